use core::{alloc::Layout, cell::Cell, ptr::NonNull};

use bytesize::ByteSize;
use log::error;

use crate::{error::AllocError, global::Global, traits::Allocator};

/// An allocator that forwards to another allocator while the bytes it has
/// handed out stay within a budget.
///
/// Requests that would exceed the budget fail with
/// [`AllocError::OutOfMemory`]. Share it between containers by reference:
///
/// ```
/// use stowage_alloc::{Limited, Vector};
///
/// let budget = Limited::new(64);
/// let mut v = Vector::<u64, _>::new_in(&budget);
/// assert!(v.reserve(8).is_ok());
/// assert!(v.reserve(9).is_err());
/// ```
#[derive(Debug)]
pub struct Limited<A: Allocator = Global> {
    inner: A,
    limit: Cell<usize>,
    // bytes currently handed out
    used: Cell<usize>,
    // blocks currently handed out
    live: Cell<usize>,
}

impl Limited {
    /// Constructs a `Limited` over the system allocator with a budget of
    /// `limit` bytes.
    pub const fn new(limit: usize) -> Self {
        Self::with_allocator(limit, Global)
    }
}

impl<A: Allocator> Limited<A> {
    /// Constructs a `Limited` over `inner` with a budget of `limit` bytes.
    pub const fn with_allocator(limit: usize, inner: A) -> Self {
        Self {
            inner,
            limit: Cell::new(limit),
            used: Cell::new(0),
            live: Cell::new(0),
        }
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Changes the budget. Blocks already handed out stay valid even if
    /// they exceed the new budget.
    pub fn set_limit(&self, limit: usize) {
        self.limit.set(limit);
    }

    #[inline]
    pub fn used(&self) -> usize {
        self.used.get()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.used())
    }

    /// Returns the number of blocks that have been allocated and not yet freed.
    #[inline]
    pub fn live_allocations(&self) -> usize {
        self.live.get()
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

unsafe impl<A: Allocator> Allocator for Limited<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let size = layout.size();
        if size > self.remaining() {
            error!(
                "size requested is larger than the remaining budget: {} > {}",
                ByteSize::b(size as u64).to_string_as(true),
                ByteSize::b(self.remaining() as u64).to_string_as(true)
            );
            return Err(AllocError::OutOfMemory {
                size,
                align: layout.align(),
            });
        }

        let ptr = self.inner.allocate(layout)?;
        self.used.set(self.used.get() + size);
        self.live.set(self.live.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.inner.deallocate(ptr, layout);
        self.used.set(self.used.get() - layout.size());
        self.live.set(self.live.get() - 1);
    }
}
