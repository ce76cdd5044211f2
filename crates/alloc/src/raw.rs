use core::{
    alloc::Layout,
    fmt,
    marker::PhantomData,
    mem,
    ptr::NonNull,
};

use crate::{error::AllocError, global::Global, traits::Allocator};

/// An owned block of uninitialized memory with room for `capacity` values of `T`.
///
/// `RawStorage` only manages address space. It never constructs, reads, or
/// drops a `T`; whoever owns it decides which slots hold live values and must
/// drop them before the block is freed.
///
/// Nothing is allocated when the capacity is zero or `T` is zero-sized. In
/// that case the pointer is dangling (but aligned).
pub struct RawStorage<T, A: Allocator = Global> {
    ptr: NonNull<T>,
    capacity: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

// SAFETY: `RawStorage` uniquely owns its block
unsafe impl<T: Send, A: Allocator + Send> Send for RawStorage<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for RawStorage<T, A> {}

impl<T> RawStorage<T, Global> {
    /// Constructs an empty block. Does not allocate.
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    /// Allocates a block with room for exactly `capacity` values.
    ///
    /// # Errors
    ///
    /// See [`allocate_in`](Self::allocate_in).
    pub fn allocate(capacity: usize) -> Result<Self, AllocError> {
        Self::allocate_in(capacity, Global)
    }
}

impl<T, A: Allocator> RawStorage<T, A> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    /// Constructs an empty block that will use `alloc`. Does not allocate.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            capacity: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Allocates a block with room for exactly `capacity` values from `alloc`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `capacity` values of `T` would exceed `isize::MAX`
    /// bytes, or if `alloc` cannot provide the block.
    pub fn allocate_in(capacity: usize, alloc: A) -> Result<Self, AllocError> {
        if capacity == 0 || Self::IS_ZST {
            return Ok(Self {
                ptr: NonNull::dangling(),
                capacity,
                alloc,
                _marker: PhantomData,
            });
        }

        let layout = Self::layout_for(capacity)?;
        let ptr = alloc.allocate(layout)?;
        Ok(Self {
            ptr: ptr.cast(),
            capacity,
            alloc,
            _marker: PhantomData,
        })
    }

    fn layout_for(capacity: usize) -> Result<Layout, AllocError> {
        Layout::array::<T>(capacity).map_err(|_| AllocError::CapacityOverflow { capacity })
    }

    /// Returns the number of slots the block can address.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns a pointer to slot 0.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns a pointer to slot 0.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Returns a pointer to slot `index`.
    ///
    /// `index == capacity` is allowed and yields the one-past-the-end address,
    /// which may be used to bound ranges but never dereferenced.
    ///
    /// The returned pointer may only be written through while `self` is
    /// borrowed mutably by the caller.
    ///
    /// Debug builds panic if `index > capacity`.
    #[inline]
    pub fn slot(&self, index: usize) -> *mut T {
        debug_assert!(
            index <= self.capacity,
            "slot {index} is past the end of a block of {} slots",
            self.capacity
        );
        self.ptr.as_ptr().wrapping_add(index)
    }

    /// Exchanges blocks (and allocators) with `other`. Never allocates or
    /// touches slot contents.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<T, A: Allocator> Drop for RawStorage<T, A> {
    fn drop(&mut self) {
        if self.capacity == 0 || Self::IS_ZST {
            return;
        }
        // SAFETY: the block was allocated in `allocate_in` with this layout,
        // which therefore cannot overflow
        unsafe {
            let layout = Layout::array::<T>(self.capacity).unwrap_unchecked();
            self.alloc.deallocate(self.ptr.cast(), layout);
        }
    }
}

impl<T, A: Allocator + Default> Default for RawStorage<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, A: Allocator> fmt::Debug for RawStorage<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStorage")
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
