use core::{alloc::Layout, ptr::NonNull};

use crate::error::AllocError;

/// A source of untyped memory blocks.
///
/// Containers never pass zero-sized layouts to an allocator; they represent
/// empty blocks with a dangling pointer instead.
///
/// # Safety
///
/// A block returned by `allocate` must be valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and must stay valid
/// until it is passed to `deallocate` on the same allocator (or a copy of a
/// reference to it).
pub unsafe trait Allocator {
    /// Allocates an uninitialized block that fits `layout`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no memory meeting the requirements is available.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Frees a block.
    ///
    /// ## Safety
    /// - `ptr` must have been returned by `allocate` on this allocator.
    /// - `layout` must be the layout it was allocated with.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout)
    }
}
