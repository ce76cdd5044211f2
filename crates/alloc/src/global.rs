use core::{alloc::Layout, ptr::NonNull};

use bytesize::ByteSize;
use log::error;

use crate::{error::AllocError, traits::Allocator};

/// The system allocator, as registered with `#[global_allocator]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl Allocator for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() != 0, "zero-sized layouts are never allocated");

        // SAFETY: layout has a non-zero size
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| {
            error!(
                "system allocator refused a block of {} (align {})",
                ByteSize::b(layout.size() as u64).to_string_as(true),
                layout.align()
            );
            AllocError::OutOfMemory {
                size: layout.size(),
                align: layout.align(),
            }
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_aligned_blocks() {
        let layout = Layout::from_size_align(48, 16).unwrap();
        let ptr = Global.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 16, 0);

        // SAFETY: allocated above with the same layout
        unsafe {
            ptr.as_ptr().write_bytes(0xAB, 48);
            assert_eq!(*ptr.as_ptr().add(47), 0xAB);
            Global.deallocate(ptr, layout);
        }
    }

    #[test]
    fn references_forward_to_the_allocator() {
        let layout = Layout::new::<u64>();
        let alloc = &Global;
        let ptr = alloc.allocate(layout).unwrap();
        // SAFETY: allocated above with the same layout
        unsafe { alloc.deallocate(ptr, layout) };
    }
}
