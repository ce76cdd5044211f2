use thiserror::Error;

/// An error with allocating memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The allocator could not provide a block for the requested layout.
    #[error("out of memory: cannot allocate {size} bytes aligned to {align}")]
    OutOfMemory { size: usize, align: usize },
    /// The number of slots requested does not fit in `isize::MAX` bytes.
    #[error("capacity overflow: {capacity} slots do not fit in the address space")]
    CapacityOverflow { capacity: usize },
    /// A full vector of `len` values cannot double its capacity without
    /// overflowing `usize`.
    #[error("capacity overflow: cannot grow a vector of {len} values by doubling")]
    GrowthOverflow { len: usize },
}

/// An error returned by [`Vector`](crate::Vector) operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Growing the vector needed memory that could not be obtained.
    #[error(transparent)]
    Alloc(#[from] AllocError),
    /// A position argument was outside the range the operation accepts.
    #[error("position {index} is out of bounds for a vector of length {len}")]
    OutOfBounds { index: usize, len: usize },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(AllocError: Send, Sync, Debug, Copy);
    assert_impl_all!(Error: Send, Sync, Debug, Copy, std::error::Error);

    #[test]
    fn alloc_error_converts_into_error() {
        let err: Error = AllocError::CapacityOverflow { capacity: usize::MAX }.into();
        assert_eq!(
            err,
            Error::Alloc(AllocError::CapacityOverflow { capacity: usize::MAX })
        );
    }

    #[test]
    fn alloc_error_is_displayed_transparently() {
        let err: Error = AllocError::OutOfMemory { size: 64, align: 8 }.into();
        assert_eq!(
            err.to_string(),
            "out of memory: cannot allocate 64 bytes aligned to 8"
        );
    }

    #[test]
    fn growth_overflow_names_the_length() {
        let err: Error = AllocError::GrowthOverflow { len: usize::MAX }.into();
        assert_eq!(
            err.to_string(),
            format!(
                "capacity overflow: cannot grow a vector of {} values by doubling",
                usize::MAX
            )
        );
    }

    #[test]
    fn out_of_bounds_names_position_and_length() {
        let err = Error::OutOfBounds { index: 7, len: 3 };
        assert_eq!(
            err.to_string(),
            "position 7 is out of bounds for a vector of length 3"
        );
    }
}
