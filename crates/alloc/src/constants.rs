use crate::error::AllocError;

/// Capacity a vector grows to when it appends into a block with no slots.
pub const MIN_NON_ZERO_CAPACITY: usize = 1;

/// Factor by which a full vector multiplies its capacity when it appends.
pub const GROWTH_FACTOR: usize = 2;

/// Returns the capacity a full vector of `len` elements grows to on append.
///
/// Fails with [`AllocError::GrowthOverflow`] if the result overflows `usize`.
pub(crate) const fn grown_capacity(len: usize) -> Result<usize, AllocError> {
    if len == 0 {
        return Ok(MIN_NON_ZERO_CAPACITY);
    }
    match len.checked_mul(GROWTH_FACTOR) {
        Some(capacity) => Ok(capacity),
        None => Err(AllocError::GrowthOverflow { len }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grows_to_one() {
        assert_eq!(grown_capacity(0), Ok(1));
    }

    #[test]
    fn non_empty_doubles() {
        assert_eq!(grown_capacity(1), Ok(2));
        assert_eq!(grown_capacity(6), Ok(12));
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            grown_capacity(usize::MAX),
            Err(AllocError::GrowthOverflow { len: usize::MAX })
        );
        assert_eq!(grown_capacity(usize::MAX / 2), Ok(usize::MAX - 1));
    }
}
