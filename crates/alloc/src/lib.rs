//! Hand-managed storage for growable arrays.
//!
//! [`RawStorage`] owns a block of uninitialized memory obtained from an
//! [`Allocator`] and knows nothing about the values in it. [`Vector`] owns
//! one such block plus a length, and is the only place that constructs,
//! moves, and drops values.
//!
//! Allocation failures are returned as [`Error::Alloc`] rather than aborting.
//! Use [`Limited`] to put a byte budget on an allocator.

pub mod constants;
pub mod containers;
pub mod error;
mod global;
mod limited;
pub mod raw;
#[cfg(test)]
mod testing;
pub mod traits;

pub use containers::vec::Vector;
pub use error::{AllocError, Error, Result};
pub use global::Global;
pub use limited::Limited;
pub use raw::RawStorage;
pub use traits::Allocator;
