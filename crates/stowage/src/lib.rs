//! A growable contiguous array over hand-managed raw storage.
//!
//! ```
//! use stowage::Vector;
//!
//! let mut v = Vector::<String>::with_len(2)?;
//! v[0].push_str("first");
//! v.push_back("third".to_string())?;
//! v.insert(1, "second".to_string())?;
//! assert_eq!(v, ["first", "second", "", "third"]);
//! # Ok::<(), stowage::Error>(())
//! ```

pub use stowage_alloc::{
    constants, AllocError, Allocator, Error, Global, Limited, RawStorage, Result, Vector,
};
