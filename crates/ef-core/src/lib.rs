//! ef-core: numeric foundation for epiflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;

pub use error::{EfError, EfResult};
pub use numeric::*;
