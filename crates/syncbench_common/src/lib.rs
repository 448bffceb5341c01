//! Hand-built synchronization primitives and worker bookkeeping shared by the syncbench crates.

mod os;

pub mod collections;
pub mod error;
pub mod sync;

pub use error::{Error, Result};
