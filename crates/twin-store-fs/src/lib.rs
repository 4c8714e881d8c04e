//! Local filesystem backend for session records.
//!
//! Logical paths are resolved below a root directory. All I/O goes through
//! [`tokio::fs`] so the async runtime is never blocked.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::LocalStore;
