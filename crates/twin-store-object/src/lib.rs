//! Object storage backend for session records.
//!
//! Wraps any [`object_store::ObjectStore`]; production uses an S3 bucket and
//! tests use the in-memory implementation.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::BucketStore;
