//! Core types and session reconciliation logic for the digital twin backend.
//!
//! This crate has no HTTP or storage dependencies. Storage backends
//! implement [`blob::BlobStore`]; the model and notification
//! transports implement [`completion::Completion`] and [`notify::Notifier`].

pub mod blob;
pub mod completion;
pub mod error;
pub mod identity;
pub mod key;
pub mod notify;
pub mod record;
pub mod rename;
pub mod repository;
pub mod session;

pub use error::{Error, Result};
pub use key::SessionKey;
