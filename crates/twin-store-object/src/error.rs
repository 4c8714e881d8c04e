//! Error type for `twin-store-object`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("object store error: {0}")]
  Backend(#[from] object_store::Error),

  #[error("invalid object path {path:?}: {source}")]
  InvalidPath {
    path:   String,
    #[source]
    source: object_store::path::Error,
  },

  #[error("copy source does not exist: {0:?}")]
  MissingSource(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
