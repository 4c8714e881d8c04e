//! Error types for `twin-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid session key: {0:?}")]
  InvalidKey(String),

  #[error("storage failure at {path}: {source}")]
  Storage {
    path:   String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("malformed record at {path}: {source}")]
  Malformed {
    path:   String,
    #[source]
    source: serde_json::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn storage<E>(path: impl Into<String>, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage { path: path.into(), source: Box::new(source) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
