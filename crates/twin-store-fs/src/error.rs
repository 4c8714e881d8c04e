//! Error type for `twin-store-fs`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error at {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The logical path is empty, absolute, or would leave the root directory.
  #[error("invalid path: {0:?}")]
  InvalidPath(String),

  #[error("copy source does not exist: {0:?}")]
  MissingSource(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
