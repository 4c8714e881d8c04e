//! The `BlobStore` trait and the logical layout of session records.
//!
//! The trait is implemented by storage backends (`twin-store-fs`,
//! `twin-store-object`). The repository and rename transaction depend on this
//! abstraction, never on a concrete backend.

use std::future::Future;

use crate::SessionKey;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Uniform access to a key/value blob store addressed by `/`-separated
/// logical paths.
///
/// A missing object is a normal outcome (`None` / `false`), never an error.
/// Errors are reserved for permission, transport and malformed-path faults.
///
/// All methods return `Send` futures so stores can be shared across a
/// multi-threaded runtime.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read a whole object. Returns `None` if nothing is stored at `path`.
  fn get<'a>(
    &'a self,
    path: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send + 'a;

  /// Overwrite the object at `path`.
  fn put<'a>(
    &'a self,
    path: &'a str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Probe for an object without reading it.
  fn exists<'a>(
    &'a self,
    path: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Copy `src` to `dst`, overwriting `dst`. Fails if `src` does not exist.
  fn copy<'a>(
    &'a self,
    src: &'a str,
    dst: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove the object at `path`.
  fn delete<'a>(
    &'a self,
    path: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// List the paths of all objects under `prefix` (a directory-like path
  /// without a trailing slash).
  fn list<'a>(
    &'a self,
    prefix: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;
}

// ─── Layout ──────────────────────────────────────────────────────────────────

const SUFFIX: &str = ".json";

/// The two records stored per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
  Conversation,
  Metadata,
}

impl RecordKind {
  /// Rename order: the transcript moves before the metadata log.
  pub const ALL: [RecordKind; 2] = [RecordKind::Conversation, RecordKind::Metadata];

  pub fn prefix(self) -> &'static str {
    match self {
      Self::Conversation => "conversations",
      Self::Metadata => "metadata",
    }
  }

  /// Logical path of this record for `key`, e.g. `metadata/jane@x.com.json`.
  pub fn path(self, key: &SessionKey) -> String {
    format!("{}/{}{SUFFIX}", self.prefix(), key)
  }

  /// Inverse of [`RecordKind::path`]. Returns `None` for paths that belong to
  /// another prefix or do not name a valid key.
  pub fn key_from_path(self, path: &str) -> Option<SessionKey> {
    let rest = path.strip_prefix(self.prefix())?.strip_prefix('/')?;
    let raw = rest.strip_suffix(SUFFIX)?;
    SessionKey::parse(raw).ok()
  }
}

impl std::fmt::Display for RecordKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Conversation => f.write_str("conversation"),
      Self::Metadata => f.write_str("metadata"),
    }
  }
}
