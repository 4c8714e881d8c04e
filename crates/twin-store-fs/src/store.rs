//! [`LocalStore`], the filesystem implementation of [`BlobStore`].

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use tokio::fs;
use twin_core::blob::BlobStore;

use crate::{Error, Result};

/// A blob store rooted at a directory; `conversations/abc.json` maps to
/// `{root}/conversations/abc.json`.
#[derive(Debug, Clone)]
pub struct LocalStore {
  root: PathBuf,
}

impl LocalStore {
  /// Open a store at `root`, creating the directory if needed.
  pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    fs::create_dir_all(&root).await.map_err(|source| Error::Io {
      path: root.clone(),
      source,
    })?;
    tracing::debug!(root = %root.display(), "opened local store");
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Map a logical path onto the filesystem. Every segment must be a plain
  /// name, so the result can never leave the root.
  fn resolve(&self, logical: &str) -> Result<PathBuf> {
    let mut full = self.root.clone();
    for segment in logical.split('/') {
      if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('\\')
      {
        return Err(Error::InvalidPath(logical.to_owned()));
      }
      full.push(segment);
    }
    Ok(full)
  }

  async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await.map_err(|source| Error::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    Ok(())
  }
}

/// Hidden sibling a document is staged in before it replaces `path`.
fn staging(path: &Path) -> PathBuf {
  let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
  path.with_file_name(format!(".{name}.tmp"))
}

fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
  move |source| Error::Io { path: path.to_path_buf(), source }
}

impl BlobStore for LocalStore {
  type Error = Error;

  async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
    let full = self.resolve(path)?;
    match fs::read(&full).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(io(&full)(e)),
    }
  }

  /// Documents are written to a staging file and renamed into place, so a
  /// reader never sees a truncated document.
  async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
    let full = self.resolve(path)?;
    Self::ensure_parent(&full).await?;
    let staged = staging(&full);
    fs::write(&staged, bytes).await.map_err(io(&staged))?;
    fs::rename(&staged, &full).await.map_err(io(&full))
  }

  async fn exists(&self, path: &str) -> Result<bool> {
    let full = self.resolve(path)?;
    fs::try_exists(&full).await.map_err(io(&full))
  }

  async fn copy(&self, src: &str, dst: &str) -> Result<()> {
    let from = self.resolve(src)?;
    let to = self.resolve(dst)?;
    Self::ensure_parent(&to).await?;
    let staged = staging(&to);
    match fs::copy(&from, &staged).await {
      Ok(_) => fs::rename(&staged, &to).await.map_err(io(&to)),
      Err(e) if e.kind() == ErrorKind::NotFound => {
        Err(Error::MissingSource(src.to_owned()))
      }
      Err(e) => Err(io(&from)(e)),
    }
  }

  async fn delete(&self, path: &str) -> Result<()> {
    let full = self.resolve(path)?;
    match fs::remove_file(&full).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(io(&full)(e)),
    }
  }

  async fn list(&self, prefix: &str) -> Result<Vec<String>> {
    let dir = self.resolve(prefix)?;
    let mut entries = match fs::read_dir(&dir).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(io(&dir)(e)),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io(&dir))? {
      let is_file = entry.file_type().await.map_err(io(&dir))?.is_file();
      match entry.file_name().to_str() {
        Some(name) if is_file && !name.starts_with('.') => {
          paths.push(format!("{prefix}/{name}"));
        }
        _ => {}
      }
    }
    paths.sort();
    Ok(paths)
  }
}
