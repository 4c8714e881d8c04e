//! The storage backend selected at startup.

use thiserror::Error;
use twin_core::blob::BlobStore;
use twin_store_fs::LocalStore;
use twin_store_object::BucketStore;

use crate::settings::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error(transparent)]
  Local(#[from] twin_store_fs::Error),
  #[error(transparent)]
  Bucket(#[from] twin_store_object::Error),
}

/// Either configured [`BlobStore`], chosen by [`StorageConfig`].
#[derive(Debug, Clone)]
pub enum Storage {
  Local(LocalStore),
  Bucket(BucketStore),
}

impl Storage {
  pub async fn open(config: &StorageConfig) -> Result<Self, StorageError> {
    match config {
      StorageConfig::Local { memory_dir } => {
        Ok(Self::Local(LocalStore::open(memory_dir.clone()).await?))
      }
      StorageConfig::S3 { bucket } => Ok(Self::Bucket(BucketStore::s3(bucket)?)),
    }
  }
}

impl BlobStore for Storage {
  type Error = StorageError;

  async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
    match self {
      Self::Local(s) => Ok(s.get(path).await?),
      Self::Bucket(s) => Ok(s.get(path).await?),
    }
  }

  async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
    match self {
      Self::Local(s) => Ok(s.put(path, bytes).await?),
      Self::Bucket(s) => Ok(s.put(path, bytes).await?),
    }
  }

  async fn exists(&self, path: &str) -> Result<bool, StorageError> {
    match self {
      Self::Local(s) => Ok(s.exists(path).await?),
      Self::Bucket(s) => Ok(s.exists(path).await?),
    }
  }

  async fn copy(&self, src: &str, dst: &str) -> Result<(), StorageError> {
    match self {
      Self::Local(s) => Ok(s.copy(src, dst).await?),
      Self::Bucket(s) => Ok(s.copy(src, dst).await?),
    }
  }

  async fn delete(&self, path: &str) -> Result<(), StorageError> {
    match self {
      Self::Local(s) => Ok(s.delete(path).await?),
      Self::Bucket(s) => Ok(s.delete(path).await?),
    }
  }

  async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
    match self {
      Self::Local(s) => Ok(s.list(prefix).await?),
      Self::Bucket(s) => Ok(s.list(prefix).await?),
    }
  }
}
