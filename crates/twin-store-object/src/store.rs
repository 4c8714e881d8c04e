//! [`BucketStore`], the object storage implementation of [`BlobStore`].

use std::sync::Arc;

use futures::TryStreamExt as _;
use object_store::{
  ObjectStore, PutPayload, aws::AmazonS3Builder, memory::InMemory,
  path::Path as ObjectPath,
};
use twin_core::blob::BlobStore;

use crate::{Error, Result};

/// A blob store over an object storage bucket.
///
/// Cloning is cheap; the inner client is reference-counted.
#[derive(Debug, Clone)]
pub struct BucketStore {
  inner: Arc<dyn ObjectStore>,
}

impl BucketStore {
  pub fn new(inner: Arc<dyn ObjectStore>) -> Self { Self { inner } }

  /// Connect to an S3 bucket. Region and credentials come from the standard
  /// `AWS_*` environment variables.
  pub fn s3(bucket: &str) -> Result<Self> {
    let s3 = AmazonS3Builder::from_env()
      .with_bucket_name(bucket)
      .build()?;
    tracing::debug!(bucket, "configured s3 store");
    Ok(Self::new(Arc::new(s3)))
  }

  /// A process-local bucket for tests.
  pub fn in_memory() -> Self { Self::new(Arc::new(InMemory::new())) }

  fn location(path: &str) -> Result<ObjectPath> {
    ObjectPath::parse(path).map_err(|source| Error::InvalidPath {
      path: path.to_owned(),
      source,
    })
  }
}

impl BlobStore for BucketStore {
  type Error = Error;

  async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
    let location = Self::location(path)?;
    match self.inner.get(&location).await {
      Ok(result) => Ok(Some(result.bytes().await?.to_vec())),
      Err(object_store::Error::NotFound { .. }) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
    let location = Self::location(path)?;
    self.inner.put(&location, PutPayload::from(bytes)).await?;
    Ok(())
  }

  /// HEAD probe; not-found is an answer, anything else is a failure.
  async fn exists(&self, path: &str) -> Result<bool> {
    let location = Self::location(path)?;
    match self.inner.head(&location).await {
      Ok(_) => Ok(true),
      Err(object_store::Error::NotFound { .. }) => Ok(false),
      Err(e) => Err(e.into()),
    }
  }

  /// Server-side copy; the object body never passes through this process.
  async fn copy(&self, src: &str, dst: &str) -> Result<()> {
    let from = Self::location(src)?;
    let to = Self::location(dst)?;
    match self.inner.copy(&from, &to).await {
      Ok(()) => Ok(()),
      Err(object_store::Error::NotFound { .. }) => {
        Err(Error::MissingSource(src.to_owned()))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn delete(&self, path: &str) -> Result<()> {
    let location = Self::location(path)?;
    match self.inner.delete(&location).await {
      Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
      Err(e) => Err(e.into()),
    }
  }

  async fn list(&self, prefix: &str) -> Result<Vec<String>> {
    let location = Self::location(prefix)?;
    let mut paths: Vec<String> = self
      .inner
      .list(Some(&location))
      .map_ok(|meta| meta.location.to_string())
      .try_collect()
      .await?;
    paths.sort();
    Ok(paths)
  }
}
