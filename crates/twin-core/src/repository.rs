//! [`ConversationRepository`] loads and saves the record pair of a session.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
  Error, Result, SessionKey,
  blob::{BlobStore, RecordKind},
  record::Conversation,
};

/// Reads and writes whole conversation documents through a [`BlobStore`].
///
/// Cloning is cheap; the store is reference-counted.
pub struct ConversationRepository<S> {
  store: Arc<S>,
}

impl<S> Clone for ConversationRepository<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: BlobStore> ConversationRepository<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Load both records for `key`. A missing record yields an empty sequence;
  /// a session that was never stored is a valid initial state.
  pub async fn load(&self, key: &SessionKey) -> Result<Conversation> {
    let messages = self.read_records(RecordKind::Conversation, key).await?;
    let metadata = self.read_records(RecordKind::Metadata, key).await?;
    Ok(Conversation { messages, metadata })
  }

  /// Overwrite the stored records for `key` with `conversation`.
  ///
  /// The metadata log is written first. If the transcript write then fails,
  /// the stored transcript is still the previous one and the only partial
  /// state is an extra metadata entry. The metadata document is not written
  /// while the metadata sequence is empty, so an existing metadata record is
  /// never cleared.
  pub async fn save(
    &self,
    key: &SessionKey,
    conversation: &Conversation,
  ) -> Result<()> {
    if conversation.metadata.is_empty() {
      tracing::debug!(%key, "no metadata yet, skipping metadata write");
    } else {
      self
        .write_records(RecordKind::Metadata, key, &conversation.metadata)
        .await?;
    }
    self
      .write_records(RecordKind::Conversation, key, &conversation.messages)
      .await
  }

  pub async fn record_exists(
    &self,
    kind: RecordKind,
    key: &SessionKey,
  ) -> Result<bool> {
    let path = kind.path(key);
    self.store.exists(&path).await.map_err(|e| Error::storage(path, e))
  }

  /// Every session key that has a metadata record.
  pub async fn session_keys(&self) -> Result<Vec<SessionKey>> {
    let prefix = RecordKind::Metadata.prefix();
    let paths = self
      .store
      .list(prefix)
      .await
      .map_err(|e| Error::storage(prefix, e))?;
    Ok(
      paths
        .iter()
        .filter_map(|p| RecordKind::Metadata.key_from_path(p))
        .collect(),
    )
  }

  async fn read_records<T: DeserializeOwned>(
    &self,
    kind: RecordKind,
    key: &SessionKey,
  ) -> Result<Vec<T>> {
    let path = kind.path(key);
    let bytes = self
      .store
      .get(&path)
      .await
      .map_err(|e| Error::storage(path.clone(), e))?;

    match bytes {
      None => {
        tracing::debug!(%path, "no stored record");
        Ok(Vec::new())
      }
      Some(bytes) => serde_json::from_slice(&bytes)
        .map_err(|source| Error::Malformed { path, source }),
    }
  }

  async fn write_records<T: Serialize>(
    &self,
    kind: RecordKind,
    key: &SessionKey,
    records: &[T],
  ) -> Result<()> {
    let path = kind.path(key);
    let bytes = serde_json::to_vec_pretty(records)?;
    self
      .store
      .put(&path, bytes)
      .await
      .map_err(|e| Error::storage(path.clone(), e))?;
    tracing::debug!(%path, count = records.len(), "saved records");
    Ok(())
  }
}
