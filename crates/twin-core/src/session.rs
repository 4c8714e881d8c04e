//! [`Sessions`]: the reconciliation entry points used by request handlers.
//!
//! A turn is a sequential pipeline: load, append (done by the caller),
//! resolve, maybe rename, save. Storage failures abort the turn before the
//! save. Rename failures do not: the turn is persisted under the key it was
//! loaded with and the split is logged.

use std::sync::Arc;

use crate::{
  Result, SessionKey,
  blob::BlobStore,
  identity::resolve_key,
  record::Conversation,
  rename::{RenameOutcome, rename_session},
  repository::ConversationRepository,
};

pub struct Sessions<S> {
  repo: ConversationRepository<S>,
}

impl<S> Clone for Sessions<S> {
  fn clone(&self) -> Self { Self { repo: self.repo.clone() } }
}

impl<S: BlobStore> Sessions<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { repo: ConversationRepository::new(store) }
  }

  pub fn repository(&self) -> &ConversationRepository<S> { &self.repo }

  pub async fn load_session(&self, key: &SessionKey) -> Result<Conversation> {
    self.repo.load(key).await
  }

  /// Persist `conversation`, re-keying the session first if its metadata
  /// names a new email. Returns the key the caller must use from now on.
  pub async fn resolve_and_persist(
    &self,
    key: &SessionKey,
    conversation: &Conversation,
  ) -> Result<SessionKey> {
    let resolved = resolve_key(key, &conversation.metadata);

    let final_key = if resolved == *key {
      resolved
    } else {
      match rename_session(self.repo.store(), key, &resolved).await {
        Ok(RenameOutcome::Renamed) => {
          tracing::info!(from = %key, to = %resolved, "session re-keyed");
          resolved
        }
        Ok(RenameOutcome::Skipped(reason)) => {
          tracing::debug!(from = %key, to = %resolved, ?reason, "rename skipped");
          resolved
        }
        Err(e) => {
          tracing::warn!(
            error = %e,
            moved = ?e.moved,
            duplicated = ?e.duplicated,
            "session rename failed, keeping previous key"
          );
          key.clone()
        }
      }
    };

    self.repo.save(&final_key, conversation).await?;
    Ok(final_key)
  }

  /// Every session that has accumulated metadata.
  pub async fn session_keys(&self) -> Result<Vec<SessionKey>> {
    self.repo.session_keys().await
  }
}
