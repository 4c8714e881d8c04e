//! Session rename transaction: relocating a session's records to a new key.
//!
//! No backend offers an atomic cross-key rename, so each record is moved with
//! copy-then-delete, conversation first and metadata second. The source of a
//! record is only deleted once its copy has succeeded, and the first failed
//! step aborts the whole transaction. If the conversation moved but the
//! metadata did not, the session is left split across both keys; nothing here
//! repairs that later.

use thiserror::Error;

use crate::{
  SessionKey,
  blob::{BlobStore, RecordKind},
};

/// What a completed transaction did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
  Renamed,
  Skipped(SkipReason),
}

/// Why a transaction was a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
  /// The session already lives under the target key.
  SameKey,
  /// At least one record is missing under the source key, e.g. the session
  /// has never been saved or was renamed on an earlier turn.
  MissingRecords { conversation: bool, metadata: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameStep {
  Probe,
  Copy,
  Delete,
}

impl std::fmt::Display for RenameStep {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Probe => f.write_str("probe"),
      Self::Copy => f.write_str("copy"),
      Self::Delete => f.write_str("delete"),
    }
  }
}

/// A failed step.
///
/// `moved` lists the records relocated before the failure. When the delete
/// of a copied record fails, that record exists under both keys and is
/// named by `duplicated`.
#[derive(Debug, Error)]
#[error("rename {from} -> {to}: {step} of {kind} record failed: {source}")]
pub struct RenameError {
  pub from:       SessionKey,
  pub to:         SessionKey,
  pub kind:       RecordKind,
  pub step:       RenameStep,
  pub moved:      Vec<RecordKind>,
  pub duplicated: Option<RecordKind>,
  #[source]
  pub source:     Box<dyn std::error::Error + Send + Sync>,
}

/// Move both records of the session at `from` to `to`.
pub async fn rename_session<S: BlobStore>(
  store: &S,
  from: &SessionKey,
  to: &SessionKey,
) -> Result<RenameOutcome, RenameError> {
  if from == to {
    return Ok(RenameOutcome::Skipped(SkipReason::SameKey));
  }

  let fail = |kind: RecordKind,
              step: RenameStep,
              moved: &[RecordKind],
              source: S::Error| RenameError {
    from: from.clone(),
    to: to.clone(),
    kind,
    step,
    moved: moved.to_vec(),
    duplicated: (step == RenameStep::Delete).then_some(kind),
    source: Box::new(source),
  };

  let mut present = [false; 2];
  for (slot, kind) in present.iter_mut().zip(RecordKind::ALL) {
    *slot = store
      .exists(&kind.path(from))
      .await
      .map_err(|e| fail(kind, RenameStep::Probe, &[], e))?;
  }
  if present.contains(&false) {
    return Ok(RenameOutcome::Skipped(SkipReason::MissingRecords {
      conversation: present[0],
      metadata:     present[1],
    }));
  }

  let mut moved = Vec::with_capacity(RecordKind::ALL.len());
  for kind in RecordKind::ALL {
    let (src, dst) = (kind.path(from), kind.path(to));
    store
      .copy(&src, &dst)
      .await
      .map_err(|e| fail(kind, RenameStep::Copy, &moved, e))?;
    store
      .delete(&src)
      .await
      .map_err(|e| fail(kind, RenameStep::Delete, &moved, e))?;
    tracing::info!(%src, %dst, "moved record");
    moved.push(kind);
  }

  Ok(RenameOutcome::Renamed)
}
