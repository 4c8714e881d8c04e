//! One-shot notification sweep over every stored session.

use twin_core::{
  blob::BlobStore,
  notify::{Notifier, contact_alert},
  session::Sessions,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
  pub notified: usize,
  pub failed:   usize,
}

/// Send a contact alert for each session that has a metadata record.
///
/// Sends are awaited one at a time. A session that cannot be loaded or
/// notified is logged and counted; the sweep carries on with the rest.
pub async fn notify_all<S, N>(
  sessions: &Sessions<S>,
  notifier: &N,
) -> Result<SweepReport, twin_core::Error>
where
  S: BlobStore,
  N: Notifier,
{
  let keys = sessions.session_keys().await?;
  tracing::info!(sessions = keys.len(), "starting notification sweep");

  let mut report = SweepReport::default();
  for key in keys {
    let conversation = match sessions.load_session(&key).await {
      Ok(c) => c,
      Err(e) => {
        tracing::warn!(session = %key, error = %e, "skipping unreadable session");
        report.failed += 1;
        continue;
      }
    };
    match notifier.notify(contact_alert(&key, &conversation.metadata)).await {
      Ok(()) => report.notified += 1,
      Err(e) => {
        tracing::warn!(session = %key, error = %e, "notification failed");
        report.failed += 1;
      }
    }
  }

  tracing::info!(notified = report.notified, failed = report.failed, "sweep finished");
  Ok(report)
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use chrono::Utc;
  use twin_core::{
    SessionKey,
    record::{Conversation, MetadataRecord},
  };
  use twin_store_object::BucketStore;

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("topic unavailable")]
  struct Unavailable;

  /// Records every message; fails for messages mentioning `fail_on`.
  #[derive(Default)]
  struct Recorder {
    sent:    Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
  }

  impl Notifier for Recorder {
    type Error = Unavailable;

    async fn notify(&self, message: String) -> Result<(), Unavailable> {
      if self.fail_on.is_some_and(|f| message.contains(f)) {
        return Err(Unavailable);
      }
      self.sent.lock().unwrap().push(message);
      Ok(())
    }
  }

  async fn seeded() -> Sessions<BucketStore> {
    let sessions = Sessions::new(Arc::new(BucketStore::in_memory()));
    for (key, email) in [("jane@x.com", Some("jane@x.com")), ("anon", None)] {
      let conversation = Conversation {
        messages: vec![],
        metadata: vec![MetadataRecord {
          email: email.map(Into::into),
          ..MetadataRecord::empty(Utc::now())
        }],
      };
      sessions
        .repository()
        .save(&SessionKey::parse(key).unwrap(), &conversation)
        .await
        .unwrap();
    }
    sessions
  }

  #[tokio::test]
  async fn alerts_every_session_with_metadata() {
    let sessions = seeded().await;
    let recorder = Recorder::default();

    let report = notify_all(&sessions, &recorder).await.unwrap();
    assert_eq!(report, SweepReport { notified: 2, failed: 0 });

    let sent = recorder.sent.lock().unwrap();
    assert!(sent.iter().any(|m| m.contains("visitor session anon")));
    assert!(sent.iter().any(|m| m.contains("Email: jane@x.com")));
  }

  #[tokio::test]
  async fn failed_send_does_not_stop_the_sweep() {
    let sessions = seeded().await;
    let recorder = Recorder { fail_on: Some("anon"), ..Recorder::default() };

    let report = notify_all(&sessions, &recorder).await.unwrap();
    assert_eq!(report, SweepReport { notified: 1, failed: 1 });
    assert_eq!(recorder.sent.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn empty_store_sends_nothing() {
    let sessions = Sessions::new(Arc::new(BucketStore::in_memory()));
    let report = notify_all(&sessions, &Recorder::default()).await.unwrap();
    assert_eq!(report, SweepReport::default());
  }
}
