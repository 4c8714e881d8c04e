//! The notification collaborator and the owner alert it carries.

use std::future::Future;

use crate::{
  SessionKey,
  record::{MetadataRecord, non_empty},
};

/// Best-effort push channel to the profile owner.
///
/// Callers log and swallow errors; a failed notification never fails a
/// visitor request.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify(
    &self,
    message: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Render the owner alert for a session from its metadata log.
///
/// Contact fields come from the most recent record that has them; every
/// unanswered question in the log is listed. A session with no recorded
/// email is reported under its key.
pub fn contact_alert(key: &SessionKey, metadata: &[MetadataRecord]) -> String {
  let latest = |field: fn(&MetadataRecord) -> &Option<String>| {
    metadata
      .iter()
      .rev()
      .find_map(|m| non_empty(field(m)))
      .unwrap_or("unknown")
  };

  let unanswered = metadata
    .iter()
    .filter_map(|m| non_empty(&m.unanswered_questions))
    .collect::<Vec<_>>()
    .join("\n");

  let email = metadata
    .iter()
    .rev()
    .find_map(|m| non_empty(&m.email))
    .unwrap_or(key.as_str());

  format!(
    "Resume Agent Alert: visitor session {key}\n\
     Email: {email}\n\
     Name: {}\n\
     Phone: {}\n\
     Company: {}\n\
     Unanswered Questions: {unanswered}",
    latest(|m| &m.name),
    latest(|m| &m.phone),
    latest(|m| &m.company),
  )
}
