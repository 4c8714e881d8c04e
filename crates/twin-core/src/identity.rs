//! Identity resolution. Derives the durable session key from metadata.
//!
//! The most recent non-empty email wins, retroactively: a visitor who gives a
//! second address later has the whole session migrated to it.

use crate::{
  SessionKey,
  record::{MetadataRecord, non_empty},
};

/// Where a session sits in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
  /// No email has been observed; the session lives under its opaque token.
  Ephemeral,
  /// An email has been observed and is the session's durable key.
  Resolved(SessionKey),
}

/// Scan `metadata` from newest to oldest and return the first usable email.
///
/// Blank values are skipped, as are values that cannot serve as a key.
pub fn latest_email(metadata: &[MetadataRecord]) -> Option<SessionKey> {
  metadata
    .iter()
    .rev()
    .filter_map(|record| non_empty(&record.email))
    .find_map(|email| SessionKey::parse(email).ok())
}

pub fn session_state(metadata: &[MetadataRecord]) -> SessionState {
  match latest_email(metadata) {
    Some(email) => SessionState::Resolved(email),
    None => SessionState::Ephemeral,
  }
}

/// The key a turn loaded under `current` must be persisted under.
pub fn resolve_key(current: &SessionKey, metadata: &[MetadataRecord]) -> SessionKey {
  latest_email(metadata).unwrap_or_else(|| current.clone())
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn with_email(email: Option<&str>) -> MetadataRecord {
    MetadataRecord {
      email: email.map(str::to_owned),
      ..MetadataRecord::empty(Utc::now())
    }
  }

  fn key(s: &str) -> SessionKey { SessionKey::parse(s).unwrap() }

  #[test]
  fn no_email_keeps_current_key() {
    let metadata = vec![with_email(None), with_email(Some("  "))];
    assert_eq!(resolve_key(&key("abc123"), &metadata), key("abc123"));
    assert_eq!(session_state(&metadata), SessionState::Ephemeral);
  }

  #[test]
  fn empty_metadata_keeps_current_key() {
    assert_eq!(resolve_key(&key("abc123"), &[]), key("abc123"));
  }

  #[test]
  fn most_recent_email_wins_over_older_and_later_blanks() {
    let metadata = vec![
      with_email(Some("first@x.com")),
      with_email(None),
      with_email(Some("second@x.com")),
      with_email(None),
      with_email(Some("")),
    ];
    assert_eq!(resolve_key(&key("abc123"), &metadata), key("second@x.com"));
    assert_eq!(
      session_state(&metadata),
      SessionState::Resolved(key("second@x.com"))
    );
  }

  #[test]
  fn unusable_email_falls_back_to_older_one() {
    let metadata = vec![with_email(Some("jane@x.com")), with_email(Some("a/b@x.com"))];
    assert_eq!(resolve_key(&key("abc123"), &metadata), key("jane@x.com"));
  }

  #[test]
  fn email_is_trimmed() {
    let metadata = vec![with_email(Some(" jane@x.com \n"))];
    assert_eq!(resolve_key(&key("abc123"), &metadata), key("jane@x.com"));
  }
}
