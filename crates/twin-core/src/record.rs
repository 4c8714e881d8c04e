//! Conversation records: the transcript and the per-turn metadata log.
//!
//! Both sequences are append-only. A record is never mutated after it has
//! been pushed; the storage layer always receives the full accumulated
//! sequence and overwrites the stored document.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

// ─── Messages ────────────────────────────────────────────────────────────────

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
  Assistant,
}

/// One entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
  pub role:      Role,
  pub content:   String,
  #[serde(deserialize_with = "iso8601")]
  pub timestamp: DateTime<Utc>,
}

impl MessageRecord {
  pub fn new(role: Role, content: impl Into<String>) -> Self {
    Self { role, content: content.into(), timestamp: Utc::now() }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self::new(Role::User, content)
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self::new(Role::Assistant, content)
  }
}

// ─── Metadata ────────────────────────────────────────────────────────────────

/// Contact details and context extracted from a single chat turn.
///
/// One record is appended per turn, even when every optional field is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
  pub name:                 Option<String>,
  pub email:                Option<String>,
  pub phone:                Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub company:              Option<String>,
  pub unanswered_questions: Option<String>,
  #[serde(deserialize_with = "iso8601")]
  pub last_time:            DateTime<Utc>,
}

impl MetadataRecord {
  /// A record with no extracted fields.
  pub fn empty(last_time: DateTime<Utc>) -> Self {
    Self {
      name: None,
      email: None,
      phone: None,
      company: None,
      unanswered_questions: None,
      last_time,
    }
  }

  /// Whether the visitor left a way to be reached during this turn.
  pub fn has_contact(&self) -> bool {
    non_empty(&self.email).is_some() || non_empty(&self.phone).is_some()
  }
}

/// Timestamps are written as RFC 3339 UTC. Older records carry ISO-8601
/// local times without an offset; those are read as UTC.
fn iso8601<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
  let raw = String::deserialize(d)?;
  if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
    return Ok(at.with_timezone(&Utc));
  }
  raw
    .parse::<NaiveDateTime>()
    .map(|naive| naive.and_utc())
    .map_err(|e| de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}

/// Trimmed field value, or `None` when absent or blank.
pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
  field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ─── Conversation ────────────────────────────────────────────────────────────

/// The pair of sequences stored under one session key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
  pub messages: Vec<MessageRecord>,
  pub metadata: Vec<MetadataRecord>,
}

impl Conversation {
  pub fn is_empty(&self) -> bool {
    self.messages.is_empty() && self.metadata.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn offsetless_timestamp_is_read_as_utc() {
    let record: MessageRecord = serde_json::from_str(
      r#"{"role":"user","content":"hi","timestamp":"2025-01-05T10:22:33.123456"}"#,
    )
    .unwrap();
    let expected = Utc.with_ymd_and_hms(2025, 1, 5, 10, 22, 33).unwrap()
      + chrono::Duration::microseconds(123_456);
    assert_eq!(record.timestamp, expected);
  }

  #[test]
  fn offset_timestamp_is_normalised_to_utc() {
    let record: MetadataRecord = serde_json::from_str(
      r#"{"name":null,"email":null,"phone":null,"unanswered_questions":null,
          "last_time":"2025-01-05T12:00:00+02:00"}"#,
    )
    .unwrap();
    assert_eq!(record.last_time, Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap());
    let written = serde_json::to_value(&record).unwrap();
    assert_eq!(written["last_time"], "2025-01-05T10:00:00Z");
  }

  #[test]
  fn garbage_timestamp_is_rejected() {
    let err = serde_json::from_str::<MessageRecord>(
      r#"{"role":"user","content":"hi","timestamp":"yesterday"}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("invalid timestamp"), "{err}");
  }
}
