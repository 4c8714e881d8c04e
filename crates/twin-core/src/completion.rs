//! The language-model collaborator.
//!
//! The model is opaque: it receives the system prompt, the prior transcript
//! and the new visitor message, and returns a reply together with whatever
//! contact details it extracted from the message.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{MessageRecord, MetadataRecord, non_empty};

/// Structured output of one completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
  /// The text shown to the visitor (markdown).
  pub reply:      String,
  #[serde(default)]
  pub name:       Option<String>,
  #[serde(default)]
  pub email:      Option<String>,
  #[serde(default)]
  pub phone:      Option<String>,
  #[serde(default)]
  pub company:    Option<String>,
  /// The visitor's question, if the profile could not answer it.
  #[serde(default)]
  pub unanswered: Option<String>,
}

impl Reply {
  /// The metadata record for the turn that produced this reply. Blank
  /// extractions are stored as `None`.
  pub fn metadata_record(&self, at: DateTime<Utc>) -> MetadataRecord {
    let clean = |f: &Option<String>| non_empty(f).map(str::to_owned);
    MetadataRecord {
      name:                 clean(&self.name),
      email:                clean(&self.email),
      phone:                clean(&self.phone),
      company:              clean(&self.company),
      unanswered_questions: clean(&self.unanswered),
      last_time:            at,
    }
  }
}

pub trait Completion: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn complete<'a>(
    &'a self,
    system_prompt: &'a str,
    history: &'a [MessageRecord],
    user_message: &'a str,
  ) -> impl Future<Output = Result<Reply, Self::Error>> + Send + 'a;
}
