//! Session keys.
//!
//! A key starts life as an opaque token (a random id or an unverified email
//! sent by the client) and is later replaced by the visitor's email once one
//! shows up in the conversation metadata. Keys double as a single storage path
//! segment, so anything that could escape that segment is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A validated session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionKey(String);

impl SessionKey {
  /// Validate `raw` as a key. Surrounding whitespace is trimmed.
  pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
    let key = raw.as_ref().trim();
    let valid = !key.is_empty()
      && key != "."
      && key != ".."
      && !key.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if valid {
      Ok(Self(key.to_owned()))
    } else {
      Err(Error::InvalidKey(raw.as_ref().to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for SessionKey {
  fn as_ref(&self) -> &str { &self.0 }
}

impl TryFrom<String> for SessionKey {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(value) }
}

impl From<SessionKey> for String {
  fn from(key: SessionKey) -> Self { key.0 }
}
