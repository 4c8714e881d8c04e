//! The owner's profile and the system prompt built from it.
//!
//! Profile documents are read once at startup. The prompt itself is rebuilt
//! for every turn because it embeds the current date and time.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
  #[error("failed to read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("invalid facts file {path:?}: {source}")]
  Facts {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Required keys of `facts.json`; any other keys are passed to the model
/// verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct Facts {
  pub full_name: String,
  /// The short name the twin answers as.
  pub name:      String,
}

#[derive(Debug, Clone)]
pub struct Profile {
  pub facts:   Facts,
  facts_text:  String,
  summary:     String,
  style:       String,
  resume:      String,
}

impl Profile {
  /// Load the profile documents from `dir`.
  ///
  /// `facts.json` is required. `summary.txt` and `style.txt` may be absent.
  /// `profile.txt` holds the text extracted from the résumé; when it is
  /// missing a placeholder is used instead.
  pub async fn load(dir: &Path) -> Result<Self, ProfileError> {
    let facts_path = dir.join("facts.json");
    let facts_text = read(&facts_path).await?.unwrap_or_default();
    let facts = serde_json::from_str(&facts_text).map_err(|source| {
      ProfileError::Facts { path: facts_path.clone(), source }
    })?;
    Self::from_parts(
      facts,
      facts_text,
      read(&dir.join("summary.txt")).await?,
      read(&dir.join("style.txt")).await?,
      read(&dir.join("profile.txt")).await?,
    )
    .map_err(|source| ProfileError::Facts { path: facts_path, source })
  }

  pub(crate) fn from_parts(
    facts: Facts,
    facts_text: String,
    summary: Option<String>,
    style: Option<String>,
    resume: Option<String>,
  ) -> Result<Self, serde_json::Error> {
    let facts_value: serde_json::Value = serde_json::from_str(&facts_text)?;
    let resume = resume.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| {
      tracing::warn!("profile text unavailable, using placeholder");
      format!("{} full profile not available", facts.full_name)
    });
    Ok(Self {
      facts_text: serde_json::to_string_pretty(&facts_value)?,
      facts,
      summary: summary.unwrap_or_default(),
      style: style.unwrap_or_default(),
      resume,
    })
  }

  /// The first thing the twin says to a new visitor.
  pub fn greeting(&self) -> String {
    format!(
      "**Hi!** I'm {}. Please feel free to ask me any questions about my \
       background, work experience, or skills.",
      self.facts.name
    )
  }

  /// The system prompt for a turn taking place at `now`.
  pub fn system_prompt<Tz>(&self, now: DateTime<Tz>) -> String
  where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
  {
    let Facts { full_name, name } = &self.facts;
    let mut prompt = format!(
      "You are the digital twin of {full_name} (called {name}) on {name}'s \
       professional website. Speak as {name} in the first person and stay \
       strictly within the information below.\n\n\
       ## Basic information\n{}\n\n",
      self.facts_text
    );
    if !self.summary.trim().is_empty() {
      prompt.push_str(&format!("## Summary\n{}\n\n", self.summary.trim()));
    }
    prompt.push_str(&format!("## Profile\n{}\n\n", self.resume.trim()));
    if !self.style.trim().is_empty() {
      prompt.push_str(&format!("## Communication style\n{}\n\n", self.style.trim()));
    }
    prompt.push_str(&format!(
      "## Current date and time\n{}\n\n\
       ## Rules\n\
       1. Use only the information above and the ongoing conversation. Never \
       use outside knowledge, even when it seems obvious.\n\
       2. Years of experience may be calculated, but only from the profile \
       and basic information above. If unsure, say you don't know.\n\
       3. Do not embellish experience beyond what the profile states.\n\
       4. Be brief: one to five sentences unless asked for detail, and never \
       more than 300 tokens.\n\
       5. Format replies as short markdown bullet points and **bold** key \
       facts.\n\
       6. If the visitor shares a name, email, phone number or company, \
       extract it. If a question cannot be answered from the profile, \
       record it as unanswered.\n\n\
       First message: \"{}\"\n",
      now.format("%Y-%m-%d %H:%M:%S"),
      self.greeting(),
    ));
    prompt
  }
}

/// Read a text file; `None` if it does not exist.
async fn read(path: &Path) -> Result<Option<String>, ProfileError> {
  match tokio::fs::read_to_string(path).await {
    Ok(text) => Ok(Some(text)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
    Err(source) => Err(ProfileError::Io { path: path.to_path_buf(), source }),
  }
}
