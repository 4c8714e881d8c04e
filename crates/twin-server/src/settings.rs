//! Runtime configuration, deserialised from `config.toml` and `TWIN_*`
//! environment variables.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level server configuration. Every field has a default so an empty
/// config file is valid.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  /// Browser origins allowed by CORS; `"*"` allows any origin.
  #[serde(default = "default_cors_origins")]
  pub cors_origins: Vec<String>,
  /// Directory holding `facts.json`, `summary.txt`, `style.txt` and
  /// `profile.txt`.
  #[serde(default = "default_profile_dir")]
  pub profile_dir:  PathBuf,
  #[serde(default)]
  pub storage:      StorageConfig,
  #[serde(default)]
  pub llm:          LlmConfig,
  #[serde(default)]
  pub notify:       NotifyConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         default_host(),
      port:         default_port(),
      cors_origins: default_cors_origins(),
      profile_dir:  default_profile_dir(),
      storage:      StorageConfig::default(),
      llm:          LlmConfig::default(),
      notify:       NotifyConfig::default(),
    }
  }
}

// ─── Storage ─────────────────────────────────────────────────────────────────

/// Where session records live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
  /// Files below a local directory.
  Local {
    #[serde(default = "default_memory_dir")]
    memory_dir: PathBuf,
  },
  /// Objects in an S3 bucket; credentials come from `AWS_*` variables.
  S3 { bucket: String },
}

impl Default for StorageConfig {
  fn default() -> Self { Self::Local { memory_dir: default_memory_dir() } }
}

impl StorageConfig {
  /// Short name reported by the status endpoints.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Local { .. } => "local",
      Self::S3 { .. } => "s3",
    }
  }
}

// ─── Model ───────────────────────────────────────────────────────────────────

/// OpenAI-compatible chat completion settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
  #[serde(default = "default_llm_base_url")]
  pub base_url:      String,
  #[serde(default = "default_llm_model")]
  pub model:         String,
  /// Falls back to `OPENAI_API_KEY` when unset.
  #[serde(default)]
  pub api_key:       Option<String>,
  #[serde(default)]
  pub temperature:   f32,
  #[serde(default = "default_max_tokens")]
  pub max_tokens:    u32,
  /// Only the most recent `history_limit` messages are sent to the model.
  /// Unset sends the whole transcript.
  #[serde(default)]
  pub history_limit: Option<usize>,
  #[serde(default = "default_llm_timeout")]
  pub timeout_secs:  u64,
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      base_url:      default_llm_base_url(),
      model:         default_llm_model(),
      api_key:       None,
      temperature:   0.0,
      max_tokens:    default_max_tokens(),
      history_limit: None,
      timeout_secs:  default_llm_timeout(),
    }
  }
}

impl LlmConfig {
  /// The tail of `messages` that fits the configured history window.
  pub fn window<'a, T>(&self, messages: &'a [T]) -> &'a [T] {
    match self.history_limit {
      Some(limit) if messages.len() > limit => &messages[messages.len() - limit..],
      _ => messages,
    }
  }
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
  /// ntfy topic URL. Notifications are disabled when unset.
  #[serde(default)]
  pub url:          Option<String>,
  #[serde(default = "default_notify_timeout")]
  pub timeout_secs: u64,
}

impl Default for NotifyConfig {
  fn default() -> Self { Self { url: None, timeout_secs: default_notify_timeout() } }
}

// ─── Defaults ────────────────────────────────────────────────────────────────

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_cors_origins() -> Vec<String> { vec!["http://localhost:3000".to_string()] }
fn default_profile_dir() -> PathBuf { PathBuf::from("data") }
fn default_memory_dir() -> PathBuf { PathBuf::from("memory") }
fn default_llm_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_llm_model() -> String { "gpt-4.1".to_string() }
fn default_max_tokens() -> u32 { 500 }
fn default_llm_timeout() -> u64 { 60 }
fn default_notify_timeout() -> u64 { 5 }
