//! OpenAI-compatible chat completion client.
//!
//! The model is asked for a JSON object matching [`Reply`] through the
//! `json_schema` response format, so the reply text and the extracted contact
//! details arrive in one call.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use twin_core::{
  completion::{Completion, Reply},
  record::{MessageRecord, Role},
};

use crate::settings::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
  #[error("no API key configured")]
  MissingApiKey,
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("model API returned {status}: {body}")]
  Status {
    status: reqwest::StatusCode,
    body:   String,
  },
  #[error("model returned no choices")]
  NoChoice,
  #[error("model reply is not valid structured output: {0}")]
  Decode(#[from] serde_json::Error),
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
  role:    Role,
  content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model:           &'a str,
  messages:        Vec<WireMessage<'a>>,
  max_tokens:      u32,
  temperature:     f32,
  response_format: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

/// Strict JSON schema for [`Reply`]. Strict mode requires every property to be
/// listed as required, so optional fields are nullable instead.
fn reply_format() -> Value {
  let nullable = |description: &str| {
    json!({ "type": ["string", "null"], "description": description })
  };
  json!({
    "type": "json_schema",
    "json_schema": {
      "name": "twin_reply",
      "strict": true,
      "schema": {
        "type": "object",
        "additionalProperties": false,
        "required": ["reply", "name", "email", "phone", "company", "unanswered"],
        "properties": {
          "reply": {
            "type": "string",
            "description": "The full reply to the visitor, in markdown."
          },
          "name": nullable("The visitor's name, if they gave it."),
          "email": nullable("The visitor's email address, if they gave it."),
          "phone": nullable("The visitor's phone number, if they gave it."),
          "company": nullable("The visitor's company, if they named it."),
          "unanswered": nullable(
            "The visitor's question, if it cannot be answered from the profile."
          )
        }
      }
    }
  })
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiClient {
  client:  Client,
  config:  LlmConfig,
  api_key: String,
}

impl OpenAiClient {
  pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
    let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config, api_key })
  }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }

  fn request<'a>(
    &'a self,
    system_prompt: &'a str,
    history: &'a [MessageRecord],
    user_message: &'a str,
  ) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(WireMessage { role: Role::System, content: system_prompt });
    messages.extend(
      self
        .config
        .window(history)
        .iter()
        .map(|m| WireMessage { role: m.role, content: &m.content }),
    );
    messages.push(WireMessage { role: Role::User, content: user_message });

    ChatRequest {
      model: &self.config.model,
      messages,
      max_tokens: self.config.max_tokens,
      temperature: self.config.temperature,
      response_format: reply_format(),
    }
  }
}

/// Extract the structured reply from a completion response body.
fn parse_reply(response: ChatResponse) -> Result<Reply, LlmError> {
  let content = response
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .ok_or(LlmError::NoChoice)?;
  Ok(serde_json::from_str(&content)?)
}

impl Completion for OpenAiClient {
  type Error = LlmError;

  async fn complete(
    &self,
    system_prompt: &str,
    history: &[MessageRecord],
    user_message: &str,
  ) -> Result<Reply, LlmError> {
    let request = self.request(system_prompt, history, user_message);
    tracing::debug!(
      model = %self.config.model,
      messages = request.messages.len(),
      "requesting completion"
    );

    let response = self
      .client
      .post(self.url())
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(LlmError::Status { status, body });
    }

    parse_reply(response.json().await?)
  }
}
