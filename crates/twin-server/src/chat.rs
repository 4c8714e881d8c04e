//! Handlers for the chat endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/chat` | Body: [`ChatBody`]; returns [`ChatResponse`] |
//! | `POST` | `/chat-close` | Body: `{"session_id":"..."}` as any content type |
//!
//! A chat turn runs under the per-key lock of the key it arrived with:
//! load the session, ask the model, append the turn, then let the session
//! facade re-key and persist it. The key in the response is the one the
//! client must send next time.

use axum::{Json, body::Bytes, extract::State};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use twin_core::{
  SessionKey,
  blob::BlobStore,
  completion::Completion,
  notify::{Notifier, contact_alert},
  record::MessageRecord,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, notify::dispatch};

// ─── Chat ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
  pub message:    String,
  /// Key returned by the previous turn, if any.
  #[serde(default)]
  pub session_id: Option<String>,
  /// Used as the key when the client has no session yet.
  #[serde(default)]
  pub email_id:   Option<String>,
  /// Visitor name known to the client; recorded when the model extracted
  /// none.
  #[serde(default)]
  pub name:       Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
  pub response:   String,
  pub session_id: String,
  pub email_id:   String,
}

fn given(field: &Option<String>) -> Option<&str> {
  field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// The key a turn starts under: the session id, else the email id, else a
/// fresh random key.
fn incoming_key(body: &ChatBody) -> Result<SessionKey, ApiError> {
  match given(&body.session_id).or_else(|| given(&body.email_id)) {
    Some(raw) => Ok(SessionKey::parse(raw)?),
    None => Ok(SessionKey::parse(Uuid::new_v4().to_string())?),
  }
}

/// `POST /chat`
pub async fn chat<S, C, N>(
  State(state): State<AppState<S, C, N>>,
  Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError>
where
  S: BlobStore + 'static,
  C: Completion + 'static,
  N: Notifier + 'static,
{
  if body.message.trim().is_empty() {
    return Err(ApiError::BadRequest("message must not be empty".into()));
  }
  let key = incoming_key(&body)?;
  let _turn = state.locks.lock(&key).await;

  let mut conversation = state.sessions.load_session(&key).await?;
  tracing::debug!(
    session = %key,
    messages = conversation.messages.len(),
    "session loaded"
  );

  let prompt = state.profile.system_prompt(Local::now());
  let reply = state
    .llm
    .complete(&prompt, &conversation.messages, &body.message)
    .await
    .map_err(|e| ApiError::Upstream(Box::new(e)))?;

  let mut record = reply.metadata_record(Utc::now());
  if record.name.is_none() {
    record.name = given(&body.name).map(str::to_owned);
  }
  let alert = record.has_contact();

  conversation.messages.push(MessageRecord::user(body.message));
  conversation.messages.push(MessageRecord::assistant(reply.reply.clone()));
  conversation.metadata.push(record);

  let key = state.sessions.resolve_and_persist(&key, &conversation).await?;
  tracing::info!(session = %key, "turn persisted");

  if alert {
    dispatch(state.notifier.clone(), contact_alert(&key, &conversation.metadata));
  }

  Ok(Json(ChatResponse {
    response:   reply.reply,
    session_id: key.to_string(),
    email_id:   key.to_string(),
  }))
}

// ─── Close ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CloseBody {
  #[serde(default)]
  session_id: Option<String>,
}

/// `POST /chat-close`
///
/// Sent by the browser when the chat window closes, usually through
/// `navigator.sendBeacon`, which cannot set `Content-Type: application/json`.
/// The raw body is therefore parsed regardless of its declared type.
pub async fn close<S, C, N>(
  State(state): State<AppState<S, C, N>>,
  body: Bytes,
) -> Result<Json<Value>, ApiError>
where
  S: BlobStore + 'static,
  C: Completion + 'static,
  N: Notifier + 'static,
{
  let body: CloseBody = serde_json::from_slice(&body)
    .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
  let raw = given(&body.session_id)
    .ok_or_else(|| ApiError::BadRequest("session_id is required".into()))?;
  let key = SessionKey::parse(raw)?;

  let conversation = state.sessions.load_session(&key).await?;
  dispatch(state.notifier.clone(), contact_alert(&key, &conversation.metadata));

  Ok(Json(json!({ "status": "Notification triggered" })))
}
