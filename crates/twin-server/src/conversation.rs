//! Handler for `GET /conversation/{session_id}`.

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use twin_core::{SessionKey, blob::BlobStore, record::MessageRecord};

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct Transcript {
  pub session_id: SessionKey,
  pub messages:   Vec<MessageRecord>,
}

/// `GET /conversation/{session_id}`
///
/// The stored transcript. An unknown
/// session has an empty transcript rather than a 404.
pub async fn get_one<S, C, N>(
  State(state): State<AppState<S, C, N>>,
  Path(session_id): Path<String>,
) -> Result<Json<Transcript>, ApiError>
where
  S: BlobStore + 'static,
{
  let key = SessionKey::parse(session_id)?;
  let conversation = state.sessions.load_session(&key).await?;
  Ok(Json(Transcript { session_id: key, messages: conversation.messages }))
}
