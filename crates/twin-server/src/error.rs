//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Body text returned when the model call fails. Upstream details stay in
/// the logs.
pub const UPSTREAM_MESSAGE: &str = "Something went wrong...";

/// Body text returned when the session store fails.
pub const STORAGE_MESSAGE: &str = "Conversation storage is unavailable";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("storage error: {0}")]
  Storage(#[source] twin_core::Error),

  #[error("model error: {0}")]
  Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<twin_core::Error> for ApiError {
  fn from(e: twin_core::Error) -> Self {
    match e {
      twin_core::Error::InvalidKey(m) => ApiError::BadRequest(format!("invalid session id: {m}")),
      e => ApiError::Storage(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Storage(e) => {
        tracing::error!(error = %e, "storage failure");
        (StatusCode::INTERNAL_SERVER_ERROR, STORAGE_MESSAGE.to_string())
      }
      ApiError::Upstream(e) => {
        tracing::error!(error = %e, "model call failed");
        (StatusCode::BAD_GATEWAY, UPSTREAM_MESSAGE.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
