//! Handlers for the status endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | Service banner |
//! | `GET`  | `/health` | Liveness probe |

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::AppState;

/// `GET /`
pub async fn root<S, C, N>(State(state): State<AppState<S, C, N>>) -> Json<Value> {
  Json(json!({
    "message": "AI Digital Twin",
    "memory_enabled": true,
    "storage": state.storage,
  }))
}

/// `GET /health`
pub async fn health<S, C, N>(State(state): State<AppState<S, C, N>>) -> Json<Value> {
  Json(json!({ "status": "healthy", "storage": state.storage }))
}
