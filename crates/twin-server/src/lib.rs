//! HTTP API for the digital twin.
//!
//! Exposes an axum [`Router`] generic over the storage backend, the model
//! client and the notifier, so tests can swap any of them for fakes.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = twin_server::router(state, &config.cors_origins);
//! axum::serve(listener, app).await?;
//! ```

pub mod backend;
pub mod chat;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod locks;
pub mod notify;
pub mod profile;
pub mod settings;
pub mod status;
pub mod sweep;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderValue,
  routing::{get, post},
};
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};
use twin_core::{blob::BlobStore, completion::Completion, notify::Notifier, session::Sessions};

pub use error::ApiError;

use crate::{locks::SessionLocks, profile::Profile};

/// Shared handler state. Every field is reference-counted, so cloning per
/// request is cheap.
pub struct AppState<S, C, N> {
  pub sessions: Sessions<S>,
  pub llm:      Arc<C>,
  pub notifier: Arc<N>,
  pub profile:  Arc<Profile>,
  pub locks:    SessionLocks,
  /// Backend label reported by the status endpoints.
  pub storage:  &'static str,
}

impl<S, C, N> Clone for AppState<S, C, N> {
  fn clone(&self) -> Self {
    Self {
      sessions: self.sessions.clone(),
      llm:      self.llm.clone(),
      notifier: self.notifier.clone(),
      profile:  self.profile.clone(),
      locks:    self.locks.clone(),
      storage:  self.storage,
    }
  }
}

impl<S: BlobStore, C, N> AppState<S, C, N> {
  pub fn new(
    store: Arc<S>,
    llm: C,
    notifier: N,
    profile: Profile,
    storage: &'static str,
  ) -> Self {
    Self {
      sessions: Sessions::new(store),
      llm: Arc::new(llm),
      notifier: Arc::new(notifier),
      profile: Arc::new(profile),
      locks: SessionLocks::new(),
      storage,
    }
  }
}

/// Build the fully-materialised application router.
///
/// `cors_origins` lists the browser origins allowed to call the API; a
/// single `"*"` allows any origin.
pub fn router<S, C, N>(state: AppState<S, C, N>, cors_origins: &[String]) -> Router<()>
where
  S: BlobStore + 'static,
  C: Completion + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Status
    .route("/", get(status::root::<S, C, N>))
    .route("/health", get(status::health::<S, C, N>))
    // Chat
    .route("/chat", post(chat::chat::<S, C, N>))
    .route("/chat-close", post(chat::close::<S, C, N>))
    .route("/conversation/{session_id}", get(conversation::get_one::<S, C, N>))
    .layer(cors(cors_origins))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

fn cors(origins: &[String]) -> CorsLayer {
  let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
  if origins.iter().any(|o| o == "*") {
    return layer.allow_origin(Any);
  }
  let origins = origins
    .iter()
    .filter_map(|o| match HeaderValue::from_str(o) {
      Ok(v) => Some(v),
      Err(_) => {
        tracing::warn!(origin = %o, "ignoring invalid CORS origin");
        None
      }
    })
    .collect::<Vec<_>>();
  layer.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests;
