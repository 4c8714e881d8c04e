//! Router tests against an in-memory bucket, a scripted model and a channel
//! notifier.

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
  time::Duration,
};

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;
use twin_core::{
  SessionKey,
  blob::{BlobStore, RecordKind},
  completion::{Completion, Reply},
  notify::Notifier,
  record::MessageRecord,
};
use twin_store_object::BucketStore;

use crate::{
  AppState,
  error::{STORAGE_MESSAGE, UPSTREAM_MESSAGE},
  profile::{Facts, Profile},
  router,
};

// ─── Fakes ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("model unavailable")]
struct ModelDown;

/// Answers with queued replies and records the history length of each call.
/// An exhausted queue answers with a plain reply.
#[derive(Default)]
struct ScriptedModel {
  replies: Mutex<VecDeque<Result<Reply, ModelDown>>>,
  seen:    Mutex<Vec<usize>>,
}

impl ScriptedModel {
  fn push(&self, reply: Result<Reply, ModelDown>) {
    self.replies.lock().unwrap().push_back(reply);
  }
}

impl Completion for ScriptedModel {
  type Error = ModelDown;

  async fn complete(
    &self,
    _system_prompt: &str,
    history: &[MessageRecord],
    _user_message: &str,
  ) -> Result<Reply, ModelDown> {
    self.seen.lock().unwrap().push(history.len());
    let next = self.replies.lock().unwrap().pop_front();
    next.unwrap_or_else(|| Ok(Reply { reply: "Noted.".into(), ..Reply::default() }))
  }
}

struct ChannelNotifier(mpsc::UnboundedSender<String>);

impl Notifier for ChannelNotifier {
  type Error = mpsc::error::SendError<String>;

  async fn notify(&self, message: String) -> Result<(), Self::Error> {
    self.0.send(message)
  }
}

fn profile() -> Profile {
  Profile::from_parts(
    Facts { full_name: "Ada Lovelace".into(), name: "Ada".into() },
    r#"{"full_name":"Ada Lovelace","name":"Ada"}"#.into(),
    None,
    None,
    None,
  )
  .unwrap()
}

struct Harness {
  app:    Router,
  store:  Arc<BucketStore>,
  model:  Arc<ScriptedModel>,
  alerts: mpsc::UnboundedReceiver<String>,
}

fn harness() -> Harness {
  let store = Arc::new(BucketStore::in_memory());
  let (tx, alerts) = mpsc::unbounded_channel();
  let state = AppState::new(
    store.clone(),
    ScriptedModel::default(),
    ChannelNotifier(tx),
    profile(),
    "s3",
  );
  let model = state.llm.clone();
  let app = router(state, &["http://localhost:3000".to_string()]);
  Harness { app, store, model, alerts }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
  send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
  let request = Request::post(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap();
  send(app, request).await
}

async fn post_text(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
  let request = Request::post(uri)
    .header(header::CONTENT_TYPE, "text/plain;charset=UTF-8")
    .body(Body::from(body.to_owned()))
    .unwrap();
  send(app, request).await
}

async fn next_alert(alerts: &mut mpsc::UnboundedReceiver<String>) -> String {
  tokio::time::timeout(Duration::from_secs(1), alerts.recv())
    .await
    .expect("alert dispatched")
    .expect("channel open")
}

async fn stored(store: &BucketStore, kind: RecordKind, key: &str) -> bool {
  store.exists(&kind.path(&SessionKey::parse(key).unwrap())).await.unwrap()
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_and_health_report_storage() {
  let h = harness();

  let (status, body) = get(&h.app, "/").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body,
    json!({ "message": "AI Digital Twin", "memory_enabled": true, "storage": "s3" })
  );

  let (status, body) = get(&h.app, "/health").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "healthy", "storage": "s3" }));
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
  let h = harness();
  let request = Request::builder()
    .method(Method::OPTIONS)
    .uri("/chat")
    .header(header::ORIGIN, "http://localhost:3000")
    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
    .body(Body::empty())
    .unwrap();
  let response = h.app.clone().oneshot(request).await.unwrap();
  assert_eq!(
    response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
    "http://localhost:3000"
  );
}

// ─── Chat ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_turn_gets_a_fresh_key_and_is_stored() {
  let h = harness();

  let (status, body) = post_json(&h.app, "/chat", json!({ "message": "Hello" })).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["response"], "Noted.");
  let key = body["session_id"].as_str().unwrap().to_owned();
  assert!(uuid::Uuid::parse_str(&key).is_ok());
  assert_eq!(body["email_id"], key.as_str());

  let (status, transcript) = get(&h.app, &format!("/conversation/{key}")).await;
  assert_eq!(status, StatusCode::OK);
  let messages = transcript["messages"].as_array().unwrap();
  assert_eq!(messages.len(), 2);
  assert_eq!(messages[0]["role"], "user");
  assert_eq!(messages[0]["content"], "Hello");
  assert_eq!(messages[1]["role"], "assistant");
  assert!(stored(&h.store, RecordKind::Metadata, &key).await);
}

#[tokio::test]
async fn email_shared_mid_conversation_re_keys_the_session() {
  let mut h = harness();

  let (_, first) = post_json(&h.app, "/chat", json!({ "message": "Hi there" })).await;
  let anon = first["session_id"].as_str().unwrap().to_owned();

  h.model.push(Ok(Reply {
    reply: "Thanks Jane!".into(),
    name: Some("Jane".into()),
    email: Some("jane@x.com".into()),
    ..Reply::default()
  }));
  let (status, second) = post_json(
    &h.app,
    "/chat",
    json!({ "message": "I'm Jane, jane@x.com", "session_id": anon }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(second["session_id"], "jane@x.com");
  assert_eq!(second["email_id"], "jane@x.com");

  assert!(!stored(&h.store, RecordKind::Conversation, &anon).await);
  assert!(!stored(&h.store, RecordKind::Metadata, &anon).await);

  let alert = next_alert(&mut h.alerts).await;
  assert!(alert.contains("visitor session jane@x.com"), "{alert}");
  assert!(alert.contains("Name: Jane"), "{alert}");

  let (_, third) = post_json(
    &h.app,
    "/chat",
    json!({ "message": "What do you do?", "session_id": "jane@x.com" }),
  )
  .await;
  assert_eq!(third["session_id"], "jane@x.com");

  let (_, transcript) = get(&h.app, "/conversation/jane@x.com").await;
  assert_eq!(transcript["messages"].as_array().unwrap().len(), 6);
  assert_eq!(*h.model.seen.lock().unwrap(), vec![0, 2, 4]);
}

#[tokio::test]
async fn email_id_seeds_the_key() {
  let h = harness();
  let (_, body) = post_json(
    &h.app,
    "/chat",
    json!({ "message": "Hello", "email_id": "bob@y.org", "name": "Bob" }),
  )
  .await;
  assert_eq!(body["session_id"], "bob@y.org");

  let sessions = twin_core::session::Sessions::new(h.store.clone());
  let conversation = sessions.load_session(&SessionKey::parse("bob@y.org").unwrap()).await.unwrap();
  assert_eq!(conversation.metadata[0].name.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn empty_message_is_rejected() {
  let h = harness();
  let (status, body) = post_json(&h.app, "/chat", json!({ "message": "   " })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
  assert!(h.model.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn model_failure_is_a_bad_gateway_and_saves_nothing() {
  let h = harness();
  h.model.push(Err(ModelDown));

  let (status, body) = post_json(
    &h.app,
    "/chat",
    json!({ "message": "Hello", "session_id": "abc123" }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(body, json!({ "error": UPSTREAM_MESSAGE }));
  assert!(!stored(&h.store, RecordKind::Conversation, "abc123").await);
  assert!(!stored(&h.store, RecordKind::Metadata, "abc123").await);
}

#[tokio::test]
async fn turn_without_contact_sends_no_alert() {
  let mut h = harness();
  post_json(&h.app, "/chat", json!({ "message": "Hello" })).await;
  tokio::task::yield_now().await;
  assert!(h.alerts.try_recv().is_err());
}

// ─── Close ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn close_accepts_a_plain_text_beacon() {
  let mut h = harness();
  h.model.push(Ok(Reply {
    reply: "Got it.".into(),
    phone: Some("555-0100".into()),
    unanswered: Some("Do you like Go?".into()),
    ..Reply::default()
  }));
  post_json(&h.app, "/chat", json!({ "message": "Call me", "session_id": "abc123" })).await;
  next_alert(&mut h.alerts).await;

  let (status, body) = post_text(&h.app, "/chat-close", r#"{"session_id":"abc123"}"#).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "Notification triggered" }));

  let alert = next_alert(&mut h.alerts).await;
  assert!(alert.contains("Phone: 555-0100"), "{alert}");
  assert!(alert.ends_with("Unanswered Questions: Do you like Go?"), "{alert}");
}

#[tokio::test]
async fn close_rejects_bad_bodies() {
  let h = harness();

  let (status, _) = post_text(&h.app, "/chat-close", "not json").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = post_text(&h.app, "/chat-close", "{}").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "session_id is required");
}

// ─── Conversation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_session_has_an_empty_transcript() {
  let h = harness();
  let (status, body) = get(&h.app, "/conversation/nobody").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "session_id": "nobody", "messages": [] }));
}

#[tokio::test]
async fn invalid_session_id_is_a_bad_request() {
  let h = harness();
  let (status, _) = get(&h.app, "/conversation/bad%5Ckey").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreadable_session_hides_storage_detail() {
  let h = harness();
  h.store
    .put(&RecordKind::Conversation.path(&SessionKey::parse("abc123").unwrap()), b"{".to_vec())
    .await
    .unwrap();

  let (status, body) = get(&h.app, "/conversation/abc123").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body, json!({ "error": STORAGE_MESSAGE }));

  let (status, body) = post_json(
    &h.app,
    "/chat",
    json!({ "message": "Hello", "session_id": "abc123" }),
  )
  .await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert!(!body["error"].as_str().unwrap().contains("conversations/"));
}
