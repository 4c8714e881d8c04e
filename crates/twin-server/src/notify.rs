//! Push notifications to the profile owner through an ntfy topic.

use std::{sync::Arc, time::Duration};

use reqwest::Client;
use tokio::task::JoinHandle;
use twin_core::notify::Notifier;

use crate::settings::NotifyConfig;

/// POSTs the message body to the configured ntfy topic URL. With no URL
/// configured every notification is a logged no-op.
#[derive(Clone)]
pub struct NtfyNotifier {
  client: Client,
  url:    Option<String>,
}

impl NtfyNotifier {
  pub fn new(config: &NotifyConfig) -> Result<Self, reqwest::Error> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, url: config.url.clone() })
  }
}

impl Notifier for NtfyNotifier {
  type Error = reqwest::Error;

  async fn notify(&self, message: String) -> Result<(), reqwest::Error> {
    let Some(url) = &self.url else {
      tracing::debug!("notification url not configured, dropping alert");
      return Ok(());
    };
    self
      .client
      .post(url)
      .body(message)
      .send()
      .await?
      .error_for_status()?;
    tracing::debug!("notification delivered");
    Ok(())
  }
}

/// Send `message` on a background task. Failures are logged, never returned.
pub fn dispatch<N>(notifier: Arc<N>, message: String) -> JoinHandle<()>
where
  N: Notifier + 'static,
{
  tokio::spawn(async move {
    if let Err(e) = notifier.notify(message).await {
      tracing::warn!(error = %e, "notification failed");
    }
  })
}
