//! Direct webhook delivery.

use crate::notifier::{DeliveryError, Notifier};
use async_trait::async_trait;
use fxwatch_core::Notification;
use reqwest::StatusCode;
use tracing::debug;

/// Notifier that POSTs the notification JSON to a fixed URL.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_notification(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(notification)?;

        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(email = %notification.email, status = status.as_u16(), "Webhook responded");

        match status {
            StatusCode::OK | StatusCode::ACCEPTED => Ok(()),
            other => Err(DeliveryError::UnexpectedStatus(other.as_u16())),
        }
    }

    fn channel(&self) -> &'static str {
        "webhook"
    }
}
