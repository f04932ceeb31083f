//! Message-bus delivery.
//!
//! The notification JSON is published as raw message bytes (no envelope)
//! to a single topic. A downstream consumer turns it into an email.

use crate::notifier::{DeliveryError, Notifier};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use fxwatch_core::Notification;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Trait for message bus clients.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish `data` to `topic`. Resolves with the broker's message ID
    /// once the publish is acknowledged.
    async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<String, DeliveryError>;
}

/// Notifier that publishes to a fixed topic and waits for the ack.
pub struct BusNotifier {
    publisher: Arc<dyn MessagePublisher>,
    topic: String,
    ack_timeout: Duration,
}

impl BusNotifier {
    pub fn new(
        publisher: Arc<dyn MessagePublisher>,
        topic: impl Into<String>,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            ack_timeout,
        }
    }
}

#[async_trait]
impl Notifier for BusNotifier {
    async fn send_notification(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let data = serde_json::to_vec(notification)?;

        let message_id = tokio::time::timeout(
            self.ack_timeout,
            self.publisher.publish(&self.topic, data),
        )
        .await
        .map_err(|_| DeliveryError::AckTimeout(self.ack_timeout))??;

        debug!(
            topic = %self.topic,
            message_id = %message_id,
            email = %notification.email,
            "Publish acknowledged"
        );
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "pubsub"
    }
}

/// Response of the Pub/Sub `topics.publish` call.
#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(rename = "messageIds", default)]
    message_ids: Vec<String>,
}

/// Google Cloud Pub/Sub publisher over the REST API.
pub struct PubSubPublisher {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    access_token: Option<String>,
}

impl PubSubPublisher {
    pub const DEFAULT_ENDPOINT: &'static str = "https://pubsub.googleapis.com";

    /// Create a publisher. `endpoint` may point at the Pub/Sub emulator,
    /// in which case `access_token` is usually `None`.
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            access_token,
        }
    }

    fn publish_url(&self, topic: &str) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.endpoint, self.project_id, topic
        )
    }
}

#[async_trait]
impl MessagePublisher for PubSubPublisher {
    async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<String, DeliveryError> {
        let body = serde_json::json!({
            "messages": [{ "data": STANDARD.encode(&data) }]
        });

        let mut request = self.http.post(self.publish_url(topic)).json(&body);
        if let Some(ref token) = self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Publish(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Publish(format!(
                "status {}: {}",
                status.as_u16(),
                text
            )));
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Publish(e.to_string()))?;

        parsed
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| DeliveryError::Publish("no message id in publish response".to_string()))
    }
}
