//! Alert configuration types.

use crate::bus::{BusNotifier, PubSubPublisher};
use crate::notifier::Notifier;
use crate::webhook::WebhookNotifier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the threshold dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Favorites evaluated per run. Keeps the free-tier rate quota intact.
    pub max_checks_per_run: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_checks_per_run: 1,
        }
    }
}

/// Delivery channel, chosen once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotifierConfig {
    /// POST to a function URL.
    Webhook { url: String },
    /// Publish to a Pub/Sub topic.
    PubSub {
        project_id: String,
        topic_id: String,
        endpoint: String,
        access_token: Option<String>,
        ack_timeout_secs: u64,
    },
}

impl NotifierConfig {
    /// Build the configured notifier on top of a shared HTTP client.
    pub fn build(&self, http: reqwest::Client) -> Arc<dyn Notifier> {
        match self {
            NotifierConfig::Webhook { url } => Arc::new(WebhookNotifier::new(http, url.clone())),
            NotifierConfig::PubSub {
                project_id,
                topic_id,
                endpoint,
                access_token,
                ack_timeout_secs,
            } => {
                let publisher = PubSubPublisher::new(
                    http,
                    endpoint.clone(),
                    project_id.clone(),
                    access_token.clone(),
                );
                Arc::new(BusNotifier::new(
                    Arc::new(publisher),
                    topic_id.clone(),
                    Duration::from_secs(*ack_timeout_secs),
                ))
            }
        }
    }
}
