//! Notification delivery contract.

use async_trait::async_trait;
use fxwatch_core::Notification;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while delivering one notification.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("error marshaling notification: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("error calling webhook: {0}")]
    Transport(String),
    #[error("webhook returned status {0}")]
    UnexpectedStatus(u16),
    #[error("error publishing message: {0}")]
    Publish(String),
    #[error("publish not acknowledged within {0:?}")]
    AckTimeout(Duration),
}

/// Delivers an alert for one triggered favorite.
///
/// Implementations hold at most a client handle and are safe to call
/// concurrently. A failed call is final: there is no internal retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_notification(&self, notification: &Notification) -> Result<(), DeliveryError>;

    /// Channel name for logs.
    fn channel(&self) -> &'static str;
}

/// Mock notifier for testing.
/// Records every notification it is asked to send, including failed ones.
#[derive(Default)]
pub struct MockNotifier {
    failing_emails: HashSet<String>,
    delay: Option<Duration>,
    sent: Mutex<Vec<Notification>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail deliveries addressed to `email`.
    pub fn failing_for(mut self, email: &str) -> Self {
        self.failing_emails.insert(email.to_string());
        self
    }

    /// Take `delay` before answering each delivery.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Notifications attempted so far, in call order.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_notification(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_emails.contains(&notification.email) {
            return Err(DeliveryError::UnexpectedStatus(500));
        }
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "mock"
    }
}
