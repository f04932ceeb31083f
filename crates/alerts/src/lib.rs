//! Threshold alerts for favorite currency conversions.
//!
//! This crate provides:
//! - SQLite-backed favorite storage
//! - Webhook and message-bus notifiers behind one `Notifier` trait
//! - The threshold dispatcher that ties rates, favorites and notifiers together

pub mod bus;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod notifier;
pub mod repository;
pub mod webhook;

pub use bus::{BusNotifier, MessagePublisher, PubSubPublisher};
pub use config::{DispatcherConfig, NotifierConfig};
pub use db::{Database, DbError};
pub use dispatcher::{
    cancelled, CancelSignal, DispatchError, DispatchReport, FavoriteOutcome, OutcomeStatus,
    ThresholdDispatcher,
};
pub use notifier::{DeliveryError, MockNotifier, Notifier};
pub use repository::{FavoriteRepository, MockFavoriteRepository};
pub use webhook::WebhookNotifier;
