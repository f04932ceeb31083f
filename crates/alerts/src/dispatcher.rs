//! Threshold evaluation and notification dispatch.
//!
//! One run is a best-effort sequential scan:
//! - load favorites (the only step whose failure reaches the caller)
//! - keep the first `max_checks_per_run` in repository order
//! - per favorite: fetch rate, compare `rate >= threshold`, notify
//!
//! A favorite's rate or delivery failure is logged and recorded in the
//! report, then the scan moves on. Cancelling a run through its
//! [`CancelSignal`] fails the in-flight call and every later one, but each
//! admitted favorite still gets an outcome. Overlapping runs are not
//! coordinated and can notify the same favorite twice.

use crate::config::DispatcherConfig;
use crate::db::DbError;
use crate::notifier::Notifier;
use crate::repository::FavoriteRepository;
use fxwatch_core::{Favorite, Notification};
use fxwatch_rates::RateSource;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Caller-side cancellation for a run. The run is cancelled once the
/// sender publishes `true`; a dropped sender never cancels.
pub type CancelSignal = watch::Receiver<bool>;

const CANCELLED: &str = "call cancelled";

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("error getting favorites: {0}")]
    Repository(#[from] DbError),
}

/// What happened to one admitted favorite.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    /// Threshold crossed and the notifier accepted the alert.
    Notified { rate: f64 },
    /// Rate fetched but below threshold.
    BelowThreshold { rate: f64 },
    /// Rate lookup failed.
    RateUnavailable { error: String },
    /// Threshold crossed but delivery failed.
    DeliveryFailed { rate: f64, error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteOutcome {
    pub favorite_id: i64,
    pub email: String,
    pub status: OutcomeStatus,
}

/// Per-run summary. Not exposed over HTTP.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Favorites returned by the repository.
    pub total_favorites: usize,
    /// Favorites left out by the admission cap.
    pub skipped: usize,
    /// One entry per admitted favorite, in evaluation order.
    pub outcomes: Vec<FavoriteOutcome>,
}

impl DispatchReport {
    pub fn evaluated(&self) -> usize {
        self.outcomes.len()
    }

    pub fn notified(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Notified { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    OutcomeStatus::RateUnavailable { .. } | OutcomeStatus::DeliveryFailed { .. }
                )
            })
            .count()
    }
}

/// Checks favorites against live rates and notifies on crossings.
pub struct ThresholdDispatcher {
    favorites: Arc<dyn FavoriteRepository>,
    rates: Arc<dyn RateSource>,
    notifier: Arc<dyn Notifier>,
    config: DispatcherConfig,
}

impl ThresholdDispatcher {
    pub fn new(
        favorites: Arc<dyn FavoriteRepository>,
        rates: Arc<dyn RateSource>,
        notifier: Arc<dyn Notifier>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            favorites,
            rates,
            notifier,
            config,
        }
    }

    /// Run one threshold check that cannot be cancelled.
    pub async fn check_thresholds_and_notify(
        &self,
        api_key: &str,
    ) -> Result<DispatchReport, DispatchError> {
        let (_cancel_tx, cancel) = watch::channel(false);
        self.check_thresholds_with_cancel(api_key, cancel).await
    }

    /// Run one threshold check over the admitted favorites.
    pub async fn check_thresholds_with_cancel(
        &self,
        api_key: &str,
        cancel: CancelSignal,
    ) -> Result<DispatchReport, DispatchError> {
        let mut favorites = self.favorites.list_favorites().await?;
        let total = favorites.len();
        info!(count = total, "Found favorite conversions to check");

        let limit = self.config.max_checks_per_run;
        if total > limit {
            warn!(limit, total, "Limiting checks to the first favorites");
            favorites.truncate(limit);
        }

        let mut report = DispatchReport {
            total_favorites: total,
            skipped: total - favorites.len(),
            outcomes: Vec::with_capacity(favorites.len()),
        };

        for favorite in &favorites {
            let status = self.evaluate(api_key, favorite, &cancel).await;
            report.outcomes.push(FavoriteOutcome {
                favorite_id: favorite.id,
                email: favorite.email.clone(),
                status,
            });
        }

        info!(
            evaluated = report.evaluated(),
            notified = report.notified(),
            failed = report.failed(),
            skipped = report.skipped,
            "Threshold check finished"
        );
        Ok(report)
    }

    async fn evaluate(
        &self,
        api_key: &str,
        favorite: &Favorite,
        cancel: &CancelSignal,
    ) -> OutcomeStatus {
        let origin = favorite.currency_origin.as_str();
        let destination = favorite.currency_destination.as_str();

        let lookup = self.rates.get_rate(api_key, origin, destination);
        let rate = match run_cancellable(lookup, cancel).await {
            None => {
                warn!(origin, destination, email = %favorite.email, "Rate lookup cancelled");
                return OutcomeStatus::RateUnavailable {
                    error: CANCELLED.to_string(),
                };
            }
            Some(Ok(rate)) => rate,
            Some(Err(e)) => {
                warn!(
                    origin,
                    destination,
                    email = %favorite.email,
                    error = %e,
                    "Error getting rate"
                );
                return OutcomeStatus::RateUnavailable {
                    error: e.to_string(),
                };
            }
        };

        info!(
            email = %favorite.email,
            rate,
            threshold = favorite.threshold,
            "Checking favorite"
        );

        let Some(notification) = Notification::for_triggered(favorite, rate) else {
            return OutcomeStatus::BelowThreshold { rate };
        };

        let delivery = self.notifier.send_notification(&notification);
        match run_cancellable(delivery, cancel).await {
            None => {
                error!(
                    email = %favorite.email,
                    channel = self.notifier.channel(),
                    "Notification cancelled"
                );
                OutcomeStatus::DeliveryFailed {
                    rate,
                    error: CANCELLED.to_string(),
                }
            }
            Some(Ok(())) => {
                info!(
                    email = %favorite.email,
                    channel = self.notifier.channel(),
                    rate,
                    threshold = favorite.threshold,
                    "Notification sent"
                );
                OutcomeStatus::Notified { rate }
            }
            Some(Err(e)) => {
                error!(
                    email = %favorite.email,
                    channel = self.notifier.channel(),
                    error = %e,
                    "Error sending notification"
                );
                OutcomeStatus::DeliveryFailed {
                    rate,
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Drive `call` until it finishes or the run is cancelled. The call is
/// polled first, so a call that is ready immediately still completes.
async fn run_cancellable<F: Future>(call: F, cancel: &CancelSignal) -> Option<F::Output> {
    let mut cancel = cancel.clone();
    tokio::select! {
        biased;
        output = call => Some(output),
        _ = cancelled(&mut cancel) => None,
    }
}

/// Resolve once `cancel` reports `true`. Pending forever if the sender is gone.
pub async fn cancelled(cancel: &mut CancelSignal) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
