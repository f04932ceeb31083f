//! In-process periodic trigger for the threshold check.

use fxwatch_alerts::{cancelled, CancelSignal, ThresholdDispatcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Run the dispatcher every `period` until `shutdown` flips to `true`.
///
/// Runs never overlap: a tick that fires while a run is still in flight is
/// skipped. A run in flight at shutdown is cancelled call by call and
/// still finishes its batch.
pub async fn run_threshold_scheduler(
    dispatcher: Arc<ThresholdDispatcher>,
    api_key: String,
    period: Duration,
    mut shutdown: CancelSignal,
) {
    info!(period_secs = period.as_secs(), "Starting threshold scheduler");

    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = timer.tick() => {}
            _ = cancelled(&mut shutdown) => break,
        }

        match dispatcher
            .check_thresholds_with_cancel(&api_key, shutdown.clone())
            .await
        {
            Ok(report) => info!(
                total = report.total_favorites,
                evaluated = report.evaluated(),
                notified = report.notified(),
                failed = report.failed(),
                "Scheduled threshold check finished"
            ),
            Err(e) => error!(error = %e, "Scheduled threshold check failed"),
        }
    }

    info!("Threshold scheduler stopped");
}
