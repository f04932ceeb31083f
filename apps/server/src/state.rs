//! Application state shared by HTTP handlers.

use fxwatch_alerts::{CancelSignal, Database, ThresholdDispatcher};
use fxwatch_rates::RateSource;
use std::sync::Arc;

/// Handles built once in `main` and shared read-only for the process lifetime.
pub struct AppState {
    pub dispatcher: Arc<ThresholdDispatcher>,
    pub rates: Arc<dyn RateSource>,
    pub db: Database,
    pub api_key: String,
    /// Flips to `true` on shutdown and cancels in-flight threshold checks.
    pub shutdown: CancelSignal,
}

/// Thread-safe shared state.
pub type SharedState = Arc<AppState>;
