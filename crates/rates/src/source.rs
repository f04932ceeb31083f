//! Rate source abstraction.

use crate::error::{RateError, RateResult};
use async_trait::async_trait;
use fxwatch_core::RateQuote;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Trait for exchange rate providers.
///
/// Implementations must not cache: every call reflects the provider's
/// current rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch the latest quote for `origin` -> `target`.
    async fn latest_quote(&self, api_key: &str, origin: &str, target: &str)
        -> RateResult<RateQuote>;

    /// Fetch only the numeric rate for `origin` -> `target`.
    async fn get_rate(&self, api_key: &str, origin: &str, target: &str) -> RateResult<f64> {
        Ok(self.latest_quote(api_key, origin, target).await?.rate)
    }
}

/// Mock rate source for testing.
/// Records every lookup so callers can assert on what was fetched.
#[derive(Default)]
pub struct MockRateSource {
    rates: HashMap<(String, String), f64>,
    failures: HashSet<(String, String)>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `rate` for the pair.
    pub fn with_rate(mut self, origin: &str, target: &str, rate: f64) -> Self {
        self.rates
            .insert((origin.to_string(), target.to_string()), rate);
        self
    }

    /// Fail every lookup for the pair with a transport error.
    pub fn with_failure(mut self, origin: &str, target: &str) -> Self {
        self.failures
            .insert((origin.to_string(), target.to_string()));
        self
    }

    /// Pairs looked up so far, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RateSource for MockRateSource {
    async fn latest_quote(
        &self,
        _api_key: &str,
        origin: &str,
        target: &str,
    ) -> RateResult<RateQuote> {
        let key = (origin.to_string(), target.to_string());
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.clone());
        }

        if self.failures.contains(&key) {
            return Err(RateError::Transport("mock failure".to_string()));
        }

        self.rates
            .get(&key)
            .map(|&rate| RateQuote::new(origin, target, rate, "", 0))
            .ok_or_else(|| RateError::RateNotFound(target.to_string()))
    }
}
