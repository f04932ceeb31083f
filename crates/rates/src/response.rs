//! Wire format of the `/latest` endpoint.

use crate::error::{RateError, RateResult};
use fxwatch_core::RateQuote;
use serde::Deserialize;
use std::collections::HashMap;

/// Error object the provider attaches when `success` is false.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

impl ProviderErrorBody {
    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(code) = self.code {
            parts.push(format!("code {}", code));
        }
        if let Some(ref kind) = self.kind {
            parts.push(kind.clone());
        }
        if let Some(ref info) = self.info {
            parts.push(info.clone());
        }
        parts.join(", ")
    }
}

/// Response body of `GET /latest`.
/// Missing fields take their zero value, so a bare error object still parses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestRatesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
    #[serde(default)]
    pub error: Option<ProviderErrorBody>,
}

impl LatestRatesResponse {
    /// Extract the quote for `target`, checking the provider's success flag first.
    pub fn into_quote(self, origin: &str, target: &str) -> RateResult<RateQuote> {
        if !self.success {
            let detail = self
                .error
                .as_ref()
                .map(ProviderErrorBody::describe)
                .filter(|d| !d.is_empty())
                .map(|d| format!(": {}", d))
                .unwrap_or_default();
            return Err(RateError::ProviderRejected(detail));
        }

        let rate = *self
            .rates
            .get(target)
            .ok_or_else(|| RateError::RateNotFound(target.to_string()))?;

        let base = if self.base.is_empty() {
            origin
        } else {
            self.base.as_str()
        };

        Ok(RateQuote::new(base, target, rate, self.date, self.timestamp))
    }
}
