//! Favorite conversions: a user's currency pair plus threshold watch.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Only base currency accepted at registration (provider free tier).
pub const DEFAULT_ORIGIN: &str = "EUR";

/// Registered threshold watch, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    /// Database ID
    pub id: i64,
    /// Owner email, unique across favorites
    pub email: String,
    /// Base currency code (e.g., "EUR")
    pub currency_origin: CompactString,
    /// Quote currency code (e.g., "COP")
    pub currency_destination: CompactString,
    /// Rate value at or above which to alert
    pub threshold: f64,
}

impl Favorite {
    pub fn new(
        id: i64,
        email: impl Into<String>,
        currency_origin: &str,
        currency_destination: &str,
        threshold: f64,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            currency_origin: CompactString::new(currency_origin),
            currency_destination: CompactString::new(currency_destination),
            threshold,
        }
    }

    /// Check if a rate crosses this favorite's threshold.
    /// Equality triggers; NaN never does.
    #[inline]
    pub fn is_triggered_by(&self, rate: f64) -> bool {
        rate >= self.threshold
    }
}

/// Errors raised while validating a registration request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("currency_origin must be {DEFAULT_ORIGIN}, got {0}")]
    UnsupportedOrigin(String),
}

/// Registration request for a new favorite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFavorite {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub currency_origin: CompactString,
    #[serde(default)]
    pub currency_destination: CompactString,
    #[serde(default)]
    pub threshold: f64,
}

impl NewFavorite {
    /// Validate the request, filling in the default origin.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if self.email.is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.currency_destination.is_empty() {
            return Err(ValidationError::MissingField("currency_destination"));
        }
        if self.currency_origin.is_empty() {
            self.currency_origin = CompactString::new(DEFAULT_ORIGIN);
        }
        if self.currency_origin != DEFAULT_ORIGIN {
            return Err(ValidationError::UnsupportedOrigin(
                self.currency_origin.to_string(),
            ));
        }
        Ok(self)
    }

    /// Attach the ID assigned by storage.
    pub fn into_favorite(self, id: i64) -> Favorite {
        Favorite {
            id,
            email: self.email,
            currency_origin: self.currency_origin,
            currency_destination: self.currency_destination,
            threshold: self.threshold,
        }
    }
}
