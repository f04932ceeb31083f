//! Error types for rate lookups.

use thiserror::Error;

/// Errors that can occur while fetching an exchange rate.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("failed to call exchange rates API: {0}")]
    Transport(String),

    #[error("exchange rates API returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("failed to parse JSON response: {0}")]
    Parse(String),

    #[error("exchange rates API returned success=false{0}")]
    ProviderRejected(String),

    #[error("{0} rate not found in API response")]
    RateNotFound(String),
}

/// Result type for rate lookups.
pub type RateResult<T> = Result<T, RateError>;

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the access key.
        RateError::Transport(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for RateError {
    fn from(err: serde_json::Error) -> Self {
        RateError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RateError::Upstream {
            status: 401,
            body: "invalid key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "exchange rates API returned status 401: invalid key"
        );
        assert_eq!(
            RateError::RateNotFound("COP".to_string()).to_string(),
            "COP rate not found in API response"
        );
        assert_eq!(
            RateError::ProviderRejected(String::new()).to_string(),
            "exchange rates API returned success=false"
        );
    }
}
