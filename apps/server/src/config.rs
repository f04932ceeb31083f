//! Application configuration.
//!
//! Read from the process environment (after `.env` is loaded). Secrets come
//! from the environment in every mode.

use fxwatch_alerts::{DispatcherConfig, NotifierConfig, PubSubPublisher};
use fxwatch_rates::ExchangeRatesClient;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("variable {0} not found")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("no notifier configured: set FUNCTION_URL or PUBSUB_TOPIC_ID")]
    NoNotifier,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Production,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    pub environment: Environment,
    /// exchangeratesapi.io access key.
    #[serde(skip_serializing)]
    pub api_key: String,
    pub rates_base_url: String,
    pub database_url: String,
    pub notifier: NotifierConfig,
    pub dispatcher: DispatcherConfig,
    /// Run the dispatcher on this interval in-process. `None` leaves
    /// triggering to `POST /check-thresholds`.
    pub check_interval_secs: Option<u64>,
    /// Timeout for outbound HTTP calls.
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let environment = if get("GCP_PROJECT_ID").is_some()
            || get("ENVIRONMENT").as_deref() == Some("production")
        {
            Environment::Production
        } else {
            Environment::Local
        };

        let notifier = match get("NOTIFIER").as_deref() {
            Some("webhook") => webhook_config(&get)?,
            Some("pubsub") => pubsub_config(&get)?,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "NOTIFIER",
                    value: other.to_string(),
                })
            }
            None if get("FUNCTION_URL").is_some() => webhook_config(&get)?,
            None if get("PUBSUB_TOPIC_ID").is_some() => pubsub_config(&get)?,
            None => return Err(ConfigError::NoNotifier),
        };

        Ok(Self {
            port: parse_or("PORT", get("PORT"), 8080)?,
            environment,
            api_key: get("EXCHANGE_RATES_API_KEY")
                .ok_or(ConfigError::Missing("EXCHANGE_RATES_API_KEY"))?,
            rates_base_url: get("EXCHANGE_RATES_BASE_URL")
                .unwrap_or_else(|| ExchangeRatesClient::DEFAULT_BASE_URL.to_string()),
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://favorites.db".to_string()),
            notifier,
            dispatcher: DispatcherConfig {
                max_checks_per_run: max_checks_per_run(get("MAX_CHECKS_PER_RUN"))?,
            },
            check_interval_secs: get("CHECK_INTERVAL_SECS")
                .map(|v| parse_or("CHECK_INTERVAL_SECS", Some(v), 0))
                .transpose()?,
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"), 10)?,
        })
    }
}

fn webhook_config<G>(get: &G) -> Result<NotifierConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    Ok(NotifierConfig::Webhook {
        url: get("FUNCTION_URL").ok_or(ConfigError::Missing("FUNCTION_URL"))?,
    })
}

fn pubsub_config<G>(get: &G) -> Result<NotifierConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    Ok(NotifierConfig::PubSub {
        project_id: get("GCP_PROJECT_ID").ok_or(ConfigError::Missing("GCP_PROJECT_ID"))?,
        topic_id: get("PUBSUB_TOPIC_ID").ok_or(ConfigError::Missing("PUBSUB_TOPIC_ID"))?,
        endpoint: get("PUBSUB_ENDPOINT")
            .unwrap_or_else(|| PubSubPublisher::DEFAULT_ENDPOINT.to_string()),
        access_token: get("PUBSUB_ACCESS_TOKEN"),
        ack_timeout_secs: parse_or("PUBSUB_ACK_TIMEOUT_SECS", get("PUBSUB_ACK_TIMEOUT_SECS"), 10)?,
    })
}

/// A cap of zero would skip every favorite while still reporting success.
fn max_checks_per_run(value: Option<String>) -> Result<usize, ConfigError> {
    let key = "MAX_CHECKS_PER_RUN";
    match parse_or(key, value, DispatcherConfig::default().max_checks_per_run)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
        }),
        cap => Ok(cap),
    }
}

fn parse_or<T: FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_local_webhook_defaults() {
        let config = load(&[
            ("EXCHANGE_RATES_API_KEY", "key"),
            ("FUNCTION_URL", "http://localhost:9000/notify"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, Environment::Local);
        assert_eq!(config.rates_base_url, ExchangeRatesClient::DEFAULT_BASE_URL);
        assert_eq!(config.database_url, "sqlite://favorites.db");
        assert_eq!(config.dispatcher.max_checks_per_run, 1);
        assert_eq!(config.check_interval_secs, None);
        assert_eq!(
            config.notifier,
            NotifierConfig::Webhook {
                url: "http://localhost:9000/notify".to_string()
            }
        );
    }

    #[test]
    fn test_pubsub_selected_in_production() {
        let config = load(&[
            ("EXCHANGE_RATES_API_KEY", "key"),
            ("GCP_PROJECT_ID", "my-project"),
            ("PUBSUB_TOPIC_ID", "rate-alerts"),
            ("PUBSUB_ACK_TIMEOUT_SECS", "3"),
            ("CHECK_INTERVAL_SECS", "3600"),
        ])
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.check_interval_secs, Some(3600));
        assert_eq!(
            config.notifier,
            NotifierConfig::PubSub {
                project_id: "my-project".to_string(),
                topic_id: "rate-alerts".to_string(),
                endpoint: PubSubPublisher::DEFAULT_ENDPOINT.to_string(),
                access_token: None,
                ack_timeout_secs: 3,
            }
        );
    }

    #[test]
    fn test_explicit_notifier_wins() {
        let config = load(&[
            ("EXCHANGE_RATES_API_KEY", "key"),
            ("NOTIFIER", "pubsub"),
            ("FUNCTION_URL", "http://localhost:9000/notify"),
            ("GCP_PROJECT_ID", "p"),
            ("PUBSUB_TOPIC_ID", "t"),
        ])
        .unwrap();
        assert!(matches!(config.notifier, NotifierConfig::PubSub { .. }));
    }

    #[test]
    fn test_missing_values() {
        let err = load(&[("FUNCTION_URL", "http://x")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("EXCHANGE_RATES_API_KEY")));

        let err = load(&[("EXCHANGE_RATES_API_KEY", "key")]).unwrap_err();
        assert!(matches!(err, ConfigError::NoNotifier));

        let err = load(&[("EXCHANGE_RATES_API_KEY", "key"), ("NOTIFIER", "pubsub")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GCP_PROJECT_ID")));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[
            ("EXCHANGE_RATES_API_KEY", "key"),
            ("FUNCTION_URL", "http://x"),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid value for PORT: eighty");

        let err = load(&[("EXCHANGE_RATES_API_KEY", "key"), ("NOTIFIER", "sms")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "NOTIFIER", .. }));
    }

    #[test]
    fn test_max_checks_per_run() {
        let base = [
            ("EXCHANGE_RATES_API_KEY", "key"),
            ("FUNCTION_URL", "http://x"),
        ];

        let config = load(&[base[0], base[1], ("MAX_CHECKS_PER_RUN", "3")]).unwrap();
        assert_eq!(config.dispatcher.max_checks_per_run, 3);

        let err = load(&[base[0], base[1], ("MAX_CHECKS_PER_RUN", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "MAX_CHECKS_PER_RUN", ref value } if value == "0"
        ));

        let err = load(&[base[0], base[1], ("MAX_CHECKS_PER_RUN", "-1")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MAX_CHECKS_PER_RUN", .. }));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = load(&[
            ("EXCHANGE_RATES_API_KEY", "super-secret"),
            ("FUNCTION_URL", "http://x"),
        ])
        .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));
    }
}
