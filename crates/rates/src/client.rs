//! exchangeratesapi.io client.
//!
//! One `GET /latest?base=<origin>` per lookup, no caching. The free tier
//! is rate limited, which is why the dispatcher caps lookups per run.

use crate::error::{RateError, RateResult};
use crate::response::LatestRatesResponse;
use crate::source::RateSource;
use async_trait::async_trait;
use fxwatch_core::RateQuote;
use reqwest::StatusCode;
use tracing::debug;

/// HTTP rate source backed by exchangeratesapi.io.
#[derive(Clone)]
pub struct ExchangeRatesClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExchangeRatesClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.exchangeratesapi.io/v1";

    /// Create a client with a prepared HTTP client and base URL.
    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RateSource for ExchangeRatesClient {
    async fn latest_quote(
        &self,
        api_key: &str,
        origin: &str,
        target: &str,
    ) -> RateResult<RateQuote> {
        let url = format!("{}/latest", self.base_url);
        debug!(base = origin, target = target, "Requesting latest rates");

        let response = self
            .http
            .get(&url)
            .query(&[("access_key", api_key), ("base", origin)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RateError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let parsed: LatestRatesResponse = serde_json::from_slice(&body)?;
        let quote = parsed.into_quote(origin, target)?;

        debug!(
            base = %quote.base,
            target = %quote.target,
            rate = quote.rate,
            date = %quote.date,
            "Fetched rate"
        );
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> ExchangeRatesClient {
        ExchangeRatesClient::with_http_client(reqwest::Client::new(), base_url)
    }

    #[tokio::test]
    async fn test_fetches_rate_for_base() {
        let router = Router::new().route(
            "/latest",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("access_key").map(String::as_str), Some("secret"));
                let base = params.get("base").cloned().unwrap_or_default();
                axum::Json(serde_json::json!({
                    "success": true,
                    "timestamp": 1705312800,
                    "base": base,
                    "date": "2024-01-15",
                    "rates": {"COP": 4600.0}
                }))
            }),
        );
        let base_url = spawn_provider(router).await;

        let quote = client(&base_url)
            .latest_quote("secret", "EUR", "COP")
            .await
            .unwrap();
        assert_eq!(quote, RateQuote::new("EUR", "COP", 4600.0, "2024-01-15", 1705312800));

        let rate = client(&format!("{}/", base_url))
            .get_rate("secret", "EUR", "COP")
            .await
            .unwrap();
        assert_eq!(rate, 4600.0);
    }

    #[tokio::test]
    async fn test_non_success_status_carries_body() {
        let router = Router::new().route(
            "/latest",
            get(|| async { (StatusCode::UNAUTHORIZED, "invalid access key") }),
        );
        let base_url = spawn_provider(router).await;

        let err = client(&base_url)
            .get_rate("bad", "EUR", "COP")
            .await
            .unwrap_err();
        match err {
            RateError::Upstream { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid access key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_other_success_statuses_are_upstream_errors() {
        let router = Router::new()
            .route("/empty/latest", get(|| async { StatusCode::NO_CONTENT }))
            .route(
                "/partial/latest",
                get(|| async { (StatusCode::NON_AUTHORITATIVE_INFORMATION, "cached") }),
            );
        let base_url = spawn_provider(router).await;

        let err = client(&format!("{}/empty", base_url))
            .get_rate("k", "EUR", "COP")
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::Upstream { status: 204, .. }));

        let err = client(&format!("{}/partial", base_url))
            .get_rate("k", "EUR", "COP")
            .await
            .unwrap_err();
        match err {
            RateError::Upstream { status, body } => {
                assert_eq!(status, 203);
                assert_eq!(body, "cached");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let router = Router::new().route("/latest", get(|| async { "not json" }));
        let base_url = spawn_provider(router).await;

        let err = client(&base_url).get_rate("k", "EUR", "COP").await.unwrap_err();
        assert!(matches!(err, RateError::Parse(_)));
    }

    #[tokio::test]
    async fn test_provider_rejection_and_missing_rate() {
        let router = Router::new()
            .route(
                "/rejected/latest",
                get(|| async { axum::Json(serde_json::json!({"success": false})) }),
            )
            .route(
                "/partial/latest",
                get(|| async {
                    axum::Json(serde_json::json!({"success": true, "rates": {"USD": 1.09}}))
                }),
            );
        let base_url = spawn_provider(router).await;

        let err = client(&format!("{}/rejected", base_url))
            .get_rate("k", "EUR", "COP")
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::ProviderRejected(_)));

        let err = client(&format!("{}/partial", base_url))
            .get_rate("k", "EUR", "COP")
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::RateNotFound(ref c) if c == "COP"));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr))
            .get_rate("secret-key", "EUR", "COP")
            .await
            .unwrap_err();
        assert!(matches!(err, RateError::Transport(_)));
        assert!(!err.to_string().contains("secret-key"));
    }
}
