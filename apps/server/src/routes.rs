//! HTTP routes.

use crate::state::SharedState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use fxwatch_alerts::DbError;
use fxwatch_core::{Favorite, NewFavorite, RateQuote};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Status envelope returned by the threshold trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: String,
}

impl StatusResponse {
    fn success(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status: "success".to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status: "error".to_string(),
        }
    }
}

type ApiError = (StatusCode, String);

/// Create the HTTP router.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/check-thresholds", post(check_thresholds_handler))
        .route("/convert", get(convert_handler))
        .route("/favorites", post(favorites_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check handler.
async fn health_handler() -> &'static str {
    "OK"
}

/// Run one threshold check. Only a favorites load failure is reported.
///
/// The run is detached from the request, so a client disconnect does not
/// cut the batch short.
async fn check_thresholds_handler(
    State(state): State<SharedState>,
) -> (StatusCode, Json<StatusResponse>) {
    info!("Starting threshold check");

    let run_state = state.clone();
    let run = tokio::spawn(async move {
        run_state
            .dispatcher
            .check_thresholds_with_cancel(&run_state.api_key, run_state.shutdown.clone())
            .await
    });

    match run.await {
        Ok(Ok(_)) => (
            StatusCode::OK,
            Json(StatusResponse::success("thresholds checked successfully")),
        ),
        Ok(Err(e)) => {
            error!(error = %e, "Error checking thresholds");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error("error checking thresholds")),
            )
        }
        Err(e) => {
            error!(error = %e, "Threshold check task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error("error checking thresholds")),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConvertParams {
    from: Option<String>,
    to: Option<String>,
}

/// Current rate for a pair, EUR -> COP unless overridden.
async fn convert_handler(
    State(state): State<SharedState>,
    Query(params): Query<ConvertParams>,
) -> Result<Json<RateQuote>, ApiError> {
    let from = params.from.unwrap_or_else(|| "EUR".to_string());
    let to = params.to.unwrap_or_else(|| "COP".to_string());

    state
        .rates
        .latest_quote(&state.api_key, &from, &to)
        .await
        .map(Json)
        .map_err(|e| {
            error!(from = %from, to = %to, error = %e, "Conversion failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

/// Register a favorite.
async fn favorites_handler(
    State(state): State<SharedState>,
    payload: Result<Json<NewFavorite>, JsonRejection>,
) -> Result<Json<Favorite>, ApiError> {
    let Json(request) =
        payload.map_err(|_| (StatusCode::BAD_REQUEST, "invalid JSON body".to_string()))?;
    let request = request
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let id = state.db.save_favorite(&request).await.map_err(|e| match e {
        DbError::EmailAlreadyExists => (StatusCode::CONFLICT, e.to_string()),
        other => {
            error!(error = %other, "Failed to save favorite");
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    })?;

    info!(id, email = %request.email, "Favorite registered");
    Ok(Json(request.into_favorite(id)))
}
