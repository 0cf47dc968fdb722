use crate::domain::fraud::{PredictionResponse, TransactionRequest};
use crate::infrastructure::observability::exposition::{export_text, SCRAPE_CONTENT_TYPE};
use crate::interfaces::http::AppState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, warn};

pub const BANNER: &str = "MLSecOps fraud detection model for Pix payments is running.";

pub async fn root() -> &'static str {
    BANNER
}

/// Text exposition of the whole registry. The scrape counter is the only
/// metric this handler touches, and it counts the current scrape.
pub async fn metrics(State(state): State<AppState>) -> Response {
    if let Err(e) = state.metrics.record_scrape() {
        warn!("Failed to count scrape: {}", e);
    }
    let body = export_text(&state.metrics.registry().snapshot());
    ([(CONTENT_TYPE, SCRAPE_CONTENT_TYPE)], body).into_response()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: f64,
    pub components: BTreeMap<String, bool>,
    pub timestamp: DateTime<Utc>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let components = state.health.snapshot().await;
    let status = if components.values().all(|healthy| *healthy) {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
        components,
        timestamp: Utc::now(),
    })
}

pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<TransactionRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let response = state.predictions.predict(request).await?;
    Ok(Json(response))
}

/// Internal failure surfaced as a JSON 500; details stay in the logs.
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "prediction failed" })),
        )
            .into_response()
    }
}
