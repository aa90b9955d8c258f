use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::services::metrics::get_metrics;
use crate::AppState;

/// Liveness: the process is serving requests.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": state.config.service_name,
        "version": state.config.service_version,
    }))
}

/// Readiness: the backing store answers.
pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(json!({
        "status": "ready",
        "checks": { "store": "up" },
    })))
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
