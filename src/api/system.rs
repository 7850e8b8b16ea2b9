use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::{AppState, HealthResponse};

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let uptime_seconds = state.start_time.elapsed().as_secs();

    match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                uptime_seconds,
            }),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    uptime_seconds,
                }),
            )
        }
    }
}
