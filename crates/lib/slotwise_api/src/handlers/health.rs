//! Liveness endpoint.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::models::HealthResponse;

/// `GET /api/health` — liveness plus feed-configuration state.
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".into(),
        version: slotwise_core::version().into(),
        feeds_configured: state.busy.is_configured(),
    }))
}
