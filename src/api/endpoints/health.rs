//! Health check endpoint.

use axum::extract::State;
use axum::Json;

use crate::api::types::{AppState, HealthResponse};

/// `GET /health`: liveness plus the active specialty table.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let specialties = state
        .orchestrator
        .table()
        .names()
        .into_iter()
        .map(str::to_string)
        .collect();

    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        specialties,
        started_at: state.started_at.to_rfc3339(),
    })
}
