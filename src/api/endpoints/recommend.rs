//! Symptom triage endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{AppState, RecommendRequest};
use crate::pipeline::triage::TriageResponse;

/// `POST /recommend`: specialty, doctors, and precautions for free-text symptoms.
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<TriageResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.symptoms.trim().is_empty() {
        return Err(ApiError::BadRequest("Symptoms must not be empty".into()));
    }

    let request_id = Uuid::new_v4();
    let orchestrator = state.orchestrator.clone();
    let response = tokio::task::spawn_blocking(move || {
        let _span = tracing::info_span!("recommend", %request_id).entered();
        orchestrator.recommend(&request.symptoms)
    })
    .await??;

    Ok(Json(response))
}
