//! Medical report analysis endpoint.

use std::io::Write;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::pipeline::triage::{ReportAnalysis, TriageError};

const FILE_FIELD: &str = "file";

/// `POST /analyze`: multipart upload of a PDF report in field `file`.
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ReportAnalysis>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return Err(ApiError::BadRequest("No file provided".into()));
    };
    if !is_pdf_name(&file_name) {
        return Err(ApiError::BadRequest("Invalid or no file selected".into()));
    }

    let request_id = Uuid::new_v4();
    let orchestrator = state.orchestrator.clone();
    let report = tokio::task::spawn_blocking(move || {
        let _span = tracing::info_span!("analyze", %request_id).entered();
        tracing::debug!(bytes = bytes.len(), "Report upload received");

        // Deleted when dropped, on every path out of this closure.
        let mut staged = tempfile::Builder::new()
            .prefix("report-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| TriageError::Extraction(e.into()))?;
        staged
            .write_all(&bytes)
            .map_err(|e| TriageError::Extraction(e.into()))?;

        orchestrator.analyze_report_file(staged.path())
    })
    .await??;

    Ok(Json(report))
}

/// Non-empty name ending in `.pdf`, any case.
fn is_pdf_name(file_name: &str) -> bool {
    !file_name.is_empty() && file_name.to_ascii_lowercase().ends_with(".pdf")
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest(err.body_text())
    }
}
