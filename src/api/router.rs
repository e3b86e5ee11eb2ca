//! HTTP router for the triage service.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::{AppState, MAX_BODY_BYTES};

/// Build the router: `/recommend`, `/analyze`, `/health`.
///
/// CORS is open to any origin; request bodies are capped at 20 MB.
pub fn triage_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/recommend", post(endpoints::recommend::recommend))
        .route("/analyze", post(endpoints::analyze::analyze))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::db::repository::{seed_doctor, NewDoctor, SqliteDoctorDirectory};
    use crate::models::specialty::SpecialtyTable;
    use crate::models::ScoringMode;
    use crate::pipeline::extraction::MockPdfExtractor;
    use crate::pipeline::triage::{MockLlmClient, TriageOrchestrator, TriageSettings};

    const BOUNDARY: &str = "triage-test-boundary";

    fn keyword_only() -> TriageSettings {
        TriageSettings {
            scoring_mode: ScoringMode::FirstMatch,
            llm_reclassify: false,
            llm_precautions: false,
            doctor_limit: 5,
        }
    }

    fn app_with(llm: MockLlmClient, pdf: MockPdfExtractor, settings: TriageSettings) -> Router {
        app_with_shared(Arc::new(llm), Arc::new(pdf), settings)
    }

    /// Like `app_with`, keeping handles on the mocks for call assertions.
    fn app_with_shared(
        llm: Arc<MockLlmClient>,
        pdf: Arc<MockPdfExtractor>,
        settings: TriageSettings,
    ) -> Router {
        let directory = SqliteDoctorDirectory::in_memory().unwrap();
        directory
            .with_conn(|conn| {
                seed_doctor(
                    conn,
                    &NewDoctor {
                        experience: Some(10),
                        city: Some("Boston"),
                        state: Some("MA"),
                        ..NewDoctor::new("Lena", "Park", "Cardiologist")
                    },
                )
            })
            .unwrap();

        let orchestrator = TriageOrchestrator::new(
            Arc::new(SpecialtyTable::default()),
            llm,
            Arc::new(directory),
            pdf,
            settings,
        );
        triage_router(AppState::new(Arc::new(orchestrator)))
    }

    fn app() -> Router {
        app_with(
            MockLlmClient::unreachable(),
            MockPdfExtractor::new(&["Patient reports chest pain."]),
            keyword_only(),
        )
    }

    fn recommend_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/recommend")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_lists_specialties() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["specialties"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn recommend_returns_specialty_and_doctors() {
        let response = app()
            .oneshot(recommend_request(r#"{"symptoms": "I have chest pain"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["recommended_specialty"], "Cardiologist");
        assert_eq!(json["available_doctors"][0]["name"], "Dr. Lena Park");
        assert_eq!(json["available_doctors"][0]["experience_years"], 10);
        assert!(json.get("notice").is_none());
    }

    #[tokio::test]
    async fn recommend_without_doctors_includes_notice() {
        let response = app()
            .oneshot(recommend_request(r#"{"symptoms": "itchy rash"}"#))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["recommended_specialty"], "Dermatologist");
        assert_eq!(json["available_doctors"], serde_json::json!([]));
        assert!(json["notice"]
            .as_str()
            .unwrap()
            .starts_with("No doctors currently available for Dermatologist."));
    }

    #[tokio::test]
    async fn recommend_rejects_empty_symptoms() {
        for body in [r#"{"symptoms": "   "}"#, r#"{}"#] {
            let response = app().oneshot(recommend_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = json_body(response).await;
            assert_eq!(json["error"]["code"], "BAD_REQUEST");
        }
    }

    #[tokio::test]
    async fn recommend_rejects_malformed_json() {
        let response = app()
            .oneshot(recommend_request("{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recommend_includes_precautions_when_enabled() {
        let llm = MockLlmClient::new(r#"{"precautions": ["avoid exertion"], "recommendations": [], "when_to_seek_care": "now"}"#);
        let settings = TriageSettings {
            llm_precautions: true,
            ..keyword_only()
        };
        let app = app_with(llm, MockPdfExtractor::new(&[]), settings);

        let response = app
            .oneshot(recommend_request(r#"{"symptoms": "heart racing"}"#))
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(
            json["precautions_and_recommendations"]["precautions"][0],
            "avoid exertion"
        );
    }

    #[tokio::test]
    async fn analyze_returns_normalized_report() {
        let llm = MockLlmClient::new(
            r#"Here you go: {"recommended_doctor": {"primary": {"specialist": "Cardiologist"}, "secondary": null}}"#,
        );
        let app = app_with(
            llm,
            MockPdfExtractor::new(&["Chest pain on exertion"]),
            keyword_only(),
        );

        let response = app
            .oneshot(multipart_request("file", "Report.PDF", b"%PDF-1.4 fake"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        let primary = &json["recommended_doctor"]["primary"];
        assert_eq!(primary["specialist"], "Cardiologist");
        assert_eq!(
            primary["specialty_description"]["description"],
            "Heart and cardiovascular conditions"
        );
        assert!(json["summary"]["overview"].is_string());
    }

    #[tokio::test]
    async fn analyze_without_file_field_is_400() {
        let response = app()
            .oneshot(multipart_request("document", "report.pdf", b"%PDF"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["message"], "No file provided");
    }

    #[tokio::test]
    async fn analyze_rejects_non_pdf_name() {
        let llm = Arc::new(MockLlmClient::new("{}"));
        let pdf = Arc::new(MockPdfExtractor::new(&["text"]));
        let app = app_with_shared(llm.clone(), pdf.clone(), keyword_only());

        let response = app
            .oneshot(multipart_request("file", "notes.txt", b"hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["message"], "Invalid or no file selected");
        assert_eq!(pdf.call_count(), 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn analyze_accepted_upload_is_extracted_once() {
        let llm = Arc::new(MockLlmClient::new("{}"));
        let pdf = Arc::new(MockPdfExtractor::new(&["text"]));
        let app = app_with_shared(llm.clone(), pdf.clone(), keyword_only());

        let response = app
            .oneshot(multipart_request("file", "report.pdf", b"%PDF"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(pdf.call_count(), 1);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn analyze_blank_pdf_is_400() {
        let app = app_with(
            MockLlmClient::new("{}"),
            MockPdfExtractor::new(&["", " "]),
            keyword_only(),
        );
        let response = app
            .oneshot(multipart_request("file", "scan.pdf", b"%PDF"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["message"], "Could not extract text from the PDF");
    }

    #[tokio::test]
    async fn analyze_llm_outage_is_503() {
        let app = app_with(
            MockLlmClient::unreachable(),
            MockPdfExtractor::new(&["some report text"]),
            keyword_only(),
        );
        let response = app
            .oneshot(multipart_request("file", "report.pdf", b"%PDF"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn analyze_unparsable_reply_still_returns_defaults() {
        let app = app_with(
            MockLlmClient::new("Sorry, I can't help with that."),
            MockPdfExtractor::new(&["some report text"]),
            keyword_only(),
        );
        let response = app
            .oneshot(multipart_request("file", "report.pdf", b"%PDF"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Failed to parse AI response");
        assert_eq!(json["raw_response"], "Sorry, I can't help with that.");
        assert_eq!(
            json["recommended_doctor"]["primary"]["specialist"],
            "General Medicine"
        );
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
