use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{LlmClient, PromptMessage};
use super::TriageError;
use crate::models::enums::PromptRole;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

/// Gemini REST client (`generateContent`), blocking.
pub struct GeminiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, TriageError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TriageError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn send_once(&self, api_key: &str, body: &GenerateRequest) -> Result<String, TriageError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TriageError::LlmTimeout(self.timeout_secs)
                } else if e.is_connect() {
                    TriageError::LlmConnection(self.base_url.clone())
                } else {
                    TriageError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TriageError::LlmError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| TriageError::ResponseParsing(e.to_string()))?;

        parsed.first_text().ok_or(TriageError::EmptyCompletion)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// System messages become `systemInstruction`; the rest go to `contents`.
fn build_request(messages: &[PromptMessage]) -> GenerateRequest {
    let system: Vec<Part> = messages
        .iter()
        .filter(|m| m.role == PromptRole::System)
        .map(|m| Part {
            text: m.content.clone(),
        })
        .collect();

    let contents = messages
        .iter()
        .filter(|m| m.role == PromptRole::User)
        .map(|m| Content {
            role: Some("user".into()),
            parts: vec![Part {
                text: m.content.clone(),
            }],
        })
        .collect();

    GenerateRequest {
        system_instruction: (!system.is_empty()).then(|| Content {
            role: None,
            parts: system,
        }),
        contents,
    }
}

/// Run `attempt`, and run it once more if the first error is transient.
pub fn with_single_retry<F>(mut attempt: F) -> Result<String, TriageError>
where
    F: FnMut() -> Result<String, TriageError>,
{
    match attempt() {
        Err(e) if e.is_retryable() => {
            tracing::warn!(error = %e, "LLM call failed, retrying once");
            attempt()
        }
        other => other,
    }
}

impl LlmClient for GeminiClient {
    fn complete(&self, messages: &[PromptMessage]) -> Result<String, TriageError> {
        let api_key = self.api_key.as_deref().ok_or(TriageError::MissingApiKey)?;
        let body = build_request(messages);

        let start = std::time::Instant::now();
        let result = with_single_retry(|| self.send_once(api_key, &body));

        match &result {
            Ok(text) => tracing::debug!(
                model = %self.model,
                chars = text.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "LLM completion received"
            ),
            Err(e) => tracing::warn!(model = %self.model, error = %e, "LLM completion failed"),
        }

        result
    }
}

enum MockFallback {
    Reply(String),
    Unreachable,
}

/// Mock LLM client for testing: scripted replies, then a fixed fallback.
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, TriageError>>>,
    fallback: MockFallback,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Vec<PromptMessage>>>,
}

impl MockLlmClient {
    /// Always answers with `response`.
    pub fn new(response: &str) -> Self {
        Self::build(VecDeque::new(), MockFallback::Reply(response.to_string()))
    }

    /// Every call fails as if the service were down.
    pub fn unreachable() -> Self {
        Self::build(VecDeque::new(), MockFallback::Unreachable)
    }

    /// Answers from `script` in order, then behaves like [`MockLlmClient::unreachable`].
    pub fn scripted(script: Vec<Result<String, TriageError>>) -> Self {
        Self::build(script.into(), MockFallback::Unreachable)
    }

    fn build(script: VecDeque<Result<String, TriageError>>, fallback: MockFallback) -> Self {
        Self {
            script: Mutex::new(script),
            fallback,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages of every call so far, oldest first.
    pub fn prompts(&self) -> Vec<Vec<PromptMessage>> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl LlmClient for MockLlmClient {
    fn complete(&self, messages: &[PromptMessage]) -> Result<String, TriageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match (scripted, &self.fallback) {
            (Some(reply), _) => reply,
            (None, MockFallback::Reply(text)) => Ok(text.clone()),
            (None, MockFallback::Unreachable) => {
                Err(TriageError::LlmConnection("mock://unreachable".into()))
            }
        }
    }
}
