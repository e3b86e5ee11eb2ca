pub mod classify;
pub mod gemini;
pub mod normalize;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod sanitize;
pub mod types;

pub use classify::*;
pub use gemini::*;
pub use normalize::*;
pub use orchestrator::*;
pub use parser::*;
pub use prompt::*;
pub use sanitize::*;
pub use types::*;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::pipeline::extraction::ExtractionError;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("LLM service is not reachable at {0}")]
    LlmConnection(String),

    #[error("LLM request timed out after {0}s")]
    LlmTimeout(u64),

    #[error("LLM returned error (status {status}): {body}")]
    LlmError { status: u16, body: String },

    #[error("LLM API key is not configured")]
    MissingApiKey,

    #[error("LLM returned no text")]
    EmptyCompletion,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Symptoms must not be empty")]
    EmptySymptoms,

    #[error("No extractable text in document")]
    NoExtractableText,

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl TriageError {
    /// Transient LLM failures worth the single retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TriageError::LlmConnection(_)
            | TriageError::LlmTimeout(_)
            | TriageError::HttpClient(_) => true,
            TriageError::LlmError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether this error comes from the LLM collaborator.
    pub fn is_llm_failure(&self) -> bool {
        matches!(
            self,
            TriageError::LlmConnection(_)
                | TriageError::LlmTimeout(_)
                | TriageError::LlmError { .. }
                | TriageError::MissingApiKey
                | TriageError::EmptyCompletion
                | TriageError::HttpClient(_)
                | TriageError::ResponseParsing(_)
        )
    }
}
