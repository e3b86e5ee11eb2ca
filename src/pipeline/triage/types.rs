use serde::{Deserialize, Serialize};

use super::TriageError;
use crate::db::DatabaseError;
use crate::models::enums::{PromptRole, ScoringMode};
use crate::models::DoctorRecord;

/// Outcome of keyword classification for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub specialty: String,
    pub score: u32,
    /// Matched keywords, duplicate-free, in the order they were found.
    pub matched_keywords: Vec<String>,
}

/// One message of an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// Hosted LLM abstraction (allows mocking).
///
/// Implementations are blocking and must bound each call by a timeout.
pub trait LlmClient: Send + Sync {
    fn complete(&self, messages: &[PromptMessage]) -> Result<String, TriageError>;
}

/// Read-only lookup of currently available doctors.
pub trait DoctorDirectory: Send + Sync {
    fn available_doctors(
        &self,
        specialty: &str,
        limit: usize,
    ) -> Result<Vec<DoctorRecord>, DatabaseError>;
}

/// Deployment variant of symptom triage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageSettings {
    pub scoring_mode: ScoringMode,
    /// Ask the LLM to pick a specialty when keywords land on the fallback.
    pub llm_reclassify: bool,
    /// Ask the LLM for precautions and recommendations.
    pub llm_precautions: bool,
    pub doctor_limit: usize,
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            scoring_mode: ScoringMode::Weighted,
            llm_reclassify: true,
            llm_precautions: true,
            doctor_limit: 5,
        }
    }
}

/// Response body for symptom triage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResponse {
    pub recommended_specialty: String,
    pub specialty_description: String,
    pub confidence_score: u32,
    pub matched_keywords: Vec<String>,
    pub available_doctors: Vec<DoctorRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precautions_and_recommendations: Option<serde_json::Value>,
}

/// Normalized medical report analysis.
///
/// Always carries the seven required top-level keys with non-falsy values.
/// Any extra keys the LLM produced are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportAnalysis(serde_json::Map<String, serde_json::Value>);

impl ReportAnalysis {
    pub(crate) fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn into_map(self) -> serde_json::Map<String, serde_json::Value> {
        self.0
    }

    /// Primary recommended specialist name.
    pub fn primary_specialist(&self) -> Option<&str> {
        self.0
            .get("recommended_doctor")
            .and_then(|d| d.get("primary"))
            .and_then(|p| p.get("specialist"))
            .and_then(|s| s.as_str())
    }
}
