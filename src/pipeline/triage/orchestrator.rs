use std::path::Path;
use std::sync::Arc;

use super::classify::{classify_first_match, classify_weighted, suggested_specialty};
use super::normalize::normalize_report;
use super::parser::{parse_json, parse_json_value};
use super::prompt::{build_precautions_prompt, build_report_prompt, build_specialty_prompt};
use super::types::{
    ClassificationResult, DoctorDirectory, LlmClient, ReportAnalysis, TriageResponse,
    TriageSettings,
};
use super::TriageError;
use crate::models::enums::ScoringMode;
use crate::models::specialty::{SpecialtyTable, FALLBACK_SPECIALTY};
use crate::models::DoctorRecord;
use crate::pipeline::extraction::{join_pages, ExtractionError, PdfExtractor};

/// Combines keyword scoring, LLM hints, and the doctor directory.
///
/// All collaborators are blocking; async callers run these methods on
/// the blocking thread pool.
pub struct TriageOrchestrator {
    table: Arc<SpecialtyTable>,
    llm: Arc<dyn LlmClient>,
    /// Report analysis client; shares `llm` unless given its own timeout.
    report_llm: Arc<dyn LlmClient>,
    directory: Arc<dyn DoctorDirectory>,
    pdf: Arc<dyn PdfExtractor>,
    settings: TriageSettings,
}

impl TriageOrchestrator {
    pub fn new(
        table: Arc<SpecialtyTable>,
        llm: Arc<dyn LlmClient>,
        directory: Arc<dyn DoctorDirectory>,
        pdf: Arc<dyn PdfExtractor>,
        settings: TriageSettings,
    ) -> Self {
        Self {
            table,
            report_llm: llm.clone(),
            llm,
            directory,
            pdf,
            settings,
        }
    }

    /// Use a separate LLM client for report analysis.
    pub fn with_report_llm(mut self, report_llm: Arc<dyn LlmClient>) -> Self {
        self.report_llm = report_llm;
        self
    }

    pub fn table(&self) -> &SpecialtyTable {
        &self.table
    }

    pub fn settings(&self) -> &TriageSettings {
        &self.settings
    }

    /// Recommend a specialty, available doctors, and optional precautions.
    pub fn recommend(&self, symptoms: &str) -> Result<TriageResponse, TriageError> {
        if symptoms.trim().is_empty() {
            return Err(TriageError::EmptySymptoms);
        }

        tracing::info!(
            chars = symptoms.len(),
            mode = self.settings.scoring_mode.as_str(),
            "Symptom triage started"
        );

        let classification = self.classify(symptoms);
        let specialty = classification.specialty.clone();

        let doctors = self.lookup_doctors(&specialty);
        let notice = doctors.is_empty().then(|| {
            format!(
                "No doctors currently available for {specialty}. \
                 Please try again later or contact our help desk."
            )
        });

        let precautions = if self.settings.llm_precautions {
            self.precautions(symptoms, &specialty)
        } else {
            None
        };

        let specialty_description = self
            .table
            .get(&specialty)
            .map(|e| e.description.clone())
            .unwrap_or_default();

        tracing::info!(
            specialty = %specialty,
            score = classification.score,
            doctors = doctors.len(),
            "Symptom triage complete"
        );

        Ok(TriageResponse {
            recommended_specialty: specialty,
            specialty_description,
            confidence_score: classification.score,
            matched_keywords: classification.matched_keywords,
            available_doctors: doctors,
            notice,
            precautions_and_recommendations: precautions,
        })
    }

    /// Keyword classification, plus the LLM hint when the mode or fallback calls for it.
    fn classify(&self, symptoms: &str) -> ClassificationResult {
        match self.settings.scoring_mode {
            ScoringMode::FirstMatch => {
                let result = classify_first_match(&self.table, symptoms);
                if self.needs_reclassification(&result) {
                    let hint = self.specialty_hint(symptoms);
                    return self.reclassify(result, hint.as_deref());
                }
                result
            }
            ScoringMode::Weighted => {
                let hint = self.specialty_hint(symptoms);
                let result = classify_weighted(&self.table, symptoms, hint.as_deref().unwrap_or(""));
                if self.needs_reclassification(&result) {
                    return self.reclassify(result, hint.as_deref());
                }
                result
            }
        }
    }

    /// Only the unscored fallback is open to an LLM override.
    fn needs_reclassification(&self, result: &ClassificationResult) -> bool {
        self.settings.llm_reclassify && result.score == 0 && result.specialty == FALLBACK_SPECIALTY
    }

    /// LLM specialty suggestion; `None` when the call fails.
    fn specialty_hint(&self, symptoms: &str) -> Option<String> {
        let messages = build_specialty_prompt(symptoms, &self.table);
        match self.llm.complete(&messages) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "Specialty hint unavailable, using keywords only");
                None
            }
        }
    }

    fn reclassify(&self, result: ClassificationResult, hint: Option<&str>) -> ClassificationResult {
        let Some(name) = hint.and_then(|h| suggested_specialty(&self.table, h)) else {
            return result;
        };
        if name == result.specialty {
            return result;
        }

        tracing::debug!(specialty = %name, "Fallback specialty replaced by LLM suggestion");
        ClassificationResult {
            specialty: name.to_string(),
            score: 0,
            matched_keywords: Vec::new(),
        }
    }

    fn lookup_doctors(&self, specialty: &str) -> Vec<DoctorRecord> {
        match self
            .directory
            .available_doctors(specialty, self.settings.doctor_limit)
        {
            Ok(mut doctors) => {
                doctors.truncate(self.settings.doctor_limit);
                doctors
            }
            Err(e) => {
                tracing::warn!(specialty = %specialty, error = %e, "Doctor lookup failed");
                Vec::new()
            }
        }
    }

    fn precautions(&self, symptoms: &str, specialty: &str) -> Option<serde_json::Value> {
        let messages = build_precautions_prompt(symptoms, specialty);
        match self.llm.complete(&messages) {
            Ok(text) => Some(parse_json_value(&text)),
            Err(e) => {
                tracing::warn!(error = %e, "Precautions unavailable");
                None
            }
        }
    }

    /// Analyze a medical report PDF held in memory.
    pub fn analyze_report(&self, pdf_bytes: &[u8]) -> Result<ReportAnalysis, TriageError> {
        let pages = match self.pdf.extract_pages(pdf_bytes) {
            Ok(pages) => pages,
            Err(ExtractionError::PdfParsing(reason)) => {
                tracing::warn!(reason = %reason, "PDF could not be parsed");
                return Err(TriageError::NoExtractableText);
            }
            Err(e) => return Err(e.into()),
        };

        let text = join_pages(&pages);
        if text.is_empty() {
            tracing::warn!(pages = pages.len(), "PDF holds no extractable text");
            return Err(TriageError::NoExtractableText);
        }

        tracing::info!(pages = pages.len(), chars = text.len(), "Report analysis started");

        let raw = self.report_llm.complete(&build_report_prompt(&text))?;
        let parsed = parse_json(&raw).unwrap_or_else(|failure| failure.into_map());
        let report = normalize_report(parsed, &self.table);

        tracing::info!(
            primary = report.primary_specialist().unwrap_or(FALLBACK_SPECIALTY),
            "Report analysis complete"
        );
        Ok(report)
    }

    /// Analyze a report PDF stored on disk.
    pub fn analyze_report_file(&self, path: &Path) -> Result<ReportAnalysis, TriageError> {
        let bytes = std::fs::read(path).map_err(ExtractionError::from)?;
        self.analyze_report(&bytes)
    }
}
