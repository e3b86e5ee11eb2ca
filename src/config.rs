use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::enums::ScoringMode;
use crate::models::specialty::{SpecialtyTable, SpecialtyTableError};
use crate::pipeline::triage::{TriageSettings, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};

/// Application-level constants
pub const APP_NAME: &str = "Specialist Triage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_DB_PATH: &str = "triage.db";
/// Per-attempt timeout for the short symptom-triage prompts.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 5;
/// Per-attempt timeout for report analysis, whose prompt carries the whole report.
pub const DEFAULT_REPORT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DOCTOR_LIMIT: usize = 5;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,triage_lib=debug"
}

/// Runtime configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub llm_timeout_secs: u64,
    pub report_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub specialties_path: Option<PathBuf>,
    pub settings: TriageSettings,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            report_timeout_secs: DEFAULT_REPORT_TIMEOUT_SECS,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            specialties_path: None,
            settings: TriageSettings::default(),
        }
    }
}

impl TriageConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Invalid values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let settings = TriageSettings {
            scoring_mode: parse_or(
                "TRIAGE_SCORING_MODE",
                get("TRIAGE_SCORING_MODE"),
                defaults.settings.scoring_mode,
                |v| ScoringMode::from_str(v).ok(),
            ),
            llm_reclassify: parse_or(
                "TRIAGE_LLM_RECLASSIFY",
                get("TRIAGE_LLM_RECLASSIFY"),
                defaults.settings.llm_reclassify,
                parse_bool,
            ),
            llm_precautions: parse_or(
                "TRIAGE_LLM_PRECAUTIONS",
                get("TRIAGE_LLM_PRECAUTIONS"),
                defaults.settings.llm_precautions,
                parse_bool,
            ),
            doctor_limit: parse_or(
                "TRIAGE_DOCTOR_LIMIT",
                get("TRIAGE_DOCTOR_LIMIT"),
                DEFAULT_DOCTOR_LIMIT,
                |v| v.parse::<usize>().ok().filter(|n| *n > 0),
            ),
        };

        Self {
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("TRIAGE_GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: get("TRIAGE_GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            llm_timeout_secs: parse_or(
                "TRIAGE_LLM_TIMEOUT_SECS",
                get("TRIAGE_LLM_TIMEOUT_SECS"),
                defaults.llm_timeout_secs,
                |v| v.parse::<u64>().ok().filter(|n| *n > 0),
            ),
            report_timeout_secs: parse_or(
                "TRIAGE_REPORT_TIMEOUT_SECS",
                get("TRIAGE_REPORT_TIMEOUT_SECS"),
                defaults.report_timeout_secs,
                |v| v.parse::<u64>().ok().filter(|n| *n > 0),
            ),
            bind_addr: parse_or(
                "TRIAGE_BIND_ADDR",
                get("TRIAGE_BIND_ADDR"),
                defaults.bind_addr,
                |v| v.parse().ok(),
            ),
            db_path: get("TRIAGE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            specialties_path: get("TRIAGE_SPECIALTIES_PATH").map(PathBuf::from),
            settings,
        }
    }

    /// The built-in table, or the one at `TRIAGE_SPECIALTIES_PATH`.
    pub fn load_specialty_table(&self) -> Result<SpecialtyTable, SpecialtyTableError> {
        match &self.specialties_path {
            Some(path) => {
                let table = SpecialtyTable::from_json_file(path)?;
                tracing::info!(
                    path = %path.display(),
                    specialties = table.len(),
                    "Loaded specialty table"
                );
                Ok(table)
            }
            None => Ok(SpecialtyTable::default()),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T, parse: impl Fn(&str) -> Option<T>) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match parse(&raw) {
        Some(value) => value,
        None => {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
