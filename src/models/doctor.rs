use serde::{Deserialize, Serialize};

/// An available doctor as returned by the directory lookup. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub doctor_id: String,
    pub name: String,
    pub degree: String,
    pub experience_years: u32,
    pub city: String,
    pub state: String,
    pub working_place: String,
}

/// Values used when a directory row leaves a field blank.
pub const DEFAULT_DEGREE: &str = "MD";

/// Format a display name the way the patient-facing client expects.
pub fn display_name(first_name: &str, last_name: &str) -> String {
    format!("Dr. {} {}", first_name.trim(), last_name.trim())
        .trim_end()
        .to_string()
}
