use serde_json::{json, Map, Value};

use super::types::ReportAnalysis;
use crate::models::specialty::{SpecialtyTable, FALLBACK_SPECIALTY};

/// Required top-level keys of a report analysis, in output order.
pub const REQUIRED_REPORT_KEYS: [&str; 7] = [
    "summary",
    "symptoms",
    "possible_diseases",
    "recommended_doctor",
    "precautions",
    "additional_tests",
    "lifestyle_recommendations",
];

/// Canonical default for one required key.
pub fn default_for(key: &str) -> Value {
    match key {
        "summary" => json!({
            "overview": "Unable to generate summary due to insufficient information",
            "severity_assessment": "unknown",
            "key_findings": ["No significant findings detected"],
            "urgent_attention": "unknown",
            "follow_up_timeline": "routine"
        }),
        "symptoms" => json!([{
            "symptom": "No symptoms detected",
            "severity": "unknown",
            "duration": "unknown",
            "related_conditions": []
        }]),
        "possible_diseases" => json!([{
            "disease": "Unable to determine",
            "confidence": "low",
            "reasoning": "Insufficient information",
            "common_complications": []
        }]),
        "recommended_doctor" => json!({
            "primary": default_primary_specialist(),
            "secondary": null,
            "reasoning": "Default recommendation due to insufficient information"
        }),
        "precautions" => json!([{
            "precaution": "Consult a healthcare provider",
            "importance": "critical",
            "duration": "until medical consultation",
            "details": "Seek professional medical advice"
        }]),
        "additional_tests" => json!([{
            "test": "General health assessment",
            "purpose": "Baseline health evaluation",
            "urgency": "routine"
        }]),
        "lifestyle_recommendations" => json!([{
            "category": "general",
            "recommendation": "Maintain healthy lifestyle",
            "importance": "high"
        }]),
        _ => Value::Null,
    }
}

fn default_primary_specialist() -> Value {
    json!({
        "specialist": FALLBACK_SPECIALTY,
        "specialty_area": "General health assessment",
        "urgency": "routine"
    })
}

/// Truthiness in the loose sense LLM output needs: null, false, zero,
/// and empty strings/arrays/objects all count as missing.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Fill every missing or falsy required key with its default, then attach
/// specialty descriptions to the recommended specialists.
///
/// Extra keys pass through untouched. Idempotent.
pub fn normalize_report(mut parsed: Map<String, Value>, table: &SpecialtyTable) -> ReportAnalysis {
    let mut filled = Vec::new();
    for key in REQUIRED_REPORT_KEYS {
        if parsed.get(key).map_or(true, is_falsy) {
            parsed.insert(key.to_string(), default_for(key));
            filled.push(key);
        }
    }

    if !filled.is_empty() {
        tracing::debug!(defaulted = ?filled, "Report analysis keys filled with defaults");
    }

    if let Some(Value::Object(doctor)) = parsed.get_mut("recommended_doctor") {
        repair_recommended_doctor(doctor);
        enrich_specialist(doctor, "primary", table);
        enrich_specialist(doctor, "secondary", table);
    } else if let Some(doctor) = parsed.get_mut("recommended_doctor") {
        // Truthy but not an object (e.g. a bare string): replace wholesale.
        *doctor = default_for("recommended_doctor");
        if let Value::Object(doctor) = doctor {
            enrich_specialist(doctor, "primary", table);
        }
    }

    ReportAnalysis::from_map(parsed)
}

/// Guarantee a usable `primary` object and a `secondary` key.
fn repair_recommended_doctor(doctor: &mut Map<String, Value>) {
    let primary_ok = matches!(doctor.get("primary"), Some(Value::Object(p)) if !p.is_empty());
    if !primary_ok {
        doctor.insert("primary".into(), default_primary_specialist());
    }
    if !doctor.contains_key("secondary") {
        doctor.insert("secondary".into(), Value::Null);
    }
}

/// Attach `specialty_description` when `slot.specialist` names a known specialty.
fn enrich_specialist(doctor: &mut Map<String, Value>, slot: &str, table: &SpecialtyTable) {
    let Some(Value::Object(specialist)) = doctor.get_mut(slot) else {
        return;
    };
    if specialist.is_empty() {
        return;
    }

    let entry = specialist
        .get("specialist")
        .and_then(Value::as_str)
        .and_then(|name| table.get(name));

    if let Some(entry) = entry {
        specialist.insert("specialty_description".into(), entry.profile());
    }
}
