use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Specialty returned whenever no keyword (or LLM hint) points anywhere else.
pub const FALLBACK_SPECIALTY: &str = "General Medicine";

/// A medical field of practice and the trigger words that route symptoms to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialtyEntry {
    pub name: String,
    pub keywords: Vec<String>,
    pub description: String,
}

impl SpecialtyEntry {
    pub fn new(name: &str, keywords: &[&str], description: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            description: description.to_string(),
        }
    }

    /// The `{keywords, description}` record attached to report specialists.
    pub fn profile(&self) -> serde_json::Value {
        serde_json::json!({
            "keywords": self.keywords,
            "description": self.description,
        })
    }
}

#[derive(Error, Debug)]
pub enum SpecialtyTableError {
    #[error("Specialty table is empty")]
    Empty,

    #[error("Duplicate specialty name: {0}")]
    DuplicateName(String),

    #[error("Specialty table must define \"General Medicine\"")]
    MissingFallback,

    #[error("Specialty with empty name at position {0}")]
    EmptyName(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid specialty file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered, immutable specialty table.
///
/// Definition order matters: both classifier modes break ties in favour of
/// the entry defined first. Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialtyTable {
    entries: Vec<SpecialtyEntry>,
}

impl SpecialtyTable {
    /// Build a table, rejecting empty/duplicate names and a missing fallback.
    pub fn new(entries: Vec<SpecialtyEntry>) -> Result<Self, SpecialtyTableError> {
        if entries.is_empty() {
            return Err(SpecialtyTableError::Empty);
        }

        let mut seen = HashSet::new();
        for (i, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(SpecialtyTableError::EmptyName(i));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(SpecialtyTableError::DuplicateName(entry.name.clone()));
            }
        }

        if !seen.contains(FALLBACK_SPECIALTY) {
            return Err(SpecialtyTableError::MissingFallback);
        }

        Ok(Self { entries })
    }

    /// Load a table from a JSON file holding an ordered array of entries.
    pub fn from_json_file(path: &Path) -> Result<Self, SpecialtyTableError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SpecialtyTableError> {
        let entries: Vec<SpecialtyEntry> = serde_json::from_str(raw)?;
        Self::new(entries)
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&SpecialtyEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpecialtyEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fallback(&self) -> &SpecialtyEntry {
        // Presence is checked in `new`.
        self.get(FALLBACK_SPECIALTY)
            .unwrap_or(&self.entries[self.entries.len() - 1])
    }
}

impl Default for SpecialtyTable {
    /// Built-in table. Names use the corrected spellings; keyword lists
    /// follow the richer symptom-chat variant plus "chest" from the report variant.
    fn default() -> Self {
        Self {
            entries: vec![
                SpecialtyEntry::new(
                    "Orthopaedic",
                    &["bone", "joint", "muscle", "fracture", "sprain", "arthritis", "back pain"],
                    "Musculoskeletal conditions and injuries",
                ),
                SpecialtyEntry::new(
                    "Dermatologist",
                    &["skin", "acne", "rash", "eczema", "dermatitis", "moles", "skin infection"],
                    "Skin, hair, and nail conditions",
                ),
                SpecialtyEntry::new(
                    "Neurologist",
                    &["headache", "migraine", "seizure", "nerve", "brain", "dizziness", "numbness"],
                    "Brain, spine, and nervous system disorders",
                ),
                SpecialtyEntry::new(
                    "Cardiologist",
                    &["heart", "chest", "palpitations", "blood pressure", "cardiovascular"],
                    "Heart and cardiovascular conditions",
                ),
                SpecialtyEntry::new(
                    "Pediatrician",
                    &["child", "children", "infant", "baby", "pediatric", "childhood"],
                    "Children's health and development",
                ),
                SpecialtyEntry::new(
                    "Psychiatrist",
                    &["anxiety", "depression", "mental", "mood", "stress", "sleep", "psychiatric"],
                    "Mental health and behavioral conditions",
                ),
                SpecialtyEntry::new(
                    FALLBACK_SPECIALTY,
                    &["fever", "cold", "flu", "cough", "fatigue"],
                    "General health conditions and primary care",
                ),
            ],
        }
    }
}
