use super::types::ClassificationResult;
use crate::models::enums::ScoringMode;
use crate::models::specialty::{SpecialtyTable, FALLBACK_SPECIALTY};

/// Points per keyword found in the patient's own words.
const SYMPTOM_KEYWORD_POINTS: u32 = 2;
/// Points per keyword found in the auxiliary (LLM) text.
const AUXILIARY_KEYWORD_POINTS: u32 = 1;
/// Bonus when the auxiliary text names the specialty outright.
const NAME_MENTION_BONUS: u32 = 3;

/// Classify symptoms with the configured scoring mode.
///
/// `auxiliary` is only consulted in weighted mode.
pub fn classify_symptoms(
    table: &SpecialtyTable,
    symptoms: &str,
    mode: ScoringMode,
    auxiliary: Option<&str>,
) -> ClassificationResult {
    match mode {
        ScoringMode::FirstMatch => classify_first_match(table, symptoms),
        ScoringMode::Weighted => classify_weighted(table, symptoms, auxiliary.unwrap_or("")),
    }
}

/// First specialty (in table order) with any keyword inside the symptoms wins.
///
/// Matching is plain substring search on lowercased text, so "chest" also
/// fires inside "chestnut".
pub fn classify_first_match(table: &SpecialtyTable, symptoms: &str) -> ClassificationResult {
    let symptoms_lower = symptoms.to_lowercase();

    for entry in table.iter() {
        let matched: Vec<String> = entry
            .keywords
            .iter()
            .filter(|k| keyword_in(k, &symptoms_lower))
            .cloned()
            .collect();

        if !matched.is_empty() {
            return ClassificationResult {
                specialty: entry.name.clone(),
                score: matched.len() as u32,
                matched_keywords: dedup_in_order(matched),
            };
        }
    }

    fallback_result()
}

/// Score every specialty against the symptoms and an auxiliary text.
///
/// Only a strictly greater score replaces the running best, so on a tie the
/// specialty defined first keeps the win.
pub fn classify_weighted(
    table: &SpecialtyTable,
    symptoms: &str,
    auxiliary: &str,
) -> ClassificationResult {
    let symptoms_lower = symptoms.to_lowercase();
    let auxiliary_lower = auxiliary.to_lowercase();

    let mut best: Option<ClassificationResult> = None;
    let mut best_score = 0;

    for entry in table.iter() {
        let mut score = 0;
        let mut matched: Vec<String> = Vec::new();

        for keyword in &entry.keywords {
            if keyword_in(keyword, &symptoms_lower) {
                score += SYMPTOM_KEYWORD_POINTS;
                matched.push(keyword.clone());
            }
        }

        for keyword in &entry.keywords {
            if keyword_in(keyword, &auxiliary_lower) {
                score += AUXILIARY_KEYWORD_POINTS;
                if !matched.contains(keyword) {
                    matched.push(keyword.clone());
                }
            }
        }

        if auxiliary_lower.contains(&entry.name.to_lowercase()) {
            score += NAME_MENTION_BONUS;
        }

        if score > best_score {
            best_score = score;
            best = Some(ClassificationResult {
                specialty: entry.name.clone(),
                score,
                matched_keywords: dedup_in_order(matched),
            });
        }
    }

    best.unwrap_or_else(fallback_result)
}

/// Find a specialty named (case-insensitively) in free text, in table order.
pub fn find_named_specialty<'a>(table: &'a SpecialtyTable, text: &str) -> Option<&'a str> {
    let lower = text.to_lowercase();
    table
        .iter()
        .find(|e| lower.contains(&e.name.to_lowercase()))
        .map(|e| e.name.as_str())
}

/// The specialty an LLM reply settles on.
///
/// Only the `Specialist:` line is read when the reply has one, so names
/// mentioned in the reasoning do not count. Replies without that line are
/// scanned whole.
pub fn suggested_specialty<'a>(table: &'a SpecialtyTable, reply: &str) -> Option<&'a str> {
    let specialist_line = reply.lines().find_map(|line| {
        let line = line.trim();
        let (label, rest) = line.split_once(':')?;
        label
            .trim_matches(|c: char| c == '*' || c == '#' || c.is_whitespace())
            .eq_ignore_ascii_case("specialist")
            .then_some(rest)
    });

    match specialist_line {
        Some(line) => find_named_specialty(table, line),
        None => find_named_specialty(table, reply),
    }
}

fn keyword_in(keyword: &str, text_lower: &str) -> bool {
    !keyword.is_empty() && text_lower.contains(&keyword.to_lowercase())
}

fn dedup_in_order(keywords: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for k in keywords {
        if !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

fn fallback_result() -> ClassificationResult {
    ClassificationResult {
        specialty: FALLBACK_SPECIALTY.to_string(),
        score: 0,
        matched_keywords: vec![],
    }
}
