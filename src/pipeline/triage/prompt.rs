use super::sanitize::sanitize_for_llm;
use super::types::PromptMessage;
use crate::models::specialty::SpecialtyTable;

pub const TRIAGE_SYSTEM_PROMPT: &str =
    "You are a healthcare assistant. Provide concise, focused responses.";

/// Ask the LLM to pick one specialty from the table for the given symptoms.
pub fn build_specialty_prompt(symptoms: &str, table: &SpecialtyTable) -> Vec<PromptMessage> {
    let symptoms = sanitize_for_llm(symptoms);
    let list: String = table
        .iter()
        .map(|entry| format!("- {}\n", entry.name))
        .collect();

    let user = format!(
        "Based on these symptoms: {symptoms}\n\
         identify the most appropriate medical specialist from this list only:\n\
         {list}\n\
         Respond in this format:\n\
         Specialist: [specialty name from the list above]\n\
         Reason: [brief explanation]\n\
         Please keep the response concise and direct."
    );

    vec![PromptMessage::system(TRIAGE_SYSTEM_PROMPT), PromptMessage::user(user)]
}

/// Ask for general precautions as a JSON object.
pub fn build_precautions_prompt(symptoms: &str, specialty: &str) -> Vec<PromptMessage> {
    let symptoms = sanitize_for_llm(symptoms);

    let user = format!(
        r#"A patient reports these symptoms: {symptoms}
They have been referred to a {specialty}.

Until they see the specialist, suggest general precautions and self-care
recommendations. Do not diagnose and do not prescribe medication.

Respond with this JSON structure:
{{
    "precautions": ["specific precaution"],
    "recommendations": ["specific self-care advice"],
    "when_to_seek_care": "signs that need urgent attention"
}}

Ensure the response is ONLY the JSON object with no additional text."#
    );

    vec![PromptMessage::system(TRIAGE_SYSTEM_PROMPT), PromptMessage::user(user)]
}

/// Ask for a structured analysis of a medical report's text.
pub fn build_report_prompt(report_text: &str) -> Vec<PromptMessage> {
    let text = sanitize_for_llm(report_text);

    let user = format!(
        r#"Analyze this medical report as a specialized medical AI. Provide a detailed analysis in JSON format:

Guidelines:
1. Extract ALL symptoms mentioned, even mild ones
2. List ALL possible diseases that match the symptoms
3. Consider test results and vital signs if present
4. Recommend specialists based on symptoms and possible conditions
5. Provide a comprehensive summary of the findings
6. Include severity assessment of the overall condition

Required JSON structure:
{{
    "summary": {{
        "overview": "Brief overview of the case and whether it needs specialist review",
        "severity_assessment": "mild/moderate/severe",
        "key_findings": ["list of important findings"],
        "urgent_attention": "yes/no",
        "follow_up_timeline": "immediate/within week/routine"
    }},
    "symptoms": [
        {{
            "symptom": "detailed symptom",
            "severity": "mild/moderate/severe",
            "duration": "duration if mentioned",
            "related_conditions": ["possible related conditions"]
        }}
    ],
    "possible_diseases": [
        {{
            "disease": "disease name",
            "confidence": "high/medium/low",
            "reasoning": "brief explanation",
            "common_complications": ["possible complications"]
        }}
    ],
    "recommended_doctor": {{
        "primary": {{
            "specialist": "main specialist needed",
            "specialty_area": "specific area of expertise",
            "urgency": "immediate/soon/routine"
        }},
        "secondary": {{
            "specialist": "additional specialist if needed",
            "specialty_area": "specific area of expertise",
            "urgency": "immediate/soon/routine"
        }},
        "reasoning": "explanation for specialist choices"
    }},
    "precautions": [
        {{
            "precaution": "specific precaution",
            "importance": "critical/important/recommended",
            "duration": "how long to follow",
            "details": "additional details"
        }}
    ],
    "additional_tests": [
        {{
            "test": "test name",
            "purpose": "why it's needed",
            "urgency": "immediate/soon/routine"
        }}
    ],
    "lifestyle_recommendations": [
        {{
            "category": "diet/exercise/sleep/etc",
            "recommendation": "specific advice",
            "importance": "high/medium/low"
        }}
    ]
}}

Medical Report:
{text}

Ensure the response is ONLY the JSON object with no additional text."#
    );

    vec![PromptMessage::user(user)]
}
