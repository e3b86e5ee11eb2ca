use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message carried by every unrecoverable LLM response.
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse AI response";

/// An LLM reply that held no usable JSON object.
///
/// This is a result value, not a fault: callers forward it to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub error: String,
    pub raw_response: String,
}

impl ParseFailure {
    pub fn new(raw_response: &str) -> Self {
        Self {
            error: PARSE_FAILURE_MESSAGE.to_string(),
            raw_response: raw_response.to_string(),
        }
    }

    /// The `{error, raw_response}` object sent to clients.
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("error".into(), Value::String(self.error));
        map.insert("raw_response".into(), Value::String(self.raw_response));
        map
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.into_map())
    }
}

/// Recover a JSON object from an LLM reply.
///
/// Tries the whole text first, then the greedy span from the first `{` to
/// the last `}`. Prose around the object and Markdown fences are tolerated.
pub fn parse_json(raw: &str) -> Result<Map<String, Value>, ParseFailure> {
    if let Some(map) = parse_object(raw) {
        return Ok(map);
    }

    if let Some(span) = greedy_brace_span(raw) {
        if let Some(map) = parse_object(span) {
            tracing::debug!(
                skipped = raw.len() - span.len(),
                "Recovered JSON object from surrounding text"
            );
            return Ok(map);
        }
    }

    tracing::warn!(length = raw.len(), "LLM response held no parsable JSON object");
    Err(ParseFailure::new(raw))
}

/// Same as [`parse_json`], but folds the failure into its JSON shape.
pub fn parse_json_value(raw: &str) -> Value {
    match parse_json(raw) {
        Ok(map) => Value::Object(map),
        Err(failure) => failure.into_value(),
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// First `{` through last `}` inclusive, if both exist in that order.
fn greedy_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_is_returned_unchanged() {
        let raw = r#"{"summary": {"overview": "ok"}, "symptoms": [1, 2, 3]}"#;
        let parsed = parse_json(raw).unwrap();
        let expected: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(Value::Object(parsed), expected);
    }

    #[test]
    fn recovers_object_wrapped_in_prose() {
        let raw = "Here is the analysis you asked for:\n{\"summary\": {\"overview\": \"mild\"}}\nLet me know!";
        let parsed = parse_json(raw).unwrap();
        assert_eq!(parsed["summary"]["overview"], "mild");
    }

    #[test]
    fn recovers_object_inside_markdown_fence() {
        let raw = "```json\n{\"precautions\": [\"rest\"]}\n```";
        let parsed = parse_json(raw).unwrap();
        assert_eq!(parsed["precautions"], json!(["rest"]));
    }

    #[test]
    fn span_is_greedy_across_nested_objects() {
        let raw = "prefix {\"a\": {\"b\": {\"c\": 1}}} suffix";
        let parsed = parse_json(raw).unwrap();
        assert_eq!(parsed["a"]["b"]["c"], 1);
    }

    #[test]
    fn text_without_json_yields_failure_shape() {
        let raw = "I'm sorry, I cannot analyze this report.";
        let failure = parse_json(raw).unwrap_err();
        assert_eq!(failure.error, PARSE_FAILURE_MESSAGE);
        assert_eq!(failure.raw_response, raw);
    }

    #[test]
    fn two_separate_objects_fail_as_greedy_span_is_invalid() {
        let raw = "{\"a\": 1} and then {\"b\": 2}";
        assert!(parse_json(raw).is_err());
    }

    #[test]
    fn broken_json_yields_failure_shape() {
        let raw = "{\"summary\": {\"overview\": \"cut off";
        let failure = parse_json(raw).unwrap_err();
        assert_eq!(failure.raw_response, raw);
    }

    #[test]
    fn closing_brace_before_opening_is_not_a_span() {
        assert!(parse_json("} nothing {").is_err());
    }

    #[test]
    fn top_level_array_is_not_an_object() {
        let failure = parse_json("[1, 2, 3]").unwrap_err();
        assert_eq!(failure.raw_response, "[1, 2, 3]");
    }

    #[test]
    fn array_holding_object_recovers_the_object() {
        let parsed = parse_json(r#"[{"a": 1}]"#).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn empty_input_fails_without_panicking() {
        let failure = parse_json("").unwrap_err();
        assert_eq!(failure.raw_response, "");
    }

    #[test]
    fn multibyte_text_around_object_is_handled() {
        let raw = "Résumé — voilà: {\"ok\": true} ✓";
        let parsed = parse_json(raw).unwrap();
        assert_eq!(parsed["ok"], true);
    }

    #[test]
    fn failure_serializes_to_error_and_raw_response_only() {
        let value = ParseFailure::new("junk").into_value();
        assert_eq!(
            value,
            json!({"error": "Failed to parse AI response", "raw_response": "junk"})
        );
    }

    #[test]
    fn parse_json_value_folds_failure() {
        let value = parse_json_value("nope");
        assert_eq!(value["error"], PARSE_FAILURE_MESSAGE);
        let value = parse_json_value("{\"x\": 1}");
        assert_eq!(value["x"], 1);
    }
}
