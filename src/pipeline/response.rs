//! Response parsing: pull a JSON object out of the model's free-form text.
//!
//! The model is asked for bare JSON but routinely wraps it in a fenced code
//! block, with or without a `json` language tag. [`extract_json_text`] handles
//! exactly three cases, in this order:
//!
//! 1. a "```json" fence: everything after the first such marker up to the next
//!    closing fence (or the end of the text);
//! 2. any "```" fence: everything between the first and second fence (or the
//!    end of the text);
//! 3. no fence: the whole text.
//!
//! The result is always trimmed.

use crate::error::PoExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Structured reading of a purchase order: arbitrary keys, arbitrary values.
pub type ExtractionResult = Map<String, Value>;

static RE_JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```json(.*?)(?:```|\z)").unwrap());

static RE_ANY_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(.*?)(?:```|\z)").unwrap());

/// Locate the JSON payload inside model text.
pub fn extract_json_text(text: &str) -> &str {
    let inner = RE_JSON_FENCE
        .captures(text)
        .or_else(|| RE_ANY_FENCE.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);
    inner.trim()
}

/// First content element's `text` field.
pub fn first_text(response: &Value) -> Result<&str, PoExtractError> {
    let first = response
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .ok_or(PoExtractError::NoContent)?;

    first
        .get("text")
        .and_then(Value::as_str)
        .ok_or(PoExtractError::MissingText)
}

/// Parse model text into an [`ExtractionResult`].
pub fn parse_text(text: &str) -> Result<ExtractionResult, PoExtractError> {
    let json_str = extract_json_text(text);
    let value: Value = serde_json::from_str(json_str).map_err(|e| PoExtractError::InvalidJson {
        detail: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(PoExtractError::NotAnObject {
            kind: json_kind(&other),
        }),
    }
}

/// Parse a full Messages API response body.
pub fn parse_response(response: &Value) -> Result<ExtractionResult, PoExtractError> {
    parse_text(first_text(response)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_fence() {
        assert_eq!(extract_json_text("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        let parsed = parse_text("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(Value::Object(parsed), json!({"a": 1}));
    }

    #[test]
    fn json_fence_after_prose() {
        let text = "Here is the data:\n```json\n{\"po\": \"123\"}\n```\nLet me know.";
        assert_eq!(extract_json_text(text), "{\"po\": \"123\"}");
    }

    #[test]
    fn json_fence_wins_over_earlier_plain_fence() {
        let text = "```\nnot this\n```\n```json\n{\"b\":2}\n```";
        assert_eq!(extract_json_text(text), "{\"b\":2}");
    }

    #[test]
    fn plain_fence() {
        assert_eq!(extract_json_text("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        assert_eq!(extract_json_text("```json\n{\"a\":1}\n"), "{\"a\":1}");
        assert_eq!(extract_json_text("```\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn no_fence_uses_trimmed_text() {
        assert_eq!(extract_json_text("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn no_fence_with_prose_is_a_parse_error() {
        let err = parse_text("no fences {\"a\":1}").unwrap_err();
        assert!(matches!(err, PoExtractError::InvalidJson { .. }));
        assert!(err.to_string().contains("line 1 column"), "got: {err}");
    }

    #[test]
    fn non_object_is_rejected() {
        let err = parse_text("[1, 2]").unwrap_err();
        assert!(matches!(err, PoExtractError::NotAnObject { kind: "an array" }));
    }

    #[test]
    fn response_without_content_is_reported() {
        let err = parse_response(&json!({"content": []})).unwrap_err();
        assert_eq!(err.to_string(), "No content in response");
        let err = parse_response(&json!({"id": "msg_1"})).unwrap_err();
        assert!(matches!(err, PoExtractError::NoContent));
    }

    #[test]
    fn first_element_without_text_is_reported() {
        let err = parse_response(&json!({"content": [{"type": "tool_use"}]})).unwrap_err();
        assert!(matches!(err, PoExtractError::MissingText));
    }

    #[test]
    fn only_first_content_element_is_read() {
        let response = json!({
            "content": [
                {"type": "text", "text": "```json\n{\"po_number\": \"PO-7\"}\n```"},
                {"type": "text", "text": "{\"ignored\": true}"}
            ]
        });
        let parsed = parse_response(&response).unwrap();
        assert_eq!(parsed.get("po_number"), Some(&json!("PO-7")));
        assert!(parsed.get("ignored").is_none());
    }
}
