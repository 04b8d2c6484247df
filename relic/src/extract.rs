//! Reply normalization and JSON extraction.
//!
//! Hosted models are instructed to answer with bare JSON, but in
//! practice replies arrive wrapped in markdown fences or surrounded by
//! prose. This module turns such a reply into a [`serde_json::Value`]
//! using a fixed two-strategy chain:
//!
//! 1. strict decode of the whole (normalized) text;
//! 2. strict decode of the region spanning the first `{` to the last
//!    `}` (greedy, nested braces included).
//!
//! If both fail the reply is rejected with [`PipelineError::Parse`].
//! The reply text is never interpreted as anything other than JSON.

use serde_json::Value;

use crate::error::{PipelineError, Result};

/// Remove markdown code-fence decoration from reply text.
///
/// Strips a leading ```` ```json ```` (or bare ```` ``` ````) marker and
/// a trailing ```` ``` ```` marker if present, then trims surrounding
/// whitespace. Idempotent: already-normalized text passes through
/// unchanged.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Extract a JSON value from reply text.
///
/// Normalizes the text, then applies the strategy chain described in
/// the module docs. First success wins.
///
/// # Errors
///
/// Returns [`PipelineError::Parse`] when no strategy yields valid JSON.
pub fn extract_json_object(text: &str) -> Result<Value> {
    let text = strip_code_fences(text);

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    // The model sometimes wraps the object in prose. The widest
    // brace-delimited region keeps nested objects intact.
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
        && start < end
        && let Ok(value) = serde_json::from_str::<Value>(&text[start..=end])
    {
        return Ok(value);
    }

    Err(PipelineError::parse(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_json_fences() {
        let wrapped = "```json\n{\"object_name\": \"Hammer\"}\n```";
        assert_eq!(strip_code_fences(wrapped), "{\"object_name\": \"Hammer\"}");
    }

    #[test]
    fn test_strip_bare_fences() {
        let wrapped = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(wrapped), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_is_idempotent() {
        let wrapped = "```json\n{\"a\": 1}\n```";
        let once = strip_code_fences(wrapped);
        assert_eq!(strip_code_fences(once), once);
    }

    #[test]
    fn test_strip_without_fences_is_noop() {
        let text = "{\"a\": 1}";
        assert_eq!(strip_code_fences(text), text);
    }

    #[test]
    fn test_direct_decode() {
        let value = extract_json_object("{\"object_name\": \"Hammer\"}").unwrap();
        assert_eq!(value, json!({"object_name": "Hammer"}));
    }

    #[test]
    fn test_fenced_decode_matches_unwrapped() {
        let bare = extract_json_object("{\"a\": [1, 2]}").unwrap();
        let fenced = extract_json_object("```json\n{\"a\": [1, 2]}\n```").unwrap();
        assert_eq!(bare, fenced);
    }

    #[test]
    fn test_brace_extraction_from_prose() {
        let reply = "Sure! Here is the result: {\"year\": \"1900\"} Hope that helps.";
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value, json!({"year": "1900"}));
    }

    #[test]
    fn test_brace_extraction_spans_nested_objects() {
        let reply = "Result: {\"outer\": {\"inner\": 1}, \"list\": [{\"x\": 2}]} done";
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value["outer"]["inner"], json!(1));
        assert_eq!(value["list"][0]["x"], json!(2));
    }

    #[test]
    fn test_unparseable_text_is_rejected() {
        let err = extract_json_object("no json here at all").unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }

    #[test]
    fn test_malformed_braces_are_rejected() {
        // Brace region exists but is not valid JSON, and no literal
        // evaluation is ever attempted on it.
        let err = extract_json_object("{'single': 'quotes', 'not': json}").unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }
}
