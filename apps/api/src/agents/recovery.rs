//! Recovers structured output from a free-text model reply.
//!
//! The reply format is not contractually guaranteed: it may arrive fenced,
//! tagged with a leading `json`, padded with stray backticks, or embedded in
//! prose. Recovery never fails loudly; every problem degrades to a typed
//! `AgentFailure` carrying the cleaned text.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::{AgentFailure, AgentResult, FailureKind};

pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse JSON";
const FENCE: &str = "```";
const FORMAT_TAG: &str = "json";

/// An explicit expected shape for an agent's output: the serde structure,
/// plus any semantic checks serde cannot express.
pub trait ExpectedShape: DeserializeOwned {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// One-line digest for the logs once the output is accepted.
    fn describe(&self) -> Option<String> {
        None
    }
}

/// Strips code fences, stray backticks, a leading `json` tag and surrounding
/// whitespace. A fenced block embedded in prose is unwrapped too.
pub fn strip_json_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let body = if !starts_like_json(trimmed) && !trimmed.starts_with('`') {
        fenced_block(trimmed).unwrap_or(trimmed)
    } else {
        trimmed
    };

    let body = body.trim().trim_matches('`').trim();
    let body = strip_format_tag(body).unwrap_or(body);
    body.trim().trim_matches('`').trim()
}

fn starts_like_json(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}

/// Contents of the first ``` fenced block, including any language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find(FENCE)? + FENCE.len();
    let rest = &text[start..];
    let end = rest.find(FENCE)?;
    Some(&rest[..end])
}

/// Drops a leading `json` tag when it is a standalone word before the body.
fn strip_format_tag(text: &str) -> Option<&str> {
    let head = text.get(..FORMAT_TAG.len())?;
    if !head.eq_ignore_ascii_case(FORMAT_TAG) {
        return None;
    }
    let rest = &text[FORMAT_TAG.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '{' || c == '[' => Some(rest),
        Some(_) => None,
    }
}

/// Cleans and parses `raw`, then checks it against `T`.
/// Returns the typed value and the untouched parsed JSON.
pub fn recover_typed<T: ExpectedShape>(raw: &str) -> Result<(T, Value), AgentFailure> {
    let cleaned = strip_json_fences(raw);

    let value: Value = serde_json::from_str(cleaned).map_err(|_| AgentFailure {
        kind: FailureKind::MalformedOutput,
        error: PARSE_FAILURE_MESSAGE.to_string(),
        raw_output: Some(cleaned.to_string()),
    })?;

    let unexpected = |detail: String| AgentFailure {
        kind: FailureKind::UnexpectedShape,
        error: format!("Model output did not match the expected shape: {detail}"),
        raw_output: Some(cleaned.to_string()),
    };

    let typed = T::deserialize(&value).map_err(|e| unexpected(e.to_string()))?;
    typed.validate().map_err(unexpected)?;

    Ok((typed, value))
}

/// Agent-facing form of `recover_typed`: the parsed JSON on success.
pub fn recover<T: ExpectedShape>(raw: &str) -> AgentResult {
    match recover_typed::<T>(raw) {
        Ok((typed, value)) => {
            if let Some(digest) = typed.describe() {
                debug!("Recovered output: {digest}");
            }
            AgentResult::success(value)
        }
        Err(failure) => AgentResult::Failure(failure),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accepts `7.5`, `"7.5"`, `"$1,200"`; models are loose with numbers.
pub fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '$' | '€' | '£' | '₹'))
                .collect();
            cleaned
                .trim()
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("expected a number, found '{s}'")))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Scored {
        score: f64,
    }

    impl ExpectedShape for Scored {
        fn validate(&self) -> Result<(), String> {
            if self.score < 0.0 {
                return Err("score is negative".to_string());
            }
            Ok(())
        }
    }

    impl ExpectedShape for Value {}

    const BODY: &str = r#"{"score": 7.5, "notes": ["a", "b"]}"#;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_leading_tag_after_backticks_are_trimmed() {
        assert_eq!(strip_json_fences("`json {\"a\": 1}`"), "{\"a\": 1}");
        assert_eq!(strip_json_fences("JSON\n[1, 2]"), "[1, 2]");
        assert_eq!(strip_json_fences("json{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_keeps_words_that_merely_start_with_json() {
        assert_eq!(strip_json_fences("jsonify this"), "jsonify this");
    }

    #[test]
    fn test_strip_unwraps_fenced_block_inside_prose() {
        let input = "Here is the report you asked for:\n```json\n{\"a\": 1}\n```\nLet me know!";
        assert_eq!(strip_json_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_leaves_backticks_inside_json_values_alone() {
        let input = r#"{"snippet": "use ```rust``` fences"}"#;
        assert_eq!(strip_json_fences(input), input);
    }

    #[test]
    fn test_recovery_is_independent_of_fence_style() {
        let direct: Value = serde_json::from_str(BODY).unwrap();
        let styles = [
            BODY.to_string(),
            format!("```json\n{BODY}\n```"),
            format!("```JSON {BODY}```"),
            format!("```\n{BODY}\n```"),
            format!("json\n{BODY}"),
            format!("``{BODY}``"),
            format!("\n\n   {BODY}   \n"),
            format!("Sure!\n```json\n{BODY}\n```"),
        ];
        for style in styles {
            match recover::<Value>(&style) {
                AgentResult::Success { output } => assert_eq!(output, direct, "style: {style:?}"),
                other => panic!("style {style:?} failed: {other:?}"),
            }
        }
    }

    #[test]
    fn test_malformed_output_keeps_cleaned_text() {
        let raw = "```json\n{\"score\": 7.5,,}\n```";
        match recover::<Value>(raw) {
            AgentResult::Failure(failure) => {
                assert_eq!(failure.kind, FailureKind::MalformedOutput);
                assert_eq!(failure.error, PARSE_FAILURE_MESSAGE);
                assert_eq!(failure.raw_output.as_deref(), Some("{\"score\": 7.5,,}"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_prose_is_malformed_not_a_panic() {
        let failure = recover_typed::<Scored>("I cannot help with that.").unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedOutput);
        assert_eq!(failure.raw_output.as_deref(), Some("I cannot help with that."));
    }

    #[test]
    fn test_wrong_shape_is_a_distinct_failure() {
        let failure = recover_typed::<Scored>("```json\n{\"total\": 3}\n```").unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnexpectedShape);
        assert!(failure.error.contains("score"));
        assert_eq!(failure.raw_output.as_deref(), Some("{\"total\": 3}"));
    }

    #[test]
    fn test_semantic_validation_failure_is_unexpected_shape() {
        let failure = recover_typed::<Scored>(r#"{"score": -1}"#).unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnexpectedShape);
        assert!(failure.error.contains("negative"));
    }

    #[test]
    fn test_recover_typed_returns_untouched_value() {
        let (typed, value) = recover_typed::<Scored>(BODY).unwrap();
        assert!((typed.score - 7.5).abs() < f64::EPSILON);
        assert_eq!(value["notes"], json!(["a", "b"]));
    }

    #[derive(Debug, Deserialize)]
    struct Amount {
        #[serde(deserialize_with = "number_or_string")]
        value: f64,
    }

    #[test]
    fn test_number_or_string() {
        let parse = |v: Value| serde_json::from_value::<Amount>(json!({ "value": v }));
        assert_eq!(parse(json!(4)).unwrap().value, 4.0);
        assert_eq!(parse(json!("6.25")).unwrap().value, 6.25);
        assert_eq!(parse(json!("$1,200")).unwrap().value, 1200.0);
        assert!(parse(json!("high")).is_err());
        assert!(parse(json!(null)).is_err());
    }
}
