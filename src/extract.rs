//! Text-to-structure extraction
//!
//! Model output is untrusted free-form text. Extraction runs a four-stage
//! cascade, each stage tried only when the previous one failed:
//! 1. strip one leading/trailing code fence (always applied)
//! 2. strict parse of the cleaned text
//! 3. balanced-delimiter scan from the first `{` or `[`
//! 4. tolerant single-level-nesting pattern match

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

/// Objects with at most one level of nested braces
static NESTED_OBJECT_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\{(?:[^{}]|\{[^{}]*\})*\}").expect("valid object pattern"));

/// Arrays with at most one level of nested brackets
static NESTED_ARRAY_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\[(?:[^\[\]]|\[[^\[\]]*\])*\]").expect("valid array pattern"));

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
  #[error("Model response was empty")]
  Empty,

  #[error("Could not extract structured data from model response")]
  Unparseable { original: String },
}

impl ExtractError {
  /// The raw text that failed, when there was any
  pub fn original_text(&self) -> Option<&str> {
    match self {
      ExtractError::Empty => None,
      ExtractError::Unparseable { original } => Some(original),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Cascade
/// ---------------------------------------------------------------------------

/// Extract a JSON value from raw model text
pub fn extract_structure(raw: &str) -> Result<Value, ExtractError> {
  if raw.trim().is_empty() {
    return Err(ExtractError::Empty);
  }

  let cleaned = strip_code_fence(raw);

  if let Some(value) = parse_strict(cleaned) {
    tracing::debug!("Extracted structure with strict parse");
    return Ok(value);
  }

  if let Some(value) = balanced_span(cleaned).and_then(parse_strict) {
    tracing::debug!("Extracted structure with balanced-delimiter scan");
    return Ok(value);
  }

  if let Some(value) = pattern_match(cleaned) {
    tracing::debug!("Extracted structure with tolerant pattern match");
    return Ok(value);
  }

  tracing::warn!(len = raw.len(), "All extraction stages failed");
  Err(ExtractError::Unparseable {
    original: raw.to_string(),
  })
}

/// Remove a single leading fence line (```` ``` ```` or ```` ```json ````) and a
/// single trailing fence
pub fn strip_code_fence(text: &str) -> &str {
  let mut out = text.trim();

  if out.starts_with("```") {
    out = match out.find('\n') {
      Some(newline) => &out[newline + 1..],
      None => out.trim_start_matches('`'),
    };
  }

  if let Some(stripped) = out.trim_end().strip_suffix("```") {
    out = stripped;
  }

  out.trim()
}

/// Stage 2: the whole text must be one JSON document
pub fn parse_strict(text: &str) -> Option<Value> {
  serde_json::from_str(text.trim()).ok()
}

/// Stage 3: substring from the first opening delimiter to its matching close.
///
/// Only the opening delimiter's own kind is counted and string literals are
/// not tracked, so a brace inside a quoted value can end the scan early.
pub fn balanced_span(text: &str) -> Option<&str> {
  let start = text.find(['{', '['])?;
  let open = text[start..].chars().next()?;
  let close = if open == '{' { '}' } else { ']' };

  let mut depth = 0usize;
  for (offset, ch) in text[start..].char_indices() {
    if ch == open {
      depth += 1;
    } else if ch == close {
      depth -= 1;
      if depth == 0 {
        return Some(&text[start..start + offset + ch.len_utf8()]);
      }
    }
  }

  None
}

/// Stage 4: first pattern match that parses, objects before arrays
pub fn pattern_match(text: &str) -> Option<Value> {
  [&*NESTED_OBJECT_RE, &*NESTED_ARRAY_RE]
    .into_iter()
    .flat_map(|re| re.find_iter(text))
    .find_map(|m| parse_strict(m.as_str()))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_extract_direct() {
    let input = r#"{"week_schedule": {"monday": []}}"#;
    let value = extract_structure(input).unwrap();
    assert_eq!(value, json!({"week_schedule": {"monday": []}}));
  }

  #[test]
  fn test_extract_tagged_fence() {
    let input = "```json\n{\"a\": 1, \"b\": [1, 2]}\n```";
    assert_eq!(extract_structure(input).unwrap(), json!({"a": 1, "b": [1, 2]}));
  }

  #[test]
  fn test_extract_untagged_fence() {
    let input = "```\n[1, 2, 3]\n```\n";
    assert_eq!(extract_structure(input).unwrap(), json!([1, 2, 3]));
  }

  #[test]
  fn test_extract_from_prose() {
    let input = r#"Here is your plan:

{"week_schedule": {"monday": [{"name": "Squat", "target_sets": 3}]}}

Let me know if you want changes!"#;
    let value = extract_structure(input).unwrap();
    assert_eq!(value["week_schedule"]["monday"][0]["name"], "Squat");
  }

  #[test]
  fn test_extract_fence_inside_prose() {
    let input = "Sure thing:\n```json\n{\"ok\": true}\n```\nEnjoy.";
    assert_eq!(extract_structure(input).unwrap(), json!({"ok": true}));
  }

  #[test]
  fn test_balanced_span_nested() {
    let text = r#"noise {"a": {"b": {"c": 1}}} trailing } junk"#;
    assert_eq!(balanced_span(text), Some(r#"{"a": {"b": {"c": 1}}}"#));
  }

  #[test]
  fn test_balanced_span_unclosed() {
    assert_eq!(balanced_span(r#"{"a": {"b": 1}"#), None);
    assert_eq!(balanced_span("no delimiters here"), None);
  }

  #[test]
  fn test_pattern_match_recovers_when_scan_is_fooled() {
    // A stray brace before the payload breaks the balanced scan
    let input = r#"use { carefully. {"plan": {"days": 3}} done"#;
    assert_eq!(balanced_span(input), None);
    assert_eq!(extract_structure(input).unwrap(), json!({"plan": {"days": 3}}));
  }

  #[test]
  fn test_extract_empty_input() {
    assert_eq!(extract_structure(""), Err(ExtractError::Empty));
    assert_eq!(extract_structure("   \n "), Err(ExtractError::Empty));
  }

  #[test]
  fn test_extract_failure_carries_original() {
    let input = "I'm sorry, I can't help with that.";
    let err = extract_structure(input).unwrap_err();
    assert_eq!(err.original_text(), Some(input));
  }

  #[test]
  fn test_strip_code_fence_leaves_plain_text() {
    assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
  }
}
