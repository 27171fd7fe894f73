//! Best-effort extraction of a JSON object from free-form model output.
//!
//! Models asked for "only JSON" still wrap it in code fences or add prose. The
//! steps run in a fixed order:
//! 1. strip code-fence markers
//! 2. take the first brace expression (one nesting level) found by regex
//! 3. otherwise scan from the first `{` counting depth to its matching `}`
//! 4. parse that span

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?\s*").expect("valid fence regex"))
}

fn object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("valid object regex")
    })
}

/// Remove markdown code-fence markers wherever they appear.
pub fn strip_code_fences(text: &str) -> String {
    fence_re().replace_all(text, "").into_owned()
}

/// Span from the first `{` to its matching `}`, if the braces balance.
fn balanced_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (i, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The candidate JSON text after steps 1-3. Falls back to the fence-stripped text.
pub fn extract_json_candidate(text: &str) -> String {
    let stripped = strip_code_fences(text);
    if let Some(m) = object_re().find(&stripped) {
        return m.as_str().to_string();
    }
    if let Some(span) = balanced_span(&stripped) {
        return span.to_string();
    }
    stripped.trim().to_string()
}

/// Parse a JSON object out of model output, or explain why not.
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>, serde_json::Error> {
    let candidate = extract_json_candidate(text);
    match serde_json::from_str::<Value>(&candidate)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::de::Error::custom(format!(
            "expected a JSON object, got {}",
            kind(&other)
        ))),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
