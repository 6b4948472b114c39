use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;

/// Wrapper keys that models wrap arrays in despite the instructions.
const WRAPPER_KEYS: &[&str] = &["items", "codes", "suggestions", "results"];

type Strategy = fn(&str) -> Result<Vec<Value>, ParseError>;

/// Ordered parse chain. Strategies run in order; the first success wins.
/// The order matters: strict parsing first, then progressively more
/// forgiving scans over malformed output.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("strict_array", strict_array),
    ("wrapper_key", wrapper_key),
    ("fence_bracket", fence_bracket),
    ("brace_scan", brace_scan),
];

/// Extract suggestion objects from raw model output, or `None` when every
/// strategy fails or the result is empty.
pub(crate) fn extract_suggestions(text: &str) -> Option<Vec<Value>> {
    if text.trim().is_empty() {
        return None;
    }
    for (name, strategy) in STRATEGIES {
        match strategy(text) {
            Ok(items) if !items.is_empty() => {
                debug!(strategy = name, count = items.len(), "parsed model output");
                return Some(items);
            }
            _ => {}
        }
    }
    None
}

/// The whole response is a JSON array.
fn strict_array(text: &str) -> Result<Vec<Value>, ParseError> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| ParseError::Json(e.to_string()))?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ParseError::Shape("top-level value is not an array".into())),
    }
}

/// The whole response is an object: unwrap a known wrapper key, or treat a
/// bare suggestion object as a one-element list.
fn wrapper_key(text: &str) -> Result<Vec<Value>, ParseError> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| ParseError::Json(e.to_string()))?;
    let Value::Object(mut map) = value else {
        return Err(ParseError::Shape("top-level value is not an object".into()));
    };
    for key in WRAPPER_KEYS {
        if let Some(Value::Array(items)) = map.remove(*key) {
            return Ok(items);
        }
    }
    Ok(vec![Value::Object(map)])
}

/// Strip code fences, then parse the outermost `[...]` span.
fn fence_bracket(text: &str) -> Result<Vec<Value>, ParseError> {
    let trimmed = text.trim().trim_matches('`').trim();
    let start = trimmed.find('[').ok_or(ParseError::NotFound)?;
    let end = trimmed.rfind(']').ok_or(ParseError::NotFound)?;
    if end <= start {
        return Err(ParseError::NotFound);
    }
    let value: Value = serde_json::from_str(&trimmed[start..=end])
        .map_err(|e| ParseError::Json(e.to_string()))?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ParseError::Shape("bracket span is not an array".into())),
    }
}

/// Last resort: parse the outermost `{...}` span as a single suggestion.
fn brace_scan(text: &str) -> Result<Vec<Value>, ParseError> {
    let trimmed = text.trim().trim_matches('`').trim();
    let start = trimmed.find('{').ok_or(ParseError::NotFound)?;
    let end = trimmed.rfind('}').ok_or(ParseError::NotFound)?;
    if end <= start {
        return Err(ParseError::NotFound);
    }
    let value: Value = serde_json::from_str(&trimmed[start..=end])
        .map_err(|e| ParseError::Json(e.to_string()))?;
    match value {
        Value::Object(_) => Ok(vec![value]),
        _ => Err(ParseError::Shape("brace span is not an object".into())),
    }
}
