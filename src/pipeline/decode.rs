//! Tolerant JSON decoding of model output.
//!
//! Models asked for "only JSON" still wrap it in prose or code fences now and
//! then, and sometimes nest a whole object as a *string* inside another field.
//! Two operations cover both:
//!
//! * [`decode`]: recover one JSON object from free-form text.
//! * [`resolve`]: decode-or-pass-through for a value that may be a
//!   structured object or an opaque string holding one.
//!
//! Neither ever invents data. If no object can be parsed the caller gets
//! `None` and must show the raw text instead.

use crate::report::AnalysisResult;
use serde_json::{Map, Value};
use tracing::debug;

/// Recover a JSON object from `text`.
///
/// 1. Parse the whole text.
/// 2. Failing that, parse the span from the first `{` to the last `}`
///    inclusive.
///
/// Anything that does not parse to a non-empty object (arrays, numbers, bare
/// strings, `{}`, unbalanced braces) yields `None`.
pub fn decode(text: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return (!map.is_empty()).then_some(map);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) if !map.is_empty() => {
            debug!(
                "Recovered JSON object from bytes {}..={} of {}",
                start,
                end,
                text.len()
            );
            Some(map)
        }
        _ => None,
    }
}

/// Decode-or-pass-through for a "structured-or-string" value.
///
/// A string that decodes to an object is replaced by that object; every
/// other value, including a string that does not decode, is returned as-is.
pub fn resolve(value: Value) -> Value {
    match value {
        Value::String(s) => match decode(&s) {
            Some(map) => Value::Object(map),
            None => Value::String(s),
        },
        other => other,
    }
}

/// Decode model output straight into an [`AnalysisResult`].
///
/// `None` unless the whole object decodes; no partial results.
pub fn decode_result(text: &str) -> Option<AnalysisResult> {
    let map = decode(text)?;
    match serde_json::from_value::<AnalysisResult>(Value::Object(map)) {
        Ok(result) => Some(result),
        Err(e) => {
            debug!("Decoded object does not fit the report shape: {}", e);
            None
        }
    }
}
