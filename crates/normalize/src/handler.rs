//! Field-handler primitives shared by the schema variants.

use chrono::NaiveDateTime;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use funnel_core::{Document, FieldValue};

use crate::time;

/// What a handler did with its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Field fully handled (written, rewritten or deliberately dropped).
    Applied,
    /// Dependencies not yet in the output document; try again later.
    Deferred,
}

/// Non-fatal findings. Collected in the normalization outcome and logged
/// where they arise; none of them stops the event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("Unrecognized field: {key}")]
    UnrecognizedField { key: String },

    #[error("Malformed component name: {value}")]
    MalformedComponent { value: String },

    #[error("Invalid timestamp in {key}: {value}")]
    InvalidTimestamp { key: String, value: String },

    #[error("Malformed record: {detail}")]
    MalformedRecord { detail: String },

    #[error("Dropped {key} after retry, dependencies never settled")]
    UnsatisfiedDependency { key: String },
}

/// Coerce per the legacy digits-only rule: a non-negative integer (or a
/// string of decimal digits) becomes its value, everything else the `-1`
/// sentinel. Negative numbers, floats, booleans and nulls all miss.
pub(crate) fn digit_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) if i >= 0 => i,
            _ => -1,
        },
        Value::String(s) => {
            if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                s.parse().unwrap_or(-1)
            } else {
                -1
            }
        }
        _ => -1,
    }
}

/// Render a scalar the way it prints: strings verbatim, numbers and
/// booleans via their JSON text. Arrays, objects and null yield None.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Truncate to at most `max` characters (characters, not bytes).
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Capped passthrough: text is truncated, other scalars keep their type,
/// arrays and objects flatten to JSON text first.
pub(crate) fn capped_field(value: &Value, max: usize) -> FieldValue {
    match FieldValue::from_json(value) {
        FieldValue::Text(s) => FieldValue::Text(truncate_chars(&s, max)),
        other => other,
    }
}

/// Time handler body, parameterized over the wire format. A value that is
/// not a string, or does not parse, is omitted from the output.
pub(crate) fn apply_time(
    key: &str,
    value: &Value,
    parse: fn(&str) -> Option<NaiveDateTime>,
    doc: &mut Document,
    warnings: &mut Vec<Warning>,
) {
    let parsed = value.as_str().and_then(parse);
    match parsed {
        Some(dt) => doc.insert(key, time::canonical(&dt)),
        None => {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            warn!(key = %key, value = %rendered, "Timestamp did not parse, omitting field");
            warnings.push(Warning::InvalidTimestamp { key: key.to_string(), value: rendered });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digit_coercion_table() {
        assert_eq!(digit_i64(&json!(42)), 42);
        assert_eq!(digit_i64(&json!(0)), 0);
        assert_eq!(digit_i64(&json!("17")), 17);
        assert_eq!(digit_i64(&json!(-3)), -1);
        assert_eq!(digit_i64(&json!("-3")), -1);
        assert_eq!(digit_i64(&json!(2.5)), -1);
        assert_eq!(digit_i64(&json!("2.5")), -1);
        assert_eq!(digit_i64(&json!(true)), -1);
        assert_eq!(digit_i64(&json!(null)), -1);
        assert_eq!(digit_i64(&json!("")), -1);
        assert_eq!(digit_i64(&json!("12a")), -1);
        // Past i64 the digits-only test still passes but the value cannot
        assert_eq!(digit_i64(&json!("99999999999999999999")), -1);
    }

    #[test]
    fn test_scalar_string_rendering() {
        assert_eq!(scalar_string(&json!("x")), Some("x".to_string()));
        assert_eq!(scalar_string(&json!(12388882i64)), Some("12388882".to_string()));
        assert_eq!(scalar_string(&json!(false)), Some("false".to_string()));
        assert_eq!(scalar_string(&json!(null)), None);
        assert_eq!(scalar_string(&json!([1])), None);
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("abcdef", 4), "abcd");
        assert_eq!(truncate_chars("abc", 4), "abc");
        // 6 two-byte chars, capped at 4 chars
        assert_eq!(truncate_chars("éééééé", 4), "éééé");
    }

    #[test]
    fn test_capped_field_keeps_non_text_typed() {
        assert_eq!(capped_field(&json!(123456), 3), FieldValue::Integer(123456));
        assert_eq!(capped_field(&json!("123456"), 3), FieldValue::Text("123".into()));
        assert_eq!(capped_field(&json!(["a", "b"]), 5), FieldValue::Text("[\"a\",".into()));
    }
}
