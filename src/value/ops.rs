//! Named conversion operations
//!
//! A property declared with a named converter (e.g. `converts("to_int")`)
//! dispatches through this table at assignment time.
//!
//! Semantics:
//! - Referencing an operation outside the table is a programming mistake and
//!   panics at the call site (never a validation error).
//! - A scalar operation applied to a structured value (array/object) returns
//!   `None`: the value lacks the operation, which the caller escalates as a
//!   capability panic.
//! - A scalar operation applied to a scalar of another type passes the value
//!   through unchanged, so a later acceptance check can report the mismatch.
//! - An operation may normalize a present value to null (e.g. `to_title` on a
//!   blank string); required properties re-check absence after conversion.

use serde_json::Value;

/// Every operation name the converter table understands
pub const OPERATIONS: &[&str] = &[
    "to_string",
    "to_int",
    "to_float",
    "to_bool",
    "trim",
    "upcase",
    "downcase",
    "to_title",
    "length",
];

/// Whether `op` names a known conversion operation
pub fn is_known(op: &str) -> bool {
    OPERATIONS.contains(&op)
}

/// Applies the named operation to a value.
///
/// Returns `None` when the value's type does not support the operation at
/// all. Callers must check [`is_known`] first; an unknown name here also
/// yields `None`.
pub fn invoke(op: &str, value: &Value) -> Option<Value> {
    // length is the only operation with a meaning for structured values
    if matches!(value, Value::Array(_) | Value::Object(_)) && op != "length" {
        return None;
    }

    match op {
        "to_string" => Some(match value {
            Value::String(_) => value.clone(),
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            _ => value.clone(),
        }),
        "to_int" => Some(match value {
            Value::Number(n) if n.is_f64() => {
                // truncation, not rounding
                Value::from(n.as_f64().unwrap_or(0.0) as i64)
            }
            Value::Number(_) => value.clone(),
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(i) => Value::from(i),
                Err(_) => Value::Null,
            },
            _ => value.clone(),
        }),
        "to_float" => Some(match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) => Value::from(f),
                None => value.clone(),
            },
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(f) => Value::from(f),
                Err(_) => Value::Null,
            },
            _ => value.clone(),
        }),
        "to_bool" => Some(match value {
            Value::Bool(_) => value.clone(),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Null,
            },
            _ => value.clone(),
        }),
        "trim" => Some(match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            _ => value.clone(),
        }),
        "upcase" => Some(match value {
            Value::String(s) => Value::String(s.to_uppercase()),
            _ => value.clone(),
        }),
        "downcase" => Some(match value {
            Value::String(s) => Value::String(s.to_lowercase()),
            _ => value.clone(),
        }),
        // Normalizes a value into a title: surrounding whitespace is
        // stripped, and a blank string has no title at all, so it normalizes
        // to null (required properties catch this post-conversion).
        "to_title" => Some(match value {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Value::Null
                } else {
                    Value::String(trimmed.to_string())
                }
            }
            _ => value.clone(),
        }),
        "length" => Some(match value {
            Value::String(s) => Value::from(s.chars().count()),
            Value::Array(items) => Value::from(items.len()),
            Value::Object(entries) => Value::from(entries.len()),
            _ => value.clone(),
        }),
        _ => None,
    }
}
