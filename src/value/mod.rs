//! Dynamic runtime values and the absence sentinel
//!
//! Properties hold `serde_json::Value` at runtime. Absence is represented by
//! `Value::Null` (or a never-written slot); [`is_absent`] is the single
//! explicit probe for it. Because `Value` is a closed enum the probe is total
//! and never consults user-overridable equality.
//!
//! A present falsy value (`false`, `0`, `""`) counts as set. Only null is
//! absent.

pub mod ops;

use serde::{Deserialize, Serialize};
pub use serde_json::Value;

/// Runtime type classes for type-membership acceptance checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// UTF-8 string
    String,
    /// 64-bit integer (signed or unsigned)
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// Array of values
    Array,
    /// String-keyed object
    Object,
    /// The null value
    Null,
}

impl Kind {
    /// Returns the kind of a value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Kind::String,
            Value::Number(n) if n.is_f64() => Kind::Float,
            Value::Number(_) => Kind::Int,
            Value::Bool(_) => Kind::Bool,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
            Value::Null => Kind::Null,
        }
    }

    /// Checks whether a value belongs to this kind
    pub fn matches(&self, value: &Value) -> bool {
        Kind::of(value) == *self
    }

    /// Returns the kind name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Null => "null",
        }
    }

    /// Parses a kind from its name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Kind::String),
            "int" => Some(Kind::Int),
            "float" => Some(Kind::Float),
            "bool" => Some(Kind::Bool),
            "array" => Some(Kind::Array),
            "object" => Some(Kind::Object),
            "null" => Some(Kind::Null),
            _ => None,
        }
    }
}

/// Returns the type name of a value for error messages
pub fn json_type_name(value: &Value) -> &'static str {
    Kind::of(value).name()
}

/// The absence probe: true only for the null sentinel.
///
/// Rule pipelines, default application, and the construction protocol all
/// route absence decisions through this function.
pub fn is_absent(value: &Value) -> bool {
    value.is_null()
}

/// Complement of [`is_absent`]
pub fn is_present(value: &Value) -> bool {
    !value.is_null()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_of_covers_every_shape() {
        assert_eq!(Kind::of(&json!("a")), Kind::String);
        assert_eq!(Kind::of(&json!(1)), Kind::Int);
        assert_eq!(Kind::of(&json!(-3)), Kind::Int);
        assert_eq!(Kind::of(&json!(1.5)), Kind::Float);
        assert_eq!(Kind::of(&json!(true)), Kind::Bool);
        assert_eq!(Kind::of(&json!([1])), Kind::Array);
        assert_eq!(Kind::of(&json!({"a": 1})), Kind::Object);
        assert_eq!(Kind::of(&Value::Null), Kind::Null);
    }

    #[test]
    fn test_kind_matches() {
        assert!(Kind::String.matches(&json!("a")));
        assert!(!Kind::String.matches(&json!(1)));
        assert!(Kind::Int.matches(&json!(7)));
        assert!(!Kind::Int.matches(&json!(7.5)));
    }

    #[test]
    fn test_kind_name_round_trips() {
        for kind in [
            Kind::String,
            Kind::Int,
            Kind::Float,
            Kind::Bool,
            Kind::Array,
            Kind::Object,
            Kind::Null,
        ] {
            assert_eq!(Kind::parse(kind.name()), Some(kind));
        }
        assert_eq!(Kind::parse("decimal"), None);
    }

    #[test]
    fn test_falsy_values_are_present() {
        assert!(is_present(&json!(false)));
        assert!(is_present(&json!(0)));
        assert!(is_present(&json!("")));
        assert!(is_absent(&Value::Null));
    }
}
