//! Error taxonomy for the property engine
//!
//! Error classes:
//! - Configuration (declaration-time misuse, fatal to the declaration)
//! - MissingValue (required property received an absent value)
//! - InvalidValue (value failed its acceptance check)
//! - Initialization (all properties still missing after construction)
//! - ConstructorArgumentForwarding (unrecognized arguments with no base step)
//!
//! Capability mistakes (unknown named conversion operation, writing an
//! unknown or read-only property) are panics, not errors: they signal a
//! caller/type mistake distinct from a validation failure.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Result type for property operations
pub type PropertyResult<T> = Result<T, PropertyError>;

/// Errors raised by declaration, assignment, and construction
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PropertyError {
    // ==================
    // Declaration Errors
    // ==================
    /// Declaration-time misuse: unknown option keys, unsafe literal default
    #[error("{message}")]
    Configuration {
        /// Name of the model the declaration targeted
        model: String,
        /// Human-readable description of the misuse
        message: String,
    },

    // ==================
    // Assignment Errors
    // ==================
    /// A required property received or holds an absent value
    #[error("{model} requires the property {property} to be set")]
    MissingValue {
        /// Name of the owning model
        model: String,
        /// Name of the offending property
        property: String,
    },

    /// A value failed its acceptance check
    #[error("{model} does not accept {value} as value for the property {property}")]
    InvalidValue {
        /// Name of the owning model
        model: String,
        /// Name of the offending property
        property: String,
        /// The rejected value
        value: Value,
    },

    // ==================
    // Construction Errors
    // ==================
    /// Required properties were still absent after defaults were applied.
    /// Carries every offending property, not just the first.
    #[error("{model} requires the following properties to be set: {}", .properties.join(", "))]
    Initialization {
        /// Name of the model under construction
        model: String,
        /// All offending property names, sorted
        properties: Vec<String>,
    },

    /// Unrecognized constructor arguments could not be forwarded to a base
    /// construction step
    #[error("{model} could not forward {positional} positional argument(s) and the unrecognized attribute(s) [{}] to a base constructor", .attrs.join(", "))]
    ConstructorArgumentForwarding {
        /// Name of the model under construction
        model: String,
        /// Number of positional arguments left over
        positional: usize,
        /// Keys of the unrecognized attributes
        attrs: Vec<String>,
    },
}

impl PropertyError {
    /// Create a configuration error for a set of unsupported option keys.
    ///
    /// Lists every unsupported key, sorted and comma-joined, never just the
    /// first.
    pub fn unsupported_options(model: impl Into<String>, mut keys: Vec<String>) -> Self {
        let model = model.into();
        keys.sort();
        Self::Configuration {
            message: format!(
                "{} does not support the following configuration options: {}",
                model,
                keys.join(", ")
            ),
            model,
        }
    }

    /// Create a configuration error for a structurally mutable literal default
    pub fn unsafe_default(model: impl Into<String>, property: impl Into<String>) -> Self {
        let model = model.into();
        Self::Configuration {
            message: format!(
                "{} does not accept a mutable literal as default for the property {}; use a generated default instead",
                model,
                property.into()
            ),
            model,
        }
    }

    /// Create a generic configuration error
    pub fn configuration(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create a missing-value error
    pub fn missing_value(model: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MissingValue {
            model: model.into(),
            property: property.into(),
        }
    }

    /// Create an invalid-value error
    pub fn invalid_value(
        model: impl Into<String>,
        property: impl Into<String>,
        value: Value,
    ) -> Self {
        Self::InvalidValue {
            model: model.into(),
            property: property.into(),
            value,
        }
    }

    /// Create an initialization error naming every offending property
    pub fn initialization(model: impl Into<String>, mut properties: Vec<String>) -> Self {
        properties.sort();
        Self::Initialization {
            model: model.into(),
            properties,
        }
    }

    /// Create a constructor-argument-forwarding error
    pub fn forwarding(model: impl Into<String>, positional: usize, attrs: Vec<String>) -> Self {
        Self::ConstructorArgumentForwarding {
            model: model.into(),
            positional,
            attrs,
        }
    }

    /// Name of the model that raised the error
    pub fn sender(&self) -> &str {
        match self {
            Self::Configuration { model, .. }
            | Self::MissingValue { model, .. }
            | Self::InvalidValue { model, .. }
            | Self::Initialization { model, .. }
            | Self::ConstructorArgumentForwarding { model, .. } => model,
        }
    }

    /// Names of the properties involved in the error, if any
    pub fn properties(&self) -> Vec<&str> {
        match self {
            Self::MissingValue { property, .. } | Self::InvalidValue { property, .. } => {
                vec![property.as_str()]
            }
            Self::Initialization { properties, .. } => {
                properties.iter().map(String::as_str).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Structured `{property: reason}` map for programmatic consumption
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        match self {
            Self::MissingValue { property, .. } => {
                map.insert(property.clone(), "must be set".to_string());
            }
            Self::InvalidValue {
                property, value, ..
            } => {
                map.insert(
                    property.clone(),
                    format!("does not accept {} as value", value),
                );
            }
            Self::Initialization { properties, .. } => {
                for property in properties {
                    map.insert(property.clone(), "must be set".to_string());
                }
            }
            _ => {}
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unsupported_options_sorted_and_joined() {
        let err = PropertyError::unsupported_options(
            "Article",
            vec!["titel".into(), "reqired".into(), "konverts".into()],
        );
        assert_eq!(
            err.to_string(),
            "Article does not support the following configuration options: konverts, reqired, titel"
        );
    }

    #[test]
    fn test_missing_value_message_and_map() {
        let err = PropertyError::missing_value("Article", "title");
        assert_eq!(err.to_string(), "Article requires the property title to be set");
        assert_eq!(err.to_map().get("title").unwrap(), "must be set");
        assert_eq!(err.sender(), "Article");
        assert_eq!(err.properties(), vec!["title"]);
    }

    #[test]
    fn test_invalid_value_interpolates_rejected_value() {
        let err = PropertyError::invalid_value("Article", "title", json!(42));
        assert_eq!(
            err.to_string(),
            "Article does not accept 42 as value for the property title"
        );
        assert_eq!(
            err.to_map().get("title").unwrap(),
            "does not accept 42 as value"
        );
    }

    #[test]
    fn test_initialization_carries_all_properties() {
        let err = PropertyError::initialization("Article", vec!["title".into(), "body".into()]);
        assert_eq!(
            err.to_string(),
            "Article requires the following properties to be set: body, title"
        );
        let map = err.to_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("body").unwrap(), "must be set");
        assert_eq!(map.get("title").unwrap(), "must be set");
    }

    #[test]
    fn test_configuration_has_no_property_map() {
        let err = PropertyError::unsafe_default("Article", "tags");
        assert!(err.to_map().is_empty());
        assert!(err.properties().is_empty());
    }
}
