//! Rule stages: the atomic steps of a property's assignment pipeline
//!
//! A pipeline is an ordered list of stages, each created once at declaration
//! time and immutable thereafter. Stages only exist for options the author
//! actually configured. Execution is fail-fast: the first failing stage
//! raises and later stages never run.
//!
//! Every stage receives the instance being configured, so predicates and
//! transforms can consult sibling properties explicitly.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::errors::{PropertyError, PropertyResult};
use crate::instance::Instance;
use crate::value::{self, is_absent, json_type_name, Kind};

/// Predicate over the instance being configured (dynamic required-ness)
pub type InstancePredicate = Arc<dyn Fn(&Instance) -> bool + Send + Sync>;

/// Predicate over a candidate value, evaluated in instance context
pub type ValuePredicate = Arc<dyn Fn(&Instance, &Value) -> bool + Send + Sync>;

/// Single-argument transform, evaluated in instance context
pub type Transform = Arc<dyn Fn(&Instance, Value) -> Value + Send + Sync>;

/// Zero-argument default generator, evaluated in instance context
pub type Generator = Arc<dyn Fn(&Instance) -> Value + Send + Sync>;

/// Required-ness configuration
#[derive(Clone)]
pub enum RequiredSpec {
    /// The property is always required
    Always,
    /// The property is never required
    Never,
    /// Required-ness depends on the instance (e.g. required unless a sibling
    /// property is set)
    When(InstancePredicate),
}

impl RequiredSpec {
    /// Builds a spec from a plain boolean
    pub fn from_bool(required: bool) -> Self {
        if required {
            RequiredSpec::Always
        } else {
            RequiredSpec::Never
        }
    }

    /// Evaluates required-ness for this instance
    pub fn is_required(&self, instance: &Instance) -> bool {
        match self {
            RequiredSpec::Always => true,
            RequiredSpec::Never => false,
            RequiredSpec::When(predicate) => predicate(instance),
        }
    }
}

impl fmt::Debug for RequiredSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredSpec::Always => write!(f, "RequiredSpec::Always"),
            RequiredSpec::Never => write!(f, "RequiredSpec::Never"),
            RequiredSpec::When(_) => write!(f, "RequiredSpec::When(..)"),
        }
    }
}

/// Conversion configuration
#[derive(Clone)]
pub enum Converter {
    /// Dispatch through the named operation table ([`crate::value::ops`])
    Named(String),
    /// Invoke an explicit transform in instance context
    With(Transform),
}

impl Converter {
    /// Applies the conversion. Absent values pass through untouched;
    /// conversion never fabricates a value.
    ///
    /// # Panics
    ///
    /// Panics when a named operation is unknown or the value's type lacks it.
    /// These are programming mistakes, not validation failures, and are
    /// deliberately not wrapped in the error taxonomy.
    pub fn apply(&self, instance: &Instance, value: Value) -> Value {
        if is_absent(&value) {
            return value;
        }
        match self {
            Converter::Named(op) => {
                if !value::ops::is_known(op) {
                    panic!("unknown conversion operation '{}'", op);
                }
                match value::ops::invoke(op, &value) {
                    Some(converted) => converted,
                    None => panic!(
                        "{} value does not support the conversion operation '{}'",
                        json_type_name(&value),
                        op
                    ),
                }
            }
            Converter::With(transform) => transform(instance, value),
        }
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Converter::Named(op) => write!(f, "Converter::Named({:?})", op),
            Converter::With(_) => write!(f, "Converter::With(..)"),
        }
    }
}

/// A single acceptance matcher
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact value match
    Equals(Value),
    /// Type-membership match
    OfKind(Kind),
    /// Regex match over string values; non-strings never match
    Pattern(Regex),
}

impl Matcher {
    /// Compiles a pattern matcher from a regex source string
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Pattern(Regex::new(source)?))
    }

    /// Checks whether the value satisfies this matcher
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Equals(expected) => value == expected,
            Matcher::OfKind(kind) => kind.matches(value),
            Matcher::Pattern(regex) => match value {
                Value::String(s) => regex.is_match(s),
                _ => false,
            },
        }
    }
}

/// Acceptance configuration
#[derive(Clone)]
pub enum AcceptSpec {
    /// A predicate evaluated in instance context; truthy result accepts
    Satisfies(ValuePredicate),
    /// A list of alternatives; the value must satisfy at least one
    AnyOf(Vec<Matcher>),
}

impl AcceptSpec {
    /// Evaluates acceptance for a present value
    pub fn accepts(&self, instance: &Instance, value: &Value) -> bool {
        match self {
            AcceptSpec::Satisfies(predicate) => predicate(instance, value),
            AcceptSpec::AnyOf(matchers) => matchers.iter().any(|m| m.matches(value)),
        }
    }
}

impl fmt::Debug for AcceptSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptSpec::Satisfies(_) => write!(f, "AcceptSpec::Satisfies(..)"),
            AcceptSpec::AnyOf(matchers) => f.debug_tuple("AcceptSpec::AnyOf").field(matchers).finish(),
        }
    }
}

/// One atomic pipeline step
#[derive(Debug, Clone)]
pub enum RuleStage {
    /// Fails with MissingValue when the property is required for this
    /// instance and the value is absent
    Required(RequiredSpec),
    /// Transforms the value (absent values pass through)
    Convert(Converter),
    /// Fails with InvalidValue when a present value is not accepted
    Accept(AcceptSpec),
}

impl RuleStage {
    /// Runs this stage against a candidate value
    pub fn apply(
        &self,
        instance: &Instance,
        property: &str,
        value: Value,
    ) -> PropertyResult<Value> {
        match self {
            RuleStage::Required(spec) => {
                if spec.is_required(instance) && is_absent(&value) {
                    return Err(PropertyError::missing_value(instance.model_name(), property));
                }
                Ok(value)
            }
            RuleStage::Convert(converter) => Ok(converter.apply(instance, value)),
            RuleStage::Accept(spec) => {
                if is_absent(&value) || spec.accepts(instance, &value) {
                    Ok(value)
                } else {
                    Err(PropertyError::invalid_value(
                        instance.model_name(),
                        property,
                        value,
                    ))
                }
            }
        }
    }
}
