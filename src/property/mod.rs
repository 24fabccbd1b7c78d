//! Property definitions: a named attribute's full configuration
//!
//! A [`Definition`] bundles the reader name, writability, default source, and
//! the ordered rule pipeline assembled from whichever options were supplied.
//! Pipelines only contain stages the author configured; `required`
//! contributes two stages (pre- and post-conversion) so a conversion that
//! normalizes a present value to absence still trips MissingValue.
//!
//! Definitions are created once at declaration time and immutable thereafter;
//! re-declaring the same name on the same model replaces the definition.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::{PropertyError, PropertyResult};
use crate::instance::Instance;
use crate::rule::{
    AcceptSpec, Converter, Generator, InstancePredicate, Matcher, RequiredSpec, RuleStage,
    Transform, ValuePredicate,
};
use crate::value::{is_absent, is_present, Kind};

/// Where a property's default value comes from
#[derive(Clone, Default)]
pub enum DefaultSource {
    /// No default configured
    #[default]
    Absent,
    /// An immutable literal (scalars only; mutable literals are rejected at
    /// declaration time so instances never share state)
    Literal(Value),
    /// A generator evaluated against the instance at default-application time
    Generated(Generator),
}

impl DefaultSource {
    /// Evaluates the default for this instance. Absent source yields null.
    pub fn evaluate(&self, instance: &Instance) -> Value {
        match self {
            DefaultSource::Absent => Value::Null,
            DefaultSource::Literal(value) => value.clone(),
            DefaultSource::Generated(generator) => generator(instance),
        }
    }
}

impl fmt::Debug for DefaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSource::Absent => write!(f, "DefaultSource::Absent"),
            DefaultSource::Literal(value) => write!(f, "DefaultSource::Literal({})", value),
            DefaultSource::Generated(_) => write!(f, "DefaultSource::Generated(..)"),
        }
    }
}

/// Declaration options for one property, consumed by
/// [`Model::property`](crate::model::Model::property)
#[derive(Clone, Default)]
pub struct PropertySpec {
    required: Option<RequiredSpec>,
    converts: Option<Converter>,
    accepts: Option<AcceptSpec>,
    default: DefaultSource,
    reader: Option<String>,
    writable: Option<bool>,
}

impl PropertySpec {
    /// An empty spec: no validation, no conversion, no default, writable
    pub fn new() -> Self {
        // the inherent `default` builder below shadows the trait method
        <Self as Default>::default()
    }

    /// Marks the property required (or explicitly optional)
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(RequiredSpec::from_bool(required));
        self
    }

    /// Makes required-ness depend on the instance
    pub fn required_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Instance) -> bool + Send + Sync + 'static,
    {
        self.required = Some(RequiredSpec::When(Arc::new(predicate) as InstancePredicate));
        self
    }

    /// Converts assigned values through a named operation
    pub fn converts(mut self, operation: impl Into<String>) -> Self {
        self.converts = Some(Converter::Named(operation.into()));
        self
    }

    /// Converts assigned values through an explicit transform
    pub fn converts_with<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Instance, Value) -> Value + Send + Sync + 'static,
    {
        self.converts = Some(Converter::With(Arc::new(transform) as Transform));
        self
    }

    /// Accepts values satisfying at least one of the given matchers
    pub fn accepts(mut self, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        self.accepts = Some(AcceptSpec::AnyOf(matchers.into_iter().collect()));
        self
    }

    /// Accepts values of the given kind
    pub fn accepts_kind(self, kind: Kind) -> Self {
        self.accepts([Matcher::OfKind(kind)])
    }

    /// Accepts values for which the predicate returns true
    pub fn accepts_where<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Instance, &Value) -> bool + Send + Sync + 'static,
    {
        self.accepts = Some(AcceptSpec::Satisfies(Arc::new(predicate) as ValuePredicate));
        self
    }

    /// Sets a literal default (validated at declaration time)
    pub fn default(mut self, value: Value) -> Self {
        self.default = DefaultSource::Literal(value);
        self
    }

    /// Sets a generated default, evaluated per instance
    pub fn default_with<F>(mut self, generator: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        self.default = DefaultSource::Generated(Arc::new(generator) as Generator);
        self
    }

    /// Renames the reader accessor
    pub fn reader(mut self, name: impl Into<String>) -> Self {
        self.reader = Some(name.into());
        self
    }

    /// Controls whether the generic write surface accepts this property
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    /// Builds a spec from a string-keyed option map.
    ///
    /// Supported keys: `required` (bool), `converts` (operation name),
    /// `accepts` (matcher or array of matchers), `default` (safe literal),
    /// `reader` (string), `writable` (bool). Every unsupported key is
    /// reported in a single ConfigurationError, sorted and comma-joined.
    pub fn from_options(
        model: &str,
        options: &IndexMap<String, Value>,
    ) -> PropertyResult<Self> {
        let unsupported: Vec<String> = options
            .keys()
            .filter(|key| {
                !matches!(
                    key.as_str(),
                    "required" | "converts" | "accepts" | "default" | "reader" | "writable"
                )
            })
            .cloned()
            .collect();
        if !unsupported.is_empty() {
            return Err(PropertyError::unsupported_options(model, unsupported));
        }

        let mut spec = PropertySpec::new();
        if let Some(value) = options.get("required") {
            let required = value.as_bool().ok_or_else(|| {
                PropertyError::configuration(model, "the required option must be a boolean")
            })?;
            spec = spec.required(required);
        }
        if let Some(value) = options.get("converts") {
            let operation = value.as_str().ok_or_else(|| {
                PropertyError::configuration(model, "the converts option must name an operation")
            })?;
            spec = spec.converts(operation);
        }
        if let Some(value) = options.get("accepts") {
            let matchers = match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| parse_matcher(model, item))
                    .collect::<PropertyResult<Vec<_>>>()?,
                other => vec![parse_matcher(model, other)?],
            };
            spec = spec.accepts(matchers);
        }
        if let Some(value) = options.get("default") {
            spec = spec.default(value.clone());
        }
        if let Some(value) = options.get("reader") {
            let name = value.as_str().ok_or_else(|| {
                PropertyError::configuration(model, "the reader option must be a string")
            })?;
            spec = spec.reader(name);
        }
        if let Some(value) = options.get("writable") {
            let writable = value.as_bool().ok_or_else(|| {
                PropertyError::configuration(model, "the writable option must be a boolean")
            })?;
            spec = spec.writable(writable);
        }
        Ok(spec)
    }
}

impl fmt::Debug for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySpec")
            .field("required", &self.required)
            .field("converts", &self.converts)
            .field("accepts", &self.accepts)
            .field("default", &self.default)
            .field("reader", &self.reader)
            .field("writable", &self.writable)
            .finish()
    }
}

/// Parses one matcher from its declarative form: a bare scalar is an exact
/// match; objects select `{"kind": ..}`, `{"equals": ..}`, or
/// `{"pattern": ..}`.
fn parse_matcher(model: &str, value: &Value) -> PropertyResult<Matcher> {
    match value {
        Value::Object(entries) => {
            if let Some(kind) = entries.get("kind") {
                let name = kind.as_str().unwrap_or_default();
                return Kind::parse(name).map(Matcher::OfKind).ok_or_else(|| {
                    PropertyError::configuration(model, format!("unknown kind matcher: {}", kind))
                });
            }
            if let Some(expected) = entries.get("equals") {
                return Ok(Matcher::Equals(expected.clone()));
            }
            if let Some(pattern) = entries.get("pattern") {
                let source = pattern.as_str().ok_or_else(|| {
                    PropertyError::configuration(model, "the pattern matcher must be a string")
                })?;
                return Matcher::pattern(source).map_err(|e| {
                    PropertyError::configuration(model, format!("invalid pattern matcher: {}", e))
                });
            }
            Err(PropertyError::configuration(
                model,
                "matcher objects must contain a kind, equals, or pattern key",
            ))
        }
        scalar => Ok(Matcher::Equals(scalar.clone())),
    }
}

/// A named attribute's full configuration
#[derive(Clone)]
pub struct Definition {
    name: String,
    reader: String,
    writable: bool,
    storage_key: String,
    required: Option<RequiredSpec>,
    default: DefaultSource,
    pipeline: Vec<RuleStage>,
}

impl Definition {
    /// Builds a definition from a spec, validating the default source.
    ///
    /// Structurally mutable literal defaults (arrays, objects) are rejected
    /// here so instances can never share mutable state through a default;
    /// a generated default must be used instead.
    pub(crate) fn build(
        model: &str,
        name: impl Into<String>,
        spec: PropertySpec,
    ) -> PropertyResult<Arc<Self>> {
        let name = name.into();

        if let DefaultSource::Literal(literal) = &spec.default {
            if matches!(literal, Value::Array(_) | Value::Object(_)) {
                return Err(PropertyError::unsafe_default(model, name));
            }
        }

        let mut pipeline = Vec::new();
        if let Some(required) = &spec.required {
            pipeline.push(RuleStage::Required(required.clone()));
        }
        if let Some(converter) = &spec.converts {
            pipeline.push(RuleStage::Convert(converter.clone()));
            // conversion may normalize a present value to absence
            if let Some(required) = &spec.required {
                pipeline.push(RuleStage::Required(required.clone()));
            }
        }
        if let Some(accepts) = &spec.accepts {
            pipeline.push(RuleStage::Accept(accepts.clone()));
        }

        Ok(Arc::new(Self {
            reader: spec.reader.unwrap_or_else(|| name.clone()),
            writable: spec.writable.unwrap_or(true),
            storage_key: name.clone(),
            required: spec.required,
            default: spec.default,
            pipeline,
            name,
        }))
    }

    /// The property name (unique within one registry)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The reader accessor name (defaults to the property name)
    pub fn reader(&self) -> &str {
        &self.reader
    }

    /// Whether the generic write surface accepts this property
    pub fn writable(&self) -> bool {
        self.writable
    }

    /// The per-instance slot identifier
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Number of stages in the assignment pipeline
    pub fn pipeline_len(&self) -> usize {
        self.pipeline.len()
    }

    /// Runs the full rule pipeline against a candidate value, fail-fast
    pub fn prepare(&self, instance: &Instance, value: Value) -> PropertyResult<Value> {
        let mut value = value;
        for stage in &self.pipeline {
            value = stage.apply(instance, &self.name, value)?;
        }
        Ok(value)
    }

    /// Prepares and stores a value in the instance's slot
    pub fn set(&self, instance: &mut Instance, value: Value) -> PropertyResult<()> {
        let prepared = self.prepare(instance, value)?;
        instance.write_slot(&self.storage_key, prepared);
        Ok(())
    }

    /// Reads the stored value, or null if never written
    pub fn get(&self, instance: &Instance) -> Value {
        instance
            .read_slot(&self.storage_key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Whether the slot holds a present value
    pub fn present(&self, instance: &Instance) -> bool {
        instance
            .read_slot(&self.storage_key)
            .map(is_present)
            .unwrap_or(false)
    }

    /// Whether the property is required for this instance
    pub fn required(&self, instance: &Instance) -> bool {
        self.required
            .as_ref()
            .map(|spec| spec.is_required(instance))
            .unwrap_or(false)
    }

    /// Required for this instance but still absent
    pub fn missing(&self, instance: &Instance) -> bool {
        self.required(instance) && !self.present(instance)
    }

    /// Applies the default, if one is configured and no present value exists.
    ///
    /// A default value is itself subject to the full pipeline. Returns
    /// whether a default was applied.
    pub fn set_default(&self, instance: &mut Instance) -> PropertyResult<bool> {
        if self.present(instance) {
            return Ok(false);
        }
        let default = self.default.evaluate(instance);
        if is_absent(&default) {
            return Ok(false);
        }
        self.set(instance, default)?;
        Ok(true)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("reader", &self.reader)
            .field("writable", &self.writable)
            .field("default", &self.default)
            .field("pipeline_len", &self.pipeline.len())
            .finish()
    }
}
