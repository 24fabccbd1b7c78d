//! Schema-bearing models and the construction protocol
//!
//! A [`Model`] is the explicit stand-in for a schema-bearing type: it owns a
//! property registry, declares properties against it, and constructs
//! instances. Sub-models created with [`Model::extend`] get a live view of
//! inherited schema through registry propagation. `Model` is a cheap clone
//! handle; clones share the same registry.
//!
//! Construction is a strictly ordered, non-retryable, single pass:
//! partition → forward → assign → configure → default → validate. There is
//! no rollback; a failed construction leaves a partial instance that the
//! caller is expected to discard.

use std::fmt;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::errors::{PropertyError, PropertyResult};
use crate::instance::{Accessor, Instance};
use crate::property::{Definition, PropertySpec};
use crate::registry::Registry;

/// Named attribute values supplied to construction
pub type AttributeMap = IndexMap<String, Value>;

/// Base construction step: receives the new instance, the positional
/// pass-through arguments, and the attributes no property recognized.
///
/// A base step that cannot process its arguments returns a
/// [`PropertyError::ConstructorArgumentForwarding`] (helper:
/// [`PropertyError::forwarding`]).
pub type BaseConstructor =
    Arc<dyn Fn(&mut Instance, &[Value], &AttributeMap) -> PropertyResult<()> + Send + Sync>;

/// A schema-bearing type: a named property registry plus construction
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

struct ModelInner {
    name: String,
    registry: Arc<Registry>,
    parent: Option<Model>,
    base: RwLock<Option<BaseConstructor>>,
}

impl Model {
    /// Defines a root model with an empty registry
    pub fn define(name: impl Into<String>) -> Self {
        let name = name.into();
        debug!("defining model '{}'", name);
        Self {
            inner: Arc::new(ModelInner {
                name,
                registry: Registry::new(),
                parent: None,
                base: RwLock::new(None),
            }),
        }
    }

    /// Defines a sub-model. Its registry is registered as a child of this
    /// model's registry at creation time, so later declarations on any
    /// ancestor reach it without re-declaration.
    pub fn extend(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        debug!("extending model '{}' as '{}'", self.inner.name, name);
        Self {
            inner: Arc::new(ModelInner {
                name,
                registry: Registry::new_child(&self.inner.registry),
                parent: Some(self.clone()),
                base: RwLock::new(None),
            }),
        }
    }

    /// The model name, used in error messages
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The model's property registry
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// The parent model, if this model extends one
    pub fn parent(&self) -> Option<&Model> {
        self.inner.parent.as_ref()
    }

    /// Declares a property. Re-declaring a name replaces the definition and
    /// keeps its enumeration position.
    pub fn property(
        &self,
        name: impl Into<String>,
        spec: PropertySpec,
    ) -> PropertyResult<Arc<Definition>> {
        let definition = Definition::build(&self.inner.name, name, spec)?;
        self.inner.registry.declare(definition.clone());
        Ok(definition)
    }

    /// Declares a required property
    pub fn required_property(
        &self,
        name: impl Into<String>,
        spec: PropertySpec,
    ) -> PropertyResult<Arc<Definition>> {
        self.property(name, spec.required(true))
    }

    /// Declares a property from a string-keyed option map. Unsupported keys
    /// raise one ConfigurationError listing every offending key.
    pub fn property_from_options(
        &self,
        name: impl Into<String>,
        options: &AttributeMap,
    ) -> PropertyResult<Arc<Definition>> {
        let spec = PropertySpec::from_options(&self.inner.name, options)?;
        self.property(name, spec)
    }

    /// Returns a per-field accessor handle for a declared property
    pub fn accessor(&self, name: &str) -> Option<Accessor> {
        self.inner.registry.get(name).map(Accessor::new)
    }

    /// Installs the base construction step that receives positional
    /// arguments and unrecognized attributes during construction
    pub fn set_base_constructor<F>(&self, base: F)
    where
        F: Fn(&mut Instance, &[Value], &AttributeMap) -> PropertyResult<()> + Send + Sync + 'static,
    {
        *self
            .inner
            .base
            .write()
            .expect("base constructor lock poisoned") = Some(Arc::new(base));
    }

    /// Nearest base construction step, walking up the model chain
    fn base_constructor(&self) -> Option<BaseConstructor> {
        let own = self
            .inner
            .base
            .read()
            .expect("base constructor lock poisoned")
            .clone();
        own.or_else(|| self.inner.parent.as_ref().and_then(Model::base_constructor))
    }

    /// Constructs an instance from an attribute map
    pub fn create(&self, attrs: AttributeMap) -> PropertyResult<Instance> {
        self.create_with(Vec::new(), attrs, |_| Ok(()))
    }

    /// Constructs an instance from positional pass-through arguments, an
    /// attribute map, and a configuration callback.
    ///
    /// 1. Attributes are partitioned into recognized and unrecognized.
    /// 2. Positional arguments and unrecognized attributes go to the nearest
    ///    base construction step; with no step to take them, construction
    ///    fails rather than silently dropping data.
    /// 3. Recognized values are assigned through each definition's pipeline
    ///    in enumeration order, fail-fast.
    /// 4. The configuration callback runs for imperative post-construction
    ///    assignment.
    /// 5. Defaults are applied in enumeration order; a generator may read a
    ///    sibling that got its value or default earlier in the order.
    /// 6. Every property required for this instance and still absent is
    ///    collected into a single InitializationError.
    pub fn create_with<F>(
        &self,
        positional: Vec<Value>,
        attrs: AttributeMap,
        configure: F,
    ) -> PropertyResult<Instance>
    where
        F: FnOnce(&mut Instance) -> PropertyResult<()>,
    {
        let definitions = self.inner.registry.definitions();

        let mut recognized = AttributeMap::new();
        let mut unrecognized = AttributeMap::new();
        for (key, value) in attrs {
            if self.inner.registry.contains(&key) {
                recognized.insert(key, value);
            } else {
                unrecognized.insert(key, value);
            }
        }

        let mut instance = Instance::new(self.clone());

        if !positional.is_empty() || !unrecognized.is_empty() {
            match self.base_constructor() {
                Some(base) => base(&mut instance, &positional, &unrecognized)?,
                None => {
                    return Err(PropertyError::forwarding(
                        &self.inner.name,
                        positional.len(),
                        unrecognized.keys().cloned().collect(),
                    ))
                }
            }
        }

        for definition in &definitions {
            if let Some(value) = recognized.swap_remove(definition.name()) {
                definition.set(&mut instance, value)?;
            }
        }

        configure(&mut instance)?;

        for definition in &definitions {
            definition.set_default(&mut instance)?;
        }

        let missing: Vec<String> = definitions
            .iter()
            .filter(|d| d.missing(&instance))
            .map(|d| d.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PropertyError::initialization(&self.inner.name, missing));
        }

        Ok(instance)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("properties", &self.inner.registry.len())
            .finish()
    }
}
