//! Instances: per-object storage slots and dispatch accessors
//!
//! An [`Instance`] holds one slot per property definition, absent until first
//! written. All access is registry-driven dispatch by name: reads resolve
//! the property name or its reader alias, writes route through the full rule
//! pipeline.
//!
//! Reading or writing a name no property claims, or writing a read-only
//! property, panics: like referencing a missing accessor method, that is a
//! programming mistake, not a validation failure.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::PropertyResult;
use crate::model::Model;
use crate::property::Definition;

static ABSENT: Value = Value::Null;

/// One configured object: a model reference plus its storage slots
#[derive(Clone)]
pub struct Instance {
    model: Model,
    slots: HashMap<String, Value>,
}

impl Instance {
    pub(crate) fn new(model: Model) -> Self {
        Self {
            model,
            slots: HashMap::new(),
        }
    }

    /// The model this instance was constructed from
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The model name, used in error messages
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Reads a property by name or reader alias; null when never written.
    ///
    /// # Panics
    ///
    /// Panics when no property claims the name.
    pub fn get(&self, name: &str) -> Value {
        self.resolve(name).get(self)
    }

    /// Writes a property through its rule pipeline.
    ///
    /// # Panics
    ///
    /// Panics when no property claims the name or the property is read-only.
    pub fn set(&mut self, name: &str, value: Value) -> PropertyResult<()> {
        let definition = self.resolve(name);
        if !definition.writable() {
            panic!(
                "{} does not allow writing the read-only property '{}'",
                self.model_name(),
                definition.name()
            );
        }
        definition.set(self, value)
    }

    /// Whether the named property holds a present value
    pub fn is_present(&self, name: &str) -> bool {
        self.resolve(name).present(self)
    }

    /// Property name → current value, in enumeration order
    pub fn to_map(&self) -> IndexMap<String, Value> {
        self.model
            .registry()
            .definitions()
            .iter()
            .map(|d| (d.name().to_string(), d.get(self)))
            .collect()
    }

    fn resolve(&self, name: &str) -> Arc<Definition> {
        let registry = self.model.registry();
        registry
            .get(name)
            .or_else(|| registry.get_by_reader(name))
            .unwrap_or_else(|| {
                panic!("{} has no property '{}'", self.model_name(), name)
            })
    }

    pub(crate) fn read_slot(&self, storage_key: &str) -> Option<&Value> {
        self.slots.get(storage_key)
    }

    pub(crate) fn write_slot(&mut self, storage_key: &str, value: Value) {
        self.slots.insert(storage_key.to_string(), value);
    }
}

impl Index<&str> for Instance {
    type Output = Value;

    /// Read-only indexed access: `instance["title"]`
    fn index(&self, name: &str) -> &Value {
        let definition = self.resolve(name);
        self.slots
            .get(definition.storage_key())
            .unwrap_or(&ABSENT)
    }
}

/// Two instances are equal when they share a model name and every property
/// resolves to the same value. Unwritten slots compare as null, so an
/// explicitly assigned null equals a never-written slot.
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.model_name() == other.model_name() && self.to_map() == other.to_map()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.model_name())
            .field("slots", &self.slots)
            .finish()
    }
}

/// An explicit per-field accessor handle bound to one definition.
///
/// Obtained from [`Model::accessor`]; avoids name resolution on every access.
#[derive(Debug, Clone)]
pub struct Accessor {
    definition: Arc<Definition>,
}

impl Accessor {
    pub(crate) fn new(definition: Arc<Definition>) -> Self {
        Self { definition }
    }

    /// The property name this accessor is bound to
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Reads the property; null when never written
    pub fn get(&self, instance: &Instance) -> Value {
        self.definition.get(instance)
    }

    /// Writes the property through its rule pipeline.
    ///
    /// # Panics
    ///
    /// Panics when the property is read-only.
    pub fn set(&self, instance: &mut Instance, value: Value) -> PropertyResult<()> {
        if !self.definition.writable() {
            panic!(
                "{} does not allow writing the read-only property '{}'",
                instance.model_name(),
                self.definition.name()
            );
        }
        self.definition.set(instance, value)
    }
}
