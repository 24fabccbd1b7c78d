//! Hierarchical property registry
//!
//! One registry exists per schema-bearing model. Each registry keeps:
//! - `own`: the definitions declared directly on its model
//! - `merged`: the live inherited view (ancestor definitions first, own
//!   definitions winning on name collision)
//! - weak links to child registries
//!
//! The merged view is maintained by push-based propagation, never by
//! re-walking the ancestry on lookup: registering a child seeds its merged
//! view with a snapshot, and every later declaration on an ancestor is pushed
//! depth-first to all live descendants together with the position the name
//! occupies in the pushing registry's merged view, so all merged views in a
//! hierarchy stay order-aligned. A descendant whose own definitions shadow
//! the name keeps its override and stops the push there.
//!
//! Enumeration order is insertion order across the union: ancestor-declared
//! names first, and an override keeps the original position of the name it
//! replaces. A descendant's merged view is always its parent's merged view
//! followed by its own non-shadowing declarations.
//!
//! Declarations for one hierarchy must be serialized by the caller; this is
//! a documented precondition, matching the declaration-at-load-time usage
//! pattern. Reads are safe alongside the single declaring thread.

use std::sync::{Arc, RwLock, Weak};

use indexmap::IndexMap;
use log::{debug, trace};

use crate::property::Definition;

/// The per-model collection of property definitions, inheritance-aware
pub struct Registry {
    inner: RwLock<RegistryInner>,
}

struct RegistryInner {
    own: IndexMap<String, Arc<Definition>>,
    merged: IndexMap<String, Arc<Definition>>,
    parent: Option<Weak<Registry>>,
    children: Vec<Weak<Registry>>,
}

impl Registry {
    /// Creates a root registry with no parent
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(RegistryInner {
                own: IndexMap::new(),
                merged: IndexMap::new(),
                parent: None,
                children: Vec::new(),
            }),
        })
    }

    /// Creates a child registry and registers it with its parent.
    ///
    /// The child's merged view is immediately seeded with a snapshot of the
    /// parent's; later declarations on the parent arrive incrementally.
    pub fn new_child(parent: &Arc<Registry>) -> Arc<Self> {
        let snapshot = parent.read().merged.clone();
        let seeded = snapshot.len();
        let child = Arc::new(Self {
            inner: RwLock::new(RegistryInner {
                own: IndexMap::new(),
                merged: snapshot,
                parent: Some(Arc::downgrade(parent)),
                children: Vec::new(),
            }),
        });

        let mut inner = parent.write();
        inner.children.retain(|c| c.strong_count() > 0);
        inner.children.push(Arc::downgrade(&child));
        drop(inner);

        trace!(
            "registered child registry seeded with {} inherited definition(s)",
            seeded
        );
        child
    }

    /// Inserts a definition declared directly on this registry's model and
    /// pushes it to every live descendant, depth-first.
    ///
    /// Re-declaring an existing name replaces the definition in place, so an
    /// override keeps the original enumeration position.
    pub fn declare(self: &Arc<Self>, definition: Arc<Definition>) {
        let name = definition.name().to_string();
        let (at, children) = {
            let mut inner = self.write();
            inner.own.insert(name.clone(), definition.clone());
            // in place for overrides, appended otherwise
            inner.merged.insert(name.clone(), definition.clone());
            let at = inner
                .merged
                .get_index_of(&name)
                .expect("definition just inserted");
            (at, inner.live_children())
        };

        debug!("declared property '{}', pushing to {} child(ren)", name, children.len());
        for child in children {
            child.inherit(definition.clone(), at);
        }
    }

    /// Receives a definition pushed down from an ancestor, together with the
    /// position the name occupies in the ancestor's merged view. A merged
    /// view is always its parent's merged view followed by own declarations,
    /// so splicing a new name at that same position keeps the views aligned.
    fn inherit(self: &Arc<Self>, definition: Arc<Definition>, at: usize) {
        let name = definition.name().to_string();
        let (at, children) = {
            let mut inner = self.write();
            if inner.own.contains_key(&name) {
                // this registry's own definition shadows the ancestor's;
                // descendants already see the shadowing definition
                trace!("inherited property '{}' shadowed by own definition", name);
                return;
            }
            let at = match inner.merged.get_index_of(&name) {
                Some(existing) => {
                    inner.merged.insert(name.clone(), definition.clone());
                    existing
                }
                None => {
                    inner.merged.shift_insert(at, name.clone(), definition.clone());
                    at
                }
            };
            (at, inner.live_children())
        };

        for child in children {
            child.inherit(definition.clone(), at);
        }
    }

    /// Looks up a definition by property name in the merged view
    pub fn get(&self, name: &str) -> Option<Arc<Definition>> {
        self.read().merged.get(name).cloned()
    }

    /// Looks up a definition by reader accessor name
    pub fn get_by_reader(&self, reader: &str) -> Option<Arc<Definition>> {
        self.read()
            .merged
            .values()
            .find(|d| d.reader() == reader)
            .cloned()
    }

    /// Whether the merged view contains the property name
    pub fn contains(&self, name: &str) -> bool {
        self.read().merged.contains_key(name)
    }

    /// Property names in enumeration order
    pub fn names(&self) -> Vec<String> {
        self.read().merged.keys().cloned().collect()
    }

    /// Definitions in enumeration order
    pub fn definitions(&self) -> Vec<Arc<Definition>> {
        self.read().merged.values().cloned().collect()
    }

    /// Number of properties in the merged view
    pub fn len(&self) -> usize {
        self.read().merged.len()
    }

    /// Whether the merged view is empty
    pub fn is_empty(&self) -> bool {
        self.read().merged.is_empty()
    }

    /// Whether this registry descends from another registry
    pub fn has_parent(&self) -> bool {
        self.read().parent.is_some()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().expect("registry lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().expect("registry lock poisoned")
    }
}

impl RegistryInner {
    fn live_children(&mut self) -> Vec<Arc<Registry>> {
        self.children.retain(|c| c.strong_count() > 0);
        self.children.iter().filter_map(Weak::upgrade).collect()
    }
}
