//! # Registry
//!
//! A named, namespaced collection of datatypes. Registries resolve names in
//! three steps:
//!
//! 1. An exact local name.
//! 2. `prefix:rest` where `prefix` is the registry's own namespace: `rest`
//!    is resolved locally.
//! 3. `prefix:rest` where `prefix` is a linked alias: `rest` is resolved in
//!    the linked registry, which may continue through its own links.
//!
//! ## Sharing
//!
//! [`Registry`] is a cheap handle around shared state. Datatypes hold a weak
//! reference back to the registry that compiled them, which is how extended
//! datatypes find their base and how error messages find their overrides.
//! Links are weak as well, so registries that link each other (or
//! themselves) are still freed. Locks are never held while resolving through
//! a linked registry.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use shape_core::{DefinitionError, Kind, LookupError, ShapeError};

use crate::datatype::{self, Datatype};
use crate::defaults::{self, COMMON_PREFIX};

#[derive(Default)]
pub(crate) struct RegistryInner {
    namespace: Option<String>,
    datatypes: RwLock<HashMap<String, Arc<Datatype>>>,
    links: RwLock<BTreeMap<String, Weak<RegistryInner>>>,
    counters: Mutex<HashMap<Kind, usize>>,
    messages: RwLock<HashMap<String, String>>,
}

/// A shared handle to a datatype registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// An empty registry with no namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry that also answers to `namespace:` prefixes.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                namespace: Some(namespace.into()),
                ..RegistryInner::default()
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<RegistryInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.inner.namespace.as_deref()
    }

    /// Compile a definition without registering it.
    ///
    /// The result is verified, so a base that does not resolve fails here
    /// with [`DefinitionError::UnresolvedBase`].
    pub fn define(&self, definition: &Value) -> Result<Arc<Datatype>, ShapeError> {
        let datatype = Arc::new(datatype::compile(self, definition, None)?);
        datatype.verify()?;
        Ok(datatype)
    }

    /// Compile a definition and register it under `name`.
    ///
    /// Bases are not checked, so a datatype may name one that is defined
    /// later. Call [`Registry::verify`] once the registry is complete.
    pub fn define_named(
        &self,
        name: &str,
        definition: &Value,
    ) -> Result<Arc<Datatype>, DefinitionError> {
        let datatype = Arc::new(datatype::compile(self, definition, Some(name))?);
        self.insert(name.to_string(), Arc::clone(&datatype));
        Ok(datatype)
    }

    /// Compile, register and verify a batch of named definitions.
    ///
    /// Members may reference each other in any order. If any definition fails
    /// to compile or resolve, the batch is rolled back and the registry is
    /// left as it was.
    pub fn define_many(&self, definitions: &Map<String, Value>) -> Result<&Self, ShapeError> {
        let compiled = definitions
            .iter()
            .map(|(name, definition)| {
                datatype::compile(self, definition, Some(name))
                    .map(|dt| (name.clone(), Arc::new(dt)))
            })
            .collect::<Result<Vec<_>, DefinitionError>>()?;

        let mut previous = Vec::with_capacity(compiled.len());
        {
            let mut datatypes = self.inner.datatypes.write();
            for (name, datatype) in &compiled {
                let old = datatypes.insert(name.clone(), Arc::clone(datatype));
                previous.push((name.clone(), old));
            }
        }

        if let Err(e) = compiled.iter().try_for_each(|(_, datatype)| datatype.verify()) {
            let mut datatypes = self.inner.datatypes.write();
            for (name, old) in previous {
                match old {
                    Some(datatype) => datatypes.insert(name, datatype),
                    None => datatypes.remove(&name),
                };
            }
            return Err(e);
        }

        for (name, old) in &previous {
            if old.is_some() {
                tracing::warn!(datatype = %name, "datatype redefined");
            }
        }
        let count = compiled.len();
        tracing::debug!(
            namespace = self.namespace().unwrap_or("-"),
            count,
            "defined datatypes"
        );
        Ok(self)
    }

    fn insert(&self, name: String, datatype: Arc<Datatype>) {
        let previous = self.inner.datatypes.write().insert(name.clone(), datatype);
        if previous.is_some() {
            tracing::warn!(datatype = %name, "datatype redefined");
        }
    }

    /// Resolve a datatype by plain or prefixed name.
    pub fn get(&self, name: &str) -> Result<Arc<Datatype>, LookupError> {
        if let Some(datatype) = self.inner.datatypes.read().get(name) {
            return Ok(Arc::clone(datatype));
        }
        let Some((prefix, rest)) = name.split_once(':') else {
            return Err(LookupError::UnknownDatatype {
                name: name.to_string(),
            });
        };
        if self.namespace() == Some(prefix) {
            return self.get(rest);
        }
        let linked = self.inner.links.read().get(prefix).cloned();
        match linked {
            Some(weak) => match weak.upgrade() {
                Some(inner) => Registry::from_inner(inner).get(rest),
                None => Err(LookupError::DetachedRegistry {
                    datatype: name.to_string(),
                }),
            },
            None => Err(LookupError::UnknownPrefix {
                prefix: prefix.to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Make `other` reachable as `prefix:name`.
    ///
    /// The link does not keep `other` alive. Once every handle to it is
    /// dropped, `prefix:` names fail with [`LookupError::DetachedRegistry`].
    pub fn link(&self, prefix: impl Into<String>, other: &Registry) -> &Self {
        let prefix = prefix.into();
        tracing::debug!(
            namespace = self.namespace().unwrap_or("-"),
            prefix = %prefix,
            "linked registry"
        );
        self.inner.links.write().insert(prefix, other.downgrade());
        self
    }

    /// Link the shared built-in registry under [`COMMON_PREFIX`].
    pub fn link_common(&self) -> Result<&Self, ShapeError> {
        let common = defaults::common()?;
        Ok(self.link(COMMON_PREFIX, &common))
    }

    /// Returns true if `name` is registered locally.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.datatypes.read().contains_key(name)
    }

    /// Locally registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.datatypes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Linked prefixes, sorted.
    pub fn prefixes(&self) -> Vec<String> {
        self.inner.links.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.datatypes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.datatypes.read().is_empty()
    }

    /// Override the message template for a constraint name.
    ///
    /// Applies to every datatype compiled in this registry, including the
    /// synthetic `type` and `integer` checks.
    pub fn set_message(&self, constraint: impl Into<String>, template: impl Into<String>) -> &Self {
        self.inner
            .messages
            .write()
            .insert(constraint.into(), template.into());
        self
    }

    /// The override for a constraint name, if one was set.
    pub fn message(&self, constraint: &str) -> Option<String> {
        self.inner.messages.read().get(constraint).cloned()
    }

    /// Resolve every registered datatype and its nested datatypes.
    ///
    /// Surfaces dangling references and illegal extension overlays eagerly
    /// instead of at first use.
    pub fn verify(&self) -> Result<(), ShapeError> {
        let datatypes: Vec<Arc<Datatype>> =
            self.inner.datatypes.read().values().cloned().collect();
        for datatype in datatypes {
            datatype.verify()?;
        }
        Ok(())
    }

    /// Validate `value` against the named datatype; failures become `Ok(false)`.
    pub fn fulfill(&self, value: &Value, name: &str) -> Result<bool, ShapeError> {
        self.get(name)?.fulfill(value)
    }

    /// Validate `value` against the named datatype and return it.
    pub fn guard<'v>(&self, value: &'v Value, name: &str) -> Result<&'v Value, ShapeError> {
        self.get(name)?.guard(value)
    }

    pub(crate) fn next_name(&self, kind: Kind) -> String {
        let mut counters = self.inner.counters.lock();
        let n = counters.entry(kind).or_insert(0);
        *n += 1;
        format!("{kind}_{n}")
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("namespace", &self.namespace())
            .field("datatypes", &self.names())
            .field("links", &self.prefixes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definitions(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not a map: {other}"),
        }
    }

    #[test]
    fn test_define_many_and_get() {
        let registry = Registry::new();
        registry
            .define_many(&definitions(json!({
                "sample1": {"type": "string", "length": 3},
                "sample2": {"type": "sample1"},
            })))
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("sample1"));
        assert_eq!(registry.get("sample2").unwrap().extends(), Some("sample1"));
    }

    #[test]
    fn test_define_many_is_all_or_nothing() {
        let registry = Registry::new();
        let err = registry
            .define_many(&definitions(json!({
                "good": {"type": "string"},
                "bad": {"type": "string", "gt": 1},
            })))
            .unwrap_err();
        assert!(matches!(
            err,
            ShapeError::Definition(DefinitionError::UnsupportedConstraint { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_define_many_rolls_back_unresolved_bases() {
        let registry = Registry::new();
        registry.define_named("kept", &json!({"type": "string"})).unwrap();
        let err = registry
            .define_many(&definitions(json!({
                "kept": {"type": "integer"},
                "fresh": {"type": "string"},
                "orphan": {"type": "nosuch"},
            })))
            .unwrap_err();
        assert!(matches!(
            err,
            ShapeError::Definition(DefinitionError::UnresolvedBase { ref base, .. }) if base == "nosuch"
        ));
        assert_eq!(registry.names(), vec!["kept".to_string()]);
        assert_eq!(registry.get("kept").unwrap().kind(), Kind::String);
    }

    #[test]
    fn test_define_checks_bases_but_define_named_defers() {
        let registry = Registry::new();
        let err = registry.define(&json!({"type": "later"})).unwrap_err();
        assert!(matches!(
            err,
            ShapeError::Definition(DefinitionError::UnresolvedBase { .. })
        ));

        registry.define_named("early", &json!({"type": "later"})).unwrap();
        assert!(registry.verify().is_err());
        registry.define_named("later", &json!({"type": "boolean"})).unwrap();
        registry.verify().unwrap();
        assert!(registry.fulfill(&json!(true), "early").unwrap());
    }

    #[test]
    fn test_unknown_names() {
        let registry = Registry::new();
        assert_eq!(
            registry.get("missing").unwrap_err(),
            LookupError::UnknownDatatype {
                name: "missing".to_string()
            }
        );
        assert_eq!(
            registry.get("a:sometype").unwrap_err(),
            LookupError::UnknownPrefix {
                prefix: "a".to_string(),
                name: "a:sometype".to_string()
            }
        );
    }

    #[test]
    fn test_own_namespace_prefix_resolves_locally() {
        let registry = Registry::with_namespace("shop");
        registry
            .define_named("sku", &json!({"type": "string"}))
            .unwrap();
        assert_eq!(registry.get("shop:sku").unwrap().name(), "sku");
    }

    #[test]
    fn test_links_chain() {
        let a = Registry::with_namespace("a");
        let b = Registry::with_namespace("b");
        b.define_named("inner", &json!({"type": "integer"})).unwrap();
        a.link("b", &b);
        let root = Registry::new();
        root.link("a", &a);
        assert_eq!(root.get("a:b:inner").unwrap().name(), "inner");
        assert_eq!(root.prefixes(), vec!["a".to_string()]);
    }

    #[test]
    fn test_self_link_does_not_deadlock() {
        let registry = Registry::new();
        registry.link("me", &registry);
        registry.define_named("x", &json!({"type": "none"})).unwrap();
        assert!(registry.get("me:me:x").is_ok());
    }

    #[test]
    fn test_links_do_not_keep_registries_alive() {
        let a = Registry::with_namespace("a");
        let b = Registry::with_namespace("b");
        a.link("b", &b).link("a", &a);
        b.link("a", &a);
        let weak_a = a.downgrade();
        let weak_b = b.downgrade();
        drop(a);
        drop(b);
        assert!(weak_a.upgrade().is_none());
        assert!(weak_b.upgrade().is_none());
    }

    #[test]
    fn test_dropped_link_is_detached() {
        let root = Registry::new();
        {
            let other = Registry::with_namespace("other");
            other.define_named("x", &json!({"type": "string"})).unwrap();
            root.link("other", &other);
            assert!(root.get("other:x").is_ok());
        }
        assert_eq!(
            root.get("other:x").unwrap_err(),
            LookupError::DetachedRegistry {
                datatype: "other:x".to_string()
            }
        );
    }

    #[test]
    fn test_verify_reports_dangling_reference() {
        let registry = Registry::new();
        registry
            .define_named("broken", &json!({"type": "list", "items": "nowhere"}))
            .unwrap();
        let err = registry.verify().unwrap_err();
        assert!(matches!(
            err,
            ShapeError::Definition(DefinitionError::UnresolvedBase {
                source: LookupError::UnknownDatatype { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_verify_terminates_on_recursive_types() {
        let registry = Registry::new();
        registry
            .define_named(
                "tree",
                &json!({"type": "dict", "fields": {"children": {"type": "list", "items": "tree"}}}),
            )
            .unwrap();
        registry.verify().unwrap();
        let value = json!({"children": [{"children": []}, {"children": [{}]}]});
        assert!(registry.fulfill(&value, "tree").unwrap());
        assert!(!registry.fulfill(&json!({"children": [1]}), "tree").unwrap());
    }

    #[test]
    fn test_detached_registry() {
        let datatype = {
            let registry = Registry::new();
            registry.define_named("base", &json!({"type": "string"})).unwrap();
            registry.define(&json!({"type": "base"})).unwrap()
        };
        let err = datatype.fulfill(&json!("x")).unwrap_err();
        assert!(matches!(
            err,
            ShapeError::Lookup(LookupError::DetachedRegistry { .. })
        ));
    }

    #[test]
    fn test_redefinition_replaces() {
        let registry = Registry::new();
        registry.define_named("x", &json!({"type": "string"})).unwrap();
        registry.define_named("x", &json!({"type": "integer"})).unwrap();
        assert_eq!(registry.get("x").unwrap().kind(), Kind::Integer);
        assert_eq!(registry.len(), 1);
    }
}
