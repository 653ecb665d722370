//! # Modules
//!
//! A module is a named bundle of datatypes loaded from a declarative
//! definition:
//!
//! ```yaml
//! name: accounts
//! ns: acct                 # optional, defaults to the name
//! description: Account datatypes
//! messages:                # optional per-constraint templates
//!   length_min: "{value} is too short"
//! datatypes:
//!   username: {type: string, length_min: 3}
//!   contact: {type: dict, fields: {email: "common:email"}}
//! ```
//!
//! Loading builds a registry namespaced after the module, links the common
//! datatypes under `common`, registers the whole batch, and then verifies
//! that every extension reference resolves. A module is read-only once
//! loaded, apart from linking further modules.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use shape_core::{DefinitionError, LookupError, ShapeError};
use shape_schema::{Datatype, Registry};

use crate::error::ModuleError;
use crate::source::{self, ModuleSource};

#[derive(Debug, Deserialize)]
pub(crate) struct ModuleDefinition {
    pub name: String,
    #[serde(default)]
    pub ns: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
    pub datatypes: Map<String, Value>,
}

/// Deserialize a definition shape, reporting failures as malformed modules.
pub(crate) fn parse_shape<T: serde::de::DeserializeOwned>(definition: &Value) -> Result<T, ModuleError> {
    serde_json::from_value(definition.clone()).map_err(|e| {
        ModuleError::from(ShapeError::from(DefinitionError::MalformedModule {
            reason: e.to_string(),
        }))
    })
}

/// A loaded module.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    namespace: String,
    description: Option<String>,
    registry: Registry,
}

impl Module {
    /// Load a module from an in-memory definition.
    pub fn from_definition(definition: &Value) -> Result<Self, ModuleError> {
        Self::load(definition, &[])
    }

    /// Load a module from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ModuleError> {
        Self::from_definition(&source::parse_yaml(text)?)
    }

    /// Load a module from a YAML or JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ModuleError> {
        Self::from_definition(&source::read_definition(path)?)
    }

    pub(crate) fn load(definition: &Value, dependencies: &[&Module]) -> Result<Self, ModuleError> {
        let shape: ModuleDefinition = parse_shape(definition)?;
        let namespace = shape.ns.clone().unwrap_or_else(|| shape.name.clone());

        let registry = Registry::with_namespace(namespace.clone());
        registry.link_common()?;
        for dependency in dependencies {
            registry.link(dependency.namespace.clone(), &dependency.registry);
        }
        for (constraint, template) in &shape.messages {
            registry.set_message(constraint.clone(), template.clone());
        }
        registry.define_many(&shape.datatypes)?;

        tracing::debug!(
            module = %shape.name,
            namespace = %namespace,
            datatypes = registry.len(),
            "loaded module"
        );

        Ok(Self {
            name: shape.name,
            namespace,
            description: shape.description,
            registry,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace datatypes of this module answer to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The module's registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve a datatype by plain or prefixed name.
    pub fn get(&self, name: &str) -> Result<Arc<Datatype>, LookupError> {
        self.registry.get(name)
    }

    /// Names of the module's own datatypes, sorted.
    pub fn datatype_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Make `other`'s datatypes reachable as `other_namespace:name`.
    ///
    /// The link is weak: `other` must stay loaded for as long as this module
    /// resolves names through it.
    pub fn link(&self, other: &Module) -> &Self {
        if self.registry.prefixes().contains(&other.namespace) {
            tracing::warn!(
                module = %self.name,
                prefix = %other.namespace,
                "replacing linked module"
            );
        }
        self.registry.link(other.namespace.clone(), &other.registry);
        self
    }

    /// Check that every datatype in the module resolves.
    pub fn verify(&self) -> Result<(), ShapeError> {
        self.registry.verify()
    }

    /// Validate `value` against a named datatype; failures become `Ok(false)`.
    pub fn fulfill(&self, value: &Value, datatype: &str) -> Result<bool, ShapeError> {
        self.registry.fulfill(value, datatype)
    }

    /// Validate `value` against a named datatype and return it.
    pub fn guard<'v>(&self, value: &'v Value, datatype: &str) -> Result<&'v Value, ShapeError> {
        self.registry.guard(value, datatype)
    }
}

/// Load a module from a definition value or a file.
pub fn load_module(source: impl Into<ModuleSource>) -> Result<Module, ModuleError> {
    Module::from_definition(&source.into().into_definition()?)
}

/// Load a module whose datatypes reference other, already loaded modules.
///
/// Each dependency is linked under its namespace before the datatypes are
/// defined, so `dep_ns:name` references resolve at load time. Dependencies
/// must outlive the returned module.
pub fn load_module_with(
    source: impl Into<ModuleSource>,
    dependencies: &[&Module],
) -> Result<Module, ModuleError> {
    Module::load(&source.into().into_definition()?, dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn accounts() -> Value {
        json!({
            "name": "accounts",
            "ns": "acct",
            "description": "Account datatypes",
            "datatypes": {
                "username": {"type": "string", "length_min": 3},
                "contact": {"type": "dict", "fields": {"email": "common:email", "user": "username"}},
            },
        })
    }

    #[test]
    fn test_load_module() {
        let module = Module::from_definition(&accounts()).unwrap();
        assert_eq!(module.name(), "accounts");
        assert_eq!(module.namespace(), "acct");
        assert_eq!(module.description(), Some("Account datatypes"));
        assert_eq!(module.datatype_names(), vec!["contact", "username"]);
        assert!(module.fulfill(&json!("alice"), "username").unwrap());
        assert!(module.fulfill(&json!("alice"), "acct:username").unwrap());
        assert!(!module
            .fulfill(&json!({"email": "x", "user": "alice"}), "contact")
            .unwrap());
    }

    #[test]
    fn test_namespace_defaults_to_name() {
        let module = Module::from_definition(&json!({"name": "m", "datatypes": {}})).unwrap();
        assert_eq!(module.namespace(), "m");
    }

    #[test]
    fn test_malformed_module() {
        for definition in [json!({"datatypes": {}}), json!({"name": "m"}), json!([1])] {
            let err = Module::from_definition(&definition).unwrap_err();
            assert!(
                matches!(
                    err,
                    ModuleError::Shape(ShapeError::Definition(
                        DefinitionError::MalformedModule { .. }
                    ))
                ),
                "{definition}: {err}"
            );
        }
    }

    #[test]
    fn test_dangling_reference_fails_at_load() {
        let err = Module::from_definition(&json!({
            "name": "m",
            "datatypes": {"x": {"type": "missing"}},
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Shape(ShapeError::Definition(DefinitionError::UnresolvedBase { .. }))
        ));
    }

    #[test]
    fn test_messages_apply_to_module_datatypes() {
        let module = Module::from_definition(&json!({
            "name": "m",
            "messages": {"length_min": "{value} is too short"},
            "datatypes": {"code": {"type": "string", "length_min": 3}},
        }))
        .unwrap();
        let err = module.guard(&json!("ab"), "code").unwrap_err();
        assert_eq!(err.as_validation().unwrap().message, "ab is too short");
    }

    #[test]
    fn test_link_modules() {
        let base = Module::from_definition(&accounts()).unwrap();
        let app = load_module_with(
            json!({
                "name": "app",
                "datatypes": {"owner": {"type": "acct:username", "length_max": 8}},
            }),
            &[&base],
        )
        .unwrap();
        assert!(app.fulfill(&json!("alice"), "owner").unwrap());
        assert!(!app.fulfill(&json!("al"), "owner").unwrap());
        assert!(!app.fulfill(&json!("alexander"), "owner").unwrap());

        let late = Module::from_definition(&json!({"name": "late", "datatypes": {}})).unwrap();
        late.link(&base);
        assert!(late.fulfill(&json!("alice"), "acct:username").unwrap());
    }
}
