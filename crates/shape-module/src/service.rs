//! # Services and Actions
//!
//! A service is a module plus an `interface` of named actions:
//!
//! ```yaml
//! name: sample
//! datatypes:
//!   sampleID: {type: string, length_min: 5}
//! interface:
//!   sample_action:
//!     description: Sample action with parameters
//!     request:
//!       method: GET
//!       url: /sample/
//!       params: {id: sampleID}
//!     response:
//!       text: {type: string}
//! ```
//!
//! Each parameter names a datatype of the module (or any linked module) or
//! carries an inline definition. An action validates every named argument
//! before its handler runs; dispatch itself is up to the caller.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use shape_core::ShapeError;
use shape_schema::{Datatype, Registry};

use crate::error::{ActionError, ModuleError};
use crate::module::{parse_shape, Module};
use crate::source::ModuleSource;

#[derive(Debug, Deserialize)]
struct ServiceDefinition {
    interface: BTreeMap<String, ActionDefinition>,
}

#[derive(Debug, Deserialize)]
struct ActionDefinition {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    request: RequestDefinition,
    #[serde(default)]
    response: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RequestDefinition {
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    params: Map<String, Value>,
}

/// A named action parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub datatype: Arc<Datatype>,
}

/// A validated call boundary.
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    qualified_name: String,
    description: Option<String>,
    method: Option<String>,
    url: Option<String>,
    params: Vec<Param>,
    response: Option<Arc<Datatype>>,
}

impl Action {
    fn build(
        namespace: &str,
        name: &str,
        definition: ActionDefinition,
        registry: &Registry,
    ) -> Result<Self, ShapeError> {
        let params = definition
            .request
            .params
            .iter()
            .map(|(param, declared)| {
                Ok(Param {
                    name: param.clone(),
                    datatype: param_datatype(registry, declared)?,
                })
            })
            .collect::<Result<Vec<_>, ShapeError>>()?;

        let response = definition
            .response
            .as_ref()
            .map(|declared| response_datatype(registry, declared))
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            qualified_name: format!("{namespace}.{name}"),
            description: definition.description,
            method: definition.request.method,
            url: definition.request.url,
            params,
            response,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `namespace.action`, the name a dispatcher looks actions up by.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Declared parameters, sorted by name.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn response(&self) -> Option<&Arc<Datatype>> {
        self.response.as_ref()
    }

    /// Validate named arguments against the declared parameters.
    ///
    /// Unknown names are rejected. A parameter that was not supplied is
    /// checked as `null`, so only `maybe` (or `none`) parameters may be
    /// omitted.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<(), ActionError> {
        if let Some(unexpected) = args.keys().find(|k| self.param(k).is_none()) {
            return Err(ActionError::UnexpectedArgument {
                action: self.qualified_name.clone(),
                argument: unexpected.clone(),
            });
        }

        for param in &self.params {
            let argument_error = |source| ActionError::Argument {
                action: self.qualified_name.clone(),
                argument: param.name.clone(),
                source,
            };
            match args.get(&param.name) {
                Some(value) => {
                    param.datatype.guard(value).map_err(argument_error)?;
                }
                None => {
                    if !param.datatype.fulfill(&Value::Null).map_err(argument_error)? {
                        return Err(ActionError::MissingArgument {
                            action: self.qualified_name.clone(),
                            argument: param.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate `args`, then run `handler` with them.
    pub fn invoke<T>(
        &self,
        args: &Map<String, Value>,
        handler: impl FnOnce(&Map<String, Value>) -> T,
    ) -> Result<T, ActionError> {
        self.validate(args)?;
        tracing::debug!(action = %self.qualified_name, "invoking action");
        Ok(handler(args))
    }

    /// Validate a handler's response against the declared response shape.
    ///
    /// Actions without a response shape accept anything.
    pub fn check_response<'v>(&self, response: &'v Value) -> Result<&'v Value, ActionError> {
        match &self.response {
            Some(datatype) => datatype
                .guard(response)
                .map_err(|source| ActionError::Response {
                    action: self.qualified_name.clone(),
                    source,
                }),
            None => Ok(response),
        }
    }
}

fn param_datatype(registry: &Registry, definition: &Value) -> Result<Arc<Datatype>, ShapeError> {
    match definition {
        Value::String(name) => Ok(registry.get(name)?),
        definition => registry.define(definition),
    }
}

/// A response map without a `type` key is shorthand for a dict of fields.
fn response_datatype(registry: &Registry, definition: &Value) -> Result<Arc<Datatype>, ShapeError> {
    match definition {
        Value::Object(fields) if !fields.contains_key("type") => {
            registry.define(&serde_json::json!({"type": "dict", "fields": fields}))
        }
        other => param_datatype(registry, other),
    }
}

/// A module with an interface of actions.
#[derive(Debug, Clone)]
pub struct Service {
    module: Module,
    actions: BTreeMap<String, Action>,
}

impl Service {
    /// Load a service from an in-memory definition.
    pub fn from_definition(definition: &Value) -> Result<Self, ModuleError> {
        let module = Module::from_definition(definition)?;
        let shape: ServiceDefinition = parse_shape(definition)?;

        let mut actions = BTreeMap::new();
        for (name, action) in shape.interface {
            let built = Action::build(module.namespace(), &name, action, module.registry())?;
            actions.insert(name, built);
        }

        tracing::debug!(
            service = %module.name(),
            actions = actions.len(),
            "loaded service"
        );
        Ok(Self { module, actions })
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn actions(&self) -> &BTreeMap<String, Action> {
        &self.actions
    }

    /// Validate `args` for the named action and run `handler`.
    pub fn call<T>(
        &self,
        action: &str,
        args: &Map<String, Value>,
        handler: impl FnOnce(&Map<String, Value>) -> T,
    ) -> Result<T, ActionError> {
        let found = self
            .action(action)
            .ok_or_else(|| ActionError::UnknownAction {
                service: self.module.name().to_string(),
                action: action.to_string(),
            })?;
        found.invoke(args, handler)
    }
}

impl Deref for Service {
    type Target = Module;

    fn deref(&self) -> &Module {
        &self.module
    }
}

/// Load a service from a definition value or a file.
pub fn load_service(source: impl Into<ModuleSource>) -> Result<Service, ModuleError> {
    Service::from_definition(&source.into().into_definition()?)
}
