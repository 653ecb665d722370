//! # shape-module: Modules, Services and Action Boundaries
//!
//! Loads declarative bundles of datatypes (modules) from JSON values or
//! YAML/JSON files, and services that add an `interface` of actions whose
//! arguments are validated before a handler runs.
//!
//! ## Loading
//!
//! 1. Parse the file (YAML by extension, otherwise JSON) into a
//!    `serde_json::Value`.
//! 2. Check the module shape: `name` and `datatypes` are required.
//! 3. Build a registry namespaced after `ns` (or `name`), link the common
//!    datatypes and any dependencies, apply `messages` overrides.
//! 4. Register every datatype as one batch and verify all references.
//!
//! Steps 2–4 fail with [`ModuleError::Shape`]; nothing is returned from a
//! partially loaded definition.

pub mod error;
pub mod module;
pub mod service;
pub mod source;

pub use error::{ActionError, ModuleError};
pub use module::{load_module, load_module_with, Module};
pub use service::{load_service, Action, Param, Service};
pub use source::{read_definition, yaml_to_json_value, ModuleSource};
