//! # shape-schema: Datatype Compilation and Validation
//!
//! Compiles datatype definitions into immutable [`Datatype`] nodes and
//! validates `serde_json::Value`s against them.
//!
//! ## Usage
//!
//! ```
//! use serde_json::json;
//!
//! let username = shape_schema::define(&json!({
//!     "type": "string",
//!     "length_min": 3,
//!     "length_max": 16,
//! }))?;
//! assert!(shape_schema::fulfill(&json!("alice"), &username)?);
//! assert!(!shape_schema::fulfill(&json!("al"), &username)?);
//!
//! let err = shape_schema::guard(&json!("al"), &username).unwrap_err();
//! assert_eq!(err.as_validation().unwrap().message, "al length is not at least 3");
//! # Ok::<(), shape_core::ShapeError>(())
//! ```
//!
//! ## Protocol
//!
//! - [`guard`] returns the value unchanged or the first [`ValidationError`].
//! - [`fulfill`] answers `true`/`false`; only validation failures become
//!   `false`. Definition and lookup errors still surface as `Err`.
//!
//! ## Crate Policy
//!
//! - Constraint legality is decided when a definition is compiled; the
//!   validate phase never sees an unknown constraint.
//! - Extended datatypes are resolved at use time through the registry that
//!   owns them. [`define`], [`define_many`] and [`Registry::define`] verify
//!   what they compile, so a base that does not resolve is a definition
//!   error there. Registries built up with [`Registry::define_named`] are
//!   checked by [`Registry::verify`].
//!
//! [`ValidationError`]: shape_core::ValidationError

pub mod constraint;
pub mod datatype;
pub mod defaults;
pub mod message;
pub mod outcome;
pub mod registry;
mod validate;

use std::sync::Arc;

use serde_json::{Map, Value};
use shape_core::ShapeError;

pub use constraint::{allows, sets_for, supported, ConstraintSet};
pub use datatype::{Argument, Datatype, Pattern, MAX_EXTENSION_DEPTH};
pub use defaults::{common, COMMON_PREFIX};
pub use message::FALLBACK_TEMPLATE;
pub use outcome::Outcome;
pub use registry::Registry;

/// Compile a standalone datatype.
///
/// The datatype gets a private registry with the common datatypes linked,
/// so definitions may reference `common:email` and friends.
pub fn define(definition: &Value) -> Result<Arc<Datatype>, ShapeError> {
    let registry = Registry::new();
    registry.link_common()?;
    let mut datatype = datatype::compile(&registry, definition, None)?;
    datatype.verify()?;
    datatype.anchor = Some(registry);
    Ok(Arc::new(datatype))
}

/// Compile a batch of named datatypes into a fresh registry.
///
/// The registry links the common datatypes. Members may reference each
/// other by name regardless of order; every reference must resolve.
pub fn define_many(definitions: &Map<String, Value>) -> Result<Registry, ShapeError> {
    let registry = Registry::new();
    registry.link_common()?;
    registry.define_many(definitions)?;
    Ok(registry)
}

/// Validate `value`; validation failures become `Ok(false)`.
pub fn fulfill(value: &Value, datatype: &Datatype) -> Result<bool, ShapeError> {
    datatype.fulfill(value)
}

/// Validate `value` and return it unchanged.
pub fn guard<'v>(value: &'v Value, datatype: &Datatype) -> Result<&'v Value, ShapeError> {
    datatype.guard(value)
}
