//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used throughout shape. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Definition errors are raised while a schema is compiled and are always
//!   fatal to the enclosing `define` call.
//! - Validation errors carry the failing value, the constraint name and
//!   argument, the datatype name, and the rendered message.
//! - Lookup errors name the datatype or prefix that did not resolve.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Top-level error type for shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// The schema itself is malformed.
    #[error("definition error: {0}")]
    Definition(#[from] DefinitionError),

    /// The value does not conform to the schema.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A datatype name or prefix did not resolve.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),
}

impl ShapeError {
    /// Returns true if this is a validation error (a data problem rather than
    /// a schema problem).
    pub fn is_validation(&self) -> bool {
        matches!(self, ShapeError::Validation(_))
    }

    /// Borrow the validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ShapeError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

/// Error raised while compiling a datatype definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The definition is neither a map nor a type name.
    #[error("datatype definition must be a map or a type name, got {found}")]
    NotADefinition {
        /// Rendering of the offending definition.
        found: String,
    },

    /// The definition map has no string `type` key.
    #[error("datatype definition has no string 'type' key: {definition}")]
    MissingType {
        /// Rendering of the offending definition.
        definition: String,
    },

    /// The constraint is unknown, or not part of the kind's constraint set.
    #[error("constraint '{constraint}' is not supported by {kind} datatype '{datatype}'")]
    UnsupportedConstraint {
        /// Name of the datatype being defined.
        datatype: String,
        /// Kind tag the constraint was attached to.
        kind: String,
        /// The offending key.
        constraint: String,
    },

    /// The constraint argument has the wrong shape.
    #[error("invalid argument for '{constraint}' on datatype '{datatype}': {reason}")]
    InvalidArgument {
        /// Name of the datatype being defined.
        datatype: String,
        /// The constraint whose argument was rejected.
        constraint: String,
        /// What was expected.
        reason: String,
    },

    /// A `regex` argument does not compile.
    #[error("invalid regex {pattern:?} on datatype '{datatype}': {reason}")]
    InvalidPattern {
        /// Name of the datatype being defined.
        datatype: String,
        /// The pattern as written.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// A combinator was defined without its mandatory option.
    #[error("{kind} datatype '{datatype}' requires option '{constraint}'")]
    MissingOption {
        /// Name of the datatype being defined.
        datatype: String,
        /// Kind tag of the datatype.
        kind: String,
        /// The missing option.
        constraint: String,
    },

    /// An extended datatype names a base that does not resolve.
    #[error("base '{base}' of datatype '{datatype}' does not resolve: {source}")]
    UnresolvedBase {
        /// The extended datatype whose base is missing.
        datatype: String,
        /// The base name as written.
        base: String,
        /// Why the lookup failed.
        source: LookupError,
    },

    /// Following base references never reached a non-extended datatype.
    #[error("extension chain of '{datatype}' exceeds {depth} levels")]
    CyclicExtension {
        /// The extended datatype being resolved.
        datatype: String,
        /// The depth bound that was hit.
        depth: usize,
    },

    /// A module or service definition lacks required keys or has the wrong shape.
    #[error("malformed module definition: {reason}")]
    MalformedModule {
        /// Deserializer diagnostic.
        reason: String,
    },
}

/// Error raised when a name does not resolve in a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No datatype with this name.
    #[error("datatype '{name}' not found")]
    UnknownDatatype {
        /// The name as requested.
        name: String,
    },

    /// The namespace prefix is neither the registry's own nor a linked alias.
    #[error("unknown prefix '{prefix}' for datatype '{name}'")]
    UnknownPrefix {
        /// The unresolved prefix.
        prefix: String,
        /// The full name as requested.
        name: String,
    },

    /// The registry that owns an extended datatype no longer exists.
    #[error("registry owning datatype '{datatype}' has been dropped")]
    DetachedRegistry {
        /// The datatype whose base could not be resolved.
        datatype: String,
    },
}

/// The way a value failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The value's runtime shape disagrees with the datatype kind.
    TypeMismatch,
    /// The value has the right shape but fails a constraint.
    InvalidValue,
    /// A fractional number was presented to an integer datatype.
    NotAnInteger,
}

impl ViolationKind {
    /// `NotAnInteger` is a specialization of `InvalidValue`.
    pub fn is_invalid_value(&self) -> bool {
        matches!(self, ViolationKind::InvalidValue | ViolationKind::NotAnInteger)
    }
}

/// A value failed a constraint.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    /// How the value failed.
    pub kind: ViolationKind,
    /// The failing value.
    pub value: Value,
    /// Name of the failing constraint (`type`/`integer` for type checks).
    pub constraint: String,
    /// The constraint argument, nested datatypes rendered by name.
    pub argument: Value,
    /// Name of the datatype that rejected the value.
    pub datatype: String,
    /// Rendered human-readable message.
    pub message: String,
}

impl ValidationError {
    /// Returns true for a shape mismatch.
    pub fn is_type_mismatch(&self) -> bool {
        self.kind == ViolationKind::TypeMismatch
    }
}
