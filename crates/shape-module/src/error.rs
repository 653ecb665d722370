//! Module-specific error types.
//!
//! Structured errors for module loading and action calls. Load errors carry
//! the file path; action errors carry the qualified action name and the
//! argument that failed.

use std::path::PathBuf;

use shape_core::ShapeError;
use thiserror::Error;

/// Errors that can occur while loading a module or service.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// YAML parsing failed.
    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON parsing failed.
    #[error("failed to parse JSON at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// YAML document contains values with no JSON counterpart.
    #[error("{path}: {detail}")]
    JsonIncompatible { path: String, detail: String },

    /// The module file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A datatype definition, reference or module shape is invalid.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Errors raised at an action boundary, before the handler runs.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The service has no action with this name.
    #[error("service '{service}' has no action '{action}'")]
    UnknownAction { service: String, action: String },

    /// An argument name is not a declared parameter.
    #[error("{action}() got an unexpected argument '{argument}'")]
    UnexpectedArgument { action: String, argument: String },

    /// A declared parameter was not supplied and does not accept null.
    #[error("{action}() missing required argument '{argument}'")]
    MissingArgument { action: String, argument: String },

    /// A supplied argument failed validation.
    #[error("{action}() argument '{argument}': {source}")]
    Argument {
        action: String,
        argument: String,
        source: ShapeError,
    },

    /// The handler's response failed validation.
    #[error("{action}() response: {source}")]
    Response { action: String, source: ShapeError },
}

impl ActionError {
    /// The validation failure behind this error, if any.
    pub fn validation(&self) -> Option<&shape_core::ValidationError> {
        match self {
            ActionError::Argument { source, .. } | ActionError::Response { source, .. } => {
                source.as_validation()
            }
            _ => None,
        }
    }
}
