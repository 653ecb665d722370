//! # shape-cli: CLI Tool for shape
//!
//! Provides the `shape` command-line interface.
//!
//! ## Subcommands
//!
//! - `shape check`: validate a JSON/YAML document against a datatype.
//! - `shape inspect`: list a module's datatypes and actions.
//! - `shape call`: validate arguments for a service action.
//!
//! ```bash
//! shape check --module accounts.yml --datatype contact contact.json
//! shape inspect --module service.yml --json
//! shape call --module service.yml --action register --args '{"tags": []}'
//! ```
//!
//! Exit codes: 0 on success, 1 when the input does not validate, 2 on
//! operational errors (unreadable files, broken schemas).

pub mod call;
pub mod check;
pub mod inspect;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// The input validated.
pub const EXIT_OK: u8 = 0;
/// The input did not validate.
pub const EXIT_INVALID: u8 = 1;
/// Files, schemas or arguments could not be processed.
pub const EXIT_ERROR: u8 = 2;

/// Read a JSON or YAML document from a file, or from stdin when no path is given.
pub fn read_document(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) => shape_module::read_definition(path)
            .with_context(|| format!("failed to load document {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read document from stdin")?;
            parse_document(&text)
        }
    }
}

/// Parse inline text as JSON, falling back to YAML.
pub fn parse_document(text: &str) -> Result<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(_) => shape_module::source::parse_yaml(text).context("document is neither JSON nor YAML"),
    }
}
