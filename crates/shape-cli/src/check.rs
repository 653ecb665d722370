//! # Check Subcommand
//!
//! Validates one document against one datatype of a module.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use shape_core::ShapeError;
use shape_module::Module;

use crate::{read_document, EXIT_INVALID, EXIT_OK};

/// Arguments for the `shape check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Module definition file (YAML or JSON).
    #[arg(long, short)]
    pub module: PathBuf,

    /// Datatype to validate against; may be prefixed (`common:email`).
    #[arg(long, short)]
    pub datatype: String,

    /// Document to validate. Reads stdin when omitted.
    #[arg(value_name = "DOCUMENT")]
    pub document: Option<PathBuf>,
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let module = Module::from_file(&args.module)
        .with_context(|| format!("failed to load module {}", args.module.display()))?;
    let document = read_document(args.document.as_deref())?;

    let (code, line) = check_document(&module, &args.datatype, &document)?;
    println!("{line}");
    Ok(code)
}

/// Validate `document` and describe the result in one line.
pub fn check_document(module: &Module, datatype: &str, document: &Value) -> Result<(u8, String)> {
    match module.guard(document, datatype) {
        Ok(_) => Ok((EXIT_OK, format!("OK: document is a valid {datatype}"))),
        Err(ShapeError::Validation(e)) => {
            tracing::info!(
                datatype = %e.datatype,
                constraint = %e.constraint,
                "document rejected"
            );
            Ok((
                EXIT_INVALID,
                format!("FAIL: {} ({}: {})", e.message, e.datatype, e.constraint),
            ))
        }
        Err(e) => Err(e).with_context(|| format!("cannot validate against '{datatype}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn module() -> Module {
        Module::from_definition(&json!({
            "name": "accounts",
            "datatypes": {
                "username": {"type": "string", "length_min": 3},
            },
        }))
        .unwrap()
    }

    #[test]
    fn check_document_passes() {
        let (code, line) = check_document(&module(), "username", &json!("alice")).unwrap();
        assert_eq!(code, EXIT_OK);
        assert_eq!(line, "OK: document is a valid username");
    }

    #[test]
    fn check_document_reports_failure() {
        let (code, line) = check_document(&module(), "username", &json!("al")).unwrap();
        assert_eq!(code, EXIT_INVALID);
        assert_eq!(line, "FAIL: al length is not at least 3 (username: length_min)");
    }

    #[test]
    fn check_document_unknown_datatype_is_error() {
        let err = check_document(&module(), "nope", &json!(1)).unwrap_err();
        assert!(format!("{err:#}").contains("datatype 'nope' not found"));
    }

    #[test]
    fn run_check_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let module_path = dir.path().join("m.yml");
        std::fs::write(
            &module_path,
            "name: m\ndatatypes:\n  contact:\n    type: dict\n    fields:\n      email: common:email\n",
        )
        .unwrap();
        let doc_path = dir.path().join("doc.json");
        std::fs::write(&doc_path, r#"{"email": "mail@example.com"}"#).unwrap();

        let args = CheckArgs {
            module: module_path,
            datatype: "contact".to_string(),
            document: Some(doc_path),
        };
        assert_eq!(run_check(&args).unwrap(), EXIT_OK);
    }
}
