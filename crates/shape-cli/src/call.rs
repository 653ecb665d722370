//! # Call Subcommand
//!
//! Validates arguments for a service action without dispatching it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use shape_module::{ActionError, Service};

use crate::{parse_document, EXIT_INVALID, EXIT_OK};

/// Arguments for the `shape call` subcommand.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Service definition file (YAML or JSON).
    #[arg(long, short)]
    pub module: PathBuf,

    /// Action name from the service interface.
    #[arg(long, short)]
    pub action: String,

    /// Named arguments as a JSON or YAML map.
    #[arg(long, default_value = "{}")]
    pub args: String,
}

/// Execute the call subcommand.
///
/// Returns exit code: 0 when the arguments validate, 1 otherwise.
pub fn run_call(args: &CallArgs) -> Result<u8> {
    let definition = shape_module::read_definition(&args.module)
        .with_context(|| format!("failed to load {}", args.module.display()))?;
    let service = Service::from_definition(&definition)
        .with_context(|| format!("invalid service {}", args.module.display()))?;
    let arguments = match parse_document(&args.args)? {
        Value::Object(map) => map,
        other => bail!("arguments must be a map, got {other}"),
    };

    let (code, line) = call_action(&service, &args.action, &arguments)?;
    println!("{line}");
    Ok(code)
}

/// Validate `arguments` for `action` and describe the result in one line.
pub fn call_action(
    service: &Service,
    action: &str,
    arguments: &Map<String, Value>,
) -> Result<(u8, String)> {
    match service.call(action, arguments, |_| ()) {
        Ok(()) => {
            let qualified = service
                .action(action)
                .map(|a| a.qualified_name().to_string())
                .unwrap_or_else(|| action.to_string());
            Ok((EXIT_OK, format!("OK: arguments for {qualified} are valid")))
        }
        Err(e @ ActionError::UnknownAction { .. }) => Err(e.into()),
        Err(e) => {
            let argument_problem = matches!(
                e,
                ActionError::UnexpectedArgument { .. } | ActionError::MissingArgument { .. }
            );
            if argument_problem || e.validation().is_some() {
                Ok((EXIT_INVALID, format!("FAIL: {e}")))
            } else {
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> Service {
        Service::from_definition(&json!({
            "name": "sample",
            "datatypes": {"sampleID": {"type": "string", "length_min": 5}},
            "interface": {
                "sample_action": {"request": {"params": {"id": "sampleID"}}},
            },
        }))
        .unwrap()
    }

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not a map: {other}"),
        }
    }

    #[test]
    fn call_action_valid() {
        let (code, line) =
            call_action(&service(), "sample_action", &map(json!({"id": "aaaaa"}))).unwrap();
        assert_eq!(code, EXIT_OK);
        assert_eq!(line, "OK: arguments for sample.sample_action are valid");
    }

    #[test]
    fn call_action_invalid() {
        let (code, line) =
            call_action(&service(), "sample_action", &map(json!({"id": "aaa"}))).unwrap();
        assert_eq!(code, EXIT_INVALID);
        assert!(line.starts_with("FAIL: sample.sample_action() argument 'id'"));

        let (code, _) = call_action(
            &service(),
            "sample_action",
            &map(json!({"id": "aaaaa", "xxx": 123})),
        )
        .unwrap();
        assert_eq!(code, EXIT_INVALID);
    }

    #[test]
    fn call_unknown_action_is_error() {
        assert!(call_action(&service(), "missing", &Map::new()).is_err());
    }
}
