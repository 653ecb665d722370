//! # Inspect Subcommand
//!
//! Lists a module's datatypes and, for services, its actions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Map, Value};
use shape_module::{Module, Service};
use shape_schema::Datatype;

use crate::EXIT_OK;

/// Arguments for the `shape inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Module or service definition file (YAML or JSON).
    #[arg(long, short)]
    pub module: PathBuf,

    /// Print a JSON summary instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the inspect subcommand.
pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    let definition = shape_module::read_definition(&args.module)
        .with_context(|| format!("failed to load {}", args.module.display()))?;

    let summary = if definition.get("interface").is_some() {
        let service = Service::from_definition(&definition)
            .with_context(|| format!("invalid service {}", args.module.display()))?;
        summarize(service.module(), Some(&service))
    } else {
        let module = Module::from_definition(&definition)
            .with_context(|| format!("invalid module {}", args.module.display()))?;
        summarize(&module, None)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_text(&summary);
    }
    Ok(EXIT_OK)
}

fn describe_datatype(datatype: &Datatype) -> Value {
    let options: Map<String, Value> = datatype
        .options()
        .iter()
        .map(|(c, a)| (c.to_string(), a.to_value()))
        .collect();
    json!({
        "kind": datatype.extends().unwrap_or(datatype.kind().as_str()),
        "description": datatype.description(),
        "options": options,
    })
}

/// Build the JSON summary of a module and its optional interface.
pub fn summarize(module: &Module, service: Option<&Service>) -> Value {
    let mut datatypes = Map::new();
    for name in module.datatype_names() {
        if let Ok(datatype) = module.get(&name) {
            datatypes.insert(name, describe_datatype(&datatype));
        }
    }

    let mut summary = json!({
        "name": module.name(),
        "namespace": module.namespace(),
        "description": module.description(),
        "datatypes": datatypes,
    });

    if let Some(service) = service {
        let actions: Map<String, Value> = service
            .actions()
            .iter()
            .map(|(name, action)| {
                let params: Map<String, Value> = action
                    .params()
                    .iter()
                    .map(|p| (p.name.clone(), Value::String(p.datatype.name().to_string())))
                    .collect();
                (
                    name.clone(),
                    json!({
                        "qualified_name": action.qualified_name(),
                        "method": action.method(),
                        "url": action.url(),
                        "params": params,
                        "response": action.response().map(|d| d.name().to_string()),
                    }),
                )
            })
            .collect();
        summary["actions"] = Value::Object(actions);
    }
    summary
}

fn print_text(summary: &Value) {
    println!(
        "Module: {} (namespace {})",
        summary["name"].as_str().unwrap_or("?"),
        summary["namespace"].as_str().unwrap_or("?")
    );
    if let Some(datatypes) = summary["datatypes"].as_object() {
        println!("Datatypes: {}", datatypes.len());
        for (name, info) in datatypes {
            println!("  {name}: {}", info["kind"].as_str().unwrap_or("?"));
        }
    }
    if let Some(actions) = summary.get("actions").and_then(Value::as_object) {
        println!("Actions: {}", actions.len());
        for (name, info) in actions {
            let params: Vec<&str> = info["params"]
                .as_object()
                .map(|p| p.keys().map(String::as_str).collect())
                .unwrap_or_default();
            println!("  {name}({})", params.join(", "));
        }
    }
}
