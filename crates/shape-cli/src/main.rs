//! # shape CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shape_cli::call::{run_call, CallArgs};
use shape_cli::check::{run_check, CheckArgs};
use shape_cli::inspect::{run_inspect, InspectArgs};
use shape_cli::EXIT_ERROR;

/// Declarative datatype validation.
///
/// Loads modules of datatypes from YAML or JSON, validates documents against
/// them, and checks action arguments against service interfaces.
#[derive(Parser, Debug)]
#[command(name = "shape", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a document against a module datatype.
    Check(CheckArgs),

    /// List a module's datatypes and actions.
    Inspect(InspectArgs),

    /// Validate arguments for a service action.
    Call(CallArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!("shape CLI starting");

    let result = match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Inspect(args) => run_inspect(&args),
        Commands::Call(args) => run_call(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
