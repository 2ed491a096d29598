//! # flowmirror CLI entry point
//!
//! Parses command-line arguments, loads the project, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flowmirror_cli::audit::{run_audit, AuditArgs};
use flowmirror_cli::generate::{run_generate, GenerateArgs};
use flowmirror_cli::inspect::{run_list, run_show, ListArgs, ShowArgs};
use flowmirror_cli::lock::{run_lock, LockArgs};
use flowmirror_cli::validate::{run_validate, ValidateArgs};
use flowmirror_cli::Project;

/// flowmirror: JSON Schema mirror of a workflow data model.
///
/// Generates one JSON Schema document per entity shape, query input, and
/// operation argument, and validates payloads against them.
#[derive(Parser, Debug)]
#[command(name = "flowmirror", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data-model declaration (YAML or JSON). Defaults to the built-in workflow model.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write one `<Name>.schema.json` per generated schema.
    Generate(GenerateArgs),

    /// Print generated schema names.
    List(ListArgs),

    /// Print one generated schema document.
    Show(ShowArgs),

    /// Validate JSON/YAML payload files against a schema.
    Validate(ValidateArgs),

    /// Generate or verify the schema digest lockfile.
    Lock(LockArgs),

    /// Report object schemas that accept unknown keys.
    Audit(AuditArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "flowmirror starting");

    let result = Project::open(cli.config.as_deref(), cli.model.as_deref()).and_then(|project| {
        match &cli.command {
            Commands::Generate(args) => run_generate(args, &project),
            Commands::List(args) => run_list(args, &project),
            Commands::Show(args) => run_show(args, &project),
            Commands::Validate(args) => run_validate(args, &project),
            Commands::Lock(args) => run_lock(args, &project),
            Commands::Audit(args) => run_audit(args, &project),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
