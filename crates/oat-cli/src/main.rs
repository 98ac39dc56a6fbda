//! # oat CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use oat_core::CaseConvention;
use tracing_subscriber::EnvFilter;

use oat_cli::case::{run_case, CaseArgs};
use oat_cli::conformance::{run_request, run_response, RequestArgs, ResponseArgs};
use oat_cli::schema::{run_schema, SchemaArgs};
use oat_cli::{GlobalOptions, DEFAULT_CONTENT_TYPE};

/// OpenAPI conformance tester.
///
/// Checks recorded request and response bodies against the schemas an
/// OpenAPI (Swagger 2 or OpenAPI 3) document declares for them.
#[derive(Parser, Debug)]
#[command(name = "oat", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Case convention every object key must follow.
    #[arg(long, global = true)]
    case: Option<CaseConvention>,

    /// Key exempt from case checks. Repeatable.
    #[arg(long = "ignore-case", global = true)]
    ignore_case: Vec<String>,

    /// Media type of the body.
    #[arg(long, global = true, default_value = DEFAULT_CONTENT_TYPE)]
    content_type: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a response body against the document.
    Response(ResponseArgs),

    /// Check a request body against the document.
    Request(RequestArgs),

    /// Check a data file against a standalone schema file.
    Schema(SchemaArgs),

    /// Check key names against a case convention.
    Case(CaseArgs),
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

    tracing::debug!("oat CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let global = GlobalOptions {
        config: cli.config,
        case: cli.case,
        ignore_case: cli.ignore_case,
        content_type: cli.content_type,
    };

    let result = match &cli.command {
        Commands::Response(args) => run_response(args, &global),
        Commands::Request(args) => run_request(args, &global),
        Commands::Schema(args) => run_schema(args, &global),
        Commands::Case(args) => run_case(args, &global),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
