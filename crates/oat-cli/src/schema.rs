//! # Schema Subcommand
//!
//! `oat schema` checks a data file against a standalone schema file. Local
//! `$ref`s in the schema resolve against the schema file itself, so a file
//! may keep shared definitions next to the root schema.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use oat_schema::{dereference_schema, SchemaTester, ValidationTarget};

use crate::input::read_value;
use crate::{load_config, report_outcome, GlobalOptions};

/// Arguments for `oat schema`.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema file (YAML or JSON).
    #[arg(long)]
    pub schema: PathBuf,

    /// Data file to check. `-` reads stdin.
    #[arg(long)]
    pub data: PathBuf,

    /// Treat the data as a request body: `readOnly` properties are rejected
    /// instead of `writeOnly` ones.
    #[arg(long)]
    pub request: bool,
}

/// Execute `oat schema`.
pub fn run_schema(args: &SchemaArgs, global: &GlobalOptions) -> Result<u8> {
    let config = load_config(global)?;
    let root = read_value(&args.schema)?;
    let schema = dereference_schema(&root).with_context(|| format!("cannot dereference {}", args.schema.display()))?;
    let data = read_value(&args.data)?;

    let target = if args.request {
        ValidationTarget::Request
    } else {
        ValidationTarget::Response
    };
    let outcome = SchemaTester::new(config).with_target(target).validate(&schema, &data);
    Ok(report_outcome(outcome, &args.data.display().to_string()))
}
