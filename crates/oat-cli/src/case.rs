//! # Case Subcommand
//!
//! `oat case <convention> KEY...` checks key names without any schema, e.g.
//! to vet a list of field names before documenting them.

use anyhow::Result;
use clap::Args;
use oat_core::CaseConvention;

use crate::{load_config, GlobalOptions};

/// Arguments for `oat case`.
#[derive(Args, Debug)]
pub struct CaseArgs {
    /// One of camelCase, snake_case, kebab-case, PascalCase.
    pub convention: CaseConvention,

    /// Keys to check.
    #[arg(required = true)]
    pub keys: Vec<String>,
}

/// Execute `oat case`. Keys listed in `--ignore-case` or the configuration
/// are skipped.
pub fn run_case(args: &CaseArgs, global: &GlobalOptions) -> Result<u8> {
    let config = load_config(global)?;
    let mut failures = 0usize;
    for key in &args.keys {
        if config.is_ignored(key) {
            tracing::debug!(key = key.as_str(), "skipping ignored key");
            continue;
        }
        match args.convention.check(key) {
            Ok(()) => println!("OK: {key}"),
            Err(e) => {
                eprintln!("{e}");
                failures += 1;
            }
        }
    }
    Ok(u8::from(failures > 0))
}
