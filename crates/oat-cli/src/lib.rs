//! # oat-cli — OpenAPI Conformance from the Command Line
//!
//! Checks recorded bodies against an OpenAPI document without writing a
//! test harness. Useful in CI against captured fixtures, or to bisect a
//! failing contract test.
//!
//! ## Subcommands
//!
//! - `response`: a response body against `route`/`method`/`status`
//! - `request`: a request body against `route`/`method`
//! - `schema`: any data file against a standalone schema file
//! - `case`: key names against a case convention
//!
//! Every subcommand exits `0` when the input conforms and `1` otherwise, with
//! the full report on stderr.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers live in modules.
//! - Handlers delegate to `oat-schema`. No validation logic here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use oat_core::{CaseConvention, TesterConfig};

pub mod case;
pub mod conformance;
pub mod input;
pub mod schema;

/// Media type assumed for bodies when `--content-type` is not given.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// YAML configuration file.
    pub config: Option<PathBuf>,
    /// Case convention, overriding file and environment.
    pub case: Option<CaseConvention>,
    /// Additional keys exempt from case checks.
    pub ignore_case: Vec<String>,
    /// Media type of the body.
    pub content_type: String,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            config: None,
            case: None,
            ignore_case: Vec::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

/// Assemble the tester configuration: defaults, then `--config`, then the
/// environment, then command-line flags.
pub fn load_config(options: &GlobalOptions) -> Result<TesterConfig> {
    let base = match &options.config {
        Some(path) => TesterConfig::from_yaml_file(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => TesterConfig::default(),
    };
    let mut config = base.merge_env().context("invalid OAT_* environment")?;
    if let Some(case) = options.case {
        config.case = Some(case);
    }
    config.ignore_case.extend(options.ignore_case.iter().cloned());
    tracing::debug!(case = ?config.case, ignored = config.ignore_case.len(), "resolved tester configuration");
    Ok(config)
}

/// Print the outcome of a check and turn it into an exit code.
pub fn report_outcome<E: std::fmt::Display>(outcome: Result<(), E>, subject: &str) -> u8 {
    match outcome {
        Ok(()) => {
            println!("OK: {subject} conforms");
            0
        }
        Err(e) => {
            eprintln!("{e}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oat.yaml");
        std::fs::write(&path, "case: snake_case\nignore_case: [ETag]\n").unwrap();
        let options = GlobalOptions {
            config: Some(path),
            case: Some(CaseConvention::Camel),
            ignore_case: vec!["X-Request-Id".to_string()],
            ..GlobalOptions::default()
        };
        let config = load_config(&options).unwrap();
        assert_eq!(config.case, Some(CaseConvention::Camel));
        assert!(config.is_ignored("ETag"));
        assert!(config.is_ignored("X-Request-Id"));
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let options = GlobalOptions {
            config: Some(PathBuf::from("/nonexistent/oat.yaml")),
            ..GlobalOptions::default()
        };
        let err = load_config(&options).unwrap_err();
        assert!(format!("{err:#}").contains("cannot load config"));
    }

    #[test]
    fn outcome_maps_to_exit_code() {
        assert_eq!(report_outcome::<String>(Ok(()), "x"), 0);
        assert_eq!(report_outcome(Err("bad"), "x"), 1);
    }
}
