//! Tester configuration.
//!
//! An explicit value handed to the schema tester at construction time. There
//! is no process-wide settings object: two testers with different
//! configurations can run side by side.
//!
//! Sources, lowest precedence first: [`TesterConfig::default`], a YAML file
//! ([`TesterConfig::from_yaml_file`]), the environment
//! ([`TesterConfig::merge_env`]). Callers such as the CLI apply their own
//! overrides last.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::case::{checker_for, CaseCheck, CaseConvention};
use crate::error::ConfigError;

/// Environment variable selecting the case convention.
pub const ENV_CASE: &str = "OAT_CASE";
/// Environment variable listing keys exempt from case checks, comma separated.
pub const ENV_IGNORE_CASE: &str = "OAT_IGNORE_CASE";

/// Configuration for a schema tester.
///
/// ```yaml
/// case: snake_case
/// ignore_case:
///   - ETag
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TesterConfig {
    /// Convention every object key must follow. `None` disables case checks.
    pub case: Option<CaseConvention>,
    /// Keys exempt from case checks.
    pub ignore_case: BTreeSet<String>,
}

impl TesterConfig {
    /// A configuration enforcing `convention` on every key.
    pub fn with_case(convention: CaseConvention) -> Self {
        Self {
            case: Some(convention),
            ..Self::default()
        }
    }

    /// Exempt `key` from case checks.
    pub fn ignore(mut self, key: impl Into<String>) -> Self {
        self.ignore_case.insert(key.into());
        self
    }

    /// The case check to run on each key.
    pub fn case_checker(&self) -> CaseCheck {
        checker_for(self.case)
    }

    /// Whether `key` is exempt from case checks.
    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignore_case.contains(key)
    }

    /// Load configuration from a YAML (or JSON) file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::InvalidFile` if it does not parse.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            ConfigError::InvalidFile { reason, .. } => ConfigError::InvalidFile {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidFile {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Load configuration from the environment alone.
    ///
    /// Variables:
    /// - `OAT_CASE` (one of `camelCase`, `snake_case`, `kebab-case`, `PascalCase`)
    /// - `OAT_IGNORE_CASE` (comma-separated keys)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    /// Overlay environment variables on top of `self`.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_vars(
            std::env::var(ENV_CASE).ok().as_deref(),
            std::env::var(ENV_IGNORE_CASE).ok().as_deref(),
        )
    }

    fn merge_vars(mut self, case: Option<&str>, ignore: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(raw) = case.map(str::trim).filter(|s| !s.is_empty()) {
            self.case = Some(raw.parse()?);
        }
        if let Some(raw) = ignore {
            self.ignore_case.extend(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(self)
    }
}
