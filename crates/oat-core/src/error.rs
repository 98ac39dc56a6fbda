//! # Error Types
//!
//! Errors shared by every crate in the workspace. Schema and documentation
//! errors live in `oat-schema`; this module holds the ones that do not need
//! any knowledge of OpenAPI documents.

use thiserror::Error;

use crate::case::CaseConvention;

/// A key does not follow the configured case convention.
///
/// Kept separate from documentation errors: the fix is renaming a key, not
/// restructuring a payload, and callers may want to silence case errors for
/// specific keys without touching structural checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("the key \"{key}\" is not properly {convention}; expected \"{expected}\"")]
pub struct CaseError {
    /// The offending key, verbatim.
    pub key: String,
    /// The convention the key was checked against.
    pub convention: CaseConvention,
    /// The key rewritten in the expected convention.
    pub expected: String,
}

impl CaseError {
    /// Build a case error for `key` under `convention`.
    pub fn new(key: impl Into<String>, convention: CaseConvention, expected: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            convention,
            expected: expected.into(),
        }
    }
}

/// Errors raised while assembling a [`TesterConfig`](crate::TesterConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A case convention name was not one of the supported options.
    #[error("unknown case convention '{0}'; expected one of camelCase, snake_case, kebab-case, PascalCase")]
    UnknownCase(String),

    /// The configuration file could not be parsed.
    #[error("invalid configuration file '{path}': {reason}")]
    InvalidFile {
        /// Path of the file that failed to parse.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// IO error reading the configuration file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
