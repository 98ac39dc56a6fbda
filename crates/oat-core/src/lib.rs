//! # oat-core — Foundational Pieces of the OpenAPI Tester
//!
//! Leaf crate of the workspace. Holds everything the schema tester needs that
//! has no knowledge of OpenAPI documents:
//!
//! - [`case`]: pure classifiers for camelCase, snake_case, kebab-case and
//!   PascalCase keys, injected into the tester as a [`CaseCheck`].
//! - [`canonical`]: deterministic, key-sorted JSON rendering for reports.
//! - [`config`]: [`TesterConfig`], the explicit configuration value passed
//!   to a tester instead of a global settings object.
//! - [`error`]: [`CaseError`] and [`ConfigError`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `oat-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod case;
pub mod config;
pub mod error;

pub use case::{
    checker_for, is_camel_case, is_kebab_case, is_pascal_case, is_snake_case, skip, CaseCheck,
    CaseConvention,
};
pub use config::TesterConfig;
pub use error::{CaseError, ConfigError};
