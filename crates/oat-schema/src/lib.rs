//! # oat-schema — OpenAPI Schema Conformance Testing
//!
//! Compares concrete request and response bodies against the schemas an
//! OpenAPI document declares for them, and reports the first disagreement
//! with enough context to fix it without a debugger.
//!
//! ## Components
//!
//! - [`tester`]: [`SchemaTester`], the recursive walker. Dispatches on
//!   [`SchemaKind`] and stops at the first violation.
//! - [`constraints`] and [`formats`]: the keyword validators applied to
//!   values once their type is known.
//! - [`report`] and [`example`]: the error formatter and the example
//!   derivation behind its `Expected:` section.
//! - [`document`]: [`OpenApiDocument`]: loading, dereferencing and locating
//!   the schema for a route, method, status and content type.
//!
//! ## Usage
//!
//! ```
//! use oat_schema::validate;
//! use serde_json::json;
//!
//! let schema = json!({"type": "integer", "minimum": 3, "maximum": 5});
//! assert!(validate(&schema, &json!(4)).is_ok());
//! assert!(validate(&schema, &json!(6)).is_err());
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `oat-core` within the workspace.
//! - Library code logs through `tracing` and never installs a subscriber.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod constraints;
pub mod document;
pub mod error;
pub mod example;
pub mod formats;
pub mod kind;
pub mod report;
pub mod tester;

pub use document::{dereference_schema, yaml_to_json, Dialect, OpenApiDocument, MAX_REF_DEPTH};
pub use error::{
    ConformanceError, DocumentationError, LoadError, SchemaError, ValidationError,
};
pub use example::example_from_schema;
pub use kind::SchemaKind;
pub use tester::{SchemaTester, ValidationTarget, ROOT_REFERENCE};

use oat_core::TesterConfig;
use serde_json::Value;

/// Validate `data` against `schema` with case checks disabled.
pub fn validate(schema: &Value, data: &Value) -> Result<(), ValidationError> {
    SchemaTester::default().validate(schema, data)
}

/// Validate `data` against `schema` under `config`.
pub fn validate_with(schema: &Value, data: &Value, config: &TesterConfig) -> Result<(), ValidationError> {
    SchemaTester::new(config.clone()).validate(schema, data)
}
