//! # Error Types
//!
//! Three kinds of failure leave the schema tester:
//!
//! - [`DocumentationError`]: the data does not match the schema. Fix either
//!   the implementation or the documentation.
//! - [`CaseError`]: a key does not follow the configured case convention.
//! - [`SchemaError`]: the schema node itself is malformed. This is a defect
//!   in the fixture or the document and is never recovered from.
//!
//! [`ValidationError`] unifies them as the single error type of the tester.
//! [`LoadError`] and [`ConformanceError`] cover the document loader.

use std::fmt;

use oat_core::CaseError;
use serde_json::Value;
use thiserror::Error;

use crate::example::example_from_schema;
use crate::report;

/// Data violates the schema it was compared against.
///
/// Carries everything needed to render a self-contained report: the message,
/// the offending schema node, the offending data, the breadcrumb of the
/// position in the walk and an optional remediation hint. `Display` renders
/// the full report (see [`report::format`]).
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentationError {
    /// What went wrong, in one sentence.
    pub message: String,
    /// The schema node the data was compared against.
    pub schema: Value,
    /// The data that failed the comparison.
    pub data: Value,
    /// Breadcrumb of the position in the walk, e.g. `init.dict:key:name.list`.
    pub reference: String,
    /// Remediation hint. Empty when there is nothing useful to add.
    pub hint: String,
}

impl DocumentationError {
    pub fn new(message: impl Into<String>, schema: &Value, data: &Value, reference: &str) -> Self {
        Self {
            message: message.into(),
            schema: schema.clone(),
            data: data.clone(),
            reference: reference.to_string(),
            hint: String::new(),
        }
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// A representative value that would have matched the schema node.
    pub fn expected(&self) -> Value {
        example_from_schema(&self.schema)
    }

    /// The full multi-line report.
    pub fn report(&self) -> String {
        report::format(&self.message, &self.schema, &self.data, &self.reference, &self.hint)
    }
}

impl fmt::Display for DocumentationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

impl std::error::Error for DocumentationError {}

/// The schema node is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The node has no `type` and none can be inferred from its keywords.
    #[error("schema node at {reference} has no `type` and none can be inferred")]
    MissingType {
        /// Breadcrumb of the node.
        reference: String,
    },

    /// The node's `type` is not one OpenAPI defines.
    #[error("schema node at {reference} has unsupported type {value}")]
    InvalidType {
        /// Breadcrumb of the node.
        reference: String,
        /// The offending `type` value, as JSON text.
        value: String,
    },

    /// An array node has no `items`.
    #[error("array schema at {reference} is missing `items`")]
    MissingItems {
        /// Breadcrumb of the node.
        reference: String,
    },

    /// An object node has neither `properties` nor `additionalProperties`.
    #[error("object schema at {reference} has neither `properties` nor `additionalProperties`")]
    MissingProperties {
        /// Breadcrumb of the node.
        reference: String,
    },

    /// A `pattern` is not a valid regular expression.
    #[error("schema node at {reference} has a pattern that is not valid regex: {pattern} ({reason})")]
    InvalidPattern {
        /// Breadcrumb of the node.
        reference: String,
        /// The pattern as written in the schema.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A `$ref` survived dereferencing.
    #[error("schema node at {reference} still contains `$ref: {target}`; dereference the schema before testing")]
    UnresolvedReference {
        /// Breadcrumb of the node.
        reference: String,
        /// The reference target.
        target: String,
    },

    /// A keyword carries a value of the wrong JSON type.
    #[error("schema node at {reference} has `{keyword}` that is not {expected}")]
    InvalidKeyword {
        /// Breadcrumb of the node.
        reference: String,
        /// The keyword name.
        keyword: &'static str,
        /// Description of the expected JSON type.
        expected: &'static str,
    },
}

/// Any failure of the schema tester.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The data does not match the schema.
    #[error(transparent)]
    Documentation(#[from] DocumentationError),

    /// A key violates the configured case convention.
    #[error(transparent)]
    Case(#[from] CaseError),

    /// The schema is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ValidationError {
    /// The documentation error, if this is one.
    pub fn as_documentation(&self) -> Option<&DocumentationError> {
        match self {
            ValidationError::Documentation(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure to load an OpenAPI document or locate a section of it.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The document could not be parsed as YAML or JSON.
    #[error("cannot parse OpenAPI document '{source_name}': {reason}")]
    Parse {
        /// File path, or `<inline>` for in-memory documents.
        source_name: String,
        /// Parser message.
        reason: String,
    },

    /// The document declares neither `swagger: "2.0"` nor `openapi: 3.x`.
    #[error("document declares neither `swagger: \"2.0\"` nor `openapi: 3.x`")]
    UnknownDialect,

    /// A local `$ref` points nowhere.
    #[error("unresolvable $ref '{target}'")]
    UnresolvedReference {
        /// The reference target.
        target: String,
    },

    /// A `$ref` points outside the document.
    #[error("external $ref '{target}' is not supported; bundle the document first")]
    ExternalReference {
        /// The reference target.
        target: String,
    },

    /// No documented path matches the route.
    #[error("route '{route}' is not documented")]
    UndocumentedRoute {
        /// The route as requested.
        route: String,
    },

    /// The path is documented but not for this method.
    #[error("method '{method}' is not documented for route '{route}'")]
    UndocumentedMethod {
        /// The route as requested.
        route: String,
        /// The HTTP method, lowercase.
        method: String,
    },

    /// Neither the status code nor `default` is documented.
    #[error("status {status} is not documented for {method} '{route}'")]
    UndocumentedStatus {
        /// The route as requested.
        route: String,
        /// The HTTP method, lowercase.
        method: String,
        /// The status code.
        status: u16,
    },

    /// The content type is not documented for this response or request body.
    #[error("content type '{content_type}' is not documented for {method} '{route}'; documented: {}", .available.join(", "))]
    UndocumentedContentType {
        /// The route as requested.
        route: String,
        /// The HTTP method, lowercase.
        method: String,
        /// The requested content type.
        content_type: String,
        /// Documented content types.
        available: Vec<String>,
    },

    /// IO error reading the document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of an end-to-end request or response check.
#[derive(Error, Debug)]
pub enum ConformanceError {
    /// The relevant schema could not be located.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The body does not conform.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A body was received where the document describes none.
    #[error("{method} '{route}' documents no body here, but one was received")]
    UnexpectedBody {
        /// The route as requested.
        route: String,
        /// The HTTP method, lowercase.
        method: String,
    },
}
