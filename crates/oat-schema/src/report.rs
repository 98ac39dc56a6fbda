//! # Error Reports
//!
//! Renders a documentation error as a multi-line, reproducible report.
//! Sections appear in a fixed order and are separated by blank lines:
//!
//! ```text
//! Error: <message>
//!
//! Expected: <example derived from the schema node>
//!
//! Received: <the data>
//!
//! Hint: <hint, only when non-empty>
//!
//! Sequence: <breadcrumb>
//! ```
//!
//! Both values are rendered as key-sorted, pretty-printed JSON so the same
//! failure always produces the same text.

use oat_core::canonical::to_pretty;
use serde_json::Value;

use crate::example::example_from_schema;

/// Build the report for one violation.
pub fn format(message: &str, schema: &Value, data: &Value, reference: &str, hint: &str) -> String {
    let mut sections = vec![
        format!("Error: {message}"),
        format!("Expected: {}", to_pretty(&example_from_schema(schema))),
        format!("Received: {}", to_pretty(data)),
    ];
    if !hint.trim().is_empty() {
        sections.push(format!("Hint: {hint}"));
    }
    sections.push(format!("Sequence: {reference}"));
    sections.join("\n\n")
}
