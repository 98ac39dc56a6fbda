//! # Schema Tester
//!
//! Walks a dereferenced schema node and a data value in lock-step and stops
//! at the first violation.
//!
//! Each node is classified once into a [`SchemaKind`] and handled by the
//! matching branch:
//!
//! 1. `null` data passes a nullable node and fails any other typed node.
//!    Composition nodes pass `null` on to their alternatives.
//! 2. `allOf` is merged into one node and walked again.
//! 3. `oneOf` needs exactly one matching alternative, `anyOf` at least one.
//!    Only documentation errors from an alternative count as "no match";
//!    case and schema errors abort the walk. Alternatives are walked
//!    without building error details, which only the outermost failure needs.
//! 4. Objects check required keys, excess keys, key counts, key casing and
//!    hidden (`writeOnly`/`readOnly`) properties, then recurse per key.
//! 5. Arrays check item counts and uniqueness, then recurse per element.
//! 6. Primitives check the JSON type, then every value constraint.
//!    Compiled `pattern`s are shared for the length of one validation.
//!
//! The breadcrumb starts at `init` and grows by `.dict:key:<name>` for
//! object members and `.list` for array elements.

use std::fmt;

use oat_core::{CaseCheck, CaseError, TesterConfig};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::constraints::{self, PatternCache, ARRAY_CHECKS, OBJECT_CHECKS, PRIMITIVE_CHECKS};
use crate::error::{DocumentationError, SchemaError, ValidationError};
use crate::kind::{as_node, is_nullable, is_truncated, json_type_name, merge_all_of, SchemaKind};

/// Breadcrumb of the root node.
pub const ROOT_REFERENCE: &str = "init";

const NULLABLE_HINT: &str = "If the value may be null, mark the schema with \
    `nullable: true` (OpenAPI 3) or `x-nullable: true` (Swagger 2).";

/// What the data being tested is: a response body or a request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ValidationTarget {
    /// Server output. `writeOnly` properties must not appear.
    #[default]
    Response,
    /// Client input. `readOnly` properties must not appear.
    Request,
}

impl ValidationTarget {
    /// The property flag that hides a property from this target.
    pub fn hidden_flag(&self) -> &'static str {
        match self {
            ValidationTarget::Response => "writeOnly",
            ValidationTarget::Request => "readOnly",
        }
    }

    fn hides(&self, property: &Value) -> bool {
        property
            .get(self.hidden_flag())
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl fmt::Display for ValidationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationTarget::Response => f.write_str("response"),
            ValidationTarget::Request => f.write_str("request"),
        }
    }
}

/// How an object node treats keys it does not declare.
enum Undeclared<'a> {
    Rejected,
    Accepted,
    Validated(&'a Value),
}

/// Recursive schema/data comparison.
///
/// A tester holds only its configuration and is immutable, so one instance
/// can serve any number of validations, from any number of threads.
#[derive(Debug, Clone)]
pub struct SchemaTester {
    config: TesterConfig,
    target: ValidationTarget,
    case_check: CaseCheck,
}

impl Default for SchemaTester {
    fn default() -> Self {
        Self::new(TesterConfig::default())
    }
}

impl SchemaTester {
    pub fn new(config: TesterConfig) -> Self {
        let case_check = config.case_checker();
        Self {
            config,
            target: ValidationTarget::default(),
            case_check,
        }
    }

    /// Test request bodies instead of responses.
    pub fn with_target(mut self, target: ValidationTarget) -> Self {
        self.target = target;
        self
    }

    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    pub fn target(&self) -> ValidationTarget {
        self.target
    }

    /// Assert that `data` conforms to `schema`.
    ///
    /// # Errors
    ///
    /// - `ValidationError::Documentation` on the first mismatch.
    /// - `ValidationError::Case` when a key breaks the configured convention.
    /// - `ValidationError::Schema` when `schema` is malformed.
    pub fn validate(&self, schema: &Value, data: &Value) -> Result<(), ValidationError> {
        self.validate_at(schema, data, ROOT_REFERENCE)
    }

    /// Like [`SchemaTester::validate`], starting from an explicit breadcrumb.
    pub fn validate_at(&self, schema: &Value, data: &Value, reference: &str) -> Result<(), ValidationError> {
        let patterns = PatternCache::default();
        let walk = Walk {
            tester: self,
            patterns: &patterns,
            quiet: false,
        };
        walk.walk(schema, data, reference).map_err(|failure| match failure {
            Failure::Error(e) => e,
            // Only quiet walks produce bare mismatches.
            Failure::Mismatch => {
                DocumentationError::new("The data does not match the schema", schema, data, reference).into()
            }
        })
    }
}

/// Why a walk stopped.
enum Failure {
    /// The data does not match, without the details. Raised instead of a
    /// documentation error while a `oneOf`/`anyOf` alternative is tried.
    Mismatch,
    Error(ValidationError),
}

impl From<ValidationError> for Failure {
    fn from(e: ValidationError) -> Self {
        Failure::Error(e)
    }
}

impl From<SchemaError> for Failure {
    fn from(e: SchemaError) -> Self {
        Failure::Error(e.into())
    }
}

impl From<CaseError> for Failure {
    fn from(e: CaseError) -> Self {
        Failure::Error(e.into())
    }
}

/// State of one validation.
#[derive(Clone, Copy)]
struct Walk<'a> {
    tester: &'a SchemaTester,
    patterns: &'a PatternCache,
    quiet: bool,
}

impl Walk<'_> {
    /// A documentation failure. `build` runs only when the details are kept.
    fn mismatch(&self, build: impl FnOnce() -> DocumentationError) -> Failure {
        if self.quiet {
            Failure::Mismatch
        } else {
            Failure::Error(build().into())
        }
    }

    fn type_mismatch(&self, kind: SchemaKind, schema: &Value, data: &Value, reference: &str) -> Failure {
        self.mismatch(|| {
            DocumentationError::new(
                format!("Expected type `{kind}` but received `{}`", json_type_name(data)),
                schema,
                data,
                reference,
            )
        })
    }

    fn walk(&self, schema: &Value, data: &Value, reference: &str) -> Result<(), Failure> {
        trace!(reference, "visiting schema node");
        if is_truncated(schema) {
            return Ok(());
        }
        let kind = SchemaKind::classify(schema, reference)?;

        if data.is_null() {
            if is_nullable(schema) {
                return Ok(());
            }
            if !kind.is_composition() {
                return Err(self.mismatch(|| {
                    DocumentationError::new(
                        format!("Expected type `{kind}` but received null"),
                        schema,
                        data,
                        reference,
                    )
                    .with_hint(NULLABLE_HINT)
                }));
            }
        }

        match kind {
            SchemaKind::AllOf => {
                let merged = merge_all_of(schema, reference)?;
                self.walk(&merged, data, reference)
            }
            SchemaKind::OneOf => self.walk_one_of(schema, data, reference),
            SchemaKind::AnyOf => self.walk_any_of(schema, data, reference),
            SchemaKind::Object => self.walk_object(schema, data, reference),
            SchemaKind::Array => self.walk_array(schema, data, reference),
            primitive => self.walk_primitive(primitive, schema, data, reference),
        }
    }

    /// Walk one alternative of a composition. `Ok(false)` means the
    /// alternative does not describe the data.
    fn matches(&self, alternative: &Value, data: &Value, reference: &str) -> Result<bool, Failure> {
        let quiet = Walk { quiet: true, ..*self };
        match quiet.walk(alternative, data, reference) {
            Ok(()) => Ok(true),
            Err(Failure::Mismatch | Failure::Error(ValidationError::Documentation(_))) => Ok(false),
            Err(other) => Err(other),
        }
    }

    fn walk_one_of(&self, schema: &Value, data: &Value, reference: &str) -> Result<(), Failure> {
        let alternatives = alternatives(schema, "oneOf", reference)?;
        let mut matched = 0usize;
        for alternative in alternatives {
            if self.matches(alternative, data, reference)? {
                matched += 1;
            }
        }
        debug!(reference, matched, alternatives = alternatives.len(), "evaluated oneOf");
        if matched == 1 {
            return Ok(());
        }
        Err(self.mismatch(|| {
            DocumentationError::new(
                format!("Expected data to match one and only one of the oneOf schema types; found {matched} matches"),
                schema,
                data,
                reference,
            )
        }))
    }

    fn walk_any_of(&self, schema: &Value, data: &Value, reference: &str) -> Result<(), Failure> {
        let alternatives = alternatives(schema, "anyOf", reference)?;
        for (index, alternative) in alternatives.iter().enumerate() {
            if self.matches(alternative, data, reference)? {
                debug!(reference, index, "anyOf matched");
                return Ok(());
            }
        }
        debug!(reference, alternatives = alternatives.len(), "anyOf matched nothing");
        Err(self.mismatch(|| {
            DocumentationError::new(
                "Expected data to match one or more of the anyOf schema types; found no matches",
                schema,
                data,
                reference,
            )
        }))
    }

    fn walk_object(&self, schema: &Value, data: &Value, reference: &str) -> Result<(), Failure> {
        let Some(object) = data.as_object() else {
            return Err(self.type_mismatch(SchemaKind::Object, schema, data, reference));
        };
        let node = as_node(schema, reference)?;
        let target = self.tester.target;

        let properties = match node.get("properties") {
            None => None,
            Some(Value::Object(properties)) => Some(properties),
            Some(_) => return Err(invalid_keyword(reference, "properties", "a mapping").into()),
        };
        let undeclared = match node.get("additionalProperties") {
            None if properties.is_none() => {
                return Err(SchemaError::MissingProperties {
                    reference: reference.to_string(),
                }
                .into())
            }
            None | Some(Value::Bool(false)) => Undeclared::Rejected,
            Some(Value::Bool(true)) => Undeclared::Accepted,
            Some(Value::Object(additional)) if additional.is_empty() => Undeclared::Accepted,
            Some(additional @ Value::Object(_)) => Undeclared::Validated(additional),
            Some(_) => {
                return Err(invalid_keyword(reference, "additionalProperties", "a boolean or a schema").into())
            }
        };
        let empty = Map::new();
        let properties = properties.unwrap_or(&empty);

        let missing = missing_required(target, node, properties, object, reference)?;
        if !missing.is_empty() {
            return Err(self.mismatch(|| {
                DocumentationError::new(
                    format!(
                        "The following required properties are missing from the {target}: {}",
                        quoted_list(&missing)
                    ),
                    schema,
                    data,
                    reference,
                )
                .with_hint("Remove the key(s) from the schema's `required` list, or include them in the data.")
            }));
        }

        if matches!(undeclared, Undeclared::Rejected) {
            let excess: Vec<&str> = object
                .keys()
                .filter(|key| !properties.contains_key(*key))
                .map(String::as_str)
                .collect();
            if !excess.is_empty() {
                return Err(self.mismatch(|| {
                    DocumentationError::new(
                        format!(
                            "The following properties were found in the {target}, but are missing from the schema definition: {}",
                            quoted_list(&excess)
                        ),
                        schema,
                        data,
                        reference,
                    )
                    .with_hint("Remove the key(s) from the data, or add them to the schema's `properties`.")
                }));
            }
        }

        if let Some(message) = constraints::run(OBJECT_CHECKS, node, data, reference)? {
            return Err(self.mismatch(|| DocumentationError::new(message, schema, data, reference)));
        }

        for (key, value) in object {
            if !self.tester.config.is_ignored(key) {
                (self.tester.case_check)(key)?;
            }
            let child = match (properties.get(key), &undeclared) {
                (Some(property), _) => property,
                (None, Undeclared::Validated(additional)) => *additional,
                (None, _) => continue,
            };
            if target.hides(child) {
                return Err(self.mismatch(|| {
                    DocumentationError::new(
                        format!(
                            "The property \"{key}\" is marked `{}` and must not appear in the {target}",
                            target.hidden_flag()
                        ),
                        schema,
                        data,
                        reference,
                    )
                }));
            }
            self.walk(child, value, &format!("{reference}.dict:key:{key}"))?;
        }
        Ok(())
    }

    fn walk_array(&self, schema: &Value, data: &Value, reference: &str) -> Result<(), Failure> {
        let Some(elements) = data.as_array() else {
            return Err(self.type_mismatch(SchemaKind::Array, schema, data, reference));
        };
        let node = as_node(schema, reference)?;
        let items = match node.get("items") {
            None => {
                return Err(SchemaError::MissingItems {
                    reference: reference.to_string(),
                }
                .into())
            }
            Some(items @ Value::Object(_)) => items,
            Some(_) => return Err(invalid_keyword(reference, "items", "a schema mapping").into()),
        };

        if let Some(message) = constraints::run(ARRAY_CHECKS, node, data, reference)? {
            return Err(self.mismatch(|| DocumentationError::new(message, schema, data, reference)));
        }

        if items.as_object().is_some_and(Map::is_empty) {
            if elements.is_empty() {
                return Ok(());
            }
            let target = self.tester.target;
            return Err(self.mismatch(|| {
                DocumentationError::new(
                    format!("The schema documents an empty array, but the {target} contains items"),
                    schema,
                    data,
                    reference,
                )
                .with_hint("Document the array's `items`, or stop returning elements.")
            }));
        }

        let child_reference = format!("{reference}.list");
        for element in elements {
            self.walk(items, element, &child_reference)?;
        }
        Ok(())
    }

    fn walk_primitive(&self, kind: SchemaKind, schema: &Value, data: &Value, reference: &str) -> Result<(), Failure> {
        if !kind.accepts_type(data) {
            return Err(self.type_mismatch(kind, schema, data, reference));
        }
        let node = as_node(schema, reference)?;
        let breach = match self.patterns.check(node, data, reference)? {
            Some(message) => Some(message),
            None => constraints::run(PRIMITIVE_CHECKS, node, data, reference)?,
        };
        match breach {
            Some(message) => Err(self.mismatch(|| DocumentationError::new(message, schema, data, reference))),
            None => Ok(()),
        }
    }
}

/// Required keys absent from the data, in schema order. Properties hidden
/// from the target are never required.
fn missing_required<'a>(
    target: ValidationTarget,
    node: &'a Map<String, Value>,
    properties: &Map<String, Value>,
    object: &Map<String, Value>,
    reference: &str,
) -> Result<Vec<&'a str>, SchemaError> {
    let Some(required) = node.get("required") else {
        return Ok(Vec::new());
    };
    let required = required
        .as_array()
        .ok_or_else(|| invalid_keyword(reference, "required", "a sequence of strings"))?;
    let mut missing = Vec::new();
    for name in required {
        let name = name
            .as_str()
            .ok_or_else(|| invalid_keyword(reference, "required", "a sequence of strings"))?;
        let hidden = properties.get(name).is_some_and(|p| target.hides(p));
        if !hidden && !object.contains_key(name) {
            missing.push(name);
        }
    }
    Ok(missing)
}

fn alternatives<'a>(schema: &'a Value, keyword: &'static str, reference: &str) -> Result<&'a Vec<Value>, SchemaError> {
    as_node(schema, reference)?
        .get(keyword)
        .and_then(Value::as_array)
        .ok_or_else(|| invalid_keyword(reference, keyword, "a sequence of schemas"))
}

fn invalid_keyword(reference: &str, keyword: &'static str, expected: &'static str) -> SchemaError {
    SchemaError::InvalidKeyword {
        reference: reference.to_string(),
        keyword,
        expected,
    }
}

fn quoted_list(keys: &[&str]) -> String {
    keys.iter().map(|k| format!("\"{k}\"")).collect::<Vec<_>>().join(", ")
}
