//! # Schema Node Classification
//!
//! Every schema node is classified once into a [`SchemaKind`] and the tester
//! dispatches on the variant. Composition keywords win over `type` because
//! composed nodes frequently carry no `type` of their own.
//!
//! This module also owns the node-level helpers shared by the tester and the
//! example derivation: nullability, `allOf` merging and the truncation
//! sentinel left behind by the document loader.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::SchemaError;

/// Marker key of the placeholder substituted for `$ref` cycles past the
/// loader's recursion limit. A node carrying it accepts any data.
pub const TRUNCATED_MARKER: &str = "x-oat-truncated";

/// The kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    File,
    OneOf,
    AnyOf,
    AllOf,
}

impl SchemaKind {
    /// Classify `schema`.
    ///
    /// # Errors
    ///
    /// - `SchemaError::UnresolvedReference` if the node still holds a `$ref`.
    /// - `SchemaError::InvalidType` for a `type` OpenAPI does not define.
    /// - `SchemaError::MissingType` when no `type` is present and none can be
    ///   inferred from `properties` or `additionalProperties`.
    pub fn classify(schema: &Value, reference: &str) -> Result<Self, SchemaError> {
        let node = as_node(schema, reference)?;

        if let Some(target) = node.get("$ref") {
            return Err(SchemaError::UnresolvedReference {
                reference: reference.to_string(),
                target: target.as_str().map_or_else(|| target.to_string(), str::to_string),
            });
        }

        if node.contains_key("allOf") {
            return Ok(SchemaKind::AllOf);
        }
        if node.contains_key("oneOf") {
            return Ok(SchemaKind::OneOf);
        }
        if node.contains_key("anyOf") {
            return Ok(SchemaKind::AnyOf);
        }

        match node.get("type") {
            Some(Value::String(name)) => Self::from_type_name(name).ok_or_else(|| {
                SchemaError::InvalidType {
                    reference: reference.to_string(),
                    value: format!("\"{name}\""),
                }
            }),
            Some(other) => Err(SchemaError::InvalidType {
                reference: reference.to_string(),
                value: other.to_string(),
            }),
            None if node.contains_key("properties") || node.contains_key("additionalProperties") => {
                Ok(SchemaKind::Object)
            }
            None => Err(SchemaError::MissingType {
                reference: reference.to_string(),
            }),
        }
    }

    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "object" => Some(SchemaKind::Object),
            "array" => Some(SchemaKind::Array),
            "string" => Some(SchemaKind::String),
            "integer" => Some(SchemaKind::Integer),
            "number" => Some(SchemaKind::Number),
            "boolean" => Some(SchemaKind::Boolean),
            "file" => Some(SchemaKind::File),
            _ => None,
        }
    }

    /// The `type` name, or the composition keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Object => "object",
            SchemaKind::Array => "array",
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::File => "file",
            SchemaKind::OneOf => "oneOf",
            SchemaKind::AnyOf => "anyOf",
            SchemaKind::AllOf => "allOf",
        }
    }

    /// Whether this kind is a composition keyword.
    pub fn is_composition(&self) -> bool {
        matches!(self, SchemaKind::OneOf | SchemaKind::AnyOf | SchemaKind::AllOf)
    }

    /// Whether `data` has the JSON type this primitive kind requires.
    ///
    /// Booleans are never numbers, and integers exclude any value stored as a
    /// float (`1.0` is a number, not an integer). Containers and composition
    /// kinds defer to their own handlers and always return `false`.
    pub fn accepts_type(&self, data: &Value) -> bool {
        match self {
            SchemaKind::String | SchemaKind::File => data.is_string(),
            SchemaKind::Integer => data.is_i64() || data.is_u64(),
            SchemaKind::Number => data.is_number(),
            SchemaKind::Boolean => data.is_boolean(),
            SchemaKind::Object => data.is_object(),
            SchemaKind::Array => data.is_array(),
            _ => false,
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The schema node as a mapping.
pub(crate) fn as_node<'a>(schema: &'a Value, reference: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    schema.as_object().ok_or_else(|| SchemaError::InvalidKeyword {
        reference: reference.to_string(),
        keyword: "schema",
        expected: "a mapping",
    })
}

/// The JSON type name of `data`, as used in messages.
pub fn json_type_name(data: &Value) -> &'static str {
    match data {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether the node accepts `null`: `nullable` (OpenAPI 3) or `x-nullable`
/// (Swagger 2), as a boolean or the string `"true"`. Both keys are always
/// consulted regardless of the document dialect.
pub fn is_nullable(schema: &Value) -> bool {
    ["nullable", "x-nullable"]
        .iter()
        .any(|key| match schema.get(key) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        })
}

/// Whether the node is the loader's recursion sentinel.
pub fn is_truncated(schema: &Value) -> bool {
    schema.get(TRUNCATED_MARKER).and_then(Value::as_bool).unwrap_or(false)
}

/// The recursion sentinel.
pub fn truncated_placeholder() -> Value {
    let mut node = Map::new();
    node.insert(TRUNCATED_MARKER.to_string(), Value::Bool(true));
    Value::Object(node)
}

/// Collapse an `allOf` node into one synthetic schema.
///
/// The node's own keywords come first, then each listed sub-schema in order.
/// Overlapping keys merge: mappings merge recursively, sequences concatenate
/// (skipping entries already present, so `required` stays a set), anything
/// else is overwritten by the later entry. The result is typed `object` when
/// it carries `properties` but no `type`.
pub fn merge_all_of(schema: &Value, reference: &str) -> Result<Value, SchemaError> {
    let node = as_node(schema, reference)?;
    let parts = node
        .get("allOf")
        .and_then(Value::as_array)
        .ok_or_else(|| SchemaError::InvalidKeyword {
            reference: reference.to_string(),
            keyword: "allOf",
            expected: "a sequence of schemas",
        })?;

    let mut merged = Map::new();
    for (key, value) in node.iter().filter(|(k, _)| k.as_str() != "allOf") {
        merge_entry(&mut merged, key, value);
    }
    for part in parts {
        let part_node = as_node(part, reference)?;
        if let Some(target) = part_node.get("$ref") {
            return Err(SchemaError::UnresolvedReference {
                reference: reference.to_string(),
                target: target.as_str().map_or_else(|| target.to_string(), str::to_string),
            });
        }
        for (key, value) in part_node {
            merge_entry(&mut merged, key, value);
        }
    }

    if !merged.contains_key("type") && merged.contains_key("properties") {
        merged.insert("type".to_string(), Value::String("object".to_string()));
    }
    Ok(Value::Object(merged))
}

fn merge_entry(target: &mut Map<String, Value>, key: &str, value: &Value) {
    match (target.get_mut(key), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                merge_entry(existing, k, v);
            }
        }
        (Some(Value::Array(existing)), Value::Array(incoming)) => {
            for item in incoming {
                if !existing.contains(item) {
                    existing.push(item.clone());
                }
            }
        }
        _ => {
            target.insert(key.to_string(), value.clone());
        }
    }
}
