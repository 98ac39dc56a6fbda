//! # Example Derivation
//!
//! Builds a representative value from a schema node for the `Expected:`
//! section of a report. The derivation is deterministic and total: any node,
//! including malformed ones, yields some value. A node the tester accepts
//! yields a value the tester accepts against that node, provided its
//! `minItems`, `minProperties` and `minLength` fit under the size caps below.
//! Larger minimums produce a capped example, so the report stays small.
//!
//! Composition nodes resolve to their first alternative. `writeOnly`
//! properties are left out because a response would never carry them.
//! Arrays with `uniqueItems` get distinct items by stepping through nearby
//! values of the item schema.

use serde_json::{json, Map, Number, Value};

use crate::constraints::values_equal;
use crate::formats;
use crate::kind::{as_node, is_truncated, merge_all_of, SchemaKind};

const PLACEHOLDER_STRING: &str = "string";
const PLACEHOLDER_KEY: &str = "additionalProp";

/// Most array items or placeholder properties an example holds.
pub const MAX_EXAMPLE_ITEMS: u64 = 3;

/// Longest string a `minLength` pads an example to.
pub const MAX_EXAMPLE_LENGTH: u64 = 64;

/// A value that conforms to `schema`. Returns `Value::Null` for nodes that
/// cannot be classified.
pub fn example_from_schema(schema: &Value) -> Value {
    if is_truncated(schema) {
        return Value::Null;
    }
    let Ok(kind) = SchemaKind::classify(schema, "") else {
        return Value::Null;
    };
    let Ok(node) = as_node(schema, "") else {
        return Value::Null;
    };

    match kind {
        SchemaKind::AllOf => merge_all_of(schema, "")
            .map(|merged| example_from_schema(&merged))
            .unwrap_or(Value::Null),
        SchemaKind::OneOf => first_alternative(node, "oneOf"),
        SchemaKind::AnyOf => first_alternative(node, "anyOf"),
        SchemaKind::Object => object_example(node),
        SchemaKind::Array => array_example(node),
        primitive => node
            .get("example")
            .cloned()
            .or_else(|| first_enum_member(node))
            .unwrap_or_else(|| primitive_placeholder(primitive, node)),
    }
}

fn first_alternative(node: &Map<String, Value>, keyword: &str) -> Value {
    node.get(keyword)
        .and_then(Value::as_array)
        .and_then(|alternatives| alternatives.first())
        .map(example_from_schema)
        .unwrap_or(Value::Null)
}

fn first_enum_member(node: &Map<String, Value>) -> Option<Value> {
    node.get("enum").and_then(Value::as_array)?.first().cloned()
}

fn object_example(node: &Map<String, Value>) -> Value {
    let mut example = Map::new();
    if let Some(properties) = node.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            let write_only = property.get("writeOnly").and_then(Value::as_bool).unwrap_or(false);
            if !write_only {
                example.insert(name.clone(), example_from_schema(property));
            }
        }
    }

    if let Some(additional) = node.get("additionalProperties").filter(|v| is_non_empty_mapping(v)) {
        let wanted = node
            .get("minProperties")
            .and_then(Value::as_u64)
            .map_or(1, |n| n.clamp(1, MAX_EXAMPLE_ITEMS)) as usize;
        let value = example_from_schema(additional);
        let mut n = 1;
        while example.len() < wanted || n == 1 {
            example.insert(format!("{PLACEHOLDER_KEY}{n}"), value.clone());
            n += 1;
        }
    }
    Value::Object(example)
}

fn is_non_empty_mapping(value: &Value) -> bool {
    value.as_object().is_some_and(|m| !m.is_empty())
}

fn array_example(node: &Map<String, Value>) -> Value {
    let Some(items) = node.get("items").filter(|v| is_non_empty_mapping(v)) else {
        return json!([]);
    };
    let min = node
        .get("minItems")
        .and_then(Value::as_u64)
        .map_or(1, |n| n.clamp(1, MAX_EXAMPLE_ITEMS));
    let max = node.get("maxItems").and_then(Value::as_u64).unwrap_or(min);
    let count = min.min(max) as usize;

    let unique = node.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false);
    if !unique {
        return Value::Array(vec![example_from_schema(items); count]);
    }
    let mut distinct: Vec<Value> = Vec::with_capacity(count);
    for candidate in candidates(items) {
        if distinct.len() == count {
            break;
        }
        if !distinct.iter().any(|seen| values_equal(seen, &candidate)) {
            distinct.push(candidate);
        }
    }
    // The item schema admits too few values; keep the count right at least.
    while distinct.len() < count {
        distinct.push(example_from_schema(items));
    }
    Value::Array(distinct)
}

/// Values that conform to `schema`, the plain example first. Only the
/// first value is guaranteed; the rest are best-effort neighbours.
fn candidates(schema: &Value) -> Vec<Value> {
    let base = example_from_schema(schema);
    let mut found = vec![base.clone()];
    if is_truncated(schema) {
        return found;
    }
    let (Ok(kind), Ok(node)) = (SchemaKind::classify(schema, ""), as_node(schema, "")) else {
        return found;
    };
    if let Some(members) = node.get("enum").and_then(Value::as_array) {
        found.extend(members.iter().cloned());
        return found;
    }

    match kind {
        SchemaKind::AllOf => {
            if let Ok(merged) = merge_all_of(schema, "") {
                found.extend(candidates(&merged));
            }
        }
        SchemaKind::OneOf | SchemaKind::AnyOf => {
            let keyword = if kind == SchemaKind::OneOf { "oneOf" } else { "anyOf" };
            if let Some(first) = node.get(keyword).and_then(Value::as_array).and_then(|a| a.first()) {
                found.extend(candidates(first));
            }
        }
        SchemaKind::Integer => {
            if let Some(base) = base.as_i64() {
                found.extend(integer_neighbours(node, base).into_iter().map(Value::from));
            }
        }
        SchemaKind::Number => {
            if let Some(base) = base.as_f64() {
                found.extend(number_neighbours(node, base).into_iter().filter_map(Number::from_f64).map(Value::Number));
            }
        }
        SchemaKind::Boolean => found.extend([Value::Bool(true), Value::Bool(false)]),
        SchemaKind::Object => {
            if let Value::Object(object) = &base {
                found.extend(object_neighbours(node, object));
            }
        }
        SchemaKind::Array => {}
        _ => {
            let free_form = !node.contains_key("format") && !node.contains_key("pattern");
            if let (true, Some(text)) = (free_form, base.as_str()) {
                found.extend(string_neighbours(node, text).into_iter().map(Value::String));
            }
        }
    }
    found
}

fn integer_neighbours(node: &Map<String, Value>, base: i64) -> Vec<i64> {
    let step = bound(node, "multipleOf")
        .filter(|m| *m >= 1.0 && m.fract() == 0.0)
        .map_or(1, |m| m as i64);
    let (low, high) = range(node, 1.0);
    let within = |n: i64| {
        let n = n as f64;
        low.map_or(true, |l| n >= l.ceil()) && high.map_or(true, |h| n <= h.floor())
    };
    let mut neighbours = Vec::new();
    for k in 1..=MAX_EXAMPLE_ITEMS as i64 {
        let offset = step.saturating_mul(k);
        for n in [base.checked_add(offset), base.checked_sub(offset)].into_iter().flatten() {
            if within(n) {
                neighbours.push(n);
            }
        }
    }
    neighbours
}

fn number_neighbours(node: &Map<String, Value>, base: f64) -> Vec<f64> {
    let multiple = bound(node, "multipleOf").filter(|m| *m > 0.0);
    let (low, high) = range(node, 0.5);
    let within = |n: f64| n.is_finite() && low.map_or(true, |l| n >= l) && high.map_or(true, |h| n <= h);
    let mut neighbours = Vec::new();
    for k in 1..=MAX_EXAMPLE_ITEMS {
        let k = k as f64;
        let steps = match multiple {
            // Whole multiples of `m`, so float noise does not accumulate.
            Some(m) => {
                let q = (base / m).round();
                [(q + k) * m, (q - k) * m]
            }
            None => [base + k, base - k],
        };
        neighbours.extend(steps.into_iter().filter(|n| within(*n)));
    }
    neighbours
}

fn string_neighbours(node: &Map<String, Value>, base: &str) -> Vec<String> {
    let max = node.get("maxLength").and_then(Value::as_u64);
    let length = base.chars().count() as u64;
    let mut neighbours = Vec::new();
    for digit in ('0'..='9').take(MAX_EXAMPLE_ITEMS as usize * 2) {
        if max.map_or(true, |m| length < m) {
            neighbours.push(format!("{base}{digit}"));
        } else if length > 0 {
            let mut text: String = base.chars().take(length as usize - 1).collect();
            text.push(digit);
            neighbours.push(text);
        }
    }
    neighbours
}

/// Copies of `base` with the first shown property swapped for its own
/// neighbours.
fn object_neighbours(node: &Map<String, Value>, base: &Map<String, Value>) -> Vec<Value> {
    let Some(properties) = node.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let Some((name, property)) = properties.iter().find(|(name, _)| base.contains_key(*name)) else {
        return Vec::new();
    };
    candidates(property)
        .into_iter()
        .skip(1)
        .map(|value| {
            let mut object = base.clone();
            object.insert(name.clone(), value);
            Value::Object(object)
        })
        .collect()
}

fn primitive_placeholder(kind: SchemaKind, node: &Map<String, Value>) -> Value {
    match kind {
        SchemaKind::Integer => Value::Number(Number::from(integer_placeholder(node))),
        SchemaKind::Number => Number::from_f64(number_placeholder(node))
            .map(Value::Number)
            .unwrap_or_else(|| json!(1.0)),
        SchemaKind::Boolean => Value::Bool(true),
        _ => Value::String(string_placeholder(node)),
    }
}

fn string_placeholder(node: &Map<String, Value>) -> String {
    if let Some(text) = node.get("format").and_then(Value::as_str).and_then(formats::placeholder) {
        return text.to_string();
    }
    let mut text = PLACEHOLDER_STRING.to_string();
    if let Some(min) = node.get("minLength").and_then(Value::as_u64) {
        let min = min.min(MAX_EXAMPLE_LENGTH);
        while (text.chars().count() as u64) < min {
            text.push('s');
        }
    }
    if let Some(max) = node.get("maxLength").and_then(Value::as_u64) {
        text = text.chars().take(max as usize).collect();
    }
    text
}

fn bound(node: &Map<String, Value>, keyword: &str) -> Option<f64> {
    node.get(keyword).and_then(Value::as_f64)
}

/// The inclusive lower and upper bound implied by the node, in either the
/// boolean or the numeric form of the exclusive keywords.
fn range(node: &Map<String, Value>, step: f64) -> (Option<f64>, Option<f64>) {
    let exclusive = |keyword: &str| matches!(node.get(keyword), Some(Value::Bool(true)));
    let mut low = bound(node, "minimum").map(|m| if exclusive("exclusiveMinimum") { m + step } else { m });
    let mut high = bound(node, "maximum").map(|m| if exclusive("exclusiveMaximum") { m - step } else { m });
    if let Some(m) = bound(node, "exclusiveMinimum") {
        low = Some(low.map_or(m + step, |l| l.max(m + step)));
    }
    if let Some(m) = bound(node, "exclusiveMaximum") {
        high = Some(high.map_or(m - step, |h| h.min(m - step)));
    }
    (low, high)
}

fn integer_placeholder(node: &Map<String, Value>) -> i64 {
    let (low, high) = range(node, 1.0);
    let low = low.map(f64::ceil);
    let high = high.map(f64::floor);
    let mut candidate = 1.0_f64;
    if let Some(l) = low.filter(|l| candidate < *l) {
        candidate = l;
    }
    if let Some(h) = high.filter(|h| candidate > *h) {
        candidate = h;
    }
    if let Some(m) = bound(node, "multipleOf").filter(|m| *m >= 1.0 && m.fract() == 0.0) {
        let up = (candidate / m).ceil() * m;
        candidate = match high {
            Some(h) if up > h => (h / m).floor() * m,
            _ => up,
        };
    }
    candidate as i64
}

fn number_placeholder(node: &Map<String, Value>) -> f64 {
    let (low, high) = range(node, 0.5);
    let mut candidate = 1.0_f64;
    if let Some(l) = low.filter(|l| candidate < *l) {
        candidate = l;
    }
    if let Some(h) = high.filter(|h| candidate > *h) {
        candidate = h;
    }
    if let Some(m) = bound(node, "multipleOf").filter(|m| *m > 0.0) {
        let up = (candidate / m).ceil() * m;
        candidate = match high {
            Some(h) if up > h => {
                let down = (h / m).floor() * m;
                if down > h {
                    down - m
                } else {
                    down
                }
            }
            _ => up,
        };
    }
    candidate
}
