//! # Value Constraints
//!
//! Keyword validators applied after a node's type check has passed. Each
//! validator inspects one keyword and returns `Ok(None)` when the data
//! satisfies it, `Ok(Some(message))` when it does not, and `Err` when the
//! keyword itself is malformed.
//!
//! Validators are grouped into per-kind tables. The tester runs the table
//! for the node's kind and stops at the first breach.
//!
//! `pattern` is not in a table: it goes through a [`PatternCache`] that lives
//! for one validation, so the pattern of an array's items compiles once
//! rather than once per element. Patterns are ECMA-262 style, so look-around
//! and backreferences are supported.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use fancy_regex::Regex;
use oat_core::canonical::to_compact;
use serde_json::{Map, Number, Value};

use crate::error::SchemaError;
use crate::formats;

type Check = fn(&Map<String, Value>, &Value, &str) -> Result<Option<String>, SchemaError>;

/// Constraints on strings, numbers, booleans and files.
pub const PRIMITIVE_CHECKS: &[(&str, Check)] = &[
    ("enum", check_enum),
    ("format", check_format),
    ("multipleOf", check_multiple_of),
    ("minimum", check_minimum),
    ("exclusiveMinimum", check_numeric_exclusive_minimum),
    ("maximum", check_maximum),
    ("exclusiveMaximum", check_numeric_exclusive_maximum),
    ("minLength", check_min_length),
    ("maxLength", check_max_length),
];

/// Constraints on arrays, checked against the element count.
pub const ARRAY_CHECKS: &[(&str, Check)] = &[
    ("minItems", check_min_items),
    ("maxItems", check_max_items),
    ("uniqueItems", check_unique_items),
];

/// Constraints on objects, checked against the key count.
pub const OBJECT_CHECKS: &[(&str, Check)] = &[
    ("minProperties", check_min_properties),
    ("maxProperties", check_max_properties),
];

/// Run every check in `table` whose keyword is present on the node.
pub fn run(
    table: &[(&str, Check)],
    schema: &Map<String, Value>,
    data: &Value,
    reference: &str,
) -> Result<Option<String>, SchemaError> {
    for (keyword, check) in table {
        if schema.contains_key(*keyword) {
            if let Some(message) = check(schema, data, reference)? {
                return Ok(Some(message));
            }
        }
    }
    Ok(None)
}

/// Deep structural equality in which numbers compare by value, so `1`
/// equals `1.0`. Used by `enum` and `uniqueItems`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, l)| y.get(k).is_some_and(|r| values_equal(l, r)))
        }
        _ => a == b,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn invalid(reference: &str, keyword: &'static str, expected: &'static str) -> SchemaError {
    SchemaError::InvalidKeyword {
        reference: reference.to_string(),
        keyword,
        expected,
    }
}

fn number_keyword<'a>(
    schema: &'a Map<String, Value>,
    keyword: &'static str,
    reference: &str,
) -> Result<&'a Number, SchemaError> {
    match schema.get(keyword) {
        Some(Value::Number(n)) => Ok(n),
        _ => Err(invalid(reference, keyword, "a number")),
    }
}

fn count_keyword(
    schema: &Map<String, Value>,
    keyword: &'static str,
    reference: &str,
) -> Result<usize, SchemaError> {
    schema
        .get(keyword)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(reference, keyword, "a non-negative integer"))
}

/// Whether `exclusiveMinimum`/`exclusiveMaximum` is the OpenAPI 3.0 boolean form set to true.
fn exclusive_flag(schema: &Map<String, Value>, keyword: &str) -> bool {
    matches!(schema.get(keyword), Some(Value::Bool(true)))
}

/// Render an exclusive bound as the inclusive bound it implies for messages:
/// integers move by one, other numbers are shown as-is.
fn effective_bound(bound: &Number, exclusive: bool, upward: bool) -> String {
    match (exclusive, bound.as_i64()) {
        (true, Some(n)) if upward => n.saturating_add(1).to_string(),
        (true, Some(n)) => n.saturating_sub(1).to_string(),
        (true, None) => format!("exclusively {bound}"),
        (false, _) => bound.to_string(),
    }
}

fn check_enum(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let members = schema
        .get("enum")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(reference, "enum", "a sequence"))?;
    if members.iter().any(|m| values_equal(m, data)) {
        return Ok(None);
    }
    Ok(Some(format!(
        "Expected a member of the enum {} but received {}",
        to_compact(&Value::Array(members.clone())),
        to_compact(data)
    )))
}

/// Compiled `pattern` keywords, keyed by the pattern text.
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    compiled: RefCell<HashMap<String, Rc<Regex>>>,
}

impl PatternCache {
    fn compile(&self, pattern: &str, reference: &str) -> Result<Rc<Regex>, SchemaError> {
        if let Some(regex) = self.compiled.borrow().get(pattern) {
            return Ok(Rc::clone(regex));
        }
        let regex = Regex::new(pattern).map_err(|e| invalid_pattern(reference, pattern, &e))?;
        let regex = Rc::new(regex);
        self.compiled
            .borrow_mut()
            .insert(pattern.to_string(), Rc::clone(&regex));
        Ok(regex)
    }

    /// The `pattern` check. Unanchored, like every OpenAPI pattern.
    pub(crate) fn check(
        &self,
        schema: &Map<String, Value>,
        data: &Value,
        reference: &str,
    ) -> Result<Option<String>, SchemaError> {
        let Some(pattern) = schema.get("pattern") else {
            return Ok(None);
        };
        let pattern = pattern
            .as_str()
            .ok_or_else(|| invalid(reference, "pattern", "a string"))?;
        let regex = self.compile(pattern, reference)?;
        let Some(text) = data.as_str() else {
            return Ok(None);
        };
        // Matching only fails when the backtracking limit is hit.
        if regex.is_match(text).map_err(|e| invalid_pattern(reference, pattern, &e))? {
            Ok(None)
        } else {
            Ok(Some(format!(
                "The string {} does not match the specified pattern: {pattern}",
                to_compact(data)
            )))
        }
    }
}

fn invalid_pattern(reference: &str, pattern: &str, error: &fancy_regex::Error) -> SchemaError {
    SchemaError::InvalidPattern {
        reference: reference.to_string(),
        pattern: pattern.to_string(),
        reason: error.to_string(),
    }
}

fn check_format(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let format = schema
        .get("format")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(reference, "format", "a string"))?;
    match formats::validate(format, data) {
        Some(false) => Ok(Some(format!(
            "Expected a \"{format}\" formatted value but received {}",
            to_compact(data)
        ))),
        _ => Ok(None),
    }
}

fn check_multiple_of(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let multiple = number_keyword(schema, "multipleOf", reference)?;
    let Value::Number(value) = data else {
        return Ok(None);
    };
    let is_multiple = match (value.as_i64(), multiple.as_i64()) {
        (_, Some(m)) if m <= 0 => return Err(invalid(reference, "multipleOf", "a positive number")),
        (Some(v), Some(m)) => v.checked_rem(m) == Some(0),
        _ => {
            let (v, m) = (value.as_f64().unwrap_or(f64::NAN), multiple.as_f64().unwrap_or(f64::NAN));
            if m <= 0.0 || m.is_nan() {
                return Err(invalid(reference, "multipleOf", "a positive number"));
            }
            let quotient = v / m;
            (quotient - quotient.round()).abs() < 1e-9
        }
    };
    if is_multiple {
        Ok(None)
    } else {
        Ok(Some(format!("The value {value} should be a multiple of {multiple}")))
    }
}

fn check_minimum(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let minimum = number_keyword(schema, "minimum", reference)?;
    let exclusive = exclusive_flag(schema, "exclusiveMinimum");
    Ok(lower_bound_breach(data, minimum, exclusive))
}

fn check_maximum(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let maximum = number_keyword(schema, "maximum", reference)?;
    let exclusive = exclusive_flag(schema, "exclusiveMaximum");
    Ok(upper_bound_breach(data, maximum, exclusive))
}

/// `exclusiveMinimum` in its numeric form; the boolean form is handled by `minimum`.
fn check_numeric_exclusive_minimum(
    schema: &Map<String, Value>,
    data: &Value,
    reference: &str,
) -> Result<Option<String>, SchemaError> {
    match schema.get("exclusiveMinimum") {
        Some(Value::Number(bound)) => Ok(lower_bound_breach(data, bound, true)),
        Some(Value::Bool(_)) => Ok(None),
        _ => Err(invalid(reference, "exclusiveMinimum", "a boolean or a number")),
    }
}

/// `exclusiveMaximum` in its numeric form; the boolean form is handled by `maximum`.
fn check_numeric_exclusive_maximum(
    schema: &Map<String, Value>,
    data: &Value,
    reference: &str,
) -> Result<Option<String>, SchemaError> {
    match schema.get("exclusiveMaximum") {
        Some(Value::Number(bound)) => Ok(upper_bound_breach(data, bound, true)),
        Some(Value::Bool(_)) => Ok(None),
        _ => Err(invalid(reference, "exclusiveMaximum", "a boolean or a number")),
    }
}

fn lower_bound_breach(data: &Value, bound: &Number, exclusive: bool) -> Option<String> {
    let Value::Number(value) = data else {
        return None;
    };
    let breached = match compare_numbers(value, bound)? {
        Ordering::Less => true,
        Ordering::Equal => exclusive,
        Ordering::Greater => false,
    };
    breached.then(|| {
        format!(
            "The value {value} is lower than the specified minimum of {}",
            effective_bound(bound, exclusive, true)
        )
    })
}

fn upper_bound_breach(data: &Value, bound: &Number, exclusive: bool) -> Option<String> {
    let Value::Number(value) = data else {
        return None;
    };
    let breached = match compare_numbers(value, bound)? {
        Ordering::Greater => true,
        Ordering::Equal => exclusive,
        Ordering::Less => false,
    };
    breached.then(|| {
        format!(
            "The value {value} exceeds the maximum allowed value of {}",
            effective_bound(bound, exclusive, false)
        )
    })
}

fn check_min_length(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let min = count_keyword(schema, "minLength", reference)?;
    let Some(text) = data.as_str() else {
        return Ok(None);
    };
    Ok((text.chars().count() < min).then(|| {
        format!(
            "The length of {} is shorter than the specified minimum length of {min}",
            to_compact(data)
        )
    }))
}

fn check_max_length(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let max = count_keyword(schema, "maxLength", reference)?;
    let Some(text) = data.as_str() else {
        return Ok(None);
    };
    Ok((text.chars().count() > max).then(|| {
        format!(
            "The length of {} exceeds the specified maximum length of {max}",
            to_compact(data)
        )
    }))
}

fn check_min_items(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let min = count_keyword(schema, "minItems", reference)?;
    let Some(items) = data.as_array() else {
        return Ok(None);
    };
    Ok((items.len() < min).then(|| {
        format!(
            "The array {} has {} items, fewer than the specified minimum of {min}",
            to_compact(data),
            items.len()
        )
    }))
}

fn check_max_items(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let max = count_keyword(schema, "maxItems", reference)?;
    let Some(items) = data.as_array() else {
        return Ok(None);
    };
    Ok((items.len() > max).then(|| {
        format!(
            "The array {} has {} items, more than the specified maximum of {max}",
            to_compact(data),
            items.len()
        )
    }))
}

fn check_unique_items(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let unique = schema
        .get("uniqueItems")
        .and_then(Value::as_bool)
        .ok_or_else(|| invalid(reference, "uniqueItems", "a boolean"))?;
    let Some(items) = data.as_array().filter(|_| unique) else {
        return Ok(None);
    };
    let duplicated = items
        .iter()
        .enumerate()
        .any(|(i, a)| items[i + 1..].iter().any(|b| values_equal(a, b)));
    Ok(duplicated.then(|| format!("The array {} must contain unique items only", to_compact(data))))
}

fn check_min_properties(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let min = count_keyword(schema, "minProperties", reference)?;
    let Some(object) = data.as_object() else {
        return Ok(None);
    };
    Ok((object.len() < min).then(|| {
        format!(
            "The object {} has {} properties, fewer than the specified minimum of {min}",
            to_compact(data),
            object.len()
        )
    }))
}

fn check_max_properties(schema: &Map<String, Value>, data: &Value, reference: &str) -> Result<Option<String>, SchemaError> {
    let max = count_keyword(schema, "maxProperties", reference)?;
    let Some(object) = data.as_object() else {
        return Ok(None);
    };
    Ok((object.len() > max).then(|| {
        format!(
            "The object {} has {} properties, more than the specified maximum of {max}",
            to_compact(data),
            object.len()
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(schema: Value) -> Map<String, Value> {
        schema.as_object().cloned().unwrap()
    }

    fn primitive(schema: Value, data: Value) -> Result<Option<String>, SchemaError> {
        let node = node(schema);
        if let Some(message) = PatternCache::default().check(&node, &data, "init")? {
            return Ok(Some(message));
        }
        run(PRIMITIVE_CHECKS, &node, &data, "init")
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!({"a": [1, 2]}), &json!({"a": [1.0, 2]})));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!values_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn enum_membership() {
        assert_eq!(primitive(json!({"enum": ["a", "b"]}), json!("a")).unwrap(), None);
        let msg = primitive(json!({"enum": ["a", "b"]}), json!("c")).unwrap().unwrap();
        assert!(msg.contains(r#"["a","b"]"#));
        assert!(msg.contains("\"c\""));
    }

    #[test]
    fn enum_must_be_sequence() {
        let err = primitive(json!({"enum": "a"}), json!("a")).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKeyword { keyword: "enum", .. }));
    }

    #[test]
    fn pattern_mismatch() {
        let msg = primitive(json!({"pattern": "^[a-z]+$"}), json!("ABC")).unwrap().unwrap();
        assert!(msg.contains("does not match the specified pattern"));
        assert_eq!(primitive(json!({"pattern": "^[a-z]+$"}), json!("abc")).unwrap(), None);
    }

    #[test]
    fn invalid_pattern_is_schema_error() {
        let err = primitive(json!({"pattern": "([a-z"}), json!("abc")).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { ref pattern, .. } if pattern == "([a-z"));
    }

    #[test]
    fn pattern_supports_look_around_and_backreferences() {
        let password = json!({"pattern": "^(?=.*[A-Z]).{8,}$"});
        assert_eq!(primitive(password.clone(), json!("Password1")).unwrap(), None);
        assert!(primitive(password, json!("password1")).unwrap().is_some());
        let doubled = json!({"pattern": "^(\\w)\\1$"});
        assert_eq!(primitive(doubled.clone(), json!("aa")).unwrap(), None);
        assert!(primitive(doubled, json!("ab")).unwrap().is_some());
    }

    #[test]
    fn pattern_cache_compiles_each_pattern_once() {
        let cache = PatternCache::default();
        let schema = node(json!({"pattern": "^[0-9]+$"}));
        for text in ["1", "22", "x"] {
            cache.check(&schema, &json!(text), "init.list").unwrap();
        }
        assert_eq!(cache.compiled.borrow().len(), 1);
    }

    #[test]
    fn pattern_must_be_a_string() {
        let err = primitive(json!({"pattern": 5}), json!("a")).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKeyword { keyword: "pattern", .. }));
    }

    #[test]
    fn pattern_ignores_non_strings() {
        assert_eq!(primitive(json!({"pattern": "^a$"}), json!(5)).unwrap(), None);
    }

    #[test]
    fn format_breach_names_format() {
        let msg = primitive(json!({"format": "uuid"}), json!("nope")).unwrap().unwrap();
        assert!(msg.contains("\"uuid\" formatted value"));
        assert_eq!(primitive(json!({"format": "custom"}), json!("x")).unwrap(), None);
    }

    #[test]
    fn multiple_of_integers_and_floats() {
        assert_eq!(primitive(json!({"multipleOf": 3}), json!(9)).unwrap(), None);
        assert!(primitive(json!({"multipleOf": 3}), json!(10)).unwrap().is_some());
        assert_eq!(primitive(json!({"multipleOf": 0.1}), json!(1.1)).unwrap(), None);
        assert!(primitive(json!({"multipleOf": 0.5}), json!(1.2)).unwrap().is_some());
        assert!(primitive(json!({"multipleOf": 0}), json!(1)).is_err());
    }

    #[test]
    fn non_positive_multiple_of_is_schema_error() {
        for multiple in [json!(-1), json!(-2.5), json!(0.0)] {
            let err = primitive(json!({"multipleOf": multiple}), json!(i64::MIN)).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidKeyword { keyword: "multipleOf", .. }));
        }
        assert!(primitive(json!({"multipleOf": 1}), json!(i64::MIN)).unwrap().is_none());
    }

    #[test]
    fn minimum_and_maximum() {
        let schema = json!({"minimum": 3, "maximum": 5});
        assert_eq!(primitive(schema.clone(), json!(3)).unwrap(), None);
        assert_eq!(primitive(schema.clone(), json!(5)).unwrap(), None);
        let low = primitive(schema.clone(), json!(2)).unwrap().unwrap();
        assert!(low.contains("minimum of 3"));
        let high = primitive(schema, json!(6)).unwrap().unwrap();
        assert!(high.contains("maximum allowed value of 5"));
    }

    #[test]
    fn exclusive_bounds_shift_reported_bound() {
        let schema = json!({"minimum": 3, "exclusiveMinimum": true, "maximum": 5, "exclusiveMaximum": true});
        let low = primitive(schema.clone(), json!(3)).unwrap().unwrap();
        assert!(low.contains("minimum of 4"), "{low}");
        let high = primitive(schema.clone(), json!(5)).unwrap().unwrap();
        assert!(high.contains("maximum allowed value of 4"), "{high}");
        assert_eq!(primitive(schema, json!(4)).unwrap(), None);
    }

    #[test]
    fn numeric_exclusive_bounds() {
        let schema = json!({"exclusiveMinimum": 0, "exclusiveMaximum": 10});
        assert!(primitive(schema.clone(), json!(0)).unwrap().is_some());
        assert!(primitive(schema.clone(), json!(10)).unwrap().is_some());
        assert_eq!(primitive(schema, json!(0.5)).unwrap(), None);
    }

    #[test]
    fn string_lengths_count_characters() {
        let schema = json!({"minLength": 2, "maxLength": 3});
        assert_eq!(primitive(schema.clone(), json!("äö")).unwrap(), None);
        assert!(primitive(schema.clone(), json!("a")).unwrap().unwrap().contains("minimum length of 2"));
        assert!(primitive(schema, json!("abcd")).unwrap().unwrap().contains("maximum length of 3"));
    }

    #[test]
    fn negative_length_is_schema_error() {
        let err = primitive(json!({"minLength": -1}), json!("a")).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidKeyword { keyword: "minLength", .. }));
    }

    #[test]
    fn array_item_counts() {
        let schema = node(json!({"minItems": 1, "maxItems": 2}));
        assert!(run(ARRAY_CHECKS, &schema, &json!([]), "init").unwrap().is_some());
        assert_eq!(run(ARRAY_CHECKS, &schema, &json!([1, 2]), "init").unwrap(), None);
        assert!(run(ARRAY_CHECKS, &schema, &json!([1, 2, 3]), "init").unwrap().is_some());
    }

    #[test]
    fn unique_items_uses_deep_equality() {
        let schema = node(json!({"uniqueItems": true}));
        let nested = json!([{"a": 1}, {"a": 1.0}]);
        let msg = run(ARRAY_CHECKS, &schema, &nested, "init").unwrap().unwrap();
        assert!(msg.contains("unique items"));
        assert_eq!(run(ARRAY_CHECKS, &schema, &json!([{"a": 1}, {"a": 2}]), "init").unwrap(), None);
        let relaxed = node(json!({"uniqueItems": false}));
        assert_eq!(run(ARRAY_CHECKS, &relaxed, &json!([1, 1]), "init").unwrap(), None);
    }

    #[test]
    fn object_property_counts() {
        let schema = node(json!({"minProperties": 1, "maxProperties": 1}));
        assert!(run(OBJECT_CHECKS, &schema, &json!({}), "init").unwrap().is_some());
        assert_eq!(run(OBJECT_CHECKS, &schema, &json!({"a": 1}), "init").unwrap(), None);
        assert!(run(OBJECT_CHECKS, &schema, &json!({"a": 1, "b": 2}), "init").unwrap().is_some());
    }
}
