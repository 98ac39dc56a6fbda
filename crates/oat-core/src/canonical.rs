//! # Canonical JSON Rendering
//!
//! Deterministic text forms of JSON values for error reports. Two runs over
//! the same data must print byte-identical reports, so object keys are always
//! sorted, regardless of the map ordering serde_json was built with.
//!
//! - [`to_compact`] produces RFC 8785 (JCS) text via `serde_jcs`: sorted keys,
//!   compact separators. Used inline in single-line messages.
//! - [`to_pretty`] produces indented text with sorted keys. Used for the
//!   `Expected:` and `Received:` blocks of a report.
//!
//! Neither function fails: rendering is only ever used for display, and a
//! report must always be producible.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// A JSON value whose object keys serialize in sorted order.
#[derive(Serialize)]
#[serde(untagged)]
enum Sorted<'a> {
    Leaf(&'a Value),
    Array(Vec<Sorted<'a>>),
    Object(BTreeMap<&'a str, Sorted<'a>>),
}

fn sorted(value: &Value) -> Sorted<'_> {
    match value {
        Value::Array(items) => Sorted::Array(items.iter().map(sorted).collect()),
        Value::Object(map) => {
            Sorted::Object(map.iter().map(|(k, v)| (k.as_str(), sorted(v))).collect())
        }
        leaf => Sorted::Leaf(leaf),
    }
}

/// Render `value` as compact canonical JSON.
pub fn to_compact(value: &Value) -> String {
    serde_jcs::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Render `value` as indented JSON with sorted keys.
pub fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(&sorted(value)).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compact_sorts_keys() {
        let data = json!({"b": 2, "a": 1, "c": "hello"});
        assert_eq!(to_compact(&data), r#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn compact_sorts_nested_keys() {
        let data = json!({"outer": {"b": 2, "a": 1}, "list": [3, 2, 1]});
        assert_eq!(to_compact(&data), r#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn compact_scalars() {
        assert_eq!(to_compact(&json!(null)), "null");
        assert_eq!(to_compact(&json!("x")), "\"x\"");
        assert_eq!(to_compact(&json!(true)), "true");
    }

    #[test]
    fn pretty_sorts_keys_and_indents() {
        let data = json!({"z": 1, "a": {"y": [1], "b": null}});
        let expected = "{\n  \"a\": {\n    \"b\": null,\n    \"y\": [\n      1\n    ]\n  },\n  \"z\": 1\n}";
        assert_eq!(to_pretty(&data), expected);
    }

    #[test]
    fn pretty_empty_containers() {
        assert_eq!(to_pretty(&json!({})), "{}");
        assert_eq!(to_pretty(&json!([])), "[]");
    }
}
