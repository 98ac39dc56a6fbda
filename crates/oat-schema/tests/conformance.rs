//! # Conformance Scenarios
//!
//! End-to-end checks of the schema tester through the public API: the
//! reference scenarios every implementation must reproduce, followed by the
//! cross-cutting properties of the walk (fail-fast, error kinds, report
//! layout, case conventions).

use oat_core::{is_snake_case, CaseConvention, TesterConfig};
use oat_schema::{
    example_from_schema, validate, validate_with, DocumentationError, SchemaError, SchemaTester,
    ValidationError,
};
use serde_json::{json, Value};

fn documentation_error(schema: &Value, data: &Value) -> DocumentationError {
    match validate(schema, data) {
        Err(ValidationError::Documentation(err)) => err,
        other => panic!("expected a documentation error for {data}, got {other:?}"),
    }
}

#[test]
fn missing_required_property_is_named() {
    let schema = json!({
        "type": "object",
        "properties": {"name": {"type": "string"}},
        "required": ["name"]
    });
    let err = documentation_error(&schema, &json!({}));
    assert!(err.message.contains("\"name\""), "{}", err.message);
    assert!(err.message.contains("missing"));
}

#[test]
fn value_above_maximum_reports_the_bound() {
    let schema = json!({"type": "integer", "minimum": 3, "maximum": 5});
    let err = documentation_error(&schema, &json!(6));
    assert!(err.message.contains("maximum"), "{}", err.message);
    assert!(err.message.contains('5'));
    assert!(validate(&schema, &json!(5)).is_ok());
}

#[test]
fn pattern_mismatch_is_reported() {
    let schema = json!({"type": "string", "pattern": "^[a-z]+$"});
    let err = documentation_error(&schema, &json!("ABC"));
    assert!(err.message.contains("pattern"), "{}", err.message);
    assert!(err.message.contains("^[a-z]+$"));
}

#[test]
fn empty_array_matches_any_items_schema() {
    let schema = json!({"type": "array", "items": {"type": "string"}});
    assert!(validate(&schema, &json!([])).is_ok());
}

#[test]
fn one_of_accepts_exactly_one_match() {
    let schema = json!({"oneOf": [{"type": "integer"}, {"type": "string"}]});
    assert!(validate(&schema, &json!(5)).is_ok());
    assert!(validate(&schema, &json!("5")).is_ok());
    let err = documentation_error(&schema, &json!({}));
    assert!(err.message.contains("0 matches"), "{}", err.message);
}

#[test]
fn camel_key_under_snake_convention_suggests_snake_form() {
    let err = is_snake_case("userName").unwrap_err();
    assert_eq!(err.expected, "user_name");
    assert_eq!(err.convention, CaseConvention::Snake);

    let schema = json!({"type": "object", "properties": {"userName": {"type": "string"}}});
    let config = TesterConfig::with_case(CaseConvention::Snake);
    match validate_with(&schema, &json!({"userName": "ada"}), &config) {
        Err(ValidationError::Case(err)) => assert_eq!(err.expected, "user_name"),
        other => panic!("expected a case error, got {other:?}"),
    }
}

#[test]
fn excess_key_is_named_verbatim() {
    let schema = json!({"type": "object", "properties": {"id": {"type": "integer"}}});
    let err = documentation_error(&schema, &json!({"id": 1, "Extra-Key_9": true}));
    assert!(err.message.contains("\"Extra-Key_9\""), "{}", err.message);
}

#[test]
fn first_violation_wins() {
    let schema = json!({
        "type": "object",
        "properties": {
            "a": {"type": "integer"},
            "b": {"type": "integer"}
        }
    });
    let err = documentation_error(&schema, &json!({"a": "x", "b": "y"}));
    assert_eq!(err.reference, "init.dict:key:a");
}

#[test]
fn malformed_schemas_are_schema_errors() {
    let cases = [
        (json!({"format": "date"}), json!("2024-01-01")),
        (json!({"type": "array"}), json!([1])),
        (json!({"type": "object"}), json!({})),
        (json!({"type": "timestamp"}), json!(1)),
        (json!({"type": "string", "pattern": "(["}), json!("a")),
    ];
    for (schema, data) in cases {
        match validate(&schema, &data) {
            Err(ValidationError::Schema(_)) => {}
            other => panic!("expected a schema error for {schema}, got {other:?}"),
        }
    }
}

#[test]
fn invalid_pattern_names_the_pattern() {
    let err = validate(&json!({"type": "string", "pattern": "(["}), &json!("a")).unwrap_err();
    assert!(matches!(
        err,
        ValidationError::Schema(SchemaError::InvalidPattern { ref pattern, .. }) if pattern == "(["
    ));
}

#[test]
fn report_contains_every_section() {
    let schema = json!({"type": "object", "properties": {"age": {"type": "integer"}}});
    let err = validate(&schema, &json!({"age": "ten"})).unwrap_err();
    let report = err.to_string();
    assert!(report.starts_with("Error: Expected type `integer` but received `string`"));
    assert!(report.contains("\n\nExpected: 1\n\n"));
    assert!(report.contains("\n\nReceived: \"ten\"\n\n"));
    assert!(report.ends_with("Sequence: init.dict:key:age"));
}

#[test]
fn derived_example_of_a_rich_schema_validates() {
    let schema = json!({
        "type": "object",
        "required": ["id", "status", "tags", "owner"],
        "properties": {
            "id": {"type": "integer", "minimum": 10, "multipleOf": 5},
            "status": {"type": "string", "enum": ["open", "closed"]},
            "tags": {"type": "array", "items": {"type": "string", "format": "uuid"}, "minItems": 2},
            "owner": {"oneOf": [
                {"type": "object", "properties": {"email": {"type": "string", "format": "email"}}},
                {"type": "boolean"}
            ]},
            "score": {"type": "number", "maximum": 0.5},
            "meta": {"type": "object", "additionalProperties": {"type": "string", "format": "date"}}
        }
    });
    let example = example_from_schema(&schema);
    assert!(validate(&schema, &example).is_ok(), "{example}");
}

#[test]
fn testers_with_different_configs_coexist() {
    let schema = json!({"type": "object", "properties": {"user-name": {"type": "string"}}});
    let data = json!({"user-name": "ada"});
    let kebab = SchemaTester::new(TesterConfig::with_case(CaseConvention::Kebab));
    let camel = SchemaTester::new(TesterConfig::with_case(CaseConvention::Camel));
    assert!(kebab.validate(&schema, &data).is_ok());
    assert!(camel.validate(&schema, &data).is_err());
    assert!(kebab.validate(&schema, &data).is_ok());
}

#[test]
fn tester_is_shareable_across_threads() {
    let tester = std::sync::Arc::new(SchemaTester::default());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let tester = tester.clone();
            std::thread::spawn(move || {
                tester.validate(&json!({"type": "integer", "maximum": 2}), &json!(i)).is_ok()
            })
        })
        .collect();
    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![true, true, true, false]);
}
