//! Whole-pipeline fixtures: compile a schema, index it, and validate a
//! handful of instances against it, covering the combinators and
//! cross-schema references a single-keyword unit test can't exercise.

use solid_json::schema::{
    build::{build_schema, build_schema_with, BuildConfig, Dialect},
    index::Builder,
    CoreAnnotation,
};
use solid_json::value::Value;
use solid_json::validator::{OutputShape, Validator};
use serde_json::json;
use solid_temporal::BigDecimal;
use std::str::FromStr;

fn num(s: &str) -> Value {
    Value::Number(BigDecimal::from_str(s).unwrap())
}

fn compile(curi: &str, doc: serde_json::Value) -> solid_json::schema::Schema<CoreAnnotation> {
    let url = url::Url::parse(curi).unwrap();
    build_schema::<CoreAnnotation>(&url, &doc).unwrap()
}

#[test]
fn test_required_and_additional_properties() {
    let schema = compile(
        "http://example.com/person",
        json!({
            "$id": "http://example.com/person",
            "type": "object",
            "required": ["name", "age"],
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "age": { "type": "integer", "minimum": 0 }
            },
            "additionalProperties": false
        }),
    );
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let good = Value::Object(vec![("name".into(), Value::String("Ada".into())), ("age".into(), num("30"))]);
    assert!(validator.validate(&schema, &good, OutputShape::Flag).is_valid());

    let missing_age = Value::Object(vec![("name".into(), Value::String("Ada".into()))]);
    assert!(!validator.validate(&schema, &missing_age, OutputShape::Flag).is_valid());

    let extra_field = Value::Object(vec![
        ("name".into(), Value::String("Ada".into())),
        ("age".into(), num("30")),
        ("extra".into(), Value::Bool(true)),
    ]);
    assert!(!validator.validate(&schema, &extra_field, OutputShape::Flag).is_valid());
}

#[test]
fn test_all_of_any_of_and_not() {
    let schema = compile(
        "http://example.com/combinators",
        json!({
            "$id": "http://example.com/combinators",
            "allOf": [
                { "type": "number" },
                { "not": { "const": 13 } }
            ],
            "anyOf": [
                { "multipleOf": 2 },
                { "multipleOf": 5 }
            ]
        }),
    );
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    assert!(validator.validate(&schema, &num("10"), OutputShape::Flag).is_valid());
    assert!(!validator.validate(&schema, &num("13"), OutputShape::Flag).is_valid(), "13 is forbidden by not/const");
    assert!(!validator.validate(&schema, &num("7"), OutputShape::Flag).is_valid(), "7 matches neither anyOf branch");
    assert!(!validator.validate(&schema, &Value::String("x".into()), OutputShape::Flag).is_valid());
}

#[test]
fn test_if_then_else() {
    let schema = compile(
        "http://example.com/conditional",
        json!({
            "$id": "http://example.com/conditional",
            "type": "object",
            "if": { "properties": { "kind": { "const": "circle" } }, "required": ["kind"] },
            "then": { "required": ["radius"] },
            "else": { "required": ["width", "height"] }
        }),
    );
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let circle = Value::Object(vec![("kind".into(), Value::String("circle".into())), ("radius".into(), num("2"))]);
    assert!(validator.validate(&schema, &circle, OutputShape::Flag).is_valid());

    let bad_circle = Value::Object(vec![("kind".into(), Value::String("circle".into()))]);
    assert!(!validator.validate(&schema, &bad_circle, OutputShape::Flag).is_valid());

    let rect = Value::Object(vec![("width".into(), num("3")), ("height".into(), num("4"))]);
    assert!(validator.validate(&schema, &rect, OutputShape::Flag).is_valid());

    let bad_rect = Value::Object(vec![("width".into(), num("3"))]);
    assert!(!validator.validate(&schema, &bad_rect, OutputShape::Flag).is_valid());
}

#[test]
fn test_ref_into_defs() {
    let schema = compile(
        "http://example.com/point",
        json!({
            "$id": "http://example.com/point",
            "$defs": {
                "coordinate": { "type": "number", "minimum": -180, "maximum": 180 }
            },
            "type": "object",
            "properties": {
                "lat": { "$ref": "#/$defs/coordinate" },
                "lng": { "$ref": "#/$defs/coordinate" }
            }
        }),
    );
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    builder.verify_references().unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let good = Value::Object(vec![("lat".into(), num("12.5")), ("lng".into(), num("-45"))]);
    assert!(validator.validate(&schema, &good, OutputShape::Flag).is_valid());

    let out_of_range = Value::Object(vec![("lat".into(), num("200")), ("lng".into(), num("0"))]);
    assert!(!validator.validate(&schema, &out_of_range, OutputShape::Flag).is_valid());
}

#[test]
fn test_dynamic_ref_recurses_through_tree_nodes() {
    let schema = compile(
        "http://example.com/tree",
        json!({
            "$id": "http://example.com/tree",
            "$dynamicAnchor": "node",
            "type": "object",
            "properties": {
                "value": { "type": "number" },
                "children": {
                    "type": "array",
                    "items": { "$dynamicRef": "#node" }
                }
            }
        }),
    );
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let good = Value::Object(vec![
        ("value".into(), num("1")),
        (
            "children".into(),
            Value::Array(vec![
                Value::Object(vec![("value".into(), num("2")), ("children".into(), Value::Array(vec![]))]),
                Value::Object(vec![("value".into(), num("3"))]),
            ]),
        ),
    ]);
    assert!(validator.validate(&schema, &good, OutputShape::Flag).is_valid());

    let bad = Value::Object(vec![
        ("value".into(), num("1")),
        (
            "children".into(),
            Value::Array(vec![Value::Object(vec![("value".into(), Value::String("not a number".into()))])]),
        ),
    ]);
    assert!(!validator.validate(&schema, &bad, OutputShape::Flag).is_valid());
}

#[test]
fn test_contains_min_max_contains() {
    let schema = compile(
        "http://example.com/tags",
        json!({
            "$id": "http://example.com/tags",
            "type": "array",
            "contains": { "const": "urgent" },
            "minContains": 1,
            "maxContains": 2
        }),
    );
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let ok = Value::Array(vec![Value::String("low".into()), Value::String("urgent".into())]);
    assert!(validator.validate(&schema, &ok, OutputShape::Flag).is_valid());

    let none_matching = Value::Array(vec![Value::String("low".into()), Value::String("medium".into())]);
    assert!(!validator.validate(&schema, &none_matching, OutputShape::Flag).is_valid());

    let too_many = Value::Array(vec![
        Value::String("urgent".into()),
        Value::String("urgent".into()),
        Value::String("urgent".into()),
    ]);
    assert!(!validator.validate(&schema, &too_many, OutputShape::Flag).is_valid());
}

#[test]
fn test_pattern_and_format() {
    let schema = compile(
        "http://example.com/contact",
        json!({
            "$id": "http://example.com/contact",
            "type": "object",
            "properties": {
                "handle": { "type": "string", "pattern": "^[a-z][a-z0-9_]{2,15}$" },
                "email": { "type": "string", "format": "email" }
            }
        }),
    );
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let good = Value::Object(vec![
        ("handle".into(), Value::String("ada_lovelace".into())),
        ("email".into(), Value::String("ada@example.com".into())),
    ]);
    assert!(validator.validate(&schema, &good, OutputShape::Flag).is_valid());

    let bad_handle = Value::Object(vec![("handle".into(), Value::String("A!".into()))]);
    assert!(!validator.validate(&schema, &bad_handle, OutputShape::Flag).is_valid());

    let bad_email = Value::Object(vec![("email".into(), Value::String("not-an-email".into()))]);
    assert!(!validator.validate(&schema, &bad_email, OutputShape::Flag).is_valid());
}

#[test]
fn test_unevaluated_properties_accounts_for_all_of_branches() {
    let schema = compile(
        "http://example.com/unevaluated",
        json!({
            "$id": "http://example.com/unevaluated",
            "allOf": [
                { "properties": { "a": true } },
                { "properties": { "b": true } }
            ],
            "unevaluatedProperties": false
        }),
    );
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let covered = Value::Object(vec![("a".into(), Value::Bool(true)), ("b".into(), Value::Bool(true))]);
    assert!(validator.validate(&schema, &covered, OutputShape::Flag).is_valid());

    let uncovered = Value::Object(vec![("a".into(), Value::Bool(true)), ("c".into(), Value::Bool(true))]);
    assert!(!validator.validate(&schema, &uncovered, OutputShape::Flag).is_valid());
}

#[test]
fn test_format_annotation_dialect_never_fails_validation() {
    let url = url::Url::parse("http://example.com/loose-email").unwrap();
    let doc = json!({
        "$id": "http://example.com/loose-email",
        "type": "string",
        "format": "email"
    });
    let config = BuildConfig { dialect: Dialect::FormatAnnotation2020_12, ..Default::default() };
    let schema = build_schema_with::<CoreAnnotation>(&url, &doc, &config).unwrap();
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let not_an_email = Value::String("definitely not an email".into());
    assert!(
        validator.validate(&schema, &not_an_email, OutputShape::Flag).is_valid(),
        "format-annotation dialect must never reject on format mismatch"
    );
}
