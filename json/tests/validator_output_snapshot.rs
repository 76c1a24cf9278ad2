//! Snapshot coverage for the three structured output shapes (`basic`,
//! `detailed`, `verbose`), mirroring the teacher's own
//! `insta::assert_json_snapshot!` usage in its validator output tests.
//! `flag` carries no interesting shape to snapshot (just a boolean) and is
//! covered directly in `src/validator/output.rs`'s unit tests instead.

use solid_json::schema::{build::build_schema, index::Builder, CoreAnnotation};
use solid_json::validator::{OutputShape, Validator};
use solid_json::value::Value;
use serde_json::json;

fn failing_instance() -> Value {
    Value::Object(vec![
        ("name".into(), Value::String("a".into())),
        ("tags".into(), Value::Array(vec![Value::String("x".into()), Value::String("x".into())])),
    ])
}

fn compile_schema() -> solid_json::schema::Schema<CoreAnnotation> {
    let url = url::Url::parse("http://example.com/snapshot-schema").unwrap();
    let schema_json = json!({
        "$id": "http://example.com/snapshot-schema",
        "type": "object",
        "required": ["name", "tags"],
        "properties": {
            "name": { "type": "string", "minLength": 3 },
            "tags": { "type": "array", "uniqueItems": true, "minItems": 1 }
        }
    });
    build_schema::<CoreAnnotation>(&url, &schema_json).unwrap()
}

#[test]
fn test_basic_output_snapshot() {
    let schema = compile_schema();
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let outcome = validator.validate(&schema, &failing_instance(), OutputShape::Basic);
    assert!(!outcome.is_valid());
    insta::assert_json_snapshot!("basic_output", outcome);
}

#[test]
fn test_detailed_output_snapshot() {
    let schema = compile_schema();
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let outcome = validator.validate(&schema, &failing_instance(), OutputShape::Detailed);
    assert!(!outcome.is_valid());
    insta::assert_json_snapshot!("detailed_output", outcome);
}

#[test]
fn test_verbose_output_snapshot() {
    let schema = compile_schema();
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let outcome = validator.validate(&schema, &failing_instance(), OutputShape::Verbose);
    assert!(!outcome.is_valid());
    insta::assert_json_snapshot!("verbose_output", outcome);
}
