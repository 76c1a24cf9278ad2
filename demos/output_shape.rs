//! `OutputShape` picks how much of the evaluation tree a `Validator::validate`
//! call serialises: a bare pass/fail flag, a flat list of failing leaves, a
//! pruned failure tree, or the full tree with every annotation attached.

use serde_json::json;
use solid_json::schema::build::build_schema;
use solid_json::schema::index::Builder;
use solid_json::schema::CoreAnnotation;
use solid_json::validator::{OutputShape, Validator};
use solid_json::value::Value;
use solid_temporal::BigDecimal;
use std::str::FromStr;

fn main() {
    let base = url::Url::parse("https://example.com/demo-person").unwrap();
    let doc = json!({
        "$id": "https://example.com/demo-person",
        "type": "object",
        "required": ["name", "age"],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "age": { "type": "integer", "minimum": 0 }
        }
    });
    let schema = build_schema::<CoreAnnotation>(&base, &doc).unwrap();
    let mut builder = Builder::new();
    builder.add(&schema).unwrap();
    let index = builder.into_index();
    let validator = Validator::new(&index);

    let instance = Value::Object(vec![
        ("name".into(), Value::String("".into())),
        ("age".into(), Value::Number(BigDecimal::from_str("-4").unwrap())),
    ]);

    for shape in [OutputShape::Flag, OutputShape::Basic, OutputShape::Detailed, OutputShape::Verbose] {
        let outcome = validator.validate(&schema, &instance, shape);
        println!("{shape:?}: valid={} -> {}", outcome.is_valid(), serde_json::to_string(&outcome).unwrap());
    }
}
