//! Adapts the non-streaming `Validator` to a push interface: accepts
//! `ValueEvent`s as they arrive from a `reader::Parser`, assembles them into
//! an owned `Value` exactly as `reader::Assembler` does, and validates the
//! complete document once the stream ends. Schema evaluation itself always
//! needs the whole instance (keywords like `required` and `contains` can't
//! be answered from a prefix), so this buys callers a single push-shaped API
//! across both parsing and validation without exposing the assembly step.

use crate::event::ValueEvent;
use crate::reader;
use crate::schema::{Annotation, Schema};
use crate::validator::{Outcome, OutputShape, Validator};
use crate::value::Value;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Assembly(#[from] reader::Error),
}

/// Buffers a `ValueEvent` stream into a `Value` and validates it against a
/// fixed schema once the stream is finished.
pub struct StreamValidator<'i, A: Annotation> {
    schema: &'i Schema<A>,
    shape: OutputShape,
    assembler: reader::Assembler,
}

impl<'i, A: Annotation> StreamValidator<'i, A> {
    pub fn new(schema: &'i Schema<A>, shape: OutputShape) -> Self {
        StreamValidator { schema, shape, assembler: reader::Assembler::new() }
    }

    pub fn push(&mut self, event: ValueEvent) -> Result<(), Error> {
        self.assembler.push(event)?;
        Ok(())
    }

    /// Consumes the buffered events and validates the assembled document.
    pub fn finish(self, validator: &Validator<'i, A>) -> Result<Outcome, Error> {
        let value: Value = self.assembler.finish()?;
        Ok(validator.validate(self.schema, &value, self.shape))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{build, index, CoreAnnotation};
    use serde_json::json;

    #[test]
    fn test_stream_validator_assembles_then_validates() {
        let schema_json = json!({
            "$id": "http://example.com/stream-schema",
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } },
        });
        let url = url::Url::parse("http://example.com/stream-schema").unwrap();
        let schema = build::build_schema::<CoreAnnotation>(&url, &schema_json).unwrap();

        let mut builder = index::Builder::new();
        builder.add(&schema).unwrap();
        let index = builder.into_index();
        let validator = Validator::new(&index);

        let mut stream = StreamValidator::new(&schema, OutputShape::Flag);
        stream.push(ValueEvent::BeginObject).unwrap();
        stream.push(ValueEvent::Key(Value::String("name".into()))).unwrap();
        stream.push(ValueEvent::Scalar(Value::String("Alice".into()))).unwrap();
        stream.push(ValueEvent::EndObject).unwrap();

        let outcome = stream.finish(&validator).unwrap();
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_stream_validator_reports_missing_required_property() {
        let schema_json = json!({
            "$id": "http://example.com/stream-schema-2",
            "type": "object",
            "required": ["name"],
        });
        let url = url::Url::parse("http://example.com/stream-schema-2").unwrap();
        let schema = build::build_schema::<CoreAnnotation>(&url, &schema_json).unwrap();

        let mut builder = index::Builder::new();
        builder.add(&schema).unwrap();
        let index = builder.into_index();
        let validator = Validator::new(&index);

        let mut stream = StreamValidator::new(&schema, OutputShape::Flag);
        stream.push(ValueEvent::BeginObject).unwrap();
        stream.push(ValueEvent::EndObject).unwrap();

        let outcome = stream.finish(&validator).unwrap();
        assert!(!outcome.is_valid());
    }
}
