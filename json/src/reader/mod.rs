//! The streaming JSON codec's read side: a byte tokenizer, a structural
//! push parser over it, and a small assembler that folds a `ValueEvent`
//! stream into an owned `Value` for callers that want a complete document
//! rather than the raw event stream.

mod parser;
mod tokenizer;

pub use parser::Parser;
pub use tokenizer::{Token, Tokenizer};

use crate::event::ValueEvent;
use crate::value::Value;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,
    #[error("invalid UTF-8 in string literal")]
    InvalidUtf8String,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid string literal")]
    InvalidString,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("invalid \\u escape sequence")]
    InvalidEscapeSequence,
    #[error("{0}")]
    InvalidStructure(String),
    #[error("more bytes are required to complete the current token")]
    IncompleteJson,
    #[error("the tokenizer has already observed a final chunk")]
    AlreadyFinished,
}

#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    pub max_depth: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig { max_depth: 512 }
    }
}

/// Folds a linear `ValueEvent` stream into an owned `Value`, the same
/// assembly the streaming schema validator performs internally before
/// delegating to the non-streaming validator (§4.5.1).
#[derive(Default)]
pub struct Assembler {
    stack: Vec<Partial>,
    pending_tag: Option<Value>,
    root: Option<Value>,
}

enum Partial {
    Array(Vec<Value>),
    Object(Vec<(String, Value)>, Option<String>),
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ValueEvent) -> Result<(), Error> {
        match event {
            ValueEvent::Tag(v) => self.pending_tag = Some(v),
            ValueEvent::Anchor | ValueEvent::Alias => {
                return Err(Error::InvalidStructure("anchors/aliases are not supported".into()))
            }
            ValueEvent::BeginArray => self.stack.push(Partial::Array(Vec::new())),
            ValueEvent::BeginObject => self.stack.push(Partial::Object(Vec::new(), None)),
            ValueEvent::EndArray => {
                let Some(Partial::Array(items)) = self.stack.pop() else {
                    return Err(Error::InvalidStructure("EndArray without matching BeginArray".into()));
                };
                self.complete(Value::Array(items))?;
            }
            ValueEvent::EndObject => {
                let Some(Partial::Object(fields, pending_key)) = self.stack.pop() else {
                    return Err(Error::InvalidStructure("EndObject without matching BeginObject".into()));
                };
                if pending_key.is_some() {
                    return Err(Error::InvalidStructure("object ended with a key but no value".into()));
                }
                self.complete(Value::Object(fields))?;
            }
            ValueEvent::Key(k) => {
                let key = k.as_str().ok_or_else(|| Error::InvalidStructure("object key must be a string".into()))?;
                match self.stack.last_mut() {
                    Some(Partial::Object(_, pending @ None)) => *pending = Some(key.to_string()),
                    _ => return Err(Error::InvalidStructure("unexpected Key event".into())),
                }
            }
            ValueEvent::Scalar(v) => self.complete(v)?,
        }
        Ok(())
    }

    fn complete(&mut self, value: Value) -> Result<(), Error> {
        let value = match self.pending_tag.take() {
            Some(tag) => Value::Tagged(Box::new(tag), Box::new(value)),
            None => value,
        };
        match self.stack.last_mut() {
            Some(Partial::Array(items)) => items.push(value),
            Some(Partial::Object(fields, pending)) => {
                let key = pending.take().ok_or_else(|| Error::InvalidStructure("object value without a key".into()))?;
                fields.push((key, value));
            }
            None => {
                if self.root.is_some() {
                    return Err(Error::InvalidStructure("multiple root values".into()));
                }
                self.root = Some(value);
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Result<Value, Error> {
        if !self.stack.is_empty() {
            return Err(Error::UnexpectedEndOfStream);
        }
        self.root.ok_or(Error::UnexpectedEndOfStream)
    }
}

/// Parses a complete, non-streamed byte slice into a `Value` in one call.
pub fn from_slice(bytes: &[u8], config: ReaderConfig) -> Result<Value, Error> {
    let mut tok = Tokenizer::new();
    let tokens = tok.feed(bytes, true)?;
    let mut parser = Parser::new(config);
    let mut assembler = Assembler::new();
    for token in tokens {
        let mut events = Vec::new();
        parser.push(token, &mut events)?;
        for event in events {
            assembler.push(event)?;
        }
    }
    parser.finish()?;
    assembler.finish()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_slice_roundtrips_object() {
        let v = from_slice(br#"{"a":1,"b":[true,null,"x"]}"#, ReaderConfig::default()).unwrap();
        let Value::Object(fields) = v else { panic!("expected object") };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, "a");
    }

    #[test]
    fn test_max_depth_enforced() {
        let deep = "[".repeat(10) + &"]".repeat(10);
        let err = from_slice(deep.as_bytes(), ReaderConfig { max_depth: 3 }).unwrap_err();
        assert!(matches!(err, Error::InvalidStructure(_)));
    }
}
