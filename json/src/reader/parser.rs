//! Structural push parser: wraps the tokenizer with the grammar of
//! `value → scalar | array | object` and emits `ValueEvent`s. Keys are
//! emitted as `Key` rather than `Scalar` so downstream consumers never
//! need to track "was the last scalar a key" themselves.

use super::tokenizer::Token;
use super::{Error, ReaderConfig};
use crate::event::ValueEvent;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootState {
    ExpectingValue,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    ExpectValueOrEnd,
    ExpectValue,
    ExpectCommaOrEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    ExpectKeyOrEnd,
    ExpectKey,
    ExpectColon,
    ExpectValue,
    ExpectCommaOrEnd,
}

#[derive(Debug, Clone, Copy)]
enum Container {
    Array(ArrayState),
    Object(ObjectState),
}

pub struct Parser {
    root: RootState,
    stack: Vec<Container>,
    config: ReaderConfig,
}

impl Parser {
    pub fn new(config: ReaderConfig) -> Self {
        Parser { root: RootState::ExpectingValue, stack: Vec::new(), config }
    }

    pub fn is_complete(&self) -> bool {
        self.root == RootState::Complete && self.stack.is_empty()
    }

    pub fn finish(&self) -> Result<(), Error> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(Error::InvalidStructure("unexpected end of input: root value incomplete".into()))
        }
    }

    pub fn push(&mut self, token: Token, out: &mut Vec<ValueEvent>) -> Result<(), Error> {
        match self.stack.last_mut() {
            None => self.push_root(token, out),
            Some(Container::Array(_)) => self.push_array(token, out),
            Some(Container::Object(_)) => self.push_object(token, out),
        }
    }

    fn push_root(&mut self, token: Token, out: &mut Vec<ValueEvent>) -> Result<(), Error> {
        if self.root == RootState::Complete {
            return Err(Error::InvalidStructure("extra token after complete document".into()));
        }
        self.begin_value(token, out)?;
        self.root = RootState::Complete;
        Ok(())
    }

    fn push_array(&mut self, token: Token, out: &mut Vec<ValueEvent>) -> Result<(), Error> {
        let Some(Container::Array(state)) = self.stack.last().copied() else { unreachable!() };
        match (state, &token) {
            (ArrayState::ExpectValueOrEnd, Token::EndArray) => {
                self.stack.pop();
                out.push(ValueEvent::EndArray);
                self.close_value(out);
                return Ok(());
            }
            (ArrayState::ExpectValueOrEnd | ArrayState::ExpectValue, _) => {
                self.begin_value(token, out)?;
                self.set_array_state(ArrayState::ExpectCommaOrEnd);
            }
            (ArrayState::ExpectCommaOrEnd, Token::ElementSeparator) => {
                self.set_array_state(ArrayState::ExpectValue);
            }
            (ArrayState::ExpectCommaOrEnd, Token::EndArray) => {
                self.stack.pop();
                out.push(ValueEvent::EndArray);
                self.close_value(out);
            }
            _ => return Err(Error::InvalidStructure(format!("unexpected token in array: {token:?}"))),
        }
        Ok(())
    }

    fn push_object(&mut self, token: Token, out: &mut Vec<ValueEvent>) -> Result<(), Error> {
        let Some(Container::Object(state)) = self.stack.last().copied() else { unreachable!() };
        match (state, token) {
            (ObjectState::ExpectKeyOrEnd, Token::EndObject) => {
                self.stack.pop();
                out.push(ValueEvent::EndObject);
                self.close_value(out);
            }
            (ObjectState::ExpectKeyOrEnd | ObjectState::ExpectKey, Token::String(s)) => {
                out.push(ValueEvent::Key(Value::String(s)));
                self.set_object_state(ObjectState::ExpectColon);
            }
            (ObjectState::ExpectColon, Token::PairSeparator) => {
                self.set_object_state(ObjectState::ExpectValue);
            }
            (ObjectState::ExpectValue, token) => {
                self.begin_value(token, out)?;
                self.set_object_state(ObjectState::ExpectCommaOrEnd);
            }
            (ObjectState::ExpectCommaOrEnd, Token::ElementSeparator) => {
                self.set_object_state(ObjectState::ExpectKey);
            }
            (ObjectState::ExpectCommaOrEnd, Token::EndObject) => {
                self.stack.pop();
                out.push(ValueEvent::EndObject);
                self.close_value(out);
            }
            (_, token) => return Err(Error::InvalidStructure(format!("unexpected token in object: {token:?}"))),
        }
        Ok(())
    }

    fn set_array_state(&mut self, s: ArrayState) {
        if let Some(Container::Array(state)) = self.stack.last_mut() {
            *state = s;
        }
    }

    fn set_object_state(&mut self, s: ObjectState) {
        if let Some(Container::Object(state)) = self.stack.last_mut() {
            *state = s;
        }
    }

    /// Called after a container at the top of the stack just emitted its
    /// `End*` event: a completed container is itself a "value" for the
    /// purposes of whatever's below it, so transition the parent just as
    /// `begin_value` would for a scalar.
    fn close_value(&mut self, _out: &mut [ValueEvent]) {
        match self.stack.last_mut() {
            None => self.root = RootState::Complete,
            Some(Container::Array(s)) => *s = ArrayState::ExpectCommaOrEnd,
            Some(Container::Object(s)) => *s = ObjectState::ExpectCommaOrEnd,
        }
    }

    fn begin_value(&mut self, token: Token, out: &mut Vec<ValueEvent>) -> Result<(), Error> {
        match token {
            Token::BeginArray => {
                if self.stack.len() >= self.config.max_depth {
                    return Err(Error::InvalidStructure("maximum nesting depth exceeded".into()));
                }
                self.stack.push(Container::Array(ArrayState::ExpectValueOrEnd));
                out.push(ValueEvent::BeginArray);
            }
            Token::BeginObject => {
                if self.stack.len() >= self.config.max_depth {
                    return Err(Error::InvalidStructure("maximum nesting depth exceeded".into()));
                }
                self.stack.push(Container::Object(ObjectState::ExpectKeyOrEnd));
                out.push(ValueEvent::BeginObject);
            }
            Token::Null => out.push(ValueEvent::Scalar(Value::Null)),
            Token::Bool(b) => out.push(ValueEvent::Scalar(Value::Bool(b))),
            Token::String(s) => out.push(ValueEvent::Scalar(Value::String(s))),
            Token::Number { value, .. } => out.push(ValueEvent::Scalar(Value::Number(value))),
            other => return Err(Error::InvalidStructure(format!("unexpected token in value position: {other:?}"))),
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reader::Tokenizer;

    fn parse(input: &[u8]) -> Vec<ValueEvent> {
        let mut tok = Tokenizer::new();
        let tokens = tok.feed(input, true).unwrap();
        let mut parser = Parser::new(ReaderConfig::default());
        let mut out = Vec::new();
        for t in tokens {
            parser.push(t, &mut out).unwrap();
        }
        parser.finish().unwrap();
        out
    }

    #[test]
    fn test_parses_nested_object() {
        let events = parse(br#"{"a":[1,2],"b":null}"#);
        assert!(matches!(events[0], ValueEvent::BeginObject));
        assert!(matches!(events.last(), Some(ValueEvent::EndObject)));
    }

    #[test]
    fn test_trailing_comma_rejected() {
        let mut tok = Tokenizer::new();
        let tokens = tok.feed(b"[1,]", true).unwrap();
        let mut parser = Parser::new(ReaderConfig::default());
        let mut out = Vec::new();
        let mut result = Ok(());
        for t in tokens {
            if let Err(e) = parser.push(t, &mut out) {
                result = Err(e);
                break;
            }
        }
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_trailing_token_rejected() {
        let mut tok = Tokenizer::new();
        let tokens = tok.feed(b"1 2", true).unwrap();
        let mut parser = Parser::new(ReaderConfig::default());
        let mut out = Vec::new();
        let mut result = Ok(());
        for t in tokens {
            if let Err(e) = parser.push(t, &mut out) {
                result = Err(e);
                break;
            }
        }
        assert!(result.is_err());
    }
}
