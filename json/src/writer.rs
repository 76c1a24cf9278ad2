//! The streaming JSON codec's write side: consumes a `ValueEvent` stream
//! and writes RFC 8259 bytes through a buffered sink, tracking structural
//! state symmetrically with the push parser so a malformed event sequence
//! is rejected rather than silently emitting broken JSON.

use crate::event::ValueEvent;
use crate::value::Value;
use std::io::Write;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid event sequence: {0}")]
    InvalidEventSequence(String),
    #[error("tagged value's tag must be a string to use the 'wrapped' shape")]
    InvalidTagType,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagShape {
    Unwrapped,
    Array,
    Object,
    Wrapped,
}

#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub tag_shape: TagShape,
    pub tag_key: String,
    pub value_key: String,
    pub escape_slashes: bool,
    pub segment_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            tag_shape: TagShape::Unwrapped,
            tag_key: "tag".to_string(),
            value_key: "value".to_string(),
            escape_slashes: false,
            segment_size: 4096,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootState {
    ExpectingValue,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    First,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    ExpectKeyFirst,
    ExpectKeyRest,
    ExpectValue,
}

#[derive(Debug, Clone, Copy)]
enum Container {
    Array(ArrayState),
    Object(ObjectState),
    /// A synthetic frame pushed by `write_tag` for `TagShape::Array`: exactly
    /// one more value closes it with `]`. Distinct from `Array` because no
    /// `EndArray` event is ever coming to pop it.
    TagArray,
    /// A synthetic frame pushed by `write_tag` for `TagShape::Object` and
    /// `TagShape::Wrapped`: exactly one more value closes it with `}`.
    TagWrapped,
}

pub struct Writer<W: Write> {
    sink: W,
    buf: Vec<u8>,
    config: WriterConfig,
    root: RootState,
    stack: Vec<Container>,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W, config: WriterConfig) -> Self {
        Writer { sink, buf: Vec::new(), config, root: RootState::ExpectingValue, stack: Vec::new() }
    }

    pub fn write_event(&mut self, event: ValueEvent) -> Result<(), Error> {
        match event {
            ValueEvent::Tag(tag) => self.write_tag(tag),
            ValueEvent::Anchor | ValueEvent::Alias => {
                Err(Error::InvalidEventSequence("anchors/aliases are not supported".into()))
            }
            ValueEvent::BeginArray => self.begin_container(b'[', Container::Array(ArrayState::First)),
            ValueEvent::EndArray => self.end_container(b']', |c| matches!(c, Container::Array(_))),
            ValueEvent::BeginObject => self.begin_container(b'{', Container::Object(ObjectState::ExpectKeyFirst)),
            ValueEvent::EndObject => self.end_container(b'}', |c| matches!(c, Container::Object(_))),
            ValueEvent::Key(k) => self.write_key(k),
            ValueEvent::Scalar(v) => self.write_scalar(&v),
        }
    }

    fn write_tag(&mut self, tag: Value) -> Result<(), Error> {
        match self.config.tag_shape {
            TagShape::Unwrapped => Ok(()),
            TagShape::Array => {
                self.before_value()?;
                self.emit(b"[")?;
                self.write_scalar_or_container(&tag)?;
                self.emit(b",")?;
                // The matching close bracket is emitted by `after_value`
                // once the tagged value itself has been written.
                self.stack.push(Container::TagArray);
                Ok(())
            }
            TagShape::Object => {
                self.before_value()?;
                self.emit(b"{")?;
                self.write_scalar_or_container(&Value::String(self.config.tag_key.clone()))?;
                self.emit(b":")?;
                self.write_scalar_or_container(&tag)?;
                self.emit(b",")?;
                self.write_scalar_or_container(&Value::String(self.config.value_key.clone()))?;
                self.emit(b":")?;
                self.stack.push(Container::TagWrapped);
                Ok(())
            }
            TagShape::Wrapped => {
                let key = tag.as_str().ok_or(Error::InvalidTagType)?.to_string();
                self.before_value()?;
                self.emit(b"{")?;
                self.write_scalar_or_container(&Value::String(key))?;
                self.emit(b":")?;
                self.stack.push(Container::TagWrapped);
                Ok(())
            }
        }
    }

    fn begin_container(&mut self, byte: u8, frame: Container) -> Result<(), Error> {
        self.before_value()?;
        self.emit(&[byte])?;
        self.stack.push(frame);
        Ok(())
    }

    fn end_container(&mut self, byte: u8, matches_kind: impl Fn(&Container) -> bool) -> Result<(), Error> {
        match self.stack.pop() {
            Some(c) if matches_kind(&c) => {
                self.emit(&[byte])?;
                self.after_value()
            }
            _ => Err(Error::InvalidEventSequence(format!("unexpected End event for '{}'", byte as char))),
        }
    }

    fn write_key(&mut self, key: Value) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(Container::Object(state @ (ObjectState::ExpectKeyFirst | ObjectState::ExpectKeyRest))) => {
                if *state == ObjectState::ExpectKeyRest {
                    self.emit(b",")?;
                }
                self.write_scalar_or_container(&key)?;
                self.emit(b":")?;
                *state = ObjectState::ExpectValue;
                Ok(())
            }
            _ => Err(Error::InvalidEventSequence("unexpected Key event".into())),
        }
    }

    fn write_scalar(&mut self, v: &Value) -> Result<(), Error> {
        self.before_value()?;
        self.write_scalar_or_container(v)?;
        self.after_value()
    }

    fn before_value(&mut self) -> Result<(), Error> {
        match self.stack.last_mut() {
            None => {
                if self.root == RootState::Complete {
                    return Err(Error::InvalidEventSequence("extra value after complete document".into()));
                }
                Ok(())
            }
            Some(Container::Array(state)) => {
                if *state == ArrayState::Rest {
                    self.emit(b",")?;
                } else {
                    *state = ArrayState::Rest;
                }
                Ok(())
            }
            Some(Container::Object(ObjectState::ExpectValue)) => Ok(()),
            Some(Container::Object(_)) => Err(Error::InvalidEventSequence("expected a key, not a value".into())),
            // The tag already emitted its own separator; this is the one
            // value the synthetic frame is waiting for.
            Some(Container::TagArray) | Some(Container::TagWrapped) => Ok(()),
        }
    }

    fn after_value(&mut self) -> Result<(), Error> {
        loop {
            match self.stack.last_mut() {
                None => {
                    self.root = RootState::Complete;
                    return Ok(());
                }
                Some(Container::Array(_)) => return Ok(()),
                Some(Container::Object(state)) => {
                    *state = ObjectState::ExpectKeyRest;
                    return Ok(());
                }
                // The value that just completed was the tag frame's one
                // pending slot: close it and let whatever it's nested in
                // (another array/object, or the root) see a value complete.
                Some(Container::TagArray) => {
                    self.stack.pop();
                    self.emit(b"]")?;
                }
                Some(Container::TagWrapped) => {
                    self.stack.pop();
                    self.emit(b"}")?;
                }
            }
        }
    }

    fn write_scalar_or_container(&mut self, v: &Value) -> Result<(), Error> {
        match v {
            Value::Null => self.emit(b"null"),
            Value::Bool(true) => self.emit(b"true"),
            Value::Bool(false) => self.emit(b"false"),
            Value::Number(n) => {
                let s = format_number(n);
                self.emit(s.as_bytes())
            }
            Value::String(s) => self.write_string(s),
            Value::Bytes(_) => Err(Error::InvalidEventSequence("raw bytes have no JSON wire representation".into())),
            Value::Array(items) => {
                self.emit(b"[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.emit(b",")?;
                    }
                    self.write_scalar_or_container(item)?;
                }
                self.emit(b"]")
            }
            Value::Object(fields) => {
                self.emit(b"{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.emit(b",")?;
                    }
                    self.write_string(k)?;
                    self.emit(b":")?;
                    self.write_scalar_or_container(v)?;
                }
                self.emit(b"}")
            }
            Value::Tagged(tag, inner) => match self.config.tag_shape {
                TagShape::Unwrapped => self.write_scalar_or_container(inner),
                TagShape::Array => {
                    self.emit(b"[")?;
                    self.write_scalar_or_container(tag)?;
                    self.emit(b",")?;
                    self.write_scalar_or_container(inner)?;
                    self.emit(b"]")
                }
                TagShape::Object => {
                    self.emit(b"{")?;
                    self.write_string(&self.config.tag_key.clone())?;
                    self.emit(b":")?;
                    self.write_scalar_or_container(tag)?;
                    self.emit(b",")?;
                    self.write_string(&self.config.value_key.clone())?;
                    self.emit(b":")?;
                    self.write_scalar_or_container(inner)?;
                    self.emit(b"}")
                }
                TagShape::Wrapped => {
                    let key = tag.as_str().ok_or(Error::InvalidTagType)?.to_string();
                    self.emit(b"{")?;
                    self.write_string(&key)?;
                    self.emit(b":")?;
                    self.write_scalar_or_container(inner)?;
                    self.emit(b"}")
                }
            },
        }
    }

    fn write_string(&mut self, s: &str) -> Result<(), Error> {
        self.emit(b"\"")?;
        for c in s.chars() {
            match c {
                '"' => self.emit(b"\\\"")?,
                '\\' => self.emit(b"\\\\")?,
                '/' if self.config.escape_slashes => self.emit(b"\\/")?,
                '\n' => self.emit(b"\\n")?,
                '\r' => self.emit(b"\\r")?,
                '\t' => self.emit(b"\\t")?,
                '\u{0008}' => self.emit(b"\\b")?,
                '\u{000C}' => self.emit(b"\\f")?,
                c if (c as u32) < 0x20 => self.emit(format!("\\u{:04x}", c as u32).as_bytes())?,
                c => {
                    let mut b = [0u8; 4];
                    self.emit(c.encode_utf8(&mut b).as_bytes())?
                }
            }
        }
        self.emit(b"\"")
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() >= self.config.segment_size {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        if !self.buf.is_empty() {
            self.sink.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<W, Error> {
        self.flush()?;
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Renders a `BigDecimal` in the lexical grammar
/// `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][-+]?[0-9]+)?`, falling back to the
/// finite-only literals JSON has no syntax for (`NaN`/`Infinity`) quoted
/// as strings, matching the `format`/`number` keyword detection rules.
fn format_number(n: &solid_temporal::BigDecimal) -> String {
    use solid_temporal::BigDecimal;
    match n {
        BigDecimal::NaN => "\"NaN\"".to_string(),
        BigDecimal::PosInfinity => "\"Infinity\"".to_string(),
        BigDecimal::NegInfinity => "\"-Infinity\"".to_string(),
        BigDecimal::Finite { .. } => n.to_string(),
    }
}

/// Serialises a single `Value` to a `String` with default configuration;
/// used by `Value`'s `Display` impl and anywhere a complete document
/// (rather than an event stream) is the natural unit of work.
pub fn to_string(value: &Value) -> Result<String, Error> {
    let mut w = Writer::new(Vec::new(), WriterConfig::default());
    write_value(&mut w, value)?;
    let buf = w.close()?;
    Ok(String::from_utf8(buf).expect("writer only emits valid UTF-8"))
}

/// Decomposes a `Value` into the `ValueEvent` sequence the `Writer`
/// state machine expects, then feeds it through. This is the inverse of
/// `reader::Assembler`.
fn write_value<W: Write>(w: &mut Writer<W>, value: &Value) -> Result<(), Error> {
    let mut events = Vec::new();
    push_events(value, &mut events);
    for event in events {
        w.write_event(event)?;
    }
    Ok(())
}

fn push_events(value: &Value, out: &mut Vec<ValueEvent>) {
    match value {
        Value::Tagged(tag, inner) => {
            out.push(ValueEvent::Tag((**tag).clone()));
            push_events(inner, out);
        }
        Value::Array(items) => {
            out.push(ValueEvent::BeginArray);
            for item in items {
                push_events(item, out);
            }
            out.push(ValueEvent::EndArray);
        }
        Value::Object(fields) => {
            out.push(ValueEvent::BeginObject);
            for (k, v) in fields {
                out.push(ValueEvent::Key(Value::String(k.clone())));
                push_events(v, out);
            }
            out.push(ValueEvent::EndObject);
        }
        scalar => out.push(ValueEvent::Scalar(scalar.clone())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(v: &Value, config: WriterConfig) -> String {
        let mut w = Writer::new(Vec::new(), config);
        write_value(&mut w, v).unwrap();
        String::from_utf8(w.close().unwrap()).unwrap()
    }

    #[test]
    fn test_scalar_roundtrip_shapes() {
        let v = Value::Object(vec![("a".into(), Value::Array(vec![Value::Bool(true), Value::Null]))]);
        assert_eq!(render(&v, WriterConfig::default()), r#"{"a":[true,null]}"#);
    }

    #[test]
    fn test_escape_slashes_configurable() {
        let v = Value::String("a/b".to_string());
        assert_eq!(render(&v, WriterConfig { escape_slashes: true, ..Default::default() }), r#""a\/b""#);
        assert_eq!(render(&v, WriterConfig::default()), r#""a/b""#);
    }

    #[test]
    fn test_tag_shapes() {
        use solid_temporal::BigDecimal;
        use std::str::FromStr;
        let tagged = Value::Tagged(Box::new(Value::String("t".into())), Box::new(Value::Number(BigDecimal::from_str("1").unwrap())));

        assert_eq!(render(&tagged, WriterConfig { tag_shape: TagShape::Unwrapped, ..Default::default() }), "1");
        assert_eq!(render(&tagged, WriterConfig { tag_shape: TagShape::Array, ..Default::default() }), r#"["t",1]"#);
        assert_eq!(render(&tagged, WriterConfig { tag_shape: TagShape::Wrapped, ..Default::default() }), r#"{"t":1}"#);
    }

    #[test]
    fn test_tagged_array_element_closes_and_continues_the_array() {
        use solid_temporal::BigDecimal;
        use std::str::FromStr;
        let tagged = Value::Tagged(Box::new(Value::String("t".into())), Box::new(Value::Number(BigDecimal::from_str("1").unwrap())));
        let v = Value::Array(vec![tagged, Value::Bool(true)]);
        assert_eq!(render(&v, WriterConfig { tag_shape: TagShape::Array, ..Default::default() }), r#"[["t",1],true]"#);
        assert_eq!(render(&v, WriterConfig { tag_shape: TagShape::Wrapped, ..Default::default() }), r#"[{"t":1},true]"#);
    }

    #[test]
    fn test_wrapped_shape_rejects_non_string_tag() {
        use solid_temporal::BigDecimal;
        let tagged = Value::Tagged(Box::new(Value::Number(BigDecimal::zero())), Box::new(Value::Null));
        let mut w = Writer::new(Vec::new(), WriterConfig { tag_shape: TagShape::Wrapped, ..Default::default() });
        let err = write_value(&mut w, &tagged).unwrap_err();
        assert!(matches!(err, Error::InvalidTagType));
    }

    #[test]
    fn test_control_bytes_are_escaped() {
        let v = Value::String("\u{0001}".to_string());
        assert_eq!(render(&v, WriterConfig::default()), "\"\\u0001\"");
    }
}
