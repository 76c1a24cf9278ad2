//! `Value`: the owned, universal data carrier. A tagged union with eight
//! variants per §3.1, with `object` keyed by `String` — every wire format
//! this crate speaks (JSON) requires string keys, so the fully generic
//! Value-keyed map is deferred (see DESIGN.md).

use crate::node::{AsNode, Field, Fields, Node};
use solid_temporal::BigDecimal;
use std::fmt;

/// An object's fields, stored in insertion order. Key uniqueness under
/// `schema_equal` is enforced by callers that build a `Value` (the JSON
/// parser enforces it by simply overwriting a duplicate key in place,
/// matching RFC 8259's "SHOULD be unique" guidance without silently
/// dropping the later value).
pub type ObjectFields = Vec<(String, Value)>;

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(BigDecimal),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(ObjectFields),
    Tagged(Box<Value>, Box<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectFields> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn object_get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.iter().find(|f| f.property() == key).map(|f| f.value())
    }
}

impl AsNode for Value {
    type Fields = ObjectFields;

    fn as_node(&self) -> Node<'_, Self> {
        match self {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(s),
            Value::Bytes(b) => Node::Bytes(b),
            Value::Array(a) => Node::Array(a),
            Value::Object(o) => Node::Object(o),
            Value::Tagged(t, v) => Node::Tagged(t, v),
        }
    }
}

pub struct ValueField<'a>(&'a str, &'a Value);

impl<'a> Field<'a, Value> for ValueField<'a> {
    fn property(&self) -> &'a str {
        self.0
    }
    fn value(&self) -> &'a Value {
        self.1
    }
}

impl Fields<Value> for ObjectFields {
    type Field<'a> = ValueField<'a>;
    type Iter<'a> = std::iter::Map<std::slice::Iter<'a, (String, Value)>, fn(&'a (String, Value)) -> ValueField<'a>>;

    fn get<'a>(&'a self, property: &str) -> Option<Self::Field<'a>> {
        self.iter().find(|f| f.property() == property)
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn iter<'a>(&'a self) -> Self::Iter<'a> {
        self.as_slice().iter().map(|(k, v)| ValueField(k, v))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::writer::to_string(self).map_err(|_| fmt::Error).and_then(|s| write!(f, "{s}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_object_preserves_insertion_order() {
        let obj: ObjectFields = vec![
            ("b".to_string(), Value::Bool(true)),
            ("a".to_string(), Value::Null),
        ];
        let keys: Vec<_> = obj.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
