//! RFC 6901 JSON Pointer: parsing, escaping, document query, and upsert.

use crate::location::Location;
use crate::node::{AsNode, Field, Fields, Node};
use crate::value::Value;
use std::str::FromStr as _;

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Token {
    /// Integer index of an array. May also serve as an object property name.
    Index(usize),
    /// Object property name without escaping. Never an integer.
    Property(String),
    /// The next property to be added ("*"), used by error locations.
    NextProperty,
    /// One past an array's current extent ("-").
    NextIndex,
}

impl Token {
    pub fn parse(s: &str) -> Self {
        if s.starts_with('+') || (s.starts_with('0') && s.len() > 1) {
            Token::Property(s.to_string())
        } else if let Ok(ind) = usize::from_str(s) {
            Token::Index(ind)
        } else {
            Token::Property(s.to_string())
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Index(ind) => write!(f, "{ind}"),
            Token::Property(prop) => write!(f, "{prop}"),
            Token::NextProperty => write!(f, "*"),
            Token::NextIndex => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pointer(pub Vec<Token>);

impl Pointer {
    pub fn empty() -> Pointer {
        Pointer(Vec::new())
    }

    /// Parses an (optionally unrooted) JSON Pointer string, unescaping `~1`
    /// and `~0` per RFC 6901 §4.
    pub fn from_str(s: &str) -> Pointer {
        if s.is_empty() {
            return Pointer(Vec::new());
        }
        let mut ptr = Self::empty();
        for token in s
            .split('/')
            .skip(if s.starts_with('/') { 1 } else { 0 })
            .map(|t| t.replace("~1", "/").replace("~0", "~"))
        {
            ptr.push(Token::parse(&token));
        }
        ptr
    }

    pub fn from_location(location: &Location) -> Pointer {
        location.fold(Pointer::empty(), |location, mut ptr| {
            match location {
                Location::Root => {}
                Location::Property(prop) => { ptr.push(Token::Property(prop.name.to_string())); }
                Location::Item(item) => { ptr.push(Token::Index(item.index)); }
                Location::EndOfArray(_) => { ptr.push(Token::NextIndex); }
                Location::NextProperty(_) => { ptr.push(Token::NextProperty); }
            };
            ptr
        })
    }

    pub fn push(&mut self, token: Token) -> &mut Pointer {
        self.0.push(token);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.0.iter()
    }

    /// Queries the value at this pointer's location. Returns `None` if the
    /// location, or any parent of it, does not exist.
    pub fn query<'n, N: AsNode>(&self, mut node: &'n N) -> Option<&'n N> {
        for token in self.iter() {
            let next: Option<&N> = match node.as_node() {
                Node::Object(fields) => match token {
                    Token::Index(ind) => fields.get(&ind.to_string()),
                    Token::Property(property) => fields.get(property),
                    Token::NextProperty | Token::NextIndex => None,
                }
                .map(|field| field.value()),
                Node::Array(arr) => match token {
                    Token::Index(ind) => arr.get(*ind),
                    Token::Property(_) | Token::NextIndex | Token::NextProperty => None,
                },
                _ => None,
            };
            node = next?;
        }
        Some(node)
    }
}

/// Queries a mutable location within `value`, creating intermediate objects
/// or arrays as needed. A `Null` parent becomes an `Object` or `Array`
/// depending on the next token's kind; an `Array` is extended with `Null`s
/// to reach a requested index. Returns `None` only when the pointer is
/// structurally incompatible with the document (e.g. indexing a scalar, or
/// taking a property of an array).
pub fn create_value<'v>(ptr: &Pointer, value: &'v mut Value) -> Option<&'v mut Value> {
    let mut v = value;

    for token in ptr.iter() {
        if let Value::Null = v {
            match token {
                Token::Property(_) | Token::NextProperty => *v = Value::Object(Vec::new()),
                Token::Index(_) | Token::NextIndex => *v = Value::Array(Vec::new()),
            }
        }

        v = match v {
            Value::Object(fields) => {
                let key = match token {
                    Token::Index(ind) => ind.to_string(),
                    Token::Property(prop) => prop.clone(),
                    Token::NextProperty | Token::NextIndex => return None,
                };
                match fields.as_slice().iter().position(|(k, _)| *k == key) {
                    Some(i) => &mut fields[i].1,
                    None => {
                        fields.push((key, Value::Null));
                        &mut fields.last_mut().unwrap().1
                    }
                }
            }
            Value::Array(arr) => match token {
                Token::Index(ind) => {
                    if *ind >= arr.len() {
                        arr.extend(std::iter::repeat(Value::Null).take(1 + ind - arr.len()));
                    }
                    &mut arr[*ind]
                }
                Token::NextIndex => {
                    arr.push(Value::Null);
                    arr.last_mut().unwrap()
                }
                Token::Property(_) | Token::NextProperty => return None,
            },
            Value::Null => unreachable!("null already instantiated above"),
            _ => return None,
        };
    }
    Some(v)
}

impl<S: AsRef<str>> From<S> for Pointer {
    fn from(s: S) -> Self {
        Pointer::from_str(s.as_ref())
    }
}

impl FromIterator<Token> for Pointer {
    fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
        let mut ptr = Self::empty();
        for token in iter {
            ptr.push(token);
        }
        ptr
    }
}

impl serde::Serialize for Pointer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{self}"))
    }
}

impl<'de> serde::Deserialize<'de> for Pointer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_str(&s))
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn escape(s: &str) -> String {
            s.replace('~', "~0").replace('/', "~1")
        }
        for item in self.iter() {
            write!(f, "/")?;
            match item {
                Token::NextIndex => write!(f, "-")?,
                Token::NextProperty => write!(f, "*")?,
                Token::Property(p) => write!(f, "{}", escape(p))?,
                Token::Index(ind) => write!(f, "{ind}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compare::compare;
    use std::cmp::Ordering;
    use std::str::FromStr;
    use solid_temporal::BigDecimal;

    fn num(s: &str) -> Value {
        Value::Number(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn test_ptr_parsing() {
        use Token::*;

        let ptr = Pointer::from("/p1/2/p3");
        assert!(vec![Property("p1".to_string()), Index(2), Property("p3".to_string())]
            .iter()
            .eq(ptr.iter()));

        let ptr = Pointer::from("");
        assert_eq!(ptr.iter().next(), None);

        let ptr = Pointer::from("p1/2");
        assert!(vec![Property("p1".to_string()), Index(2)].iter().eq(ptr.iter()));

        let ptr = Pointer::from("/p~01/~12");
        assert!(vec![Property("p~1".to_string()), Property("/2".to_string())].iter().eq(ptr.iter()));

        let ptr = Pointer::from("/01/+2/-3/4");
        assert!(vec![
            Property("01".to_string()),
            Property("+2".to_string()),
            Property("-3".to_string()),
            Index(4),
        ]
        .iter()
        .eq(ptr.iter()));
    }

    #[test]
    fn test_ptr_query() {
        let doc = Value::Object(vec![
            ("foo".into(), Value::Array(vec![Value::String("bar".into()), Value::String("baz".into())])),
            ("".into(), num("0")),
            ("a/b".into(), num("1")),
        ]);

        let ptr = Pointer::from("/foo/1");
        assert_eq!(compare(ptr.query(&doc).unwrap(), &Value::String("baz".into())), Ordering::Equal);

        let ptr = Pointer::from("/");
        assert_eq!(compare(ptr.query(&doc).unwrap(), &num("0")), Ordering::Equal);

        let ptr = Pointer::from("/a~1b");
        assert_eq!(compare(ptr.query(&doc).unwrap(), &num("1")), Ordering::Equal);

        assert!(Pointer::from("/bar").query(&doc).is_none());
        assert!(Pointer::from("/foo/2").query(&doc).is_none());
        assert!(Pointer::from("/foo/prop").query(&doc).is_none());
    }

    #[test]
    fn test_ptr_create() {
        let mut root = Value::Null;

        for (ptr, value) in [
            ("/foo/2/a", Value::String("hello".into())),
            ("/foo/2/b", num("3")),
            ("/foo/0", Value::Bool(false)),
            ("/bar", Value::Null),
            ("/foo/0", Value::Bool(true)),
        ] {
            let ptr = Pointer::from(ptr);
            *create_value(&ptr, &mut root).unwrap() = value;
        }

        let expect = Value::Object(vec![
            (
                "foo".into(),
                Value::Array(vec![
                    Value::Bool(true),
                    Value::Null,
                    Value::Object(vec![("a".into(), Value::String("hello".into())), ("b".into(), num("3"))]),
                ]),
            ),
            ("bar".into(), Value::Null),
        ]);

        assert_eq!(compare(&root, &expect), Ordering::Equal);

        for case in ["/foo/2/a/3", "/foo/bar"] {
            let ptr = Pointer::from(case);
            assert!(create_value(&ptr, &mut root).is_none());
        }
    }

    #[test]
    fn test_ptr_to_string_roundtrip() {
        let cases = ["/foo/2/a~1b", "/foo/2/b~0", "/foo/0", "/bar", "/foo/-", "/foo/2/4"];
        let results: Vec<String> = cases.iter().map(|c| Pointer::from(*c).to_string()).collect();
        assert_eq!(cases.to_vec(), results);
    }
}
