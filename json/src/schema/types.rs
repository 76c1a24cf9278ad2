//! `Set`: a bitset over instance types, used to evaluate the `type`
//! keyword and to classify an instance's actual type for combination with
//! sibling assertions. Unlike a JSON library backed by machine integers,
//! a `Number` here is a single `BigDecimal`-backed variant; "integer" is a
//! semantic refinement (zero fractional part) rather than a distinct wire
//! representation, so it is evaluated from the decimal's value, not its
//! syntax.

use crate::node::{AsNode, Node};
use solid_temporal::BigDecimal;
use std::fmt;

#[derive(Clone, Copy, Hash, Eq, PartialEq)]
pub struct Set(u32);

pub const INVALID: Set = Set(0b0000_0000);
pub const ARRAY: Set = Set(0b0000_0001);
pub const BOOLEAN: Set = Set(0b0000_0010);
pub const INTEGER: Set = Set(0b0000_0100);
pub const NULL: Set = Set(0b0000_1000);
pub const NUMBER: Set = Set(0b0001_0000);
pub const OBJECT: Set = Set(0b0010_0000);
pub const STRING: Set = Set(0b0100_0000);
pub const BYTES: Set = Set(0b1000_0000);

pub const ANY: Set = Set(ARRAY.0 | BOOLEAN.0 | INTEGER.0 | NULL.0 | NUMBER.0 | OBJECT.0 | STRING.0 | BYTES.0);

impl std::ops::BitOr for Set {
    type Output = Self;
    fn bitor(self, other: Self) -> Self::Output {
        Set(self.0 | other.0)
    }
}
impl std::ops::BitAnd for Set {
    type Output = Self;
    fn bitand(self, other: Self) -> Self::Output {
        Set(self.0 & other.0)
    }
}
impl std::ops::Sub for Set {
    type Output = Self;
    fn sub(self, other: Self) -> Self::Output {
        Set(self.0 & !other.0)
    }
}

impl Set {
    pub fn overlaps(&self, other: Self) -> bool {
        (*self & other) != INVALID
    }

    pub fn for_type_name(name: &str) -> Option<Set> {
        Some(match name {
            "array" => ARRAY,
            "boolean" => BOOLEAN,
            "integer" => INTEGER,
            "null" => NULL,
            "number" => NUMBER | INTEGER,
            "object" => OBJECT,
            "string" => STRING,
            "bytes" => BYTES,
            _ => return None,
        })
    }

    pub fn iter(&self) -> Iter {
        Iter { types: *self, index: 0 }
    }

    /// The actual type-set of an instance node: a number additionally
    /// carries `INTEGER` when its value has no fractional part.
    pub fn of_node<N: AsNode>(node: &N) -> Set {
        match node.as_node() {
            Node::Array(_) => ARRAY,
            Node::Bool(_) => BOOLEAN,
            Node::Null => NULL,
            Node::Object(_) => OBJECT,
            Node::String(_) => STRING,
            Node::Bytes(_) => BYTES,
            Node::Number(n) => {
                if is_integral(n) {
                    NUMBER | INTEGER
                } else {
                    NUMBER
                }
            }
            Node::Tagged(_, inner) => Set::of_node(inner),
        }
    }
}

pub fn is_integral(n: &BigDecimal) -> bool {
    match n.normalized() {
        BigDecimal::Finite { scale, .. } => scale <= 0,
        _ => false,
    }
}

pub struct Iter {
    types: Set,
    index: usize,
}

impl Iterator for Iter {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        const ORDER: &[Set] = &[ARRAY, BOOLEAN, INTEGER, NULL, NUMBER, OBJECT, STRING, BYTES];
        loop {
            let ty = *ORDER.get(self.index)?;
            self.index += 1;
            if ty - self.types == INVALID {
                match ty {
                    ARRAY => return Some("array"),
                    BOOLEAN => return Some("boolean"),
                    INTEGER if !self.types.overlaps(NUMBER) => return Some("integer"),
                    INTEGER => (),
                    NULL => return Some("null"),
                    NUMBER => return Some("number"),
                    OBJECT => return Some("object"),
                    STRING => return Some("string"),
                    BYTES => return Some("bytes"),
                    _ => unreachable!(),
                }
            }
        }
    }
}

impl<A: AsRef<str>> std::iter::FromIterator<A> for Set {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        let mut s = INVALID;
        for ty in iter {
            match Set::for_type_name(ty.as_ref()) {
                Some(t) => s = s | t,
                None => return INVALID,
            }
        }
        s
    }
}

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.iter().collect::<Vec<_>>().join(", "))
    }
}

/// `BitWidth`: the canonical enum form from the `coding` vocabulary's
/// `bitWidth` annotation. A raw-integer-keyed variant existed in earlier
/// drafts of this vocabulary and is not implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitWidth {
    #[serde(rename = "8")]
    B8,
    #[serde(rename = "16")]
    B16,
    #[serde(rename = "32")]
    B32,
    #[serde(rename = "64")]
    B64,
    #[serde(rename = "128")]
    B128,
    Big,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_type_set_iteration() {
        let ty = ARRAY | OBJECT | NULL;
        let names: Vec<_> = ty.iter().collect();
        assert_eq!(names, vec!["array", "null", "object"]);
    }

    #[test]
    fn test_number_vs_integer_overlap() {
        let ty = NUMBER | INTEGER;
        let names: Vec<_> = ty.iter().collect();
        assert_eq!(names, vec!["number"]);

        let ty = INTEGER;
        assert_eq!(ty.iter().collect::<Vec<_>>(), vec!["integer"]);
    }

    #[test]
    fn test_is_integral() {
        use std::str::FromStr;
        assert!(is_integral(&BigDecimal::from_str("10").unwrap()));
        assert!(is_integral(&BigDecimal::from_str("10.00").unwrap()));
        assert!(!is_integral(&BigDecimal::from_str("10.5").unwrap()));
    }
}
