//! `compare`/`compare_at`: a total ordering over documents, used for sort
//! keys and composite-key comparisons. Establishes an arbitrary but stable
//! ordering across types so mixed-type arrays and objects still sort.

use crate::node::{AsNode, Field, Fields, Node};
use crate::ptr::Pointer;
use itertools::{EitherOrBoth, Itertools};
use solid_temporal::BigDecimal;
use std::cmp::Ordering;

/// Total order over `BigDecimal`, including the non-finite sentinels that
/// make the type's own `PartialOrd` partial: NaN compares equal only to
/// itself and sorts above every other value, mirroring `f64::total_cmp`.
fn decimal_cmp(lhs: &BigDecimal, rhs: &BigDecimal) -> Ordering {
    match (lhs.is_nan(), rhs.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => lhs.partial_cmp(rhs).expect("non-NaN BigDecimal is totally ordered"),
    }
}

/// Evaluates the deep ordering of `lhs` and `rhs` under an arbitrary total
/// ordering over node types: null < bool < number < string < bytes < array <
/// object < tagged. Arrays and objects compare lexicographically; object
/// fields compare in their stored (insertion) order, not sorted by name.
pub fn compare<N: AsNode>(lhs: &N, rhs: &N) -> Ordering {
    compare_cross(lhs, rhs)
}

/// Same ordering as [`compare`], but across two (possibly distinct) node
/// representations. Needed wherever a schema-side literal (always a `Value`)
/// is compared against an instance of whatever representation the caller
/// chose to validate, e.g. `const`/`enum` keyword evaluation.
pub fn compare_cross<L: AsNode, R: AsNode>(lhs: &L, rhs: &R) -> Ordering {
    match (lhs.as_node(), rhs.as_node()) {
        (Node::Null, Node::Null) => Ordering::Equal,
        (Node::Bool(l), Node::Bool(r)) => l.cmp(&r),
        (Node::Number(l), Node::Number(r)) => decimal_cmp(l, r),
        (Node::String(l), Node::String(r)) => l.cmp(r),
        (Node::Bytes(l), Node::Bytes(r)) => l.cmp(r),
        (Node::Array(l), Node::Array(r)) => l
            .iter()
            .zip_longest(r.iter())
            .map(|eob| match eob {
                EitherOrBoth::Both(l, r) => compare_cross(l, r),
                EitherOrBoth::Right(_) => Ordering::Less,
                EitherOrBoth::Left(_) => Ordering::Greater,
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal),
        (Node::Object(l), Node::Object(r)) => l
            .iter()
            .zip_longest(r.iter())
            .map(|eob| match eob {
                EitherOrBoth::Both(l, r) => match l.property().cmp(r.property()) {
                    Ordering::Equal => compare_cross(l.value(), r.value()),
                    o => o,
                },
                EitherOrBoth::Right(_) => Ordering::Less,
                EitherOrBoth::Left(_) => Ordering::Greater,
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal),
        (Node::Tagged(lt, lv), Node::Tagged(rt, rv)) => match compare_cross(lt, rt) {
            Ordering::Equal => compare_cross(lv, rv),
            o => o,
        },

        (Node::Null, _) => Ordering::Less,
        (_, Node::Null) => Ordering::Greater,
        (Node::Bool(_), _) => Ordering::Less,
        (_, Node::Bool(_)) => Ordering::Greater,
        (Node::Number(_), _) => Ordering::Less,
        (_, Node::Number(_)) => Ordering::Greater,
        (Node::String(_), _) => Ordering::Less,
        (_, Node::String(_)) => Ordering::Greater,
        (Node::Bytes(_), _) => Ordering::Less,
        (_, Node::Bytes(_)) => Ordering::Greater,
        (Node::Array(_), _) => Ordering::Less,
        (_, Node::Array(_)) => Ordering::Greater,
        (Node::Object(_), _) => Ordering::Less,
        (_, Node::Object(_)) => Ordering::Greater,
    }
}

/// Evaluates ordering by a composite key of JSON Pointers, each relative to
/// the respective document roots. A pointer that resolves to nothing is
/// treated as pointing at an implicit null, identical to an explicit one.
pub fn compare_at<N: AsNode, S: AsRef<str>>(key_ptrs: &[S], lhs: &N, rhs: &N) -> Ordering {
    key_ptrs
        .iter()
        .map(|s| Pointer::from_str(s.as_ref()))
        .map(|ptr| compare_opt(ptr.query(lhs), ptr.query(rhs)))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn compare_opt<N: AsNode>(lhs: Option<&N>, rhs: Option<&N>) -> Ordering {
    match (lhs, rhs) {
        (Some(l), Some(r)) => compare(l, r),
        (None, Some(r)) => compare_null_side(r, true),
        (Some(l), None) => compare_null_side(l, false),
        (None, None) => Ordering::Equal,
    }
}

/// Compares a present node against an implicit null on the other side.
fn compare_null_side<N: AsNode>(present: &N, present_is_rhs: bool) -> Ordering {
    let o = match present.as_node() {
        Node::Null => Ordering::Equal,
        _ => Ordering::Greater,
    };
    if present_is_rhs {
        o.reverse()
    } else {
        o
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use solid_temporal::BigDecimal;
    use std::str::FromStr;

    fn num(s: &str) -> Value {
        Value::Number(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn test_scalar_ordering() {
        assert_eq!(compare(&Value::Null, &Value::Null), Ordering::Equal);
        assert_eq!(compare(&Value::Bool(false), &Value::Bool(true)), Ordering::Less);
        assert_eq!(compare(&Value::Null, &Value::Bool(false)), Ordering::Less);
        assert_eq!(compare(&num("10"), &num("20")), Ordering::Less);
        assert_eq!(compare(&num("20.00"), &num("20")), Ordering::Equal);
        assert_eq!(compare(&Value::Bool(true), &num("1")), Ordering::Less);
    }

    #[test]
    fn test_array_ordering() {
        let a = Value::Array(vec![num("1"), num("2")]);
        let b = Value::Array(vec![num("1"), num("2"), num("3")]);
        assert_eq!(compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_object_ordering_uses_stored_order() {
        let a = Value::Object(vec![("a".into(), num("1")), ("b".into(), num("2"))]);
        let b = Value::Object(vec![("a".into(), num("1")), ("c".into(), num("1"))]);
        assert_eq!(compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_compare_at_missing_is_implicit_null() {
        let d1 = Value::Object(vec![("a".into(), Value::Null), ("c".into(), num("3"))]);
        let d2 = Value::Object(vec![("b".into(), num("2"))]);

        assert_eq!(compare_at(&["/does/not/exist"], &d1, &d2), Ordering::Equal);
        assert_eq!(compare_at(&["/c"], &d1, &d2), Ordering::Greater);
        assert_eq!(compare_at(&["/b"], &d1, &d2), Ordering::Less);
        assert_eq!(compare_at(&["/a"], &d1, &d2), Ordering::Equal);
    }

    #[test]
    fn test_nan_sorts_consistently() {
        assert_eq!(decimal_cmp(&BigDecimal::NaN, &BigDecimal::NaN), Ordering::Equal);
        assert_eq!(decimal_cmp(&BigDecimal::NaN, &BigDecimal::zero()), Ordering::Greater);
    }
}
