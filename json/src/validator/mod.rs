//! The schema validator: walks a compiled `Schema<A>` against an instance
//! `AsNode`, combining keyword outcomes per the applicator semantics of
//! each keyword and threading sibling/adjacent annotations so
//! `unevaluatedProperties`/`unevaluatedItems` can see what their neighbours
//! already covered.

pub mod output;
pub mod stream;

use crate::node::{AsNode, Field, Fields, Node};
use crate::schema::{types, Annotation, Index, Keyword, Schema};
use std::collections::BTreeSet;

pub use output::{Outcome, OutputShape, ScopedOutcome};
pub use stream::StreamValidator;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("schema reference '{0}' was not found in the index")]
    UnresolvedReference(String),
    #[error("dynamic reference '{0}' did not resolve to any schema in the active dynamic scope")]
    UnresolvedDynamicRef(String),
}

/// Validates instances against schemas resolved through a shared `Index`.
/// Built once per index and reused across many `validate` calls; holds no
/// per-validation state itself.
pub struct Validator<'i, A: Annotation> {
    index: &'i Index<'i, A>,
}

/// What a container keyword's children collectively evaluated: used to
/// answer `unevaluatedProperties`/`unevaluatedItems` without re-walking the
/// schema a second time.
#[derive(Default)]
struct Evaluated {
    properties: BTreeSet<String>,
    items: usize,
    all_items: bool,
}

impl Evaluated {
    fn merge(&mut self, other: Evaluated) {
        self.properties.extend(other.properties);
        self.items = self.items.max(other.items);
        self.all_items = self.all_items || other.all_items;
    }
}

impl<'i, A: Annotation> Validator<'i, A> {
    pub fn new(index: &'i Index<'i, A>) -> Self {
        Validator { index }
    }

    pub fn validate<N: AsNode>(&self, schema: &'i Schema<A>, instance: &N, shape: OutputShape) -> Outcome {
        let mut scope = vec![schema];
        let (node, _) = self.eval(schema, instance, String::new(), schema.curi.to_string(), String::new(), &mut scope);
        output::build(shape, node)
    }

    fn eval<N: AsNode>(
        &self,
        schema: &'i Schema<A>,
        instance: &N,
        keyword_location: String,
        absolute_keyword_location: String,
        instance_location: String,
        dynamic_scope: &mut Vec<&'i Schema<A>>,
    ) -> (ScopedOutcome, Evaluated) {
        let mut children = Vec::new();
        let mut evaluated = Evaluated::default();
        let mut valid = true;
        let pushed_here = !dynamic_scope.iter().any(|s| std::ptr::eq(*s, schema));
        if pushed_here {
            dynamic_scope.push(schema);
        }

        // `minContains`/`maxContains` constrain the match count of the
        // sibling `contains` schema; computed once up front since they're
        // meaningless without it (the builder already rejects `minContains`
        // with no `contains`).
        let contains_count = schema.keywords.iter().find_map(|k| match k {
            Keyword::Contains { contains } => Some(count_matches(self, contains, instance, dynamic_scope)),
            _ => None,
        });

        for kw in &schema.keywords {
            let child_loc = format!("{keyword_location}/{}", kw.keyword());
            let child_abs = format!("{}#{}", schema.curi.as_str().trim_end_matches('#'), schema_fragment(&child_loc));
            let (ok, outcome) =
                self.eval_keyword(kw, instance, &child_loc, &child_abs, &instance_location, dynamic_scope, &mut evaluated, contains_count);
            valid &= ok;
            if let Some(outcome) = outcome {
                children.push(outcome);
            }
        }

        if pushed_here {
            dynamic_scope.pop();
        }

        (
            ScopedOutcome {
                valid,
                keyword_location,
                absolute_keyword_location,
                instance_location,
                error: None,
                annotation: None,
                children,
            },
            evaluated,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_keyword<N: AsNode>(
        &self,
        kw: &'i Keyword<A>,
        instance: &N,
        keyword_location: &str,
        absolute_keyword_location: &str,
        instance_location: &str,
        dynamic_scope: &mut Vec<&'i Schema<A>>,
        evaluated: &mut Evaluated,
        contains_count: Option<usize>,
    ) -> (bool, Option<ScopedOutcome>) {
        use Keyword::*;

        let leaf = |valid: bool, error: Option<String>| {
            (
                valid,
                Some(ScopedOutcome {
                    valid,
                    keyword_location: keyword_location.to_string(),
                    absolute_keyword_location: absolute_keyword_location.to_string(),
                    instance_location: instance_location.to_string(),
                    error,
                    annotation: None,
                    children: Vec::new(),
                }),
            )
        };

        match kw {
            Annotation { annotation } => (
                true,
                Some(ScopedOutcome {
                    valid: true,
                    keyword_location: keyword_location.to_string(),
                    absolute_keyword_location: absolute_keyword_location.to_string(),
                    instance_location: instance_location.to_string(),
                    error: None,
                    annotation: Some(format!("{annotation:?}")),
                    children: Vec::new(),
                }),
            ),
            False => leaf(false, Some("schema is the boolean 'false', which rejects every instance".into())),
            Id { .. } | Anchor { .. } | DynamicAnchor { .. } | Vocabulary { .. } | Opaque { .. } => (true, None),

            Type { r#type } => leaf(types::Set::of_node(instance).overlaps(*r#type), Some(format!("expected type {}", r#type))),
            Const { r#const } => {
                let ok = crate::compare::compare_cross(r#const.as_ref(), instance) == std::cmp::Ordering::Equal;
                leaf(ok, Some("instance does not equal 'const' value".into()))
            }
            Enum { r#enum } => {
                let ok =
                    r#enum.iter().any(|v| crate::compare::compare_cross(v, instance) == std::cmp::Ordering::Equal);
                leaf(ok, Some("instance is not one of the 'enum' values".into()))
            }

            MinLength { min_length } => match instance.as_node() {
                Node::String(s) => leaf(s.chars().count() >= *min_length, Some("string shorter than minLength".into())),
                _ => (true, None),
            },
            MaxLength { max_length } => match instance.as_node() {
                Node::String(s) => leaf(s.chars().count() <= *max_length, Some("string longer than maxLength".into())),
                _ => (true, None),
            },
            Pattern { pattern } => match instance.as_node() {
                Node::String(s) => leaf(pattern.is_match(s), Some(format!("string does not match pattern {pattern}"))),
                _ => (true, None),
            },
            Format { format } => match instance.as_node() {
                Node::String(s) => {
                    let outcome = format.validate(s);
                    leaf(outcome.is_valid(), (!outcome.is_valid()).then(|| format!("invalid {format} string")))
                }
                _ => (true, None),
            },
            FormatAnnotation { format } => (
                true,
                Some(ScopedOutcome {
                    valid: true,
                    keyword_location: keyword_location.to_string(),
                    absolute_keyword_location: absolute_keyword_location.to_string(),
                    instance_location: instance_location.to_string(),
                    error: None,
                    annotation: Some(format!("{format}")),
                    children: Vec::new(),
                }),
            ),
            MinSize { min_size } => match instance.as_node() {
                Node::Bytes(b) => leaf(b.len() >= *min_size, Some("byte string shorter than minSize".into())),
                Node::String(s) => leaf(s.len() >= *min_size, Some("string shorter than minSize".into())),
                _ => (true, None),
            },
            MaxSize { max_size } => match instance.as_node() {
                Node::Bytes(b) => leaf(b.len() <= *max_size, Some("byte string longer than maxSize".into())),
                Node::String(s) => leaf(s.len() <= *max_size, Some("string longer than maxSize".into())),
                _ => (true, None),
            },

            Minimum { minimum } => match instance.as_node() {
                Node::Number(n) => leaf(n >= minimum, Some("number below minimum".into())),
                _ => (true, None),
            },
            Maximum { maximum } => match instance.as_node() {
                Node::Number(n) => leaf(n <= maximum, Some("number above maximum".into())),
                _ => (true, None),
            },
            ExclusiveMinimum { exclusive_minimum } => match instance.as_node() {
                Node::Number(n) => leaf(n > exclusive_minimum, Some("number not greater than exclusiveMinimum".into())),
                _ => (true, None),
            },
            ExclusiveMaximum { exclusive_maximum } => match instance.as_node() {
                Node::Number(n) => leaf(n < exclusive_maximum, Some("number not less than exclusiveMaximum".into())),
                _ => (true, None),
            },
            MultipleOf { multiple_of } => match instance.as_node() {
                Node::Number(n) => {
                    let ok = is_multiple_of(n, multiple_of);
                    leaf(ok, Some("number is not a multiple of multipleOf".into()))
                }
                _ => (true, None),
            },

            MinItems { min_items } => match instance.as_node() {
                Node::Array(a) => leaf(a.len() >= *min_items, Some("array has fewer than minItems elements".into())),
                _ => (true, None),
            },
            MaxItems { max_items } => match instance.as_node() {
                Node::Array(a) => leaf(a.len() <= *max_items, Some("array has more than maxItems elements".into())),
                _ => (true, None),
            },
            UniqueItems {} => match instance.as_node() {
                Node::Array(a) => {
                    let mut ok = true;
                    'outer: for i in 0..a.len() {
                        for j in (i + 1)..a.len() {
                            if crate::compare::compare(&a[i], &a[j]) == std::cmp::Ordering::Equal {
                                ok = false;
                                break 'outer;
                            }
                        }
                    }
                    leaf(ok, Some("array has duplicate elements".into()))
                }
                _ => (true, None),
            },

            MinProperties { min_properties } => match instance.as_node() {
                Node::Object(o) => leaf(o.len() >= *min_properties, Some("object has fewer than minProperties members".into())),
                _ => (true, None),
            },
            MaxProperties { max_properties } => match instance.as_node() {
                Node::Object(o) => leaf(o.len() <= *max_properties, Some("object has more than maxProperties members".into())),
                _ => (true, None),
            },
            Required { required, mask, table } => match instance.as_node() {
                Node::Object(o) => {
                    let mut present = 0;
                    for field in o.iter() {
                        present |= table.lookup(field.property());
                    }
                    let ok = mask & !present == 0;
                    let missing: Vec<_> = if ok { Vec::new() } else { required.iter().filter(|r| o.get(r).is_none()).collect() };
                    leaf(ok, (!ok).then(|| format!("missing required properties: {missing:?}")))
                }
                _ => (true, None),
            },
            DependentRequired { dependent_required } => match instance.as_node() {
                Node::Object(o) => {
                    let mut ok = true;
                    let mut reason = None;
                    for (trigger, deps) in dependent_required.iter() {
                        if o.get(trigger).is_some() {
                            let missing: Vec<_> = deps.iter().filter(|d| o.get(d).is_none()).collect();
                            if !missing.is_empty() {
                                ok = false;
                                reason = Some(format!("'{trigger}' requires missing properties: {missing:?}"));
                            }
                        }
                    }
                    leaf(ok, reason)
                }
                _ => (true, None),
            },

            AllOf { all_of } => {
                let mut ok = true;
                let mut kids = Vec::new();
                for (i, sub) in all_of.iter().enumerate() {
                    let (node, e) = self.eval(
                        sub,
                        instance,
                        format!("{keyword_location}/{i}"),
                        format!("{absolute_keyword_location}/{i}"),
                        instance_location.to_string(),
                        dynamic_scope,
                    );
                    ok &= node.valid;
                    if node.valid {
                        evaluated.merge(e);
                    }
                    kids.push(node);
                }
                (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
            }
            AnyOf { any_of } => {
                let mut ok = false;
                let mut kids = Vec::new();
                for (i, sub) in any_of.iter().enumerate() {
                    let (node, e) = self.eval(
                        sub,
                        instance,
                        format!("{keyword_location}/{i}"),
                        format!("{absolute_keyword_location}/{i}"),
                        instance_location.to_string(),
                        dynamic_scope,
                    );
                    if node.valid {
                        ok = true;
                        evaluated.merge(e);
                    }
                    kids.push(node);
                }
                (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
            }
            OneOf { one_of } => {
                let mut matches = 0;
                let mut kids = Vec::new();
                let mut matched_evaluated = None;
                for (i, sub) in one_of.iter().enumerate() {
                    let (node, e) = self.eval(
                        sub,
                        instance,
                        format!("{keyword_location}/{i}"),
                        format!("{absolute_keyword_location}/{i}"),
                        instance_location.to_string(),
                        dynamic_scope,
                    );
                    if node.valid {
                        matches += 1;
                        matched_evaluated = Some(e);
                    }
                    kids.push(node);
                }
                let ok = matches == 1;
                if ok {
                    evaluated.merge(matched_evaluated.unwrap());
                }
                (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
            }
            Not { not } => {
                let (node, _) = self.eval(
                    not,
                    instance,
                    format!("{keyword_location}/0"),
                    format!("{absolute_keyword_location}/0"),
                    instance_location.to_string(),
                    dynamic_scope,
                );
                let ok = !node.valid;
                (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, vec![node])))
            }
            If { r#if } => {
                let (cond, e) = self.eval(
                    r#if,
                    instance,
                    format!("{keyword_location}/0"),
                    format!("{absolute_keyword_location}/0"),
                    instance_location.to_string(),
                    dynamic_scope,
                );
                if cond.valid {
                    evaluated.merge(e);
                }
                // `if` never fails validation on its own; `then`/`else` react to it.
                (true, Some(wrap(keyword_location, absolute_keyword_location, instance_location, true, vec![cond])))
            }
            Then { then } => {
                let (node, e) = self.eval(
                    then,
                    instance,
                    format!("{keyword_location}/0"),
                    format!("{absolute_keyword_location}/0"),
                    instance_location.to_string(),
                    dynamic_scope,
                );
                if node.valid {
                    evaluated.merge(e);
                }
                (node.valid, Some(wrap(keyword_location, absolute_keyword_location, instance_location, node.valid, vec![node])))
            }
            Else { r#else } => {
                let (node, e) = self.eval(
                    r#else,
                    instance,
                    format!("{keyword_location}/0"),
                    format!("{absolute_keyword_location}/0"),
                    instance_location.to_string(),
                    dynamic_scope,
                );
                if node.valid {
                    evaluated.merge(e);
                }
                (node.valid, Some(wrap(keyword_location, absolute_keyword_location, instance_location, node.valid, vec![node])))
            }

            Properties { properties } => match instance.as_node() {
                Node::Object(o) => {
                    let mut ok = true;
                    let mut kids = Vec::new();
                    for (name, sub) in properties.iter() {
                        if let Some(field) = o.get(name) {
                            let (node, e) = self.eval(
                                sub,
                                field.value(),
                                format!("{keyword_location}/{name}"),
                                format!("{absolute_keyword_location}/{name}"),
                                format!("{instance_location}/{name}"),
                                dynamic_scope,
                            );
                            ok &= node.valid;
                            if node.valid {
                                evaluated.properties.insert(name.to_string());
                                evaluated.merge(e);
                            }
                            kids.push(node);
                        }
                    }
                    (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
                }
                _ => (true, None),
            },
            PatternProperties { pattern_properties } => match instance.as_node() {
                Node::Object(o) => {
                    let mut ok = true;
                    let mut kids = Vec::new();
                    for field in o.iter() {
                        for (re, sub) in pattern_properties.iter() {
                            if re.is_match(field.property()) {
                                let (node, e) = self.eval(
                                    sub,
                                    field.value(),
                                    format!("{keyword_location}/{}", re.as_str()),
                                    format!("{absolute_keyword_location}/{}", re.as_str()),
                                    format!("{instance_location}/{}", field.property()),
                                    dynamic_scope,
                                );
                                ok &= node.valid;
                                if node.valid {
                                    evaluated.properties.insert(field.property().to_string());
                                    evaluated.merge(e);
                                }
                                kids.push(node);
                            }
                        }
                    }
                    (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
                }
                _ => (true, None),
            },
            AdditionalProperties { additional_properties } => match instance.as_node() {
                Node::Object(o) => {
                    let mut ok = true;
                    let mut kids = Vec::new();
                    for field in o.iter() {
                        if evaluated.properties.contains(field.property()) {
                            continue;
                        }
                        let (node, e) = self.eval(
                            additional_properties,
                            field.value(),
                            format!("{keyword_location}/{}", field.property()),
                            format!("{absolute_keyword_location}/{}", field.property()),
                            format!("{instance_location}/{}", field.property()),
                            dynamic_scope,
                        );
                        ok &= node.valid;
                        if node.valid {
                            evaluated.properties.insert(field.property().to_string());
                            evaluated.merge(e);
                        }
                        kids.push(node);
                    }
                    (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
                }
                _ => (true, None),
            },
            UnevaluatedProperties { unevaluated_properties } => match instance.as_node() {
                Node::Object(o) => {
                    let mut ok = true;
                    let mut kids = Vec::new();
                    for field in o.iter() {
                        if evaluated.properties.contains(field.property()) {
                            continue;
                        }
                        let (node, e) = self.eval(
                            unevaluated_properties,
                            field.value(),
                            format!("{keyword_location}/{}", field.property()),
                            format!("{absolute_keyword_location}/{}", field.property()),
                            format!("{instance_location}/{}", field.property()),
                            dynamic_scope,
                        );
                        ok &= node.valid;
                        if node.valid {
                            evaluated.properties.insert(field.property().to_string());
                            evaluated.merge(e);
                        }
                        kids.push(node);
                    }
                    (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
                }
                _ => (true, None),
            },
            PropertyNames { property_names } => match instance.as_node() {
                Node::Object(o) => {
                    let mut ok = true;
                    let mut kids = Vec::new();
                    for field in o.iter() {
                        let name = crate::value::Value::String(field.property().to_string());
                        let (node, _) = self.eval(
                            property_names,
                            &name,
                            format!("{keyword_location}"),
                            format!("{absolute_keyword_location}"),
                            format!("{instance_location}/{}", field.property()),
                            dynamic_scope,
                        );
                        ok &= node.valid;
                        kids.push(node);
                    }
                    (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
                }
                _ => (true, None),
            },
            DependentSchemas { dependent_schemas } => match instance.as_node() {
                Node::Object(o) => {
                    let mut ok = true;
                    let mut kids = Vec::new();
                    for (trigger, sub) in dependent_schemas.iter() {
                        if o.get(trigger).is_some() {
                            let (node, e) = self.eval(
                                sub,
                                instance,
                                format!("{keyword_location}/{trigger}"),
                                format!("{absolute_keyword_location}/{trigger}"),
                                instance_location.to_string(),
                                dynamic_scope,
                            );
                            ok &= node.valid;
                            if node.valid {
                                evaluated.merge(e);
                            }
                            kids.push(node);
                        }
                    }
                    (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
                }
                _ => (true, None),
            },

            PrefixItems { prefix_items } => match instance.as_node() {
                Node::Array(a) => {
                    let mut ok = true;
                    let mut kids = Vec::new();
                    for (i, sub) in prefix_items.iter().enumerate() {
                        let Some(item) = a.get(i) else { break };
                        let (node, e) = self.eval(
                            sub,
                            item,
                            format!("{keyword_location}/{i}"),
                            format!("{absolute_keyword_location}/{i}"),
                            format!("{instance_location}/{i}"),
                            dynamic_scope,
                        );
                        ok &= node.valid;
                        if node.valid {
                            evaluated.items = evaluated.items.max(i + 1);
                            evaluated.merge(e);
                        }
                        kids.push(node);
                    }
                    (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
                }
                _ => (true, None),
            },
            Items { items } => match instance.as_node() {
                Node::Array(a) => {
                    let start = evaluated.items;
                    let mut ok = true;
                    let mut kids = Vec::new();
                    for (i, item) in a.iter().enumerate().skip(start) {
                        let (node, e) = self.eval(
                            items,
                            item,
                            format!("{keyword_location}"),
                            format!("{absolute_keyword_location}"),
                            format!("{instance_location}/{i}"),
                            dynamic_scope,
                        );
                        ok &= node.valid;
                        if node.valid {
                            evaluated.merge(e);
                        }
                        kids.push(node);
                    }
                    if ok {
                        evaluated.all_items = true;
                    }
                    (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
                }
                _ => (true, None),
            },
            UnevaluatedItems { unevaluated_items } => match instance.as_node() {
                Node::Array(a) => {
                    if evaluated.all_items {
                        return (true, None);
                    }
                    let mut ok = true;
                    let mut kids = Vec::new();
                    for (i, item) in a.iter().enumerate().skip(evaluated.items) {
                        let (node, e) = self.eval(
                            unevaluated_items,
                            item,
                            format!("{keyword_location}"),
                            format!("{absolute_keyword_location}"),
                            format!("{instance_location}/{i}"),
                            dynamic_scope,
                        );
                        ok &= node.valid;
                        if node.valid {
                            evaluated.items = evaluated.items.max(i + 1);
                            evaluated.merge(e);
                        }
                        kids.push(node);
                    }
                    (ok, Some(wrap(keyword_location, absolute_keyword_location, instance_location, ok, kids)))
                }
                _ => (true, None),
            },
            Contains { .. } => match instance.as_node() {
                Node::Array(_) => {
                    let count = contains_count.unwrap_or(0);
                    leaf(count > 0, (count == 0).then(|| "array contains no matching element".to_string()))
                }
                _ => (true, None),
            },
            MinContains { min_contains } => match instance.as_node() {
                Node::Array(_) => {
                    let count = contains_count.unwrap_or(0);
                    leaf(count >= *min_contains, (count < *min_contains).then(|| format!("only {count} elements match 'contains', need at least {min_contains}")))
                }
                _ => (true, None),
            },
            MaxContains { max_contains } => match instance.as_node() {
                Node::Array(_) => {
                    let count = contains_count.unwrap_or(0);
                    leaf(count <= *max_contains, (count > *max_contains).then(|| format!("{count} elements match 'contains', more than the allowed {max_contains}")))
                }
                _ => (true, None),
            },

            Defs { .. } => (true, None),

            Ref { r#ref } => match self.resolve_ref(*dynamic_scope.last().expect("dynamic scope always has an entry"), r#ref) {
                Ok(target) => {
                    let (node, e) = self.eval(
                        target,
                        instance,
                        keyword_location.to_string(),
                        target.curi.to_string(),
                        instance_location.to_string(),
                        dynamic_scope,
                    );
                    if node.valid {
                        evaluated.merge(e);
                    }
                    (node.valid, Some(node))
                }
                Err(err) => leaf(false, Some(err.to_string())),
            },
            DynamicRef { dynamic_ref } => match self.resolve_dynamic_ref(dynamic_scope.as_slice(), dynamic_ref) {
                Ok(target) => {
                    let (node, e) = self.eval(
                        target,
                        instance,
                        keyword_location.to_string(),
                        target.curi.to_string(),
                        instance_location.to_string(),
                        dynamic_scope,
                    );
                    if node.valid {
                        evaluated.merge(e);
                    }
                    (node.valid, Some(node))
                }
                Err(err) => leaf(false, Some(err.to_string())),
            },
        }
    }

    fn resolve_ref(&self, current: &'i Schema<A>, reference: &str) -> Result<&'i Schema<A>, Error> {
        let uri = current.curi.join(reference).unwrap_or_else(|_| current.curi.clone());
        self.index.fetch(&uri).ok_or_else(|| Error::UnresolvedReference(reference.to_string()))
    }

    /// Per §4.5: search the dynamic scope from innermost to outermost for a
    /// resource exposing a matching `$dynamicAnchor`, preferring the
    /// outermost resource that matches; fall back to a static `$ref` lookup.
    fn resolve_dynamic_ref(&self, dynamic_scope: &[&'i Schema<A>], reference: &str) -> Result<&'i Schema<A>, Error> {
        let anchor = reference.strip_prefix('#').unwrap_or(reference);
        let mut outermost_match = None;
        for schema in dynamic_scope.iter() {
            let mut resource = schema.curi.clone();
            resource.set_fragment(Some(anchor));
            if let Some(candidate) = self.index.fetch(&resource) {
                if candidate.keywords.iter().any(|k| matches!(k, Keyword::DynamicAnchor { dynamic_anchor } if &**dynamic_anchor == anchor)) {
                    outermost_match = Some(candidate);
                    break;
                }
            }
        }
        if let Some(found) = outermost_match {
            return Ok(found);
        }
        tracing::debug!(reference, scope_depth = dynamic_scope.len(), "no dynamic anchor matched in scope, falling back to static resolution");
        let base = &dynamic_scope.last().expect("dynamic scope always has an entry").curi;
        let uri = base.join(reference).unwrap_or_else(|_| base.clone());
        self.index.fetch(&uri).ok_or_else(|| Error::UnresolvedDynamicRef(reference.to_string()))
    }
}

fn count_matches<'i, A: Annotation, N: AsNode>(
    validator: &Validator<'i, A>,
    sub: &'i Schema<A>,
    instance: &N,
    dynamic_scope: &mut Vec<&'i Schema<A>>,
) -> usize {
    match instance.as_node() {
        Node::Array(a) => a
            .iter()
            .filter(|item| validator.eval(sub, *item, String::new(), String::new(), String::new(), dynamic_scope).0.valid)
            .count(),
        _ => 0,
    }
}

fn wrap(keyword_location: &str, absolute_keyword_location: &str, instance_location: &str, valid: bool, children: Vec<ScopedOutcome>) -> ScopedOutcome {
    ScopedOutcome {
        valid,
        keyword_location: keyword_location.to_string(),
        absolute_keyword_location: absolute_keyword_location.to_string(),
        instance_location: instance_location.to_string(),
        error: None,
        annotation: None,
        children,
    }
}

fn schema_fragment(pointer: &str) -> &str {
    pointer.trim_start_matches('/')
}

fn is_multiple_of(n: &solid_temporal::BigDecimal, of: &solid_temporal::BigDecimal) -> bool {
    use solid_temporal::{BigDecimal, RoundingContext};
    let zero = BigDecimal::zero();
    match (n, of) {
        (_, d) if *d == zero => false,
        (n, _) if *n == zero => true,
        (BigDecimal::Finite { .. }, BigDecimal::Finite { .. }) => {
            // Exact only when the quotient has no fractional remainder, evaluated
            // at generous precision since `multipleOf` operands are rarely exact
            // binary fractions of one another.
            let q = n.div(of, RoundingContext::default());
            crate::schema::types::is_integral(&q)
        }
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{build_schema, index::Builder, CoreAnnotation};
    use crate::value::Value;
    use serde_json::json;

    fn compile(doc: serde_json::Value) -> Schema<CoreAnnotation> {
        let curi = url::Url::parse("http://example/schema").unwrap();
        build_schema::<CoreAnnotation>(&curi, &doc).unwrap()
    }

    #[test]
    fn test_basic_object_validation() {
        let schema = compile(json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string", "minLength": 1 } },
            "additionalProperties": false,
        }));
        let mut builder = Builder::new();
        builder.add(&schema).unwrap();
        let index = builder.into_index();
        let validator = Validator::new(&index);

        let good = Value::Object(vec![("name".into(), Value::String("a".into()))]);
        let outcome = validator.validate(&schema, &good, OutputShape::Flag);
        assert!(outcome.is_valid());

        let bad = Value::Object(vec![("extra".into(), Value::Bool(true))]);
        let outcome = validator.validate(&schema, &bad, OutputShape::Flag);
        assert!(!outcome.is_valid());
    }

    #[test]
    fn test_any_of_and_not() {
        let schema = compile(json!({ "anyOf": [{ "type": "string" }, { "type": "number" }], "not": { "const": "forbidden" } }));
        let mut builder = Builder::new();
        builder.add(&schema).unwrap();
        let index = builder.into_index();
        let validator = Validator::new(&index);

        assert!(validator.validate(&schema, &Value::String("ok".into()), OutputShape::Flag).is_valid());
        assert!(!validator.validate(&schema, &Value::String("forbidden".into()), OutputShape::Flag).is_valid());
        assert!(!validator.validate(&schema, &Value::Bool(true), OutputShape::Flag).is_valid());
    }

    #[test]
    fn test_ref_resolution() {
        let schema = compile(json!({
            "$defs": { "pos": { "type": "number", "minimum": 0 } },
            "$ref": "#/$defs/pos",
        }));
        let mut builder = Builder::new();
        builder.add(&schema).unwrap();
        builder.verify_references().unwrap();
        let index = builder.into_index();
        let validator = Validator::new(&index);

        use solid_temporal::BigDecimal;
        use std::str::FromStr;
        assert!(validator.validate(&schema, &Value::Number(BigDecimal::from_str("3").unwrap()), OutputShape::Flag).is_valid());
        assert!(!validator.validate(&schema, &Value::Number(BigDecimal::from_str("-1").unwrap()), OutputShape::Flag).is_valid());
    }
}
