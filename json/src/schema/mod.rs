//! Schema compilation: `Schema`/`SubSchema` graphs, resolved against the
//! Draft 2020-12 core, applicator, validation, format-annotation, content,
//! and meta-data vocabularies, plus the `bytes-validation` and `coding`
//! extension vocabularies.

pub mod build;
pub mod formats;
pub mod index;
pub mod intern;
pub mod keywords;
pub mod types;

pub use build::build_schema;
pub use index::Index;
pub use keywords::{Annotation, CoreAnnotation, Keyword};

/// A compiled schema: its canonical URI and the flat list of keywords
/// parsed from it, in document order. `$ref`/`$dynamicRef` are stored as
/// URIs to be resolved against an `Index`, not inlined, so cyclic schemas
/// compile without infinite recursion.
#[derive(Debug)]
pub struct Schema<A: Annotation> {
    pub curi: url::Url,
    pub keywords: Vec<Keyword<A>>,
}

impl<A: Annotation> Schema<A> {
    pub fn new(curi: url::Url) -> Self {
        Self { curi, keywords: Vec::new() }
    }

    /// Sub-schemas directly applied by this schema's keywords, in keyword
    /// order, paired with the JSON Pointer token (relative to this schema)
    /// at which each was compiled. Used by both indexing (to recurse) and
    /// validation (to walk applicators).
    pub fn applied_schemas(&self) -> impl Iterator<Item = &Schema<A>> {
        self.keywords.iter().flat_map(Keyword::applied_schemas)
    }
}

impl<A: Annotation> Keyword<A> {
    pub fn applied_schemas(&self) -> Box<dyn Iterator<Item = &Schema<A>> + '_> {
        use Keyword::*;
        match self {
            AdditionalProperties { additional_properties: s }
            | Contains { contains: s }
            | Else { r#else: s }
            | If { r#if: s }
            | Items { items: s }
            | Not { not: s }
            | PropertyNames { property_names: s }
            | Then { then: s }
            | UnevaluatedItems { unevaluated_items: s }
            | UnevaluatedProperties { unevaluated_properties: s } => Box::new(std::iter::once(s.as_ref())),

            AllOf { all_of: v } | AnyOf { any_of: v } | OneOf { one_of: v } | PrefixItems { prefix_items: v } => {
                Box::new(v.iter())
            }

            Defs { defs: v } | Properties { properties: v } => Box::new(v.iter().map(|(_, s)| s)),
            DependentSchemas { dependent_schemas: v } => Box::new(v.iter().map(|(_, s)| s)),
            PatternProperties { pattern_properties: v } => Box::new(v.iter().map(|(_, s)| s)),

            _ => Box::new(std::iter::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_curi_roundtrip() {
        let url = url::Url::parse("http://example/schema").unwrap();
        let schema = Schema::<CoreAnnotation>::new(url.clone());
        assert_eq!(schema.curi, url);
    }
}
