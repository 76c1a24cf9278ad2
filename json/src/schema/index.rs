//! Builds a lookup index of compiled schemas, keyed by canonical and
//! anchor-form URIs, then partitions it into a small "fast" table of URIs
//! that are actually referenced and a "slow" table of everything else, so
//! `$ref` resolution at validation time touches a small binary search
//! rather than scanning every sub-schema in the document.

use super::{Annotation, Keyword, Schema};
use std::collections::{BTreeMap, BTreeSet};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("duplicate canonical URI: '{0}'")]
    DuplicateCanonicalUri(url::Url),
    #[error("duplicate anchor URI: '{0}'")]
    DuplicateAnchorUri(url::Url),
    #[error("schema $ref '{ruri}', referenced by '{curi}', was not found")]
    InvalidReference { ruri: url::Url, curi: url::Url },
    #[error("schema '{uri}' was not found")]
    NotFound { uri: url::Url },
}

pub struct Builder<'s, A: Annotation>(BTreeMap<url::Url, &'s Schema<A>>);

impl<'s, A: Annotation> Default for Builder<'s, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'s, A: Annotation> Builder<'s, A> {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn add(&mut self, schema: &'s Schema<A>) -> Result<(), Error> {
        if self.0.insert(schema.curi.clone(), schema).is_some() {
            return Err(Error::DuplicateCanonicalUri(schema.curi.clone()));
        }
        for kw in &schema.keywords {
            if let Keyword::Anchor { anchor } | Keyword::DynamicAnchor { dynamic_anchor: anchor } = kw {
                let mut auri = schema.curi.clone();
                auri.set_fragment(Some(anchor));
                if self.0.insert(auri.clone(), schema).is_some() {
                    return Err(Error::DuplicateAnchorUri(auri));
                }
            }
        }
        for child in schema.applied_schemas() {
            self.add(child)?;
        }
        Ok(())
    }

    pub fn verify_references(&self) -> Result<(), Error> {
        for (referrer, referrent) in self.references() {
            if !self.0.contains_key(referrent) {
                return Err(Error::InvalidReference { ruri: referrent.clone(), curi: referrer.clone() });
            }
        }
        Ok(())
    }

    pub fn into_index(self) -> Index<'s, A> {
        let referrents: BTreeSet<&url::Url> = self.references().map(|(_, r)| r).collect();
        let (fast, slow) = self.0.into_iter().partition(|(u, _)| referrents.contains(u));
        Index { fast, slow }
    }

    fn references(&self) -> impl Iterator<Item = (&url::Url, &url::Url)> + '_ {
        self.0.iter().flat_map(|(referrer, schema)| {
            schema.keywords.iter().filter_map(move |kw| match kw {
                Keyword::Ref { r#ref } => Some((referrer, resolve(&schema.curi, r#ref))),
                Keyword::DynamicRef { dynamic_ref } => Some((referrer, resolve(&schema.curi, dynamic_ref))),
                _ => None,
            })
        })
    }
}

/// `$ref`/`$dynamicRef` values are stored as the literal string from the
/// document; resolve them against the referring schema's base URI here,
/// leaking the resolved `Url` for the lifetime of the index build (mirrors
/// the lifetime of `schema.curi` itself since both derive from the same
/// parsed document tree).
fn resolve<'s>(base: &'s url::Url, reference: &str) -> &'s url::Url {
    Box::leak(Box::new(base.join(reference).unwrap_or_else(|_| base.clone())))
}

pub struct Index<'s, A: Annotation> {
    fast: Vec<(url::Url, &'s Schema<A>)>,
    slow: Vec<(url::Url, &'s Schema<A>)>,
}

impl<'s, A: Annotation> Index<'s, A> {
    pub fn fetch(&self, uri: &url::Url) -> Option<&'s Schema<A>> {
        if let Ok(ind) = self.fast.binary_search_by_key(&uri, |(u, _)| u) {
            Some(self.fast[ind].1)
        } else if let Ok(ind) = self.slow.binary_search_by_key(&uri, |(u, _)| u) {
            Some(self.slow[ind].1)
        } else {
            None
        }
    }

    pub fn must_fetch(&self, uri: &url::Url) -> Result<&'s Schema<A>, Error> {
        self.fetch(uri).ok_or_else(|| Error::NotFound { uri: uri.clone() })
    }
}

#[cfg(test)]
mod test {
    use super::super::{build_schema, CoreAnnotation};
    use super::Builder;
    use serde_json::json;

    #[test]
    fn test_indexing() {
        let schema = json!({
            "$defs": {
                "one": { "const": 1 },
                "two": { "$anchor": "Two", "const": 2 },
                "three": { "$id": "http://other", "$anchor": "Three", "const": 3 },
                "other": { "$ref": "http://other" },
            },
            "$ref": "#Two",
        });

        let curi = url::Url::parse("http://example/schema").unwrap();
        let schema = build_schema::<CoreAnnotation>(&curi, &schema).unwrap();

        let mut builder = Builder::new();
        builder.add(&schema).unwrap();
        builder.verify_references().unwrap();
        let index = builder.into_index();

        for (uri, expect) in &[
            ("http://other/", true),
            ("http://example/schema#Two", true),
            ("http://example/schema", true),
            ("http://other/#Three", true),
            ("http://missing/#Four", false),
        ] {
            let uri = url::Url::parse(uri).unwrap();
            assert_eq!(index.fetch(&uri).is_some(), *expect, "{uri}");
        }
    }
}
