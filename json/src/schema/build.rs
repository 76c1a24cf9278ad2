//! Compiles a schema document (plain `serde_json::Value`, since schemas are
//! static documents rather than streamed instances) into a `Schema<A>`
//! graph: one pass, depth first, resolving `$id` against the enclosing
//! base URI as it descends and leaving `$ref`/`$dynamicRef` as unresolved
//! URIs for `schema::index` to wire up afterward.

use super::{formats, intern, keywords, types, Annotation, Keyword, Schema};
use solid_temporal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("schema must be a JSON object or boolean, found {0}")]
    NotAnObjectOrBool(&'static str),
    #[error("invalid value for keyword '{keyword}'")]
    InvalidKeywordValue { keyword: String },
    #[error("unknown keyword '{0}' is not declared by any active vocabulary")]
    UnknownKeyword(String),
    #[error("invalid $id or $ref URI: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),
    #[error("invalid numeric literal: {0}")]
    Number(String),
}

/// Governs what happens when a document uses a keyword this build doesn't
/// recognise and the active `Annotation` type doesn't claim either.
#[derive(Clone)]
pub enum UnknownKeywordPolicy {
    /// Record it as an opaque, unparsed annotation value (the JSON Schema
    /// default: unknown keywords are always legal, just unenforced).
    Annotate,
    /// Drop it silently.
    Ignore,
    /// Reject the schema.
    Fail,
    /// Hand it to a caller-supplied handler.
    Custom(Arc<dyn Fn(&str, &serde_json::Value) -> Result<(), Error> + Send + Sync>),
}

impl Default for UnknownKeywordPolicy {
    fn default() -> Self {
        UnknownKeywordPolicy::Annotate
    }
}

/// Which schema dialect a document is compiled under, per §6.3. All three
/// share the same keyword grammar; they differ only in whether `format` is
/// enforced and whether the `bytes-validation`/`coding` extension keywords
/// (`minSize`/`maxSize`/`units`/`bitWidth`) are recognised at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `https://json-schema.org/draft/2020-12/schema` — `format` is an
    /// assertion, the extension keywords are rejected as unknown.
    #[default]
    Standard2020_12,
    /// The companion dialect with `format-assertion` swapped for
    /// `format-annotation`: `format` is parsed and recorded but never
    /// checked against the instance.
    FormatAnnotation2020_12,
    /// `https://github.com/solid-swift/draft/v1-2020-12/schema` — on top of
    /// `Standard2020_12`'s format-assertion behaviour, additionally
    /// recognises `bytes-validation` and `coding`.
    SolidExtension,
}

impl Dialect {
    pub fn uri(self) -> &'static str {
        match self {
            Dialect::Standard2020_12 => "https://json-schema.org/draft/2020-12/schema",
            Dialect::FormatAnnotation2020_12 => "https://json-schema.org/draft/2020-12/schema-format-annotation",
            Dialect::SolidExtension => "https://github.com/solid-swift/draft/v1-2020-12/schema",
        }
    }

    fn format_is_assertion(self) -> bool {
        !matches!(self, Dialect::FormatAnnotation2020_12)
    }

    fn allows_extension_keywords(self) -> bool {
        matches!(self, Dialect::SolidExtension)
    }
}

#[derive(Clone, Default)]
pub struct BuildConfig {
    pub unknown_keyword: UnknownKeywordPolicy,
    pub dialect: Dialect,
}

pub fn build_schema<A: Annotation>(base: &url::Url, doc: &serde_json::Value) -> Result<Schema<A>, Error> {
    build_schema_with(base, doc, &BuildConfig::default())
}

pub fn build_schema_with<A: Annotation>(
    base: &url::Url,
    doc: &serde_json::Value,
    config: &BuildConfig,
) -> Result<Schema<A>, Error> {
    build_at(base, doc, config)
}

fn to_value(v: &serde_json::Value) -> crate::value::Value {
    use crate::value::Value;
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            Value::Number(BigDecimal::from_str(&n.to_string()).unwrap_or(BigDecimal::NaN))
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(a) => Value::Array(a.iter().map(to_value).collect()),
        serde_json::Value::Object(m) => Value::Object(m.iter().map(|(k, v)| (k.clone(), to_value(v))).collect()),
    }
}

fn as_bigdecimal(v: &serde_json::Value, keyword: &str) -> Result<BigDecimal, Error> {
    let serde_json::Value::Number(n) = v else {
        return Err(Error::InvalidKeywordValue { keyword: keyword.to_string() });
    };
    let n = n.to_string();
    BigDecimal::from_str(&n).map_err(|_| Error::Number(n))
}

fn as_usize(v: &serde_json::Value, keyword: &str) -> Result<usize, Error> {
    v.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| Error::InvalidKeywordValue { keyword: keyword.to_string() })
}

fn as_str<'v>(v: &'v serde_json::Value, keyword: &str) -> Result<&'v str, Error> {
    v.as_str().ok_or_else(|| Error::InvalidKeywordValue { keyword: keyword.to_string() })
}

fn as_array<'v>(v: &'v serde_json::Value, keyword: &str) -> Result<&'v Vec<serde_json::Value>, Error> {
    v.as_array().ok_or_else(|| Error::InvalidKeywordValue { keyword: keyword.to_string() })
}

fn as_object<'v>(
    v: &'v serde_json::Value,
    keyword: &str,
) -> Result<&'v serde_json::Map<String, serde_json::Value>, Error> {
    v.as_object().ok_or_else(|| Error::InvalidKeywordValue { keyword: keyword.to_string() })
}

/// Escapes `token` per RFC 6901 and appends it as a new path segment of
/// `base`'s existing fragment (or starts a fresh fragment if none).
fn child_base(base: &url::Url, token: &str) -> url::Url {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    let mut child = base.clone();
    let fragment = format!("{}/{escaped}", base.fragment().unwrap_or(""));
    child.set_fragment(Some(&fragment));
    child
}

fn build_array<A: Annotation>(
    base: &url::Url,
    parent_keyword: &str,
    arr: &[serde_json::Value],
    config: &BuildConfig,
) -> Result<Box<[Schema<A>]>, Error> {
    let keyword_base = child_base(base, parent_keyword);
    arr.iter()
        .enumerate()
        .map(|(i, v)| build_at(&child_base(&keyword_base, &i.to_string()), v, config))
        .collect()
}

fn build_named<A: Annotation>(
    base: &url::Url,
    parent_keyword: &str,
    obj: &serde_json::Map<String, serde_json::Value>,
    config: &BuildConfig,
) -> Result<Box<[(Box<str>, Schema<A>)]>, Error> {
    let keyword_base = child_base(base, parent_keyword);
    obj.iter()
        .map(|(k, v)| {
            let schema = build_at(&child_base(&keyword_base, k), v, config)?;
            Ok((k.as_str().into(), schema))
        })
        .collect()
}

/// Compiles a `required` array into a keyword that checks membership with a
/// single mask comparison rather than a per-name scan. Interning every
/// required name costs one bit of a 64-bit set each, so lists longer than
/// `intern::MAX_TABLE_SIZE` are split into same-sized chunks and recombined
/// under a synthetic `allOf`, each chunk getting its own table.
fn build_required<A: Annotation>(curi: &url::Url, props: Vec<Box<str>>) -> Keyword<A> {
    if props.len() <= intern::MAX_TABLE_SIZE {
        let (table, mask) = intern_required(&props);
        Keyword::Required { required: props.into(), mask, table: Arc::new(table) }
    } else {
        let all_of: Box<[Schema<A>]> = props
            .chunks(intern::MAX_TABLE_SIZE)
            .map(|chunk| {
                let chunk: Box<[Box<str>]> = chunk.to_vec().into();
                let (table, mask) = intern_required(&chunk);
                let mut sub = Schema::new(curi.clone());
                sub.keywords.push(Keyword::Required { required: chunk, mask, table: Arc::new(table) });
                sub
            })
            .collect();
        Keyword::AllOf { all_of }
    }
}

fn intern_required(props: &[Box<str>]) -> (intern::Table, intern::Set) {
    let mut table = intern::Table::new();
    let mut mask = 0;
    for p in props {
        mask |= table.intern(p).expect("chunk is bounded by MAX_TABLE_SIZE");
    }
    table.freeze();
    (table, mask)
}

fn build_at<A: Annotation>(
    parent_base: &url::Url,
    doc: &serde_json::Value,
    config: &BuildConfig,
) -> Result<Schema<A>, Error> {
    match doc {
        serde_json::Value::Bool(true) => Ok(Schema::new(parent_base.clone())),
        serde_json::Value::Bool(false) => {
            let mut s = Schema::new(parent_base.clone());
            s.keywords.push(Keyword::False);
            Ok(s)
        }
        serde_json::Value::Object(map) => build_object(parent_base, map, config),
        other => Err(Error::NotAnObjectOrBool(type_name(other))),
    }
}

fn type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn build_object<A: Annotation>(
    parent_base: &url::Url,
    map: &serde_json::Map<String, serde_json::Value>,
    config: &BuildConfig,
) -> Result<Schema<A>, Error> {
    use keywords::*;

    let curi = match map.get(ID).and_then(|v| v.as_str()) {
        Some(id) => parent_base.join(id)?,
        None => parent_base.clone(),
    };
    let _span = tracing::debug_span!("schema_resource_scope", %curi).entered();
    let mut kw = Vec::new();

    if let Some(id) = map.get(ID).and_then(|v| v.as_str()) {
        kw.push(Keyword::Id { curi: id.into(), explicit: true });
    }

    for (key, value) in map {
        let key = key.as_str();
        match key {
            ID | SCHEMA => continue,

            ADDITIONAL_PROPERTIES => kw.push(Keyword::AdditionalProperties {
                additional_properties: Box::new(build_at(&child_base(&curi, ADDITIONAL_PROPERTIES), value, config)?),
            }),
            ALL_OF => kw.push(Keyword::AllOf { all_of: build_array(&curi, ALL_OF, as_array(value, ALL_OF)?, config)? }),
            ANCHOR => kw.push(Keyword::Anchor { anchor: as_str(value, ANCHOR)?.into() }),
            ANY_OF => kw.push(Keyword::AnyOf { any_of: build_array(&curi, ANY_OF, as_array(value, ANY_OF)?, config)? }),
            CONST => kw.push(Keyword::Const { r#const: Box::new(to_value(value)) }),
            CONTAINS => kw.push(Keyword::Contains {
                contains: Box::new(build_at(&child_base(&curi, CONTAINS), value, config)?),
            }),
            DEFS => kw.push(Keyword::Defs { defs: build_named(&curi, DEFS, as_object(value, DEFS)?, config)? }),
            DEPENDENT_REQUIRED => {
                let obj = as_object(value, DEPENDENT_REQUIRED)?;
                let mut out = Vec::with_capacity(obj.len());
                for (k, v) in obj {
                    let props: Box<[Box<str>]> = as_array(v, DEPENDENT_REQUIRED)?
                        .iter()
                        .map(|p| as_str(p, DEPENDENT_REQUIRED).map(Into::into))
                        .collect::<Result<_, _>>()?;
                    out.push((k.as_str().into(), props));
                }
                kw.push(Keyword::DependentRequired { dependent_required: out.into() });
            }
            DEPENDENT_SCHEMAS => kw.push(Keyword::DependentSchemas {
                dependent_schemas: build_named(&curi, DEPENDENT_SCHEMAS, as_object(value, DEPENDENT_SCHEMAS)?, config)?,
            }),
            DYNAMIC_ANCHOR => kw.push(Keyword::DynamicAnchor { dynamic_anchor: as_str(value, DYNAMIC_ANCHOR)?.into() }),
            DYNAMIC_REF => kw.push(Keyword::DynamicRef { dynamic_ref: as_str(value, DYNAMIC_REF)?.into() }),
            ELSE => kw.push(Keyword::Else { r#else: Box::new(build_at(&child_base(&curi, ELSE), value, config)?) }),
            ENUM => kw.push(Keyword::Enum { r#enum: as_array(value, ENUM)?.iter().map(to_value).collect() }),
            EXCLUSIVE_MAXIMUM => kw.push(Keyword::ExclusiveMaximum { exclusive_maximum: as_bigdecimal(value, EXCLUSIVE_MAXIMUM)? }),
            EXCLUSIVE_MINIMUM => kw.push(Keyword::ExclusiveMinimum { exclusive_minimum: as_bigdecimal(value, EXCLUSIVE_MINIMUM)? }),
            FORMAT => {
                let s = as_str(value, FORMAT)?;
                let format: formats::Format = serde_json::from_value(serde_json::Value::String(s.to_string()))
                    .map_err(|_| Error::InvalidKeywordValue { keyword: FORMAT.to_string() })?;
                if config.dialect.format_is_assertion() {
                    kw.push(Keyword::Format { format });
                } else {
                    kw.push(Keyword::FormatAnnotation { format });
                }
            }
            IF => kw.push(Keyword::If { r#if: Box::new(build_at(&child_base(&curi, IF), value, config)?) }),
            ITEMS => kw.push(Keyword::Items { items: Box::new(build_at(&child_base(&curi, ITEMS), value, config)?) }),
            MAXIMUM => kw.push(Keyword::Maximum { maximum: as_bigdecimal(value, MAXIMUM)? }),
            MAX_CONTAINS => kw.push(Keyword::MaxContains { max_contains: as_usize(value, MAX_CONTAINS)? }),
            MAX_ITEMS => kw.push(Keyword::MaxItems { max_items: as_usize(value, MAX_ITEMS)? }),
            MAX_LENGTH => kw.push(Keyword::MaxLength { max_length: as_usize(value, MAX_LENGTH)? }),
            MAX_PROPERTIES => kw.push(Keyword::MaxProperties { max_properties: as_usize(value, MAX_PROPERTIES)? }),
            MAX_SIZE if config.dialect.allows_extension_keywords() => {
                kw.push(Keyword::MaxSize { max_size: as_usize(value, MAX_SIZE)? })
            }
            MINIMUM => kw.push(Keyword::Minimum { minimum: as_bigdecimal(value, MINIMUM)? }),
            MIN_CONTAINS => kw.push(Keyword::MinContains { min_contains: as_usize(value, MIN_CONTAINS)? }),
            MIN_ITEMS => kw.push(Keyword::MinItems { min_items: as_usize(value, MIN_ITEMS)? }),
            MIN_LENGTH => kw.push(Keyword::MinLength { min_length: as_usize(value, MIN_LENGTH)? }),
            MIN_PROPERTIES => kw.push(Keyword::MinProperties { min_properties: as_usize(value, MIN_PROPERTIES)? }),
            MIN_SIZE if config.dialect.allows_extension_keywords() => {
                kw.push(Keyword::MinSize { min_size: as_usize(value, MIN_SIZE)? })
            }
            MULTIPLE_OF => kw.push(Keyword::MultipleOf { multiple_of: as_bigdecimal(value, MULTIPLE_OF)? }),
            NOT => kw.push(Keyword::Not { not: Box::new(build_at(&child_base(&curi, NOT), value, config)?) }),
            ONE_OF => kw.push(Keyword::OneOf { one_of: build_array(&curi, ONE_OF, as_array(value, ONE_OF)?, config)? }),
            PATTERN => kw.push(Keyword::Pattern { pattern: Box::new(regex::Regex::new(as_str(value, PATTERN)?)?) }),
            PATTERN_PROPERTIES => {
                let obj = as_object(value, PATTERN_PROPERTIES)?;
                let keyword_base = child_base(&curi, PATTERN_PROPERTIES);
                let mut out = Vec::with_capacity(obj.len());
                for (k, v) in obj {
                    let re = regex::Regex::new(k)?;
                    let schema = build_at(&child_base(&keyword_base, k), v, config)?;
                    out.push((re, schema));
                }
                kw.push(Keyword::PatternProperties { pattern_properties: out.into() });
            }
            PREFIX_ITEMS => kw.push(Keyword::PrefixItems {
                prefix_items: build_array(&curi, PREFIX_ITEMS, as_array(value, PREFIX_ITEMS)?, config)?,
            }),
            PROPERTIES => kw.push(Keyword::Properties {
                properties: build_named(&curi, PROPERTIES, as_object(value, PROPERTIES)?, config)?,
            }),
            PROPERTY_NAMES => kw.push(Keyword::PropertyNames {
                property_names: Box::new(build_at(&child_base(&curi, PROPERTY_NAMES), value, config)?),
            }),
            REF => kw.push(Keyword::Ref { r#ref: as_str(value, REF)?.into() }),
            REQUIRED => {
                let props: Vec<Box<str>> = as_array(value, REQUIRED)?
                    .iter()
                    .map(|v| as_str(v, REQUIRED).map(Into::into))
                    .collect::<Result<_, _>>()?;
                kw.push(build_required(&curi, props));
            }
            THEN => kw.push(Keyword::Then { then: Box::new(build_at(&child_base(&curi, THEN), value, config)?) }),
            TYPE => {
                let set = match value {
                    serde_json::Value::String(s) => types::Set::for_type_name(s)
                        .ok_or_else(|| Error::InvalidKeywordValue { keyword: TYPE.to_string() })?,
                    serde_json::Value::Array(a) => a
                        .iter()
                        .map(|v| as_str(v, TYPE))
                        .collect::<Result<types::Set, _>>()
                        .map_err(|_| Error::InvalidKeywordValue { keyword: TYPE.to_string() })?,
                    _ => return Err(Error::InvalidKeywordValue { keyword: TYPE.to_string() }),
                };
                kw.push(Keyword::Type { r#type: set });
            }
            UNEVALUATED_ITEMS => kw.push(Keyword::UnevaluatedItems {
                unevaluated_items: Box::new(build_at(&child_base(&curi, UNEVALUATED_ITEMS), value, config)?),
            }),
            UNEVALUATED_PROPERTIES => kw.push(Keyword::UnevaluatedProperties {
                unevaluated_properties: Box::new(build_at(&child_base(&curi, UNEVALUATED_PROPERTIES), value, config)?),
            }),
            UNIQUE_ITEMS => {
                if value.as_bool().unwrap_or(false) {
                    kw.push(Keyword::UniqueItems {});
                }
            }
            VOCABULARY => {
                let obj = as_object(value, VOCABULARY)?;
                let vocab = obj
                    .iter()
                    .map(|(k, v)| (k.as_str().into(), v.as_bool().unwrap_or(false)))
                    .collect();
                kw.push(Keyword::Vocabulary { vocabulary: vocab });
            }

            _ if A::uses_keyword(key) => {
                let annotation = A::from_keyword(key, &to_value(value)).map_err(|_| Error::InvalidKeywordValue {
                    keyword: key.to_string(),
                })?;
                kw.push(Keyword::Annotation { annotation: Box::new(annotation) });
            }
            _ => match &config.unknown_keyword {
                UnknownKeywordPolicy::Annotate => {
                    kw.push(Keyword::Opaque { keyword: key.to_string().into_boxed_str(), value: Box::new(to_value(value)) })
                }
                UnknownKeywordPolicy::Ignore => (),
                UnknownKeywordPolicy::Fail => return Err(Error::UnknownKeyword(key.to_string())),
                UnknownKeywordPolicy::Custom(f) => f(key, value)?,
            },
        }
    }

    // minContains without an explicit contains is meaningless; required on
    // an object with no properties keyword still validates every instance.
    if kw.iter().any(|k| matches!(k, Keyword::MinContains { .. }))
        && !kw.iter().any(|k| matches!(k, Keyword::Contains { .. }))
    {
        return Err(Error::InvalidKeywordValue { keyword: MIN_CONTAINS.to_string() });
    }

    Ok(Schema { curi, keywords: kw })
}
