//! `Keyword<A>`: every recognised keyword compiles into one variant of this
//! flat sum type, tagged by role (identifier, applicator, assertion,
//! annotation) through how the validator dispatches on it rather than
//! through a parallel class hierarchy. A single `BigDecimal`-backed
//! `Number` collapses what upstream JSON libraries often split into
//! separate signed/unsigned/float numeric-keyword variants.

use super::{formats, intern, types, Schema};
use solid_temporal::BigDecimal;
use std::sync::Arc;

/// Annotations defined by the JSON Schema Validation vocabulary, plus the
/// `coding` extension vocabulary's `units`/`bitWidth`.
#[derive(Debug)]
pub enum CoreAnnotation {
    Comment(Box<str>),
    ContentEncoding(Box<str>),
    ContentMediaType(Box<str>),
    ContentSchema(Box<crate::value::Value>),
    Default(Box<crate::value::Value>),
    Deprecated(bool),
    Description(Box<str>),
    Examples(Box<[crate::value::Value]>),
    ReadOnly(bool),
    Title(Box<str>),
    WriteOnly(bool),
    Units(Box<str>),
    BitWidth(types::BitWidth),
}

// `format`'s dual assertion/annotation behaviour is a property of which
// dialect compiled the schema (`Keyword::Format` vs `Keyword::FormatAnnotation`),
// not of the annotation type, so `CoreAnnotation` has no `Format` variant
// of its own.

/// A parsed annotation keyword, associated with a compiled sub-schema. An
/// `Annotation` impl may wrap or convert to `CoreAnnotation`.
pub trait Annotation: std::fmt::Debug + Sized + 'static {
    type KeywordError: std::error::Error;

    fn keyword(&self) -> &str;
    fn uses_keyword(keyword: &str) -> bool;
    fn from_keyword(keyword: &str, value: &crate::value::Value) -> Result<Self, Self::KeywordError>;
}

#[derive(Debug)]
pub enum Keyword<A: Annotation> {
    Annotation { annotation: Box<A> },
    /// An unrecognised keyword kept under `UnknownKeywordPolicy::Annotate`:
    /// neither a vocabulary keyword nor claimed by `A`, recorded verbatim
    /// rather than discarded so the compiled schema still carries it.
    Opaque { keyword: Box<str>, value: Box<crate::value::Value> },
    /// Not a keyword: the compiled form of the boolean schema `false`,
    /// which always fails validation.
    False,

    AdditionalProperties { additional_properties: Box<Schema<A>> },
    AllOf { all_of: Box<[Schema<A>]> },
    Anchor { anchor: Box<str> },
    AnyOf { any_of: Box<[Schema<A>]> },
    Const { r#const: Box<crate::value::Value> },
    Contains { contains: Box<Schema<A>> },
    Defs { defs: Box<[(Box<str>, Schema<A>)]> },
    DependentRequired { dependent_required: Box<[(Box<str>, Box<[Box<str>]>)]> },
    DependentSchemas { dependent_schemas: Box<[(Box<str>, Schema<A>)]> },
    DynamicAnchor { dynamic_anchor: Box<str> },
    DynamicRef { dynamic_ref: Box<str> },
    Else { r#else: Box<Schema<A>> },
    Enum { r#enum: Box<[crate::value::Value]> },
    ExclusiveMaximum { exclusive_maximum: BigDecimal },
    ExclusiveMinimum { exclusive_minimum: BigDecimal },
    Format { format: formats::Format },
    /// `format` compiled under the format-annotation dialect: recorded but
    /// never checked against the instance.
    FormatAnnotation { format: formats::Format },
    Id { curi: Box<str>, explicit: bool },
    If { r#if: Box<Schema<A>> },
    Items { items: Box<Schema<A>> },
    Maximum { maximum: BigDecimal },
    MaxContains { max_contains: usize },
    MaxItems { max_items: usize },
    MaxLength { max_length: usize },
    MaxProperties { max_properties: usize },
    /// `bytes-validation` vocabulary.
    MaxSize { max_size: usize },
    Minimum { minimum: BigDecimal },
    MinContains { min_contains: usize },
    MinItems { min_items: usize },
    MinLength { min_length: usize },
    MinProperties { min_properties: usize },
    MinSize { min_size: usize },
    MultipleOf { multiple_of: BigDecimal },
    Not { not: Box<Schema<A>> },
    OneOf { one_of: Box<[Schema<A>]> },
    Pattern { pattern: Box<regex::Regex> },
    PatternProperties { pattern_properties: Box<[(regex::Regex, Schema<A>)]> },
    PrefixItems { prefix_items: Box<[Schema<A>]> },
    Properties { properties: Box<[(Box<str>, Schema<A>)]> },
    PropertyNames { property_names: Box<Schema<A>> },
    Ref { r#ref: Box<str> },
    /// `mask` is the bitwise-OR of every required name's interned bit in
    /// `table`; checking an instance against it is an OR-and-compare over
    /// its own interned keys rather than a per-name lookup into `required`.
    /// Built by `build::build_required`, which splits lists longer than
    /// `intern::MAX_TABLE_SIZE` into chunked `AllOf` subschemas instead of
    /// ever constructing a `Required` whose table would overflow.
    Required { required: Box<[Box<str>]>, mask: intern::Set, table: Arc<intern::Table> },
    Then { then: Box<Schema<A>> },
    Type { r#type: types::Set },
    UnevaluatedItems { unevaluated_items: Box<Schema<A>> },
    UnevaluatedProperties { unevaluated_properties: Box<Schema<A>> },
    UniqueItems {},
    Vocabulary { vocabulary: Box<[(Box<str>, bool)]> },
}

impl<A: Annotation> Keyword<A> {
    pub fn keyword(&self) -> &str {
        match self {
            Keyword::Annotation { annotation } => annotation.keyword(),
            Keyword::Opaque { keyword, .. } => keyword,
            Keyword::AdditionalProperties { .. } => ADDITIONAL_PROPERTIES,
            Keyword::AllOf { .. } => ALL_OF,
            Keyword::Anchor { .. } => ANCHOR,
            Keyword::AnyOf { .. } => ANY_OF,
            Keyword::Const { .. } => CONST,
            Keyword::Contains { .. } => CONTAINS,
            Keyword::Defs { .. } => DEFS,
            Keyword::DependentRequired { .. } => DEPENDENT_REQUIRED,
            Keyword::DependentSchemas { .. } => DEPENDENT_SCHEMAS,
            Keyword::DynamicAnchor { .. } => DYNAMIC_ANCHOR,
            Keyword::DynamicRef { .. } => DYNAMIC_REF,
            Keyword::Else { .. } => ELSE,
            Keyword::Enum { .. } => ENUM,
            Keyword::ExclusiveMaximum { .. } => EXCLUSIVE_MAXIMUM,
            Keyword::ExclusiveMinimum { .. } => EXCLUSIVE_MINIMUM,
            Keyword::Format { .. } => FORMAT,
            Keyword::FormatAnnotation { .. } => FORMAT,
            Keyword::Id { .. } => ID,
            Keyword::If { .. } => IF,
            Keyword::Items { .. } => ITEMS,
            Keyword::Maximum { .. } => MAXIMUM,
            Keyword::MaxContains { .. } => MAX_CONTAINS,
            Keyword::MaxItems { .. } => MAX_ITEMS,
            Keyword::MaxLength { .. } => MAX_LENGTH,
            Keyword::MaxProperties { .. } => MAX_PROPERTIES,
            Keyword::MaxSize { .. } => MAX_SIZE,
            Keyword::Minimum { .. } => MINIMUM,
            Keyword::MinContains { .. } => MIN_CONTAINS,
            Keyword::MinItems { .. } => MIN_ITEMS,
            Keyword::MinLength { .. } => MIN_LENGTH,
            Keyword::MinProperties { .. } => MIN_PROPERTIES,
            Keyword::MinSize { .. } => MIN_SIZE,
            Keyword::MultipleOf { .. } => MULTIPLE_OF,
            Keyword::Not { .. } => NOT,
            Keyword::OneOf { .. } => ONE_OF,
            Keyword::Pattern { .. } => PATTERN,
            Keyword::PatternProperties { .. } => PATTERN_PROPERTIES,
            Keyword::PrefixItems { .. } => PREFIX_ITEMS,
            Keyword::Properties { .. } => PROPERTIES,
            Keyword::PropertyNames { .. } => PROPERTY_NAMES,
            Keyword::Ref { .. } => REF,
            Keyword::Required { .. } => REQUIRED,
            Keyword::Then { .. } => THEN,
            Keyword::Type { .. } => TYPE,
            Keyword::UnevaluatedItems { .. } => UNEVALUATED_ITEMS,
            Keyword::UnevaluatedProperties { .. } => UNEVALUATED_PROPERTIES,
            Keyword::UniqueItems {} => UNIQUE_ITEMS,
            Keyword::Vocabulary { .. } => VOCABULARY,
            Keyword::False => "'false' is not a keyword",
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid value for annotation keyword '{keyword}'")]
pub struct AnnotationError {
    keyword: String,
}

impl Annotation for CoreAnnotation {
    type KeywordError = AnnotationError;

    fn keyword(&self) -> &str {
        match self {
            CoreAnnotation::Comment(_) => COMMENT,
            CoreAnnotation::ContentEncoding(_) => CONTENT_ENCODING,
            CoreAnnotation::ContentMediaType(_) => CONTENT_MEDIA_TYPE,
            CoreAnnotation::ContentSchema(_) => CONTENT_SCHEMA,
            CoreAnnotation::Default(_) => DEFAULT,
            CoreAnnotation::Deprecated(_) => DEPRECATED,
            CoreAnnotation::Description(_) => DESCRIPTION,
            CoreAnnotation::Examples(_) => EXAMPLES,
            CoreAnnotation::ReadOnly(_) => READ_ONLY,
            CoreAnnotation::Title(_) => TITLE,
            CoreAnnotation::WriteOnly(_) => WRITE_ONLY,
            CoreAnnotation::Units(_) => UNITS,
            CoreAnnotation::BitWidth(_) => BIT_WIDTH,
        }
    }

    fn uses_keyword(kw: &str) -> bool {
        matches!(
            kw,
            COMMENT
                | CONTENT_ENCODING
                | CONTENT_MEDIA_TYPE
                | CONTENT_SCHEMA
                | DEFAULT
                | DEPRECATED
                | DESCRIPTION
                | EXAMPLE
                | EXAMPLES
                | READ_ONLY
                | TITLE
                | WRITE_ONLY
                | UNITS
                | BIT_WIDTH
        )
    }

    fn from_keyword(kw: &str, v: &crate::value::Value) -> Result<Self, Self::KeywordError> {
        let err = || AnnotationError { keyword: kw.to_string() };
        let as_str = |v: &crate::value::Value| -> Result<Box<str>, AnnotationError> {
            v.as_str().map(Into::into).ok_or_else(err)
        };
        let as_bool = |v: &crate::value::Value| -> Result<bool, AnnotationError> { v.as_bool().ok_or_else(err) };

        Ok(match kw {
            COMMENT => CoreAnnotation::Comment(as_str(v)?),
            CONTENT_ENCODING => CoreAnnotation::ContentEncoding(as_str(v)?),
            CONTENT_MEDIA_TYPE => CoreAnnotation::ContentMediaType(as_str(v)?),
            CONTENT_SCHEMA => CoreAnnotation::ContentSchema(Box::new(v.clone())),
            DEFAULT => CoreAnnotation::Default(Box::new(v.clone())),
            DEPRECATED => CoreAnnotation::Deprecated(as_bool(v)?),
            DESCRIPTION => CoreAnnotation::Description(as_str(v)?),
            EXAMPLE => CoreAnnotation::Examples(vec![v.clone()].into()),
            EXAMPLES => {
                let items = v.as_array().ok_or_else(err)?;
                CoreAnnotation::Examples(items.to_vec().into())
            }
            READ_ONLY => CoreAnnotation::ReadOnly(as_bool(v)?),
            TITLE => CoreAnnotation::Title(as_str(v)?),
            WRITE_ONLY => CoreAnnotation::WriteOnly(as_bool(v)?),
            UNITS => CoreAnnotation::Units(as_str(v)?),
            BIT_WIDTH => {
                let s = as_str(v)?;
                let width: types::BitWidth = serde_json::from_value(serde_json::Value::String(s.to_string()))
                    .map_err(|_| err())?;
                CoreAnnotation::BitWidth(width)
            }
            _ => unreachable!("caller must check uses_keyword first"),
        })
    }
}

pub const ADDITIONAL_PROPERTIES: &str = "additionalProperties";
pub const ALL_OF: &str = "allOf";
pub const ANCHOR: &str = "$anchor";
pub const ANY_OF: &str = "anyOf";
pub const BIT_WIDTH: &str = "bitWidth";
pub const COMMENT: &str = "$comment";
pub const CONST: &str = "const";
pub const CONTAINS: &str = "contains";
pub const CONTENT_ENCODING: &str = "contentEncoding";
pub const CONTENT_MEDIA_TYPE: &str = "contentMediaType";
pub const CONTENT_SCHEMA: &str = "contentSchema";
pub const DEFAULT: &str = "default";
pub const DEFS: &str = "$defs";
pub const DEPENDENT_REQUIRED: &str = "dependentRequired";
pub const DEPENDENT_SCHEMAS: &str = "dependentSchemas";
pub const DEPRECATED: &str = "deprecated";
pub const DESCRIPTION: &str = "description";
pub const DYNAMIC_ANCHOR: &str = "$dynamicAnchor";
pub const DYNAMIC_REF: &str = "$dynamicRef";
pub const ELSE: &str = "else";
pub const ENUM: &str = "enum";
pub const EXAMPLE: &str = "example";
pub const EXAMPLES: &str = "examples";
pub const EXCLUSIVE_MAXIMUM: &str = "exclusiveMaximum";
pub const EXCLUSIVE_MINIMUM: &str = "exclusiveMinimum";
pub const FORMAT: &str = "format";
pub const ID: &str = "$id";
pub const IF: &str = "if";
pub const ITEMS: &str = "items";
pub const MAXIMUM: &str = "maximum";
pub const MAX_CONTAINS: &str = "maxContains";
pub const MAX_ITEMS: &str = "maxItems";
pub const MAX_LENGTH: &str = "maxLength";
pub const MAX_PROPERTIES: &str = "maxProperties";
pub const MAX_SIZE: &str = "maxSize";
pub const MINIMUM: &str = "minimum";
pub const MIN_CONTAINS: &str = "minContains";
pub const MIN_ITEMS: &str = "minItems";
pub const MIN_LENGTH: &str = "minLength";
pub const MIN_PROPERTIES: &str = "minProperties";
pub const MIN_SIZE: &str = "minSize";
pub const MULTIPLE_OF: &str = "multipleOf";
pub const NOT: &str = "not";
pub const ONE_OF: &str = "oneOf";
pub const PATTERN: &str = "pattern";
pub const PATTERN_PROPERTIES: &str = "patternProperties";
pub const PREFIX_ITEMS: &str = "prefixItems";
pub const PROPERTIES: &str = "properties";
pub const PROPERTY_NAMES: &str = "propertyNames";
pub const READ_ONLY: &str = "readOnly";
pub const REF: &str = "$ref";
pub const REQUIRED: &str = "required";
pub const SCHEMA: &str = "$schema";
pub const THEN: &str = "then";
pub const TITLE: &str = "title";
pub const TYPE: &str = "type";
pub const UNEVALUATED_ITEMS: &str = "unevaluatedItems";
pub const UNEVALUATED_PROPERTIES: &str = "unevaluatedProperties";
pub const UNIQUE_ITEMS: &str = "uniqueItems";
pub const UNITS: &str = "units";
pub const VOCABULARY: &str = "$vocabulary";
pub const WRITE_ONLY: &str = "writeOnly";
