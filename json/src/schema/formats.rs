//! The `format` vocabulary's recognised string formats. Date/time formats
//! delegate to the temporal kernel rather than re-implementing ISO 8601
//! parsing here, so this crate and the kernel never disagree about what a
//! valid date or date-time looks like.

use addr::{parse_domain_name, parse_email_address};
use iri_string::spec::{IriSpec, UriSpec};
use regex::Regex;
use serde::{Deserialize, Serialize};
use solid_temporal::{BigDecimal, LocalDate, LocalTime, OffsetDateTime};
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

/// The outcome of validating a string against a format: either it matches,
/// or it doesn't, optionally with a human-readable reason for diagnostics.
/// Per §7, format mismatches never raise — they surface as ordinary
/// keyword-invalid outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    Valid,
    Invalid(Option<String>),
}

impl FormatOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, FormatOutcome::Valid)
    }
}

impl From<bool> for FormatOutcome {
    fn from(b: bool) -> Self {
        if b {
            FormatOutcome::Valid
        } else {
            FormatOutcome::Invalid(None)
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for FormatOutcome {
    fn from(r: Result<T, E>) -> Self {
        match r {
            Ok(_) => FormatOutcome::Valid,
            Err(e) => FormatOutcome::Invalid(Some(e.to_string())),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Format {
    Date,
    #[serde(rename = "date-time", alias = "datetime")]
    DateTime,
    Time,
    Email,
    Hostname,
    #[serde(rename = "idn-hostname")]
    IdnHostname,
    #[serde(rename = "idn-email")]
    IdnEmail,
    Ipv4,
    Ipv6,
    Macaddr,
    Macaddr8,
    Uuid,
    Duration,
    Iri,
    Uri,
    #[serde(rename = "uri-reference")]
    UriReference,
    #[serde(rename = "iri-reference")]
    IriReference,
    #[serde(rename = "uri-template")]
    UriTemplate,
    #[serde(rename = "json-pointer")]
    JsonPointer,
    Regex,
    #[serde(rename = "relative-json-pointer")]
    RelativeJsonPointer,
    #[serde(alias = "uint32", alias = "uint64")]
    Integer,
    Number,
    #[serde(rename = "sha256")]
    Sha256,
}

lazy_static::lazy_static! {
    static ref RELATIVE_JSON_POINTER_RE: Regex =
        Regex::new(r"^(?:0|[1-9][0-9]*)(?:#|(?:/(?:[^~/]|~0|~1)*)*)\z").expect("valid regex");
    static ref URI_TEMPLATE_RE: Regex = Regex::new(
        r#"^(?:(?:[^\x00-\x20""'<>%\\^`{|}]|%[0-9a-f]{2})|\{[+#.\/;?&=,!@|]?(?:[a-z0-9_]|%[0-9a-f]{2})+(?:\:[1-9][0-9]{0,3}|\*)?(?:,(?:[a-z0-9_]|%[0-9a-f]{2})+(?:\:[1-9][0-9]{0,3}|\*)?)*\})*$"#
    ).expect("valid regex");
    static ref JSON_POINTER_RE: Regex = Regex::new(r"^(\/([^~]|(~[01]))*)*$").expect("valid regex");
    static ref MACADDR: Regex = Regex::new(r"^([0-9A-Fa-f]{2}[:-]?){5}[0-9A-Fa-f]{2}$").expect("valid regex");
    static ref MACADDR8: Regex = Regex::new(r"^([0-9A-Fa-f]{2}[:-]?){7}[0-9A-Fa-f]{2}$").expect("valid regex");
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let serde_json::Value::String(s) = serde_json::json!(self) else {
            unreachable!("Format always serializes as a string")
        };
        write!(f, "{s}")
    }
}

impl Format {
    pub fn validate(&self, val: &str) -> FormatOutcome {
        match self {
            Self::Date => LocalDate::parse(val).into(),
            Self::DateTime => OffsetDateTime::parse(val).into(),
            Self::Time => LocalTime::parse(val).into(),
            Self::Email => parse_email_address(val).into(),
            Self::Hostname => parse_domain_name(val).into(),
            Self::IdnHostname | Self::IdnEmail => {
                FormatOutcome::Invalid(Some(format!("{self:?} is not supported")))
            }
            Self::Ipv4 => {
                if val.starts_with('0') {
                    return FormatOutcome::Invalid(None);
                }
                match IpAddr::from_str(val) {
                    Ok(ip) => ip.is_ipv4().into(),
                    Err(e) => FormatOutcome::Invalid(Some(e.to_string())),
                }
            }
            Self::Ipv6 => match IpAddr::from_str(val) {
                Ok(ip) => ip.is_ipv6().into(),
                Err(e) => FormatOutcome::Invalid(Some(e.to_string())),
            },
            Self::Macaddr => MACADDR.is_match(val).into(),
            Self::Macaddr8 => MACADDR8.is_match(val).into(),
            Self::Uuid if val.len() == 36 => Uuid::parse_str(val).into(),
            Self::Uuid => FormatOutcome::Invalid(Some(format!("{val} is the wrong length (missing hyphens?)"))),
            Self::Duration => solid_temporal::calendar::parse_period_duration(val).into(),
            Self::Iri => iri_string::validate::iri::<IriSpec>(val).into(),
            Self::Uri => iri_string::validate::iri::<UriSpec>(val).into(),
            Self::UriReference => iri_string::validate::iri_reference::<UriSpec>(val).into(),
            Self::IriReference => iri_string::validate::iri_reference::<IriSpec>(val).into(),
            Self::UriTemplate => URI_TEMPLATE_RE.is_match(val).into(),
            Self::JsonPointer => JSON_POINTER_RE.is_match(val).into(),
            Self::Regex => Regex::new(val).into(),
            Self::RelativeJsonPointer => RELATIVE_JSON_POINTER_RE.is_match(val).into(),
            Self::Integer => (BigDecimal::from_str(val)
                .map(|d| crate::schema::types::is_integral(&d))
                .unwrap_or(false)
                && !val.contains('_'))
            .into(),
            Self::Number => (BigDecimal::from_str(val).is_ok() && !val.contains('_')
                || ["NaN", "Infinity", "-Infinity"].contains(&val))
            .into(),
            Self::Sha256 => (val.len() == 71
                && &val.as_bytes()[0..7] == b"sha256:"
                && val[7..].bytes().all(|b| b.is_ascii_hexdigit()))
            .into(),
        }
    }

    pub fn detect(val: &str) -> Option<Self> {
        match val {
            _ if Format::Integer.validate(val).is_valid() => Some(Format::Integer),
            _ if Format::Number.validate(val).is_valid() => Some(Format::Number),
            _ if Format::DateTime.validate(val).is_valid() => Some(Format::DateTime),
            _ if Format::Date.validate(val).is_valid() => Some(Format::Date),
            _ if Format::Uuid.validate(val).is_valid() => Some(Format::Uuid),
            _ if Format::Sha256.validate(val).is_valid() => Some(Format::Sha256),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Format;

    #[test]
    fn test_format_cases() {
        for (format, value, expect) in [
            ("date", "2022-09-11", true),
            ("date", "2022-09-11T10:31:25.123Z", false),
            ("date-time", "2022-09-11T10:31:25.123Z", true),
            ("date-time", "2022-09-11T10:31:25Z", true),
            ("datetime", "2022-09-11T10:31:25.123Z", true),
            ("time", "10:31:25.123Z", true),
            ("email", "john@doe.com", true),
            ("email", "john at doe.com", false),
            ("hostname", "hostname.com", true),
            ("ipv4", "123.45.6.78", true),
            ("ipv4", "0.1.2.3", false),
            ("ipv6", "2001:0db8:0000:0000:0000:ff00:0042:8329", true),
            ("macaddr", "00:1b:63:84:45:e6", true),
            ("uuid", "df518555-34f0-446a-8788-7b36f607bbea", true),
            ("uuid", "not-a-UUID-7B36F607BBEA", false),
            ("duration", "P1M3DT30H4S", true),
            ("duration", "PT0.5S", false),
            ("uri", "http://www.example.org/foo/bar", true),
            ("uri", "../path/to/bar", false),
            ("uri-reference", "../path/to/bar", true),
            ("json-pointer", "/valid/json pointer", true),
            ("json-pointer", "/invalid/es~cape", false),
            ("regex", "^hello$", true),
            ("regex", "[hello", false),
            ("integer", "1234", true),
            ("integer", "1.234", false),
            ("number", "1.234", true),
            ("number", "NaN", true),
            (
                "sha256",
                "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
                true,
            ),
            ("sha256", "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855", false),
        ] {
            let format: Format = serde_json::from_value(serde_json::Value::String(format.to_string())).unwrap();
            let outcome = format.validate(value);
            assert_eq!(outcome.is_valid(), expect, "format {format:?} value {value:?} -> {outcome:?}");
        }
    }
}
