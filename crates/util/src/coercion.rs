//! Argument coercion pipeline.
//!
//! Turns `key::type=value` arguments, as typed at the shell prompt, into a
//! [`TypedArgs`] mapping. The type annotation grammar is:
//!
//! ```text
//! type    := array | b64url | scalar
//! array   := "[]{" SEP "}" type        (SEP is exactly one character)
//! b64url  := "[b64url]" type
//! scalar  := uint | uint8 | uint16 | uint32 | uint64 | uintptr | byte
//!          | int | int8 | int16 | int32 | int64
//!          | float32 | float64 | bool | boolean | json | <anything else>
//! ```
//!
//! Unknown scalar names fall back to a plain string. Type annotations are
//! parsed once into a [`TypeTag`] and then applied to the value.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use befall_types::{TypedArgs, TypedValue};
use thiserror::Error;
use tracing::debug;

use crate::shell_lexing::split_quoted;

/// Separator between an argument key and its type annotation.
pub const TYPE_SEPARATOR: &str = "::";

const ARRAY_MARKER: &str = "[]";
const B64URL_MARKER: &str = "[b64url]";

/// URL-safe alphabet, accepting input with or without padding.
const B64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A value that could not be parsed under its declared type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to convert {key}={value} to {type_name}: {reason}")]
pub struct CoercionError {
    pub key: String,
    pub value: String,
    pub type_name: String,
    pub reason: String,
}

impl CoercionError {
    fn new(key: &str, value: &str, type_name: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Scalar target of a coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Byte,
    Float32,
    Float64,
    Json,
}

impl ScalarKind {
    /// Resolves a type name case-insensitively. Unknown names map to `String`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => ScalarKind::Bool,
            "int" => ScalarKind::Int,
            "int8" => ScalarKind::Int8,
            "int16" => ScalarKind::Int16,
            "int32" => ScalarKind::Int32,
            "int64" => ScalarKind::Int64,
            "uint" => ScalarKind::Uint,
            "uint8" => ScalarKind::Uint8,
            "uint16" => ScalarKind::Uint16,
            "uint32" => ScalarKind::Uint32,
            "uint64" => ScalarKind::Uint64,
            "uintptr" => ScalarKind::Uintptr,
            "byte" => ScalarKind::Byte,
            "float32" => ScalarKind::Float32,
            "float64" => ScalarKind::Float64,
            "json" => ScalarKind::Json,
            _ => ScalarKind::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Int8 => "int8",
            ScalarKind::Int16 => "int16",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint => "uint",
            ScalarKind::Uint8 => "uint8",
            ScalarKind::Uint16 => "uint16",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Uintptr => "uintptr",
            ScalarKind::Byte => "byte",
            ScalarKind::Float32 => "float32",
            ScalarKind::Float64 => "float64",
            ScalarKind::Json => "json",
        }
    }
}

/// Parsed form of a `::type` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    Scalar(ScalarKind),
    Array { separator: char, element: Box<TypeTag> },
    Base64Url(Box<TypeTag>),
}

impl Default for TypeTag {
    fn default() -> Self {
        TypeTag::Scalar(ScalarKind::String)
    }
}

/// Malformed type annotation, e.g. a missing or multi-character separator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid array type {annotation}: {reason}")]
pub struct TypeTagError {
    pub annotation: String,
    pub reason: &'static str,
}

impl FromStr for TypeTag {
    type Err = TypeTagError;

    fn from_str(annotation: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = annotation.strip_prefix(ARRAY_MARKER) {
            let invalid = |reason| TypeTagError {
                annotation: annotation.to_string(),
                reason,
            };
            let rest = rest.strip_prefix('{').ok_or_else(|| invalid("expected '{' after '[]'"))?;
            let close = rest.find('}').ok_or_else(|| invalid("missing closing '}'"))?;
            let mut separator = rest[..close].chars();
            let (Some(separator), None) = (separator.next(), separator.next()) else {
                return Err(invalid("only single character separators are supported"));
            };
            let element = rest[close + 1..].parse()?;
            return Ok(TypeTag::Array {
                separator,
                element: Box::new(element),
            });
        }

        if let Some(rest) = annotation.strip_prefix(B64URL_MARKER) {
            return Ok(TypeTag::Base64Url(Box::new(rest.parse()?)));
        }

        Ok(TypeTag::Scalar(ScalarKind::from_name(annotation)))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Scalar(kind) => f.write_str(kind.as_str()),
            TypeTag::Array { separator, element } => write!(f, "{ARRAY_MARKER}{{{separator}}}{element}"),
            TypeTag::Base64Url(inner) => write!(f, "{B64URL_MARKER}{inner}"),
        }
    }
}

/// Splits `key::type` on the last `::`. The type is `None` when absent.
pub fn split_key_type(raw_key: &str) -> (&str, Option<&str>) {
    match raw_key.rsplit_once(TYPE_SEPARATOR) {
        Some((key, type_name)) => (key, Some(type_name)),
        None => (raw_key, None),
    }
}

/// Coerces one raw argument.
///
/// `raw_key` may carry a `::type` suffix; the returned key never does.
pub fn coerce_arg(raw_key: &str, value: &str) -> Result<(String, TypedValue), CoercionError> {
    let (key, annotation) = split_key_type(raw_key);
    let tag = match annotation {
        Some(annotation) => annotation
            .parse::<TypeTag>()
            .map_err(|err| CoercionError::new(key, value, annotation, err.reason))?,
        None => TypeTag::default(),
    };
    let typed = coerce_value(key, &tag, value)?;
    Ok((key.to_string(), typed))
}

/// Coerces a sequence of raw `(key::type, value)` pairs into a typed mapping.
///
/// Later duplicates of the same key replace earlier ones.
pub fn coerce_args<'a, I>(raw: I) -> Result<TypedArgs, CoercionError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut args = TypedArgs::new();
    for (raw_key, value) in raw {
        let (key, typed) = coerce_arg(raw_key, value)?;
        debug!(key = %key, kind = typed.kind_name(), "Coerced argument");
        args.insert(key, typed);
    }
    Ok(args)
}

/// Applies a parsed type tag to a raw value.
pub fn coerce_value(key: &str, tag: &TypeTag, value: &str) -> Result<TypedValue, CoercionError> {
    match tag {
        TypeTag::Array { separator, element } => {
            let parts = split_quoted(value, *separator).map_err(|err| CoercionError::new(key, value, tag, err))?;
            parts
                .iter()
                .map(|part| coerce_value(key, element, part))
                .collect::<Result<Vec<_>, _>>()
                .map(TypedValue::Array)
        }
        TypeTag::Base64Url(inner) => {
            let bytes = B64URL
                .decode(value)
                .map_err(|err| CoercionError::new(key, value, tag, format!("failed to decode base64url: {err}")))?;
            let decoded = String::from_utf8(bytes)
                .map_err(|err| CoercionError::new(key, value, tag, format!("decoded value is not UTF-8: {err}")))?;
            coerce_value(key, inner, &decoded)
        }
        TypeTag::Scalar(kind) => coerce_scalar(key, *kind, value),
    }
}

fn coerce_scalar(key: &str, kind: ScalarKind, value: &str) -> Result<TypedValue, CoercionError> {
    let fail = |reason: &dyn fmt::Display| CoercionError::new(key, value, kind.as_str(), reason);
    let trimmed = value.trim();

    macro_rules! number {
        ($ty:ty, $variant:ident) => {
            trimmed
                .parse::<$ty>()
                .map(TypedValue::$variant)
                .map_err(|err| fail(&err))
        };
    }

    match kind {
        ScalarKind::String => Ok(TypedValue::String(value.to_string())),
        ScalarKind::Bool => parse_bool(trimmed)
            .map(TypedValue::Bool)
            .ok_or_else(|| fail(&"invalid syntax")),
        ScalarKind::Int => number!(isize, Isize),
        ScalarKind::Int8 => number!(i8, I8),
        ScalarKind::Int16 => number!(i16, I16),
        ScalarKind::Int32 => number!(i32, I32),
        ScalarKind::Int64 => number!(i64, I64),
        ScalarKind::Uint | ScalarKind::Uintptr => number!(usize, Usize),
        ScalarKind::Uint8 | ScalarKind::Byte => number!(u8, U8),
        ScalarKind::Uint16 => number!(u16, U16),
        ScalarKind::Uint32 => number!(u32, U32),
        ScalarKind::Uint64 => number!(u64, U64),
        ScalarKind::Float32 => number!(f32, F32),
        ScalarKind::Float64 => number!(f64, F64),
        ScalarKind::Json => serde_json::from_str(value)
            .map(TypedValue::Json)
            .map_err(|err| fail(&err)),
    }
}

/// Boolean spellings accepted on the command line.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coerce(raw_key: &str, value: &str) -> Result<TypedValue, CoercionError> {
        coerce_arg(raw_key, value).map(|(_, typed)| typed)
    }

    #[test]
    fn canonical_forms_and_unknown_types() {
        assert_eq!(coerce("count::int32", "42").unwrap(), TypedValue::I32(42));
        assert_eq!(coerce("count::wibble", "42").unwrap(), TypedValue::String("42".into()));
        assert_eq!(coerce("count", "42").unwrap(), TypedValue::String("42".into()));
    }

    #[test]
    fn numeric_values_are_trimmed_but_strings_are_not() {
        assert_eq!(coerce("n::uint16", " 7 ").unwrap(), TypedValue::U16(7));
        assert_eq!(coerce("n::BOOL", " True").unwrap(), TypedValue::Bool(true));
        assert_eq!(coerce("s", " padded ").unwrap(), TypedValue::String(" padded ".into()));
    }

    #[test]
    fn out_of_range_values_fail_with_context() {
        let err = coerce("limit::uint8", "300").unwrap_err();
        assert_eq!(err.key, "limit");
        assert_eq!(err.value, "300");
        assert_eq!(err.type_name, "uint8");
        assert!(err.to_string().starts_with("failed to convert limit=300 to uint8:"));
        assert!(coerce("flag::bool", "yes").is_err());
        assert!(coerce("n::int", "-").is_err());
    }

    #[test]
    fn json_is_embedded_as_is() {
        assert_eq!(coerce("body::json", r#"{"a":[1,2]}"#).unwrap(), TypedValue::Json(json!({"a": [1, 2]})));
        assert!(coerce("body::json", "{oops").is_err());
    }

    #[test]
    fn arrays_split_on_separator_outside_quotes() {
        let value = coerce("tags::[]{,}", r#"a,"b,c",d"#).unwrap();
        assert_eq!(
            value,
            TypedValue::Array(vec![
                TypedValue::String("a".into()),
                TypedValue::String("b,c".into()),
                TypedValue::String("d".into()),
            ])
        );
        let numbers = coerce("ids::[]{;}uint32", "1;2;3").unwrap();
        assert_eq!(numbers.to_json(), json!([1, 2, 3]));
        assert_eq!(coerce("ids::[]{,}int", "").unwrap(), TypedValue::Array(vec![]));
    }

    #[test]
    fn malformed_array_annotations_fail() {
        assert!(coerce("ids::[]uint32", "1").is_err());
        assert!(coerce("ids::[]{,,}uint32", "1").is_err());
        assert!(coerce("ids::[]{,uint32", "1").is_err());
        assert!(coerce("ids::[]{,}int8", "1,999").is_err());
    }

    #[test]
    fn base64url_decodes_before_coercing() {
        assert_eq!(coerce("name::[b64url]string", "aGVsbG8").unwrap(), TypedValue::String("hello".into()));
        assert_eq!(coerce("name::[b64url]string", "aGVsbG8=").unwrap(), TypedValue::String("hello".into()));
        assert_eq!(coerce("n::[b64url]int64", "NDI").unwrap(), TypedValue::I64(42));
        assert!(coerce("name::[b64url]string", "!!!").is_err());
    }

    #[test]
    fn key_splits_on_last_type_separator() {
        assert_eq!(split_key_type("a::b::int32"), ("a::b", Some("int32")));
        assert_eq!(split_key_type("plain"), ("plain", None));
        let (key, _) = coerce_arg("a::b::int32", "1").unwrap();
        assert_eq!(key, "a::b");
    }

    #[test]
    fn type_tags_render_back_to_their_syntax() {
        let tag: TypeTag = "[]{;}[b64url]json".parse().unwrap();
        assert_eq!(tag.to_string(), "[]{;}[b64url]json");
    }

    #[test]
    fn coerce_args_keeps_typed_order() {
        let args = coerce_args([("name", "Alice"), ("count::int32", "3")]).unwrap();
        let keys: Vec<_> = args.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "count"]);
        assert_eq!(args["count"], TypedValue::I32(3));
    }
}
