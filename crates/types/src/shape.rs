//! Declarative request and response shape descriptions.
//!
//! Request payloads describe their fields through a static table of
//! [`FieldSpec`] entries rather than runtime reflection. The table is built
//! once per request type (as an associated constant) and drives:
//!
//! - binding of typed CLI arguments onto a concrete request value
//! - query-string rendering for `Query`-placed fields
//! - field-name completion in the interactive shell
//! - the `apiexec.ls` listing
//!
//! Response payloads are described with a JSON Schema derived through
//! `schemars`, since they are only ever introspected, never bound.

use std::fmt;

use schemars::{JsonSchema, Schema};
use serde::{Serialize, de::DeserializeOwned};

/// Where a request field ends up when the request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Rendered into the URL query string.
    Query,
    /// Substituted into the URL path.
    Path,
    /// Serialized into the JSON request body.
    Body,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Query => "query",
            Placement::Path => "path",
            Placement::Body => "body",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared value type of a request field.
///
/// Integer and float widths are explicit so that binding can reject
/// out-of-range values while still naming the offending key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Arbitrary JSON, embedded as-is.
    Json,
    /// Homogeneous list of the inner kind.
    List(&'static FieldKind),
}

impl FieldKind {
    /// Inclusive integer bounds for integer kinds.
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        let bounds = match self {
            FieldKind::I8 => (i8::MIN as i128, i8::MAX as i128),
            FieldKind::I16 => (i16::MIN as i128, i16::MAX as i128),
            FieldKind::I32 => (i32::MIN as i128, i32::MAX as i128),
            FieldKind::I64 => (i64::MIN as i128, i64::MAX as i128),
            FieldKind::U8 => (0, u8::MAX as i128),
            FieldKind::U16 => (0, u16::MAX as i128),
            FieldKind::U32 => (0, u32::MAX as i128),
            FieldKind::U64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, FieldKind::F32 | FieldKind::F64)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
            FieldKind::I8 => "int8",
            FieldKind::I16 => "int16",
            FieldKind::I32 => "int32",
            FieldKind::I64 => "int64",
            FieldKind::U8 => "uint8",
            FieldKind::U16 => "uint16",
            FieldKind::U32 => "uint32",
            FieldKind::U64 => "uint64",
            FieldKind::F32 => "float32",
            FieldKind::F64 => "float64",
            FieldKind::Json => "json",
            FieldKind::List(inner) => return write!(f, "[]{inner}"),
        };
        f.write_str(name)
    }
}

/// One row of a request type's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Serialized field name on the request struct.
    pub name: &'static str,
    /// Argument key a user types to set this field. Fields without a source
    /// key cannot be bound and are invisible to completion.
    pub source_key: Option<&'static str>,
    /// Where the field is sent, if it is sent at all.
    pub placement: Option<Placement>,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    /// An internal field with no source key and no placement.
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            source_key: None,
            placement: None,
            kind,
            required: false,
            description: "",
        }
    }

    /// A required path parameter.
    pub const fn path(name: &'static str, source_key: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            source_key: Some(source_key),
            placement: Some(Placement::Path),
            kind,
            required: true,
            description: "",
        }
    }

    /// An optional query parameter.
    pub const fn query(name: &'static str, source_key: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            source_key: Some(source_key),
            placement: Some(Placement::Query),
            kind,
            required: false,
            description: "",
        }
    }

    /// An optional body member.
    pub const fn body(name: &'static str, source_key: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            source_key: Some(source_key),
            placement: Some(Placement::Body),
            kind,
            required: false,
            description: "",
        }
    }

    pub const fn required(self) -> Self {
        Self { required: true, ..self }
    }

    pub const fn optional(self) -> Self {
        Self { required: false, ..self }
    }

    pub const fn describe(self, description: &'static str) -> Self {
        Self { description, ..self }
    }

    /// Whether the field carries a usable source key.
    pub fn is_bindable(&self) -> bool {
        self.source_key.is_some_and(|key| !key.is_empty())
    }
}

/// Static description of a request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestShape {
    pub type_name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RequestShape {
    pub const fn new(type_name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { type_name, fields }
    }

    /// Fields that can be set from CLI arguments.
    pub fn bindable_fields(&self) -> impl Iterator<Item = &'static FieldSpec> + use<> {
        self.fields.iter().filter(|field| field.is_bindable())
    }

    pub fn field_by_source_key(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.source_key == Some(key))
    }

    pub fn fields_in(&self, placement: Placement) -> impl Iterator<Item = &'static FieldSpec> + use<> {
        self.fields.iter().filter(move |field| field.placement == Some(placement))
    }
}

impl fmt::Display for RequestShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.type_name)?;
        for field in self.fields {
            write!(f, "  {}: {}", field.name, field.kind)?;
            match (field.source_key, field.placement) {
                (Some(key), Some(placement)) => write!(f, " [{placement}:{key}]")?,
                (Some(key), None) => write!(f, " [{key}]")?,
                (None, _) => write!(f, " [not bindable]")?,
            }
            if field.required {
                write!(f, " (required)")?;
            }
            if !field.description.is_empty() {
                write!(f, " - {}", field.description)?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}

/// A request payload with a declared field table.
pub trait ApiRequest: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    const SHAPE: RequestShape;
}

/// A response payload that can describe itself for listing.
pub trait ApiResponse: Serialize + JsonSchema + fmt::Debug + Send + Sync + 'static {}

impl<T> ApiResponse for T where T: Serialize + JsonSchema + fmt::Debug + Send + Sync + 'static {}

/// Introspection-only description of a response payload.
#[derive(Debug, Clone)]
pub struct ResponseShape {
    pub type_name: String,
    pub schema: Schema,
}

impl ResponseShape {
    pub fn of<T: JsonSchema>() -> Self {
        Self {
            type_name: T::schema_name().into_owned(),
            schema: schemars::schema_for!(T),
        }
    }
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string_pretty(self.schema.as_value()).map_err(|_| fmt::Error)?;
        write!(f, "{}\n{}", self.type_name, rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::path("guild_id", "guildId", FieldKind::String),
        FieldSpec::query("refresh", "refresh", FieldKind::Bool),
        FieldSpec::new("internal", FieldKind::Json),
    ];
    const SHAPE: RequestShape = RequestShape::new("Sample", FIELDS);

    #[test]
    fn bindable_fields_skip_fields_without_source_key() {
        let names: Vec<_> = SHAPE.bindable_fields().map(|field| field.name).collect();
        assert_eq!(names, vec!["guild_id", "refresh"]);
    }

    #[test]
    fn lookup_by_source_key_and_placement() {
        assert_eq!(SHAPE.field_by_source_key("guildId").map(|f| f.name), Some("guild_id"));
        assert!(SHAPE.field_by_source_key("guild_id").is_none());
        assert_eq!(SHAPE.fields_in(Placement::Query).count(), 1);
    }

    #[test]
    fn list_kind_renders_with_array_prefix() {
        assert_eq!(FieldKind::List(&FieldKind::U32).to_string(), "[]uint32");
        assert_eq!(FieldKind::U8.integer_bounds(), Some((0, 255)));
    }

    #[test]
    fn display_marks_unbindable_fields() {
        let rendered = SHAPE.to_string();
        assert!(rendered.contains("guild_id: string [path:guildId] (required)"));
        assert!(rendered.contains("internal: json [not bindable]"));
    }
}
