//! Binding of typed CLI arguments onto request values.
//!
//! Binding walks the request type's field table. For every bindable field
//! whose source key appears in the argument mapping, the typed value is
//! converted to the field's declared kind and written under the field's
//! serialized name. The resulting JSON object is then deserialized into the
//! request type, so fields that were not supplied keep their defaults.

use befall_types::{ApiRequest, FieldKind, FieldSpec, TypedArgs, TypedValue};
use befall_util::parse_bool;
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindingError {
    #[error("missing required argument {key}")]
    MissingField { key: String },
    #[error("argument {key}: expected {expected}, got {got}")]
    TypeMismatch {
        key: String,
        expected: String,
        got: String,
    },
    #[error("argument {key}: value {value} does not fit in {expected}")]
    OutOfRange {
        key: String,
        value: String,
        expected: String,
    },
    #[error("argument {key}: {reason}")]
    Invalid { key: String, reason: String },
    #[error("failed to build {type_name}: {reason}")]
    Deserialize { type_name: &'static str, reason: String },
}

/// Binds `args` onto a fresh `R`.
///
/// Keys in `args` that match no field are ignored.
pub fn bind_request<R: ApiRequest>(args: &TypedArgs) -> Result<R, BindingError> {
    let object = bind_object(R::SHAPE.fields, args)?;
    serde_json::from_value(Value::Object(object)).map_err(|err| BindingError::Deserialize {
        type_name: R::SHAPE.type_name,
        reason: err.to_string(),
    })
}

/// Builds the JSON object of bound fields, keyed by serialized field name.
pub fn bind_object(fields: &[FieldSpec], args: &TypedArgs) -> Result<Map<String, Value>, BindingError> {
    let mut object = Map::new();
    for field in fields {
        let Some(key) = field.source_key.filter(|key| !key.is_empty()) else {
            continue;
        };
        match args.get(key) {
            Some(value) => {
                object.insert(field.name.to_string(), convert(key, &field.kind, value)?);
            }
            None if field.required => {
                return Err(BindingError::MissingField { key: key.to_string() });
            }
            None => {}
        }
    }
    Ok(object)
}

fn mismatch(key: &str, kind: &FieldKind, value: &TypedValue) -> BindingError {
    BindingError::TypeMismatch {
        key: key.to_string(),
        expected: kind.to_string(),
        got: value.kind_name().to_string(),
    }
}

/// Converts one typed value to the JSON form of `kind`.
fn convert(key: &str, kind: &FieldKind, value: &TypedValue) -> Result<Value, BindingError> {
    match kind {
        FieldKind::String => match value {
            TypedValue::String(s) => Ok(Value::String(s.clone())),
            TypedValue::Json(Value::String(s)) => Ok(Value::String(s.clone())),
            other => Err(mismatch(key, kind, other)),
        },
        FieldKind::Bool => match value {
            TypedValue::Bool(b) => Ok(Value::Bool(*b)),
            TypedValue::Json(Value::Bool(b)) => Ok(Value::Bool(*b)),
            TypedValue::String(s) => parse_bool(s).map(Value::Bool).ok_or_else(|| BindingError::Invalid {
                key: key.to_string(),
                reason: format!("{s:?} is not a boolean"),
            }),
            other => Err(mismatch(key, kind, other)),
        },
        FieldKind::Json => Ok(value.to_json()),
        FieldKind::List(inner) => {
            let items: Vec<TypedValue> = match value {
                TypedValue::Array(items) => items.clone(),
                TypedValue::Json(Value::Array(items)) => items.iter().cloned().map(TypedValue::Json).collect(),
                other => return Err(mismatch(key, kind, other)),
            };
            items
                .iter()
                .map(|item| convert(key, inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        float if float.is_float() => convert_float(key, kind, value),
        _ => convert_integer(key, kind, value),
    }
}

fn convert_integer(key: &str, kind: &FieldKind, value: &TypedValue) -> Result<Value, BindingError> {
    let Some((min, max)) = kind.integer_bounds() else {
        return Err(mismatch(key, kind, value));
    };
    let widened: i128 = match value {
        TypedValue::String(s) => s.trim().parse::<i128>().map_err(|err| BindingError::Invalid {
            key: key.to_string(),
            reason: format!("{s:?} is not an integer: {err}"),
        })?,
        TypedValue::Json(Value::Number(number)) => match (number.as_i64(), number.as_u64()) {
            (Some(v), _) => v as i128,
            (None, Some(v)) => v as i128,
            _ => return Err(mismatch(key, kind, value)),
        },
        other => other.as_i128().ok_or_else(|| mismatch(key, kind, other))?,
    };
    if widened < min || widened > max {
        return Err(BindingError::OutOfRange {
            key: key.to_string(),
            value: widened.to_string(),
            expected: kind.to_string(),
        });
    }
    if widened < 0 {
        Ok(Value::from(widened as i64))
    } else {
        Ok(Value::from(widened as u64))
    }
}

fn convert_float(key: &str, kind: &FieldKind, value: &TypedValue) -> Result<Value, BindingError> {
    let float = match value {
        TypedValue::String(s) => s.trim().parse::<f64>().map_err(|err| BindingError::Invalid {
            key: key.to_string(),
            reason: format!("{s:?} is not a number: {err}"),
        })?,
        TypedValue::Json(Value::Number(number)) => number.as_f64().ok_or_else(|| mismatch(key, kind, value))?,
        other => other.as_f64().ok_or_else(|| mismatch(key, kind, other))?,
    };
    if !float.is_finite() {
        return Err(BindingError::Invalid {
            key: key.to_string(),
            reason: format!("{float} has no JSON representation"),
        });
    }
    if *kind == FieldKind::F32 && float.abs() > f32::MAX as f64 {
        return Err(BindingError::OutOfRange {
            key: key.to_string(),
            value: float.to_string(),
            expected: kind.to_string(),
        });
    }
    Number::from_f64(float).map(Value::Number).ok_or_else(|| mismatch(key, kind, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use befall_types::RequestShape;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        guild_id: String,
        limit: u8,
        ratio: f32,
        refresh: bool,
        tags: Vec<String>,
        extra: Value,
    }

    impl ApiRequest for Sample {
        const SHAPE: RequestShape = RequestShape::new(
            "Sample",
            &[
                FieldSpec::path("guild_id", "guildId", FieldKind::String),
                FieldSpec::query("limit", "limit", FieldKind::U8),
                FieldSpec::query("ratio", "ratio", FieldKind::F32),
                FieldSpec::query("refresh", "refresh", FieldKind::Bool),
                FieldSpec::query("tags", "tags", FieldKind::List(&FieldKind::String)),
                FieldSpec::body("extra", "extra", FieldKind::Json),
            ],
        );
    }

    fn args(pairs: &[(&str, TypedValue)]) -> TypedArgs {
        pairs.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
    }

    #[test]
    fn binds_fields_by_source_key() {
        let bound: Sample = bind_request(&args(&[
            ("guildId", TypedValue::String("42".into())),
            ("limit", TypedValue::I64(10)),
            ("ratio", TypedValue::F64(0.5)),
            ("refresh", TypedValue::String("yes".into())),
            (
                "tags",
                TypedValue::Array(vec![TypedValue::String("a".into()), TypedValue::String("b".into())]),
            ),
            ("extra", TypedValue::Json(json!({"x": 1}))),
        ]))
        .unwrap();
        assert_eq!(
            bound,
            Sample {
                guild_id: "42".into(),
                limit: 10,
                ratio: 0.5,
                refresh: true,
                tags: vec!["a".into(), "b".into()],
                extra: json!({"x": 1}),
            }
        );
    }

    #[test]
    fn missing_optional_fields_keep_defaults_and_unknown_keys_are_ignored() {
        let bound: Sample = bind_request(&args(&[
            ("guildId", TypedValue::String("1".into())),
            ("nonsense", TypedValue::Bool(true)),
        ]))
        .unwrap();
        assert_eq!(bound.limit, 0);
        assert!(!bound.refresh);
        assert_eq!(bound.extra, Value::Null);
    }

    #[test]
    fn missing_required_field_names_key() {
        let err = bind_request::<Sample>(&TypedArgs::new()).unwrap_err();
        assert_eq!(err, BindingError::MissingField { key: "guildId".into() });
    }

    #[test]
    fn out_of_range_integer_names_key() {
        let err = bind_request::<Sample>(&args(&[
            ("guildId", TypedValue::String("1".into())),
            ("limit", TypedValue::I32(300)),
        ]))
        .unwrap_err();
        assert!(matches!(err, BindingError::OutOfRange { ref key, .. } if key == "limit"), "{err}");
        assert!(err.to_string().contains("uint8"));
    }

    #[test]
    fn incompatible_kind_is_a_mismatch() {
        let err = bind_request::<Sample>(&args(&[("guildId", TypedValue::Bool(true))])).unwrap_err();
        assert_eq!(
            err,
            BindingError::TypeMismatch {
                key: "guildId".into(),
                expected: "string".into(),
                got: "bool".into(),
            }
        );
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let err = bind_request::<Sample>(&args(&[
            ("guildId", TypedValue::String("1".into())),
            ("ratio", TypedValue::F64(f64::INFINITY)),
        ]))
        .unwrap_err();
        assert!(matches!(err, BindingError::Invalid { .. }));
    }

    #[test]
    fn json_arrays_bind_to_list_fields() {
        let bound: Sample = bind_request(&args(&[
            ("guildId", TypedValue::String("1".into())),
            ("tags", TypedValue::Json(json!(["x", "y"]))),
        ]))
        .unwrap();
        assert_eq!(bound.tags, vec!["x".to_string(), "y".to_string()]);
    }
}
