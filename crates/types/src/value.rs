//! Semantically typed argument values produced by the coercion pipeline.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Number, Value};

/// Typed argument mapping keyed by source key, in the order the user typed it.
pub type TypedArgs = IndexMap<String, TypedValue>;

/// A single coerced argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    /// Platform-width signed integer (`int`).
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Platform-width unsigned integer (`uint`, `uintptr`).
    Usize(usize),
    F32(f32),
    F64(f64),
    /// Parsed JSON embedded as-is.
    Json(Value),
    Array(Vec<TypedValue>),
}

impl TypedValue {
    /// Short name of the variant, matching the coercion type tag vocabulary.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::String(_) => "string",
            TypedValue::Bool(_) => "bool",
            TypedValue::I8(_) => "int8",
            TypedValue::I16(_) => "int16",
            TypedValue::I32(_) => "int32",
            TypedValue::I64(_) => "int64",
            TypedValue::Isize(_) => "int",
            TypedValue::U8(_) => "uint8",
            TypedValue::U16(_) => "uint16",
            TypedValue::U32(_) => "uint32",
            TypedValue::U64(_) => "uint64",
            TypedValue::Usize(_) => "uint",
            TypedValue::F32(_) => "float32",
            TypedValue::F64(_) => "float64",
            TypedValue::Json(_) => "json",
            TypedValue::Array(_) => "array",
        }
    }

    /// Widened integer view of integer variants.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            TypedValue::I8(v) => Some(v as i128),
            TypedValue::I16(v) => Some(v as i128),
            TypedValue::I32(v) => Some(v as i128),
            TypedValue::I64(v) => Some(v as i128),
            TypedValue::Isize(v) => Some(v as i128),
            TypedValue::U8(v) => Some(v as i128),
            TypedValue::U16(v) => Some(v as i128),
            TypedValue::U32(v) => Some(v as i128),
            TypedValue::U64(v) => Some(v as i128),
            TypedValue::Usize(v) => Some(v as i128),
            _ => None,
        }
    }

    /// Float view of numeric variants.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            TypedValue::F32(v) => Some(v as f64),
            TypedValue::F64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    /// JSON rendering; non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::String(s) => Value::String(s.clone()),
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::I8(v) => Value::from(*v),
            TypedValue::I16(v) => Value::from(*v),
            TypedValue::I32(v) => Value::from(*v),
            TypedValue::I64(v) => Value::from(*v),
            TypedValue::Isize(v) => Value::from(*v as i64),
            TypedValue::U8(v) => Value::from(*v),
            TypedValue::U16(v) => Value::from(*v),
            TypedValue::U32(v) => Value::from(*v),
            TypedValue::U64(v) => Value::from(*v),
            TypedValue::Usize(v) => Value::from(*v as u64),
            TypedValue::F32(v) => Number::from_f64(*v as f64).map(Value::Number).unwrap_or(Value::Null),
            TypedValue::F64(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
            TypedValue::Json(value) => value.clone(),
            TypedValue::Array(items) => Value::Array(items.iter().map(TypedValue::to_json).collect()),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&TypedValue> for Value {
    fn from(value: &TypedValue) -> Self {
        value.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arrays_render_recursively() {
        let value = TypedValue::Array(vec![TypedValue::U8(1), TypedValue::String("b".into()), TypedValue::Json(json!({"x": 1}))]);
        assert_eq!(value.to_json(), json!([1, "b", {"x": 1}]));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(TypedValue::F64(f64::NAN).to_json(), Value::Null);
        assert_eq!(TypedValue::F32(1.5).to_json(), json!(1.5));
    }

    #[test]
    fn integer_views_widen() {
        assert_eq!(TypedValue::U64(u64::MAX).as_i128(), Some(u64::MAX as i128));
        assert_eq!(TypedValue::String("1".into()).as_i128(), None);
    }
}
