//! Value types that attributes can hold.
//!
//! [`Value`] is the canonical, typed form recorded in a [`Datum`](crate::Datum).
//! [`RawValue`] is what producers hand to the broker: any built-in integer or
//! float width, a bool, a string, or null. A [`Definition`](crate::Definition)
//! turns the latter into the former.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical value recorded for an attribute.
///
/// # Examples
///
/// ```
/// use attrbus::Value;
///
/// let v = Value::Int(21);
/// assert_eq!(v.as_int(), Some(21));
/// assert_eq!(v.as_float(), Some(21.0));
/// assert!(Value::Null.is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// No value; held by attributes without a definition until first written.
    Null,
}

impl Value {
    /// Returns true for `Bool`.
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Returns true for `Int`.
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Returns true for `Float`.
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    /// Returns true for `String`.
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns true for `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is `Bool`.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is `Int`.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The number as `f64`; `Int` converts too.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// The string slice, if this is `String`.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Null => "null",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Uncoerced input handed to `publish`, `update`, or a definition default.
///
/// Every built-in numeric width converts into this with `From`, so callers
/// can write `client.publish("lamp.level", 42u8)` or `attr.update(21.5f32)`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// `i8` input.
    I8(i8),
    /// `i16` input.
    I16(i16),
    /// `i32` input.
    I32(i32),
    /// `i64` input.
    I64(i64),
    /// `isize` input.
    Isize(isize),
    /// `u8` input.
    U8(u8),
    /// `u16` input.
    U16(u16),
    /// `u32` input.
    U32(u32),
    /// `u64` input.
    U64(u64),
    /// `usize` input.
    Usize(usize),
    /// `f32` input.
    F32(f32),
    /// `f64` input.
    F64(f64),
    /// `bool` input.
    Bool(bool),
    /// `String` input.
    String(String),
    /// No value.
    Null,
}

/// A numeric raw value widened to one of three 64-bit carriers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl RawValue {
    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::Isize(_) => "isize",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::Usize(_) => "usize",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Null => "null",
        }
    }

    pub(crate) fn number(&self) -> Option<Number> {
        let n = match *self {
            Self::I8(v) => Number::Signed(i64::from(v)),
            Self::I16(v) => Number::Signed(i64::from(v)),
            Self::I32(v) => Number::Signed(i64::from(v)),
            Self::I64(v) => Number::Signed(v),
            Self::Isize(v) => Number::Signed(v as i64),
            Self::U8(v) => Number::Unsigned(u64::from(v)),
            Self::U16(v) => Number::Unsigned(u64::from(v)),
            Self::U32(v) => Number::Unsigned(u64::from(v)),
            Self::U64(v) => Number::Unsigned(v),
            Self::Usize(v) => Number::Unsigned(v as u64),
            Self::F32(v) => Number::Float(f64::from(v)),
            Self::F64(v) => Number::Float(v),
            Self::Bool(_) | Self::String(_) | Self::Null => return None,
        };
        Some(n)
    }

    /// Canonicalises without validation; used for attributes that carry no definition.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn into_value(self) -> Value {
        match self {
            Self::Bool(v) => Value::Bool(v),
            Self::String(v) => Value::String(v),
            Self::Null => Value::Null,
            other => match other.number() {
                Some(Number::Signed(v)) => Value::Int(v),
                Some(Number::Unsigned(v)) => match i64::try_from(v) {
                    Ok(v) => Value::Int(v),
                    Err(_) => Value::Float(v as f64),
                },
                Some(Number::Float(v)) => Value::Float(v),
                None => Value::Null,
            },
        }
    }
}

impl Default for RawValue {
    fn default() -> Self {
        Self::Null
    }
}

macro_rules! raw_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RawValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

raw_from! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    String => String,
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<()> for RawValue {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<Value> for RawValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Bool(v) => Self::Bool(v),
            Value::Int(v) => Self::I64(v),
            Value::Float(v) => Self::F64(v),
            Value::String(v) => Self::String(v),
            Value::Null => Self::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_int_reads_as_float() {
        let val = Value::Int(42);
        assert!(val.is_int());
        assert_eq!(val.as_int(), Some(42));
        assert_eq!(val.as_float(), Some(42.0));
        assert_eq!(val.type_name(), "int");
    }

    #[test]
    fn test_value_type_mismatch() {
        let val = Value::Bool(true);
        assert!(val.as_int().is_none());
        assert!(val.as_float().is_none());
        assert!(val.as_string().is_none());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::String("on".into()).to_string(), "\"on\"");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_value_serialization() {
        let val = Value::Float(21.5);
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"type":"float","value":21.5}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, val);
    }

    #[test]
    fn test_raw_numbers_widen() {
        assert_eq!(RawValue::from(-5i8).number(), Some(Number::Signed(-5)));
        assert_eq!(RawValue::from(7u16).number(), Some(Number::Unsigned(7)));
        assert_eq!(RawValue::from(1.5f32).number(), Some(Number::Float(1.5)));
        assert_eq!(RawValue::from("x").number(), None);
        assert_eq!(RawValue::from(true).number(), None);
    }

    #[test]
    fn test_raw_into_value() {
        assert_eq!(RawValue::from(3u8).into_value(), Value::Int(3));
        assert_eq!(RawValue::from(u64::MAX).into_value(), Value::Float(u64::MAX as f64));
        assert_eq!(RawValue::from("hi").into_value(), Value::String("hi".into()));
        assert_eq!(RawValue::Null.into_value(), Value::Null);
    }

    #[test]
    fn test_raw_from_value() {
        assert_eq!(RawValue::from(Value::Int(9)), RawValue::I64(9));
        assert_eq!(RawValue::from(Value::Null), RawValue::Null);
    }
}
