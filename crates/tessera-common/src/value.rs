//! Type-erased cell values and the coercion path between column types.

use crate::error::{Result, TesseraError};
use crate::types::{Date, Timestamp, TypeId};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single type-erased column value.
///
/// `Value::Null` is distinct from every zero value, which is what lets
/// null-wrapped columns round-trip NULL through the boxed access path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Binary(Bytes),
    Date(Date),
    Timestamp(Timestamp),
}

impl Value {
    /// Returns the type identifier of this value.
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Null => TypeId::Null,
            Value::Boolean(_) => TypeId::Boolean,
            Value::Int8(_) => TypeId::Int8,
            Value::Int16(_) => TypeId::Int16,
            Value::Int32(_) => TypeId::Int32,
            Value::Int64(_) => TypeId::Int64,
            Value::UInt8(_) => TypeId::UInt8,
            Value::UInt16(_) => TypeId::UInt16,
            Value::UInt32(_) => TypeId::UInt32,
            Value::UInt64(_) => TypeId::UInt64,
            Value::Float32(_) => TypeId::Float32,
            Value::Float64(_) => TypeId::Float64,
            Value::Text(_) => TypeId::Text,
            Value::Binary(_) => TypeId::Binary,
            Value::Date(_) => TypeId::Date,
            Value::Timestamp(_) => TypeId::Timestamp,
        }
    }

    /// Returns true for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts this value to `target`, parsing text where needed.
    ///
    /// NULL coerces to NULL for every target. Lossy numeric conversions
    /// (overflow, fractional floats into integers) fail with ConversionError.
    pub fn coerce(&self, target: TypeId) -> Result<Value> {
        if self.type_id() == target || self.is_null() {
            return Ok(self.clone());
        }
        let fail = |reason: &str| TesseraError::conversion(self.type_id(), target, reason);

        match target {
            TypeId::Null => Err(fail("only NULL converts to NULL")),
            TypeId::Boolean => self.to_bool().map(Value::Boolean),
            TypeId::Int8 => self.to_i128().and_then(|v| narrow(v, self, target).map(Value::Int8)),
            TypeId::Int16 => self.to_i128().and_then(|v| narrow(v, self, target).map(Value::Int16)),
            TypeId::Int32 => self.to_i128().and_then(|v| narrow(v, self, target).map(Value::Int32)),
            TypeId::Int64 => self.to_i128().and_then(|v| narrow(v, self, target).map(Value::Int64)),
            TypeId::UInt8 => self.to_i128().and_then(|v| narrow(v, self, target).map(Value::UInt8)),
            TypeId::UInt16 => self.to_i128().and_then(|v| narrow(v, self, target).map(Value::UInt16)),
            TypeId::UInt32 => self.to_i128().and_then(|v| narrow(v, self, target).map(Value::UInt32)),
            TypeId::UInt64 => self.to_i128().and_then(|v| narrow(v, self, target).map(Value::UInt64)),
            TypeId::Float32 => self.to_f64().map(|v| Value::Float32(v as f32)),
            TypeId::Float64 => self.to_f64().map(Value::Float64),
            TypeId::Text => match self {
                Value::Binary(b) => std::str::from_utf8(b)
                    .map(|s| Value::Text(s.to_string()))
                    .map_err(|e| fail(&e.to_string())),
                other => Ok(Value::Text(other.to_string())),
            },
            TypeId::Binary => match self {
                Value::Text(s) => Ok(Value::Binary(Bytes::copy_from_slice(s.as_bytes()))),
                _ => Err(fail("no binary representation")),
            },
            TypeId::Date => match self {
                Value::Text(s) => Date::parse(s)
                    .map(Value::Date)
                    .ok_or_else(|| fail("expected YYYY-MM-DD")),
                Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
                _ => self
                    .to_i128()
                    .and_then(|v| narrow::<i32>(v, self, target))
                    .map(|days| Value::Date(Date(days))),
            },
            TypeId::Timestamp => match self {
                Value::Text(s) => Timestamp::parse(s)
                    .or_else(|| s.trim().parse().ok().map(Timestamp))
                    .map(Value::Timestamp)
                    .ok_or_else(|| fail("expected an ISO-8601 timestamp or epoch milliseconds")),
                Value::Date(d) => Ok(Value::Timestamp(Timestamp::from(*d))),
                _ => self
                    .to_i128()
                    .and_then(|v| narrow::<i64>(v, self, target))
                    .map(|ms| Value::Timestamp(Timestamp(ms))),
            },
        }
    }

    fn to_bool(&self) -> Result<bool> {
        let fail = |reason: &str| TesseraError::conversion(self.type_id(), TypeId::Boolean, reason);
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "1" => Ok(true),
                "false" | "f" | "no" | "0" => Ok(false),
                _ => Err(fail("expected true or false")),
            },
            _ => match self.to_i128()? {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(fail("only 0 and 1 convert to booleans")),
            },
        }
    }

    fn to_i128(&self) -> Result<i128> {
        let fail = |reason: &str| TesseraError::conversion(self.type_id(), "INTEGER", reason);
        match self {
            Value::Boolean(b) => Ok(*b as i128),
            Value::Int8(v) => Ok(*v as i128),
            Value::Int16(v) => Ok(*v as i128),
            Value::Int32(v) => Ok(*v as i128),
            Value::Int64(v) => Ok(*v as i128),
            Value::UInt8(v) => Ok(*v as i128),
            Value::UInt16(v) => Ok(*v as i128),
            Value::UInt32(v) => Ok(*v as i128),
            Value::UInt64(v) => Ok(*v as i128),
            Value::Float32(v) => float_to_int(*v as f64).ok_or_else(|| fail("not an integral value")),
            Value::Float64(v) => float_to_int(*v).ok_or_else(|| fail("not an integral value")),
            Value::Text(s) => {
                let s = s.trim();
                s.parse::<i128>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
                    .ok_or_else(|| fail("not an integer"))
            }
            Value::Date(d) => Ok(d.0 as i128),
            Value::Timestamp(ts) => Ok(ts.0 as i128),
            Value::Null | Value::Binary(_) => Err(fail("no integer representation")),
        }
    }

    fn to_f64(&self) -> Result<f64> {
        match self {
            Value::Float32(v) => Ok(*v as f64),
            Value::Float64(v) => Ok(*v),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|e: std::num::ParseFloatError| {
                    TesseraError::conversion(TypeId::Text, TypeId::Float64, e)
                }),
            _ => self.to_i128().map(|v| v as f64),
        }
    }
}

fn float_to_int(v: f64) -> Option<i128> {
    (v.is_finite() && v.fract() == 0.0).then_some(v as i128)
}

fn narrow<T: TryFrom<i128>>(v: i128, source: &Value, target: TypeId) -> Result<T> {
    T::try_from(v).map_err(|_| TesseraError::conversion(source.type_id(), target, "out of range"))
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Binary(v) => {
                for byte in v.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Date(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value!(
    bool => Boolean,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    String => Text,
    Bytes => Binary,
    Date => Date,
    Timestamp => Timestamp,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
