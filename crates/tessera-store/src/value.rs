//! Element types that can live in a column store.

use bytes::Bytes;
use tessera_common::{Date, Result, TesseraError, Timestamp, TypeId, Value};

/// A type that can be stored in a [`ColumnStore`](crate::ColumnStore).
///
/// Every element type has a default that unwritten slots read back as, and a
/// lossless mapping to and from the type-erased [`Value`] used by the boxed
/// access path. `Option<T>` is the null-wrapping variant: its default is
/// `None`, which maps to `Value::Null` instead of the zero value.
pub trait ColumnValue: Clone + Default + Send + Sync + 'static {
    /// Type tag of the underlying (non-null) values.
    const TYPE_ID: TypeId;

    /// True when NULL is stored distinctly from the default value.
    const NULLABLE: bool = false;

    /// Boxes this value.
    fn to_value(&self) -> Value;

    /// Unboxes a value, coercing it to this type first.
    ///
    /// NULL becomes the default value for direct types.
    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! impl_column_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ColumnValue for $ty {
                const TYPE_ID: TypeId = TypeId::$variant;

                #[inline]
                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value.coerce(Self::TYPE_ID)? {
                        Value::$variant(v) => Ok(v),
                        Value::Null => Ok(Self::default()),
                        other => Err(TesseraError::conversion(
                            other.type_id(),
                            Self::TYPE_ID,
                            "coercion produced a different type",
                        )),
                    }
                }
            }
        )*
    };
}

impl_column_value!(
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

impl<T: ColumnValue> ColumnValue for Option<T> {
    const TYPE_ID: TypeId = T::TYPE_ID;
    const NULLABLE: bool = true;

    #[inline]
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_roundtrip() {
        assert_eq!(i32::from_value(42i32.to_value()).unwrap(), 42);
        assert_eq!(String::from_value(Value::from("abc")).unwrap(), "abc");
        assert_eq!(Date::from_value(Value::Date(Date(9))).unwrap(), Date(9));
    }

    #[test]
    fn test_direct_null_reads_default() {
        assert_eq!(i64::from_value(Value::Null).unwrap(), 0);
        assert_eq!(String::from_value(Value::Null).unwrap(), "");
        assert!(!bool::from_value(Value::Null).unwrap());
    }

    #[test]
    fn test_nullable_keeps_null_apart_from_zero() {
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_value(Value::Int32(0)).unwrap(), Some(0));
        assert_eq!(None::<i32>.to_value(), Value::Null);
        assert_eq!(Some(0i32).to_value(), Value::Int32(0));
        assert!(<Option<i32> as ColumnValue>::NULLABLE);
        assert!(!<i32 as ColumnValue>::NULLABLE);
        assert_eq!(<Option<f64> as ColumnValue>::TYPE_ID, TypeId::Float64);
    }

    #[test]
    fn test_from_value_coerces() {
        assert_eq!(u16::from_value(Value::from("17")).unwrap(), 17);
        assert_eq!(f64::from_value(Value::Int32(2)).unwrap(), 2.0);
        assert!(u8::from_value(Value::Int32(-4)).is_err());
    }
}
