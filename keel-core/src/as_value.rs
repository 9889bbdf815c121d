use crate::{DbValue, Error, FieldType, Result};
use rust_decimal::Decimal;
use std::{any, str::FromStr};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};
use uuid::Uuid;

/// Conversion between a field value and the generic [`DbValue`].
///
/// For every implementation `from_db_value(to_db_value(v)) == v` holds for all representable
/// `v`. Decoding a value whose variant does not fit the target type fails with
/// [`Error::Mapping`], as does any narrowing conversion that would lose information.
///
/// # Custom types
/// Implement the trait directly for types with a bespoke representation. Field-less enums
/// should use `#[derive(DbEnum)]` instead, which stores the ordinal and honours the
/// converters registered with [`register_converter`](crate::register_converter).
pub trait AsDbValue: Sized {
    /// Whether `DbValue::Null` is a legal value.
    const NULLABLE: bool = false;
    /// Declared type used for the field descriptor and the column type.
    fn field_type() -> FieldType;
    fn to_db_value(&self) -> Result<DbValue>;
    fn from_db_value(value: DbValue) -> Result<Self>;
}

/// Encode a field value.
pub fn encode<T: AsDbValue>(value: &T) -> Result<DbValue> {
    value.to_db_value()
}

/// Decode a field value.
pub fn decode<T: AsDbValue>(value: DbValue) -> Result<T> {
    T::from_db_value(value)
}

pub(crate) fn mismatch<T>(value: &DbValue) -> Error {
    Error::mapping(format!(
        "Cannot decode a {} value ({}) into {}",
        value.kind(),
        value,
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($($source:ty),+ $(,)?) => {
        $(
            impl AsDbValue for $source {
                fn field_type() -> FieldType {
                    FieldType::Int
                }
                fn to_db_value(&self) -> Result<DbValue> {
                    i64::try_from(*self).map(DbValue::Int64).map_err(|_| {
                        Error::mapping(format!(
                            "Value {} of type {} does not fit a 64 bit integer",
                            self,
                            any::type_name::<Self>()
                        ))
                    })
                }
                fn from_db_value(value: DbValue) -> Result<Self> {
                    match value {
                        DbValue::Int64(v) => <$source>::try_from(v).map_err(|_| {
                            Error::mapping(format!(
                                "Value {v}: i64 is out of range for {}",
                                any::type_name::<Self>()
                            ))
                        }),
                        _ => Err(mismatch::<Self>(&value)),
                    }
                }
            }
        )+
    };
}
impl_as_value_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl AsDbValue for f64 {
    fn field_type() -> FieldType {
        FieldType::Float
    }
    fn to_db_value(&self) -> Result<DbValue> {
        Ok(DbValue::Float64(*self))
    }
    fn from_db_value(value: DbValue) -> Result<Self> {
        match value {
            DbValue::Float64(v) => Ok(v),
            // Some backends hand back integral floats as integers, beyond 2^53 precision is lost
            DbValue::Int64(v) if v.unsigned_abs() <= 1 << 53 => Ok(v as f64),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsDbValue for f32 {
    fn field_type() -> FieldType {
        FieldType::Float
    }
    fn to_db_value(&self) -> Result<DbValue> {
        Ok(DbValue::Float64(*self as f64))
    }
    fn from_db_value(value: DbValue) -> Result<Self> {
        let v = f64::from_db_value(value)?;
        if v.is_nan() || (v as f32) as f64 == v {
            Ok(v as f32)
        } else {
            Err(Error::mapping(format!(
                "Value {v}: f64 cannot be represented exactly as f32"
            )))
        }
    }
}

impl AsDbValue for bool {
    fn field_type() -> FieldType {
        FieldType::Bool
    }
    fn to_db_value(&self) -> Result<DbValue> {
        Ok(DbValue::Bool(*self))
    }
    fn from_db_value(value: DbValue) -> Result<Self> {
        match value {
            DbValue::Bool(v) => Ok(v),
            DbValue::Int64(0) => Ok(false),
            DbValue::Int64(1) => Ok(true),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsDbValue for String {
    fn field_type() -> FieldType {
        FieldType::Text
    }
    fn to_db_value(&self) -> Result<DbValue> {
        Ok(DbValue::Text(self.clone()))
    }
    fn from_db_value(value: DbValue) -> Result<Self> {
        match value {
            DbValue::Text(v) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsDbValue for Box<[u8]> {
    fn field_type() -> FieldType {
        FieldType::Blob
    }
    fn to_db_value(&self) -> Result<DbValue> {
        Ok(DbValue::Blob(self.clone()))
    }
    fn from_db_value(value: DbValue) -> Result<Self> {
        match value {
            DbValue::Blob(v) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsDbValue for Vec<u8> {
    fn field_type() -> FieldType {
        FieldType::Blob
    }
    fn to_db_value(&self) -> Result<DbValue> {
        Ok(DbValue::Blob(self.as_slice().into()))
    }
    fn from_db_value(value: DbValue) -> Result<Self> {
        Box::<[u8]>::from_db_value(value).map(Into::into)
    }
}

impl AsDbValue for DbValue {
    const NULLABLE: bool = true;
    fn field_type() -> FieldType {
        FieldType::Blob
    }
    fn to_db_value(&self) -> Result<DbValue> {
        Ok(self.clone())
    }
    fn from_db_value(value: DbValue) -> Result<Self> {
        Ok(value)
    }
}

impl<T: AsDbValue> AsDbValue for Option<T> {
    const NULLABLE: bool = true;
    fn field_type() -> FieldType {
        T::field_type()
    }
    fn to_db_value(&self) -> Result<DbValue> {
        match self {
            Some(v) => v.to_db_value(),
            None => Ok(DbValue::Null),
        }
    }
    fn from_db_value(value: DbValue) -> Result<Self> {
        match value {
            DbValue::Null => Ok(None),
            v => T::from_db_value(v).map(Some),
        }
    }
}

impl<T: AsDbValue> AsDbValue for Box<T> {
    const NULLABLE: bool = T::NULLABLE;
    fn field_type() -> FieldType {
        T::field_type()
    }
    fn to_db_value(&self) -> Result<DbValue> {
        self.as_ref().to_db_value()
    }
    fn from_db_value(value: DbValue) -> Result<Self> {
        T::from_db_value(value).map(Box::new)
    }
}

macro_rules! impl_as_value_text {
    ($source:ty, |$v:ident| $format:expr, |$s:ident| $parse:expr $(,)?) => {
        impl AsDbValue for $source {
            fn field_type() -> FieldType {
                FieldType::Text
            }
            fn to_db_value(&self) -> Result<DbValue> {
                let $v = self;
                $format.map(DbValue::Text).map_err(|e| {
                    Error::mapping(format!(
                        "Cannot encode {} as text: {e}",
                        any::type_name::<Self>()
                    ))
                })
            }
            fn from_db_value(value: DbValue) -> Result<Self> {
                match value {
                    DbValue::Text(ref $s) => $parse.map_err(|e| {
                        Error::mapping(format!(
                            "Cannot parse `{}` as {}: {e}",
                            $s,
                            any::type_name::<Self>()
                        ))
                    }),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_value_text!(
    Date,
    |v| v.format(format_description!("[year]-[month]-[day]")),
    |s| Date::parse(s, format_description!("[year]-[month]-[day]")),
);
impl_as_value_text!(
    Time,
    |v| v.format(format_description!(
        "[hour]:[minute]:[second].[subsecond]"
    )),
    |s| Time::parse(
        s,
        format_description!("[hour]:[minute]:[second].[subsecond]")
    ),
);
impl_as_value_text!(
    PrimitiveDateTime,
    |v| v.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"
    )),
    |s| PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]")
    ),
);
impl_as_value_text!(
    OffsetDateTime,
    |v| v.format(&Rfc3339),
    |s| OffsetDateTime::parse(s, &Rfc3339),
);
impl_as_value_text!(
    Uuid,
    |v| Ok::<_, std::convert::Infallible>(v.hyphenated().to_string()),
    |s| Uuid::parse_str(s),
);
impl_as_value_text!(
    Decimal,
    |v| Ok::<_, std::convert::Infallible>(v.to_string()),
    |s| Decimal::from_str(s),
);

#[cfg(test)]
mod tests {
    use super::{AsDbValue, decode, encode};
    use crate::{DbValue, Error, FieldType};

    #[test]
    fn narrowing_is_an_error() {
        assert!(matches!(
            decode::<i32>(DbValue::Int64(i64::MAX)),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            decode::<u8>(DbValue::Int64(-1)),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(encode(&u64::MAX), Err(Error::Mapping(..))));
        assert_eq!(decode::<i32>(DbValue::Int64(-7)).unwrap(), -7);
        assert!(matches!(
            decode::<f64>(DbValue::Int64(i64::MAX)),
            Err(Error::Mapping(..))
        ));
        assert!(decode::<f64>(DbValue::Int64((1 << 53) + 1)).is_err());
        assert_eq!(decode::<f64>(DbValue::Int64(-(1 << 53))).unwrap(), -9007199254740992.0);
        assert_eq!(decode::<f64>(DbValue::Int64(3)).unwrap(), 3.0);
    }

    #[test]
    fn incompatible_tags() {
        assert!(matches!(
            decode::<i64>(DbValue::Text("12".into())),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            decode::<String>(DbValue::Int64(12)),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            decode::<bool>(DbValue::Int64(2)),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(decode::<i64>(DbValue::Null), Err(Error::Mapping(..))));
    }

    #[test]
    fn nullable() {
        assert!(<Option<i32>>::NULLABLE);
        assert!(!<i32>::NULLABLE);
        assert!(<Box<Option<String>>>::NULLABLE);
        assert_eq!(<Option<String>>::field_type(), FieldType::Text);
        assert_eq!(decode::<Option<i32>>(DbValue::Null).unwrap(), None);
        assert_eq!(encode(&None::<i32>).unwrap(), DbValue::Null);
    }
}
