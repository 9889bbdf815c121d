use crate::{DbValue, Error, FieldType, Result, as_value::mismatch};
use std::{
    any::{self, Any, TypeId},
    collections::HashMap,
    sync::{Arc, LazyLock, RwLock},
};

/// User supplied bidirectional conversion for a type, see [`register_converter`].
pub struct Converter<T> {
    /// Column type used to store the converted value.
    pub storage: FieldType,
    pub encode: fn(&T) -> Result<DbValue>,
    pub decode: fn(DbValue) -> Result<T>,
}

type Registry = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static CONVERTERS: LazyLock<Registry> = LazyLock::new(Default::default);

/// Register a process wide conversion for `T`.
///
/// A type can be registered once, a second registration fails with [`Error::Mapping`].
/// Register converters during initialization, before the entities using `T` are reflected:
/// the column type of already reflected entities is not updated.
pub fn register_converter<T: 'static>(converter: Converter<T>) -> Result<()> {
    let mut registry = CONVERTERS
        .write()
        .map_err(|_| Error::mapping("The converter registry is poisoned"))?;
    let key = TypeId::of::<T>();
    if registry.contains_key(&key) {
        return Err(Error::mapping(format!(
            "A converter for {} is already registered",
            any::type_name::<T>()
        )));
    }
    registry.insert(key, Arc::new(converter));
    log::debug!("Registered converter for {}", any::type_name::<T>());
    Ok(())
}

/// The converter registered for `T`, if any.
pub fn converter<T: 'static>() -> Option<Arc<Converter<T>>> {
    let registry = CONVERTERS.read().ok()?;
    registry
        .get(&TypeId::of::<T>())
        .cloned()?
        .downcast::<Converter<T>>()
        .ok()
}

/// Field-less enumeration stored by ordinal. Usually derived with `#[derive(DbEnum)]`.
pub trait DbEnum: Sized + 'static {
    fn ordinal(&self) -> i64;
    fn from_ordinal(ordinal: i64) -> Option<Self>;
}

pub fn enum_field_type<T: DbEnum>() -> FieldType {
    FieldType::Enum(Box::new(
        converter::<T>()
            .map(|c| c.storage.clone())
            .unwrap_or(FieldType::Int),
    ))
}

pub fn encode_enum<T: DbEnum>(value: &T) -> Result<DbValue> {
    match converter::<T>() {
        Some(converter) => (converter.encode)(value),
        None => Ok(DbValue::Int64(value.ordinal())),
    }
}

pub fn decode_enum<T: DbEnum>(value: DbValue) -> Result<T> {
    if let Some(converter) = converter::<T>() {
        return (converter.decode)(value);
    }
    match value {
        DbValue::Int64(ordinal) => T::from_ordinal(ordinal).ok_or_else(|| {
            Error::mapping(format!(
                "{ordinal} is not a valid ordinal for {}",
                any::type_name::<T>()
            ))
        }),
        _ => Err(mismatch::<T>(&value)),
    }
}

#[cfg(test)]
mod tests {
    use super::{Converter, DbEnum, converter, decode_enum, encode_enum, register_converter};
    use crate::{DbValue, Error, FieldType, enum_field_type};

    #[derive(Debug, PartialEq)]
    enum Plain {
        A,
        B,
    }
    impl DbEnum for Plain {
        fn ordinal(&self) -> i64 {
            match self {
                Plain::A => 0,
                Plain::B => 1,
            }
        }
        fn from_ordinal(ordinal: i64) -> Option<Self> {
            match ordinal {
                0 => Some(Plain::A),
                1 => Some(Plain::B),
                _ => None,
            }
        }
    }

    #[test]
    fn ordinal_by_default() {
        assert_eq!(encode_enum(&Plain::B).unwrap(), DbValue::Int64(1));
        assert_eq!(decode_enum::<Plain>(DbValue::Int64(0)).unwrap(), Plain::A);
        assert!(matches!(
            decode_enum::<Plain>(DbValue::Int64(5)),
            Err(Error::Mapping(..))
        ));
        assert!(matches!(
            decode_enum::<Plain>(DbValue::Text("A".into())),
            Err(Error::Mapping(..))
        ));
        assert_eq!(
            enum_field_type::<Plain>(),
            FieldType::Enum(Box::new(FieldType::Int))
        );
    }

    #[derive(Debug, PartialEq)]
    struct Celsius(f64);

    #[test]
    fn register_once() {
        let make = || Converter::<Celsius> {
            storage: FieldType::Float,
            encode: |v| Ok(DbValue::Float64(v.0)),
            decode: |v| match v {
                DbValue::Float64(v) => Ok(Celsius(v)),
                _ => Err(Error::mapping("not a temperature")),
            },
        };
        assert!(converter::<Celsius>().is_none());
        register_converter(make()).expect("First registration succeeds");
        assert!(matches!(register_converter(make()), Err(Error::Mapping(..))));
        let converter = converter::<Celsius>().expect("Converter is registered");
        assert_eq!(
            (converter.encode)(&Celsius(21.5)).unwrap(),
            DbValue::Float64(21.5)
        );
        assert_eq!(
            (converter.decode)(DbValue::Float64(-3.0)).unwrap(),
            Celsius(-3.0)
        );
    }
}
