/*!
Value mapper layer.

Converts a generic [`Value`] produced by the tokenizer into a requested Rust
target type: one trait with an impl per primitive/collection target, the
same shape as an `ActivePrimitiveKind`-style scalar-coercion dispatch, so
user leaf types can plug into the same conversion path as the built-ins.

Null handling follows one precedence, checked in order, the first match
wins:

1. `retain_nulls` on the member — the mapper still runs and must itself
   decide what to do with a null (usually only meaningful for `Option<T>`
   and similar nullable targets).
2. A declared `default_value` on the member.
3. A default constructor parameter supplied by the caller's type (handled
   above this layer, since it's a property of the target type's
   constructor, not of the mapper).
4. The mapper's own `map_null`, which by default is an error.
*/

use crate::error::{JsonProcessingError, MappingError};
use crate::value::{Number, Value};

/// Converts generic JSON values into one target Rust type.
///
/// Implemented for the primitive and collection types this crate maps
/// out of the box; user schemas may implement it for their own leaf types
/// as well.
pub trait ValueMapper: Sized {
    fn map_string(value: &str) -> Result<Self, MappingError> {
        Err(unsupported_error(Value::String(value.to_string()), type_name::<Self>()))
    }

    fn map_number(value: Number) -> Result<Self, MappingError> {
        Err(unsupported_error(Value::Number(value), type_name::<Self>()))
    }

    fn map_boolean(value: bool) -> Result<Self, MappingError> {
        Err(unsupported_error(Value::Bool(value), type_name::<Self>()))
    }

    /// Called only when the member's null policy (see module docs) defers
    /// the decision to the mapper. The default rejects nulls.
    fn map_null() -> Result<Self, MappingError> {
        Err(unsupported_error(Value::Null, type_name::<Self>()))
    }

    /// Dispatches a generic [`Value`] to the scalar method matching its
    /// kind. Collections are mapped by the caller (the engine, for
    /// streamed collections, or [`map_value`] below for an eagerly-read
    /// `MappedValue` list/map).
    fn map_value(value: &Value) -> Result<Self, MappingError> {
        match value {
            Value::String(s) => Self::map_string(s),
            Value::Number(n) => Self::map_number(*n),
            Value::Bool(b) => Self::map_boolean(*b),
            Value::Null => Self::map_null(),
            other => Err(unsupported_error(other.clone(), type_name::<Self>())),
        }
    }
}

fn type_name<T>() -> &'static str {
    std::any::type_name::<T>()
}

fn unsupported_error(value: Value, target_type: &'static str) -> MappingError {
    MappingError {
        position: String::new(),
        source_value: value.render_short(),
        target_type,
    }
}

macro_rules! impl_integer_mapper {
    ($($t:ty),+ $(,)?) => {
        $(
            impl ValueMapper for $t {
                fn map_number(value: Number) -> Result<Self, MappingError> {
                    value
                        .as_i64()
                        .and_then(|n| <$t>::try_from(n).ok())
                        .ok_or_else(|| unsupported_error(Value::Number(value), type_name::<Self>()))
                }
            }
        )+
    };
}

impl_integer_mapper!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl ValueMapper for f32 {
    fn map_number(value: Number) -> Result<Self, MappingError> {
        Ok(value.as_f64() as f32)
    }
}

impl ValueMapper for f64 {
    fn map_number(value: Number) -> Result<Self, MappingError> {
        Ok(value.as_f64())
    }
}

impl ValueMapper for bool {
    fn map_boolean(value: bool) -> Result<Self, MappingError> {
        Ok(value)
    }
}

impl ValueMapper for String {
    fn map_string(value: &str) -> Result<Self, MappingError> {
        Ok(value.to_string())
    }
}

impl ValueMapper for char {
    fn map_string(value: &str) -> Result<Self, MappingError> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(unsupported_error(Value::String(value.to_string()), type_name::<Self>())),
        }
    }
}

/// `Option<T>` always accepts null (mapping it to `None`), regardless of
/// the member's null policy — this is the one built-in target type for
/// which `retain_nulls` is meaningful.
impl<T: ValueMapper> ValueMapper for Option<T> {
    fn map_string(value: &str) -> Result<Self, MappingError> {
        T::map_string(value).map(Some)
    }

    fn map_number(value: Number) -> Result<Self, MappingError> {
        T::map_number(value).map(Some)
    }

    fn map_boolean(value: bool) -> Result<Self, MappingError> {
        T::map_boolean(value).map(Some)
    }

    fn map_null() -> Result<Self, MappingError> {
        Ok(None)
    }
}

/// An eagerly-read `MappedValue` list: every element is a scalar target,
/// the JSON array order is preserved. Lets `consume_value::<Vec<T>>()` work
/// the same way `consume_value::<T>()` does for a plain scalar member.
impl<T: ValueMapper> ValueMapper for Vec<T> {
    fn map_value(value: &Value) -> Result<Self, MappingError> {
        match value {
            Value::List(items) => items.iter().map(T::map_value).collect(),
            other => Err(unsupported_error(other.clone(), type_name::<Self>())),
        }
    }
}

/// Maps an eagerly-read `MappedValue` list via the free-function form,
/// useful when the target collection isn't `Vec<T>` (e.g. after a manual
/// `consume_raw`).
pub fn map_list<T: ValueMapper>(value: &Value) -> Result<Vec<T>, JsonProcessingError> {
    Vec::<T>::map_value(value).map_err(JsonProcessingError::from)
}

/// Maps an eagerly-read `MappedValue` object-as-map: JSON member names
/// become string keys, values map through `T`.
pub fn map_map<T: ValueMapper>(value: &Value) -> Result<Vec<(String, T)>, JsonProcessingError> {
    match value {
        Value::Map(entries) => entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), T::map_value(v)?)))
            .collect::<Result<Vec<(String, T)>, MappingError>>()
            .map_err(JsonProcessingError::from),
        other => Err(unsupported_error(other.clone(), "Map<_, _>").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_mapper_rejects_out_of_range() {
        let err = u8::map_number(Number::I32(1000));
        assert!(err.is_err());
    }

    #[test]
    fn integer_mapper_accepts_in_range() {
        assert_eq!(i32::map_number(Number::I32(42)).unwrap(), 42);
    }

    #[test]
    fn option_maps_null_to_none_and_value_to_some() {
        assert_eq!(Option::<i32>::map_null().unwrap(), None);
        assert_eq!(Option::<i32>::map_number(Number::I32(7)).unwrap(), Some(7));
    }

    #[test]
    fn char_mapper_rejects_multi_char_strings() {
        assert!(char::map_string("ab").is_err());
        assert_eq!(char::map_string("a").unwrap(), 'a');
    }

    #[test]
    fn map_list_preserves_order() {
        let value = Value::List(vec![
            Value::Number(Number::I32(1)),
            Value::Number(Number::I32(2)),
            Value::Number(Number::I32(3)),
        ]);
        let mapped: Vec<i32> = map_list(&value).unwrap();
        assert_eq!(mapped, vec![1, 2, 3]);
    }

    #[test]
    fn map_map_preserves_keys() {
        let value = Value::Map(vec![
            ("a".to_string(), Value::Number(Number::I32(1))),
            ("b".to_string(), Value::Number(Number::I32(2))),
        ]);
        let mapped: Vec<(String, i32)> = map_map(&value).unwrap();
        assert_eq!(mapped, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }
}
