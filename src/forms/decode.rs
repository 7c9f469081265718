//! Serde-driven decoding of submitted form fields into typed form structs.
//!
//! The decoder walks the submitted key/value pairs and lets the target's
//! `Deserialize` impl pull each value through [`ScalarDeserializer`], which
//! parses numbers and booleans on demand. Submitted keys the target does not
//! know are ignored; keys the submission omits fall back to the struct's
//! `Default` (forms derive `#[serde(default)]`).

use std::collections::{hash_map, HashMap};
use std::fmt;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, IntoDeserializer, MapAccess, Visitor,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    /// A submitted value could not be converted to the target field's type.
    /// Surfaced to the client as a 400.
    #[error("form field {field:?}: {message}")]
    Malformed { field: String, message: String },

    /// The destination type cannot be populated from flat form data. This is
    /// a defect in the calling code, never bad input, and call sites treat it
    /// as fatal.
    #[error("invalid form decode target: {0}")]
    InvalidTarget(String),

    #[error("{0}")]
    Custom(String),
}

impl de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DecodeError::Custom(msg.to_string())
    }
}

/// Decode submitted key/value pairs into `T`.
pub fn decode<T: DeserializeOwned>(fields: &HashMap<String, String>) -> Result<T, DecodeError> {
    T::deserialize(FormDeserializer { fields })
}

struct FormDeserializer<'de> {
    fields: &'de HashMap<String, String>,
}

impl<'de> Deserializer<'de> for FormDeserializer<'de> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(DecodeError::InvalidTarget(
            "form data can only populate a struct or map".to_string(),
        ))
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_map(FieldAccess {
            iter: self.fields.iter(),
            value: None,
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_map(visitor)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}

struct FieldAccess<'de> {
    iter: hash_map::Iter<'de, String, String>,
    value: Option<(&'de str, &'de str)>,
}

impl<'de> MapAccess<'de> for FieldAccess<'de> {
    type Error = DecodeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some((key.as_str(), value.as_str()));
                seed.deserialize(key.as_str().into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let (field, value) = self
            .value
            .take()
            .ok_or_else(|| DecodeError::Custom("value requested before key".to_string()))?;
        seed.deserialize(ScalarDeserializer { field, value })
    }
}

/// Deserializes a single submitted value, parsing to the type the target
/// field asks for.
struct ScalarDeserializer<'de> {
    field: &'de str,
    value: &'de str,
}

impl ScalarDeserializer<'_> {
    fn parse<T>(&self) -> Result<T, DecodeError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        self.value.parse().map_err(|err| DecodeError::Malformed {
            field: self.field.to_string(),
            message: format!("cannot convert {:?}: {err}", self.value),
        })
    }

    fn invalid_target(&self, shape: &str) -> DecodeError {
        DecodeError::InvalidTarget(format!(
            "field {:?} cannot decode into a {shape}",
            self.field
        ))
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                visitor.$visit(self.parse()?)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ScalarDeserializer<'de> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_str(self.value)
    }

    deserialize_parsed! {
        deserialize_bool => visit_bool,
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_i128 => visit_i128,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_u128 => visit_u128,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let mut chars = self.value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(DecodeError::Malformed {
                field: self.field.to_string(),
                message: format!(
                    "cannot convert {:?}: expected a single character",
                    self.value
                ),
            }),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_str(self.value)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_str(self.value)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_str(self.value)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("unit"))
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("unit struct"))
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("byte array"))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("byte array"))
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("sequence"))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("tuple"))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("tuple struct"))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("map"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("nested struct"))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.invalid_target("enum"))
    }
}
