//! Merged request fields and the serde `Deserializer` over them.
//!
//! Body fields arrive as JSON and are handed to `serde_json` as-is. Query and
//! path values arrive as text and are parsed on demand into whatever the
//! target field asks for, so `?limit=10` binds to a `u32` and `/comments/3`
//! binds to a `u64` without a separate schema.

use crate::error::{ExtractionError, ExtractionSource};
use serde::de::value::{SeqDeserializer, StrDeserializer, StringDeserializer};
use serde::de::{self, DeserializeSeed, Deserializer, IntoDeserializer, MapAccess, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::Value;
use std::collections::{btree_map, BTreeMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One field's value as supplied by a single source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Bound {
    /// A member of the JSON body.
    Json(Value),
    /// A single query or path value.
    Text(String),
    /// A query key given more than once.
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    origin: ExtractionSource,
    value: Bound,
}

/// The merged view of every source, keyed by field name.
#[derive(Debug, Default)]
pub(crate) struct Fields(BTreeMap<String, Slot>);

impl Fields {
    /// Sets a field, replacing whatever another source supplied.
    pub(crate) fn set(&mut self, name: String, origin: ExtractionSource, value: Bound) {
        self.0.insert(name, Slot { origin, value });
    }

    /// Sets a field only if no other source supplied it.
    pub(crate) fn set_if_absent(&mut self, name: String, origin: ExtractionSource, value: Bound) {
        self.0.entry(name).or_insert(Slot { origin, value });
    }

    #[cfg(test)]
    pub(crate) fn origin_of(&self, name: &str) -> Option<ExtractionSource> {
        self.0.get(name).map(|slot| slot.origin)
    }
}

/// Error raised while deserializing merged fields.
#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct BindError {
    message: String,
    field: Option<String>,
    origin: Option<ExtractionSource>,
    missing: bool,
}

impl BindError {
    fn multiple(count: usize) -> Self {
        de::Error::custom(format_args!("expected a single value, got {count}"))
    }

    /// Attributes the error to the first field it surfaced through.
    fn at(mut self, field: &str, origin: ExtractionSource) -> Self {
        if self.field.is_none() {
            self.field = Some(field.to_string());
            self.origin = Some(origin);
        }
        self
    }

    pub(crate) fn into_extraction_error(self) -> ExtractionError {
        match (self.field, self.origin) {
            (Some(field), _) if self.missing => ExtractionError::missing(ExtractionSource::Request, field),
            (Some(field), Some(origin)) => ExtractionError::invalid_type(origin, field, self.message),
            _ => ExtractionError::deserialization_failed(ExtractionSource::Request, self.message),
        }
    }
}

impl de::Error for BindError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self {
            message: msg.to_string(),
            field: None,
            origin: None,
            missing: false,
        }
    }

    fn missing_field(field: &'static str) -> Self {
        Self {
            message: format!("missing field `{field}`"),
            field: Some(field.to_string()),
            origin: None,
            missing: true,
        }
    }
}

fn parse_text<T>(text: &str) -> Result<T, BindError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|e| de::Error::custom(format_args!("{text:?}: {e}")))
}

fn parse_bool(text: &str) -> Result<bool, BindError> {
    match text.trim() {
        "true" | "True" | "TRUE" | "t" | "T" | "1" => Ok(true),
        "false" | "False" | "FALSE" | "f" | "F" | "0" => Ok(false),
        other => Err(de::Error::custom(format_args!("{other:?} is not a boolean"))),
    }
}

fn visit_list<'de, V: Visitor<'de>>(values: Vec<String>, visitor: V) -> Result<V::Value, BindError> {
    let mut seq = SeqDeserializer::<_, BindError>::new(values.into_iter().map(Bound::Text));
    let value = visitor.visit_seq(&mut seq)?;
    seq.end()?;
    Ok(value)
}

macro_rules! parse_scalar {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
            match self {
                Self::Json(value) => value.$method(visitor).map_err(de::Error::custom),
                Self::Text(text) => visitor.$visit(parse_text::<$ty>(&text)?),
                Self::List(values) => Err(BindError::multiple(values.len())),
            }
        }
    )*};
}

impl<'de> Deserializer<'de> for Bound {
    type Error = BindError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self {
            Self::Json(value) => value.deserialize_any(visitor).map_err(de::Error::custom),
            Self::Text(text) => visitor.visit_string(text),
            Self::List(values) => visit_list(values, visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self {
            Self::Json(value) => value.deserialize_bool(visitor).map_err(de::Error::custom),
            Self::Text(text) => visitor.visit_bool(parse_bool(&text)?),
            Self::List(values) => Err(BindError::multiple(values.len())),
        }
    }

    parse_scalar! {
        deserialize_i8 => visit_i64(i64),
        deserialize_i16 => visit_i64(i64),
        deserialize_i32 => visit_i64(i64),
        deserialize_i64 => visit_i64(i64),
        deserialize_u8 => visit_u64(u64),
        deserialize_u16 => visit_u64(u64),
        deserialize_u32 => visit_u64(u64),
        deserialize_u64 => visit_u64(u64),
        deserialize_f32 => visit_f64(f64),
        deserialize_f64 => visit_f64(f64),
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self {
            Self::Json(value) => value.deserialize_option(visitor).map_err(de::Error::custom),
            Self::Text(text) if text.is_empty() => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self {
            Self::Json(value) => value.deserialize_seq(visitor).map_err(de::Error::custom),
            Self::Text(text) => visit_list(vec![text], visitor),
            Self::List(values) => visit_list(values, visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        match self {
            Self::Json(value) => value
                .deserialize_enum(name, variants, visitor)
                .map_err(de::Error::custom),
            Self::Text(text) => {
                let variant: StringDeserializer<BindError> = text.trim().to_string().into_deserializer();
                visitor.visit_enum(variant)
            }
            Self::List(values) => Err(BindError::multiple(values.len())),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        match self {
            Self::Json(value) => value
                .deserialize_newtype_struct(name, visitor)
                .map_err(de::Error::custom),
            other => visitor.visit_newtype_struct(other),
        }
    }

    forward_to_deserialize_any! {
        i128 u128 char str string bytes byte_buf unit unit_struct
        tuple tuple_struct map struct identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, BindError> for Bound {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

struct FieldsAccess {
    iter: btree_map::IntoIter<String, Slot>,
    pending: Option<(String, Slot)>,
}

impl<'de> MapAccess<'de> for FieldsAccess {
    type Error = BindError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, BindError> {
        let Some((name, slot)) = self.iter.next() else {
            return Ok(None);
        };
        let key: StrDeserializer<'_, BindError> = name.as_str().into_deserializer();
        let key = seed.deserialize(key)?;
        self.pending = Some((name, slot));
        Ok(Some(key))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, BindError> {
        let (name, slot) = self
            .pending
            .take()
            .ok_or_else(|| <BindError as de::Error>::custom("value requested before key"))?;
        seed.deserialize(slot.value)
            .map_err(|err| err.at(&name, slot.origin))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

impl<'de> Deserializer<'de> for Fields {
    type Error = BindError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_map(FieldsAccess {
            iter: self.0.into_iter(),
            pending: None,
        })
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct enum
        identifier ignored_any
    }
}
