//! Declared-field discovery for whitelist checks.
//!
//! A derived `Deserialize` impl for a struct hands its field list to
//! `Deserializer::deserialize_struct`. Driving it with a deserializer that
//! records that list and then bails out gives us the declared properties
//! without any extra trait on the payload type.

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::forward_to_deserialize_any;

#[derive(Debug)]
struct Stop;

impl std::fmt::Display for Stop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("field introspection")
    }
}

impl std::error::Error for Stop {}

impl de::Error for Stop {
    fn custom<T: std::fmt::Display>(_msg: T) -> Self {
        Stop
    }
}

struct FieldNames<'a> {
    found: &'a mut Option<&'static [&'static str]>,
}

impl<'de, 'a> Deserializer<'de> for FieldNames<'a> {
    type Error = Stop;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Stop> {
        Err(Stop)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Stop> {
        *self.found = Some(fields);
        Err(Stop)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

/// Wire names of the properties `T` declares, if `T` is a plain struct.
///
/// Returns `None` for maps, enums and structs using `#[serde(flatten)]`,
/// which do not expose a fixed field list.
pub fn declared_fields<T>() -> Option<&'static [&'static str]>
where
    T: for<'de> Deserialize<'de>,
{
    let mut found = None;
    let _ = T::deserialize(FieldNames { found: &mut found });
    found
}
