use rust_decimal::Decimal;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::{SerializeMap, SerializeSeq},
};
use std::collections::BTreeMap;
use std::fmt;
use time::{
    Date, Duration, OffsetDateTime,
    format_description::well_known::Rfc3339,
    macros::format_description,
};
use uuid::Uuid;

/// Calendar-date wire format shared by the date scalar plumbing.
pub(crate) const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

///
/// Value
///
/// Generic nested-value representation exchanged with the wire layer.
///
/// Null        → the attribute's value is absent-as-data (i.e. JSON null).
/// Map         → textual keys only; entries are kept in canonical key order.
///
/// List order is preserved; container semantics (set/unique) are applied by
/// the composite fields, not by the value tree itself.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Date(Date),
    DateTime(OffsetDateTime),
    Decimal(Decimal),
    Duration(Duration),
    Float(f64),
    Int(i64),
    List(Vec<Self>),
    Map(BTreeMap<String, Self>),
    Null,
    Text(String),
    Uint(u64),
    Uuid(Uuid),
}

impl Value {
    ///
    /// CONSTRUCTION
    ///

    /// Build a `Value::List` from owned items.
    ///
    /// This is the canonical constructor for wire / fixture boundaries.
    pub fn from_list<T>(items: Vec<T>) -> Self
    where
        T: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a `Value::Map` from owned key/value entries.
    ///
    /// Later duplicate keys overwrite earlier ones; entries end up in
    /// canonical key order.
    pub fn from_entries<K, V>(entries: Vec<(K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    ///
    /// TYPES
    ///

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Map(_) | Self::Null)
    }

    /// Stable lowercase label used in validation messages.
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Decimal(_) => "decimal",
            Self::Duration(_) => "duration",
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Null => "null",
            Self::Text(_) => "str",
            Self::Uint(_) => "uint",
            Self::Uuid(_) => "uuid",
        }
    }

    ///
    /// CONVERSION
    ///

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(b) = self { Some(*b) } else { None }
    }

    /// Signed view over both integer variants.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Uint(u) if *u <= i64::MAX as u64 => Some(*u as i64),
            _ => None,
        }
    }

    /// Unsigned view over both integer variants.
    #[must_use]
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(u) => Some(*u),
            Self::Int(i) if *i >= 0 => Some(*i as u64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_text(&self) -> Option<&str> {
        if let Self::Text(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&[Self]> {
        if let Self::List(xs) = self {
            Some(xs.as_slice())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        if let Self::Map(entries) = self {
            Some(entries)
        } else {
            None
        }
    }

    #[must_use]
    pub fn into_map(self) -> Option<BTreeMap<String, Self>> {
        if let Self::Map(entries) = self {
            Some(entries)
        } else {
            None
        }
    }
}

#[macro_export]
macro_rules! impl_value_from_for {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from_for! {
    bool       => Bool,
    Date       => Date,
    Decimal    => Decimal,
    Duration   => Duration,
    f32        => Float,
    f64        => Float,
    i8         => Int,
    i16        => Int,
    i32        => Int,
    i64        => Int,
    OffsetDateTime => DateTime,
    &str       => Text,
    String     => Text,
    u8         => Uint,
    u16        => Uint,
    u32        => Uint,
    u64        => Uint,
    Uuid       => Uuid,
}

impl From<Vec<Self>> for Value {
    fn from(vec: Vec<Self>) -> Self {
        Self::List(vec)
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(entries: BTreeMap<String, Self>) -> Self {
        Self::Map(entries)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

// Wire-facing serde: the tree serializes to its natural nested form rather
// than an externally-tagged enum. Typed scalars render as their canonical
// text forms; encoded output only ever contains wire primitives anyway.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Date(d) => {
                let text = d
                    .format(DATE_FORMAT)
                    .map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&text)
            }
            Self::DateTime(dt) => {
                let text = dt.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&text)
            }
            Self::Decimal(d) => serializer.serialize_str(&d.to_string()),
            Self::Duration(d) => serializer.serialize_i64(d.whole_seconds()),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Null => serializer.serialize_unit(),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Uint(u) => serializer.serialize_u64(*u),
            Self::Uuid(u) => serializer.serialize_str(&u.to_string()),
        }
    }
}

// Deserialization targets the wire subset only: numbers, strings, booleans,
// null, sequences and mappings. Typed scalars are produced by field decoding,
// never by serde.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a wire value (null, bool, number, string, sequence or mapping)")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
                Ok(Value::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
                Ok(i64::try_from(v).map_or(Value::Uint(v), Value::Int))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
                Ok(Value::Float(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
                Ok(Value::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
                Ok(Value::Text(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
                Value::deserialize(d)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::List(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    entries.insert(key, value);
                }
                Ok(Value::Map(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
