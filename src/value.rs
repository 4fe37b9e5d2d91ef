//! The data a [`Template`][`crate::Template`] is rendered against.
//!
//! Host data arrives in many shapes. [`Value`] closes over all of them:
//!
//! - scalars: [`Value::Null`], [`Value::Bool`], [`Value::Number`], [`Value::String`],
//! - sequences: [`Value::Array`],
//! - key-value mappings whose keys may be strings or integers: [`Value::Map`],
//! - structured records with named members, such as a serialized struct: [`Value::Record`],
//! - objects answering property queries at runtime: [`Value::Dynamic`].
//!
//! Any type implementing [`serde::Serialize`] converts with [`to_value`]. Structs become
//! records, maps keep their native key kind, and sequences become arrays.
//!
//! ```
//! use serde::Serialize;
//! use stache::{to_value, Value};
//! use std::collections::BTreeMap;
//!
//! #[derive(Serialize)]
//! struct Team {
//!     name: String,
//!     scores: BTreeMap<i32, u32>,
//! }
//!
//! let mut scores = BTreeMap::new();
//! scores.insert(42, 7);
//!
//! let value = to_value(&Team { name: "red".into(), scores }).unwrap();
//! assert!(matches!(value, Value::Record(_)));
//! ```
mod format;
mod map;
mod ser;

pub use map::{Key, Map, Record};
pub use ser::Serializer;
pub use serde_json::Number;

use crate::Error;
use serde::Serialize;
use std::{borrow::Cow, fmt::Debug, sync::Arc};

/// Describes an object that answers property queries at runtime.
///
/// # Examples
///
/// ```
/// use stache::{Dynamic, Value};
///
/// #[derive(Debug)]
/// struct Env;
///
/// impl Dynamic for Env {
///     fn get(&self, name: &str) -> Option<Value> {
///         (name == "user").then(|| Value::from("taylor"))
///     }
///
///     fn keys(&self) -> Vec<String> {
///         vec!["user".into()]
///     }
/// }
///
/// let value = Value::dynamic(Env);
/// assert_eq!(value.lookup_dynamic("user"), Some(Value::from("taylor")));
/// ```
pub trait Dynamic: Debug + Send + Sync {
    /// Return the property with the given name, if any.
    fn get(&self, name: &str) -> Option<Value>;

    /// Return the names of all properties, in enumeration order.
    fn keys(&self) -> Vec<String>;
}

/// Data that can be rendered.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// An absent value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer or floating point number.
    Number(Number),
    /// A string.
    String(String),
    /// An ordered sequence.
    Array(Vec<Value>),
    /// A key-value mapping. A block headed by a plain path iterates it.
    Map(Map),
    /// A structured record with named members. A block headed by a plain
    /// path enters it.
    Record(Record),
    /// An object implementing the dynamic property protocol.
    Dynamic(Arc<dyn Dynamic>),
}

impl Value {
    /// Wrap the given [`Dynamic`] object.
    pub fn dynamic<T>(object: T) -> Self
    where
        T: Dynamic + 'static,
    {
        Value::Dynamic(Arc::new(object))
    }

    /// Return true if the [`Value`] is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Return the string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(string) => Some(string),
            _ => None,
        }
    }

    /// Return the number as `f64`, if this is a [`Value::Number`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(number) => number.as_f64(),
            _ => None,
        }
    }

    /// Return the element at the given position of a sequence.
    pub fn index_by_position(&self, position: usize) -> Option<&Value> {
        match self {
            Value::Array(array) => array.get(position),
            _ => None,
        }
    }

    /// Return the number of elements in a sequence.
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            Value::Array(array) => Some(array.len()),
            _ => None,
        }
    }

    /// Return the entry of a mapping whose key matches the given text.
    ///
    /// The text is tried against each key kind in turn: as a string, then as
    /// a 32-bit integer, then as a 64-bit integer.
    pub fn lookup_by_key(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.lookup(key),
            _ => None,
        }
    }

    /// Query a [`Value::Dynamic`] for the named property.
    pub fn lookup_dynamic(&self, name: &str) -> Option<Value> {
        match self {
            Value::Dynamic(object) => object.get(name),
            _ => None,
        }
    }

    /// Return the named member of a [`Value::Record`].
    ///
    /// An exact match is preferred, a case-insensitive match is accepted.
    pub fn lookup_member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(record) => record.lookup(name),
            _ => None,
        }
    }

    /// Return the entries of this [`Value`] in natural iteration order, as
    /// `(key, value)` pairs.
    ///
    /// Sequences use the position as key, mappings their own keys, records and
    /// dynamic objects the member names. Other values do not enumerate and
    /// return `None`.
    pub fn entries(&self) -> Option<Vec<(Value, Cow<'_, Value>)>> {
        let entries = match self {
            Value::Array(array) => array
                .iter()
                .enumerate()
                .map(|(i, item)| (Value::from(i as u64), Cow::Borrowed(item)))
                .collect(),
            Value::Map(map) => map
                .iter()
                .map(|(key, item)| (key.to_value(), Cow::Borrowed(item)))
                .collect(),
            Value::Record(record) => record
                .iter()
                .map(|(name, item)| (Value::from(name.as_str()), Cow::Borrowed(item)))
                .collect(),
            Value::Dynamic(object) => object
                .keys()
                .into_iter()
                .filter_map(|name| {
                    let item = object.get(&name)?;
                    Some((Value::String(name), Cow::Owned(item)))
                })
                .collect(),
            _ => return None,
        };

        Some(entries)
    }

    /// Return the text form of the [`Value`].
    ///
    /// [`Value::Null`] is the empty string, strings are returned as they are,
    /// everything else is formatted.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::String(string) => Cow::Borrowed(string),
            other => Cow::Owned(format::format_value(other)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Number(left), Value::Number(right)) => {
                left == right || left.as_f64() == right.as_f64()
            }
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Array(left), Value::Array(right)) => left == right,
            (Value::Map(left), Value::Map(right)) => left == right,
            (Value::Record(left), Value::Record(right)) => left == right,
            (Value::Dynamic(left), Value::Dynamic(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

/// Convert a [`Serialize`] type into a [`Value`].
///
/// # Errors
///
/// Returns an [`Error`] if the type cannot be serialized, for example when a
/// map key is neither a string nor an integer.
pub fn to_value<T>(value: &T) -> Result<Value, Error>
where
    T: Serialize + ?Sized,
{
    value.serialize(Serializer)
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value.into())
    }
}

impl From<f64> for Value {
    /// Non-finite numbers become [`Value::Null`].
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    /// JSON objects convert to string keyed [`Map`] instances, preserving
    /// their order. Like any mapping, a block headed by a plain path iterates
    /// them, and `{{#with}}` enters them.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(bool) => Value::Bool(bool),
            serde_json::Value::Number(number) => Value::Number(number),
            serde_json::Value::String(string) => Value::String(string),
            serde_json::Value::Array(array) => {
                Value::Array(array.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => {
                let mut map = Map::new();
                for (key, value) in object {
                    map.insert(key, Value::from(value));
                }
                Value::Map(map)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{to_value, Dynamic, Key, Map, Record, Value};
    use serde::Serialize;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug)]
    struct Settings;

    impl Dynamic for Settings {
        fn get(&self, name: &str) -> Option<Value> {
            match name {
                "theme" => Some(Value::from("dark")),
                "width" => Some(Value::from(120)),
                _ => None,
            }
        }

        fn keys(&self) -> Vec<String> {
            vec!["theme".into(), "width".into()]
        }
    }

    #[test]
    fn test_from_json_keeps_order() {
        let value = Value::from(json!({"b": 1, "a": 2}));
        let keys: Vec<_> = value
            .entries()
            .unwrap()
            .into_iter()
            .map(|(key, _)| key.to_text().into_owned())
            .collect();

        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_lookup_by_key_coercion() {
        let mut map = Map::new();
        map.insert(Key::I32(42), Value::from("int"));
        map.insert(Key::I64(100_000_000_000_017), Value::from("long"));
        let value = Value::Map(map);

        assert_eq!(value.lookup_by_key("42"), Some(&Value::from("int")));
        assert_eq!(
            value.lookup_by_key("100000000000017"),
            Some(&Value::from("long"))
        );
        assert_eq!(value.lookup_by_key("7"), None);
    }

    #[test]
    fn test_lookup_member_case_insensitive() {
        let mut record = Record::new();
        record.insert("Name", Value::from("exact"));
        record.insert("title", Value::from("lower"));
        let value = Value::Record(record);

        assert_eq!(value.lookup_member("Name"), Some(&Value::from("exact")));
        assert_eq!(value.lookup_member("TITLE"), Some(&Value::from("lower")));
        assert_eq!(value.lookup_member("missing"), None);
    }

    #[test]
    fn test_dynamic_entries() {
        let value = Value::dynamic(Settings);
        let entries = value.entries().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].0, Value::from("width"));
        assert_eq!(*entries[1].1, Value::from(120));
    }

    #[test]
    fn test_scalars_do_not_enumerate() {
        assert!(Value::from("text").entries().is_none());
        assert!(Value::from(3).entries().is_none());
    }

    #[test]
    fn test_to_value_struct_and_map() {
        #[derive(Serialize)]
        struct Profile {
            name: &'static str,
            ids: BTreeMap<i64, &'static str>,
            tags: Vec<&'static str>,
        }

        let mut ids = BTreeMap::new();
        ids.insert(7_i64, "seven");
        let value = to_value(&Profile {
            name: "erik",
            ids,
            tags: vec!["a", "b"],
        })
        .unwrap();

        assert_eq!(value.lookup_member("NAME"), Some(&Value::from("erik")));
        let ids = value.lookup_member("ids").unwrap();
        assert_eq!(ids.lookup_by_key("7"), Some(&Value::from("seven")));
        assert_eq!(
            value.lookup_member("tags").and_then(Value::sequence_len),
            Some(2)
        );
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::from(true).to_text(), "true");
        assert_eq!(Value::from(-0.5).to_text(), "-0.5");
        assert_eq!(Value::from(vec![1, 2]).to_text(), "[1, 2]");
    }
}
