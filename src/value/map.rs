use super::Value;
use indexmap::IndexMap;
use std::fmt::Display;

/// Key of a [`Map`] entry, keeping the native key kind of the host data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    String(String),
    I32(i32),
    I64(i64),
}

impl Key {
    /// Return the key as a [`Value`], numbers stay numbers.
    pub fn to_value(&self) -> Value {
        match self {
            Key::String(string) => Value::String(string.clone()),
            Key::I32(int) => Value::from(*int),
            Key::I64(int) => Value::from(*int),
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::String(string) => write!(f, "{string}"),
            Key::I32(int) => write!(f, "{int}"),
            Key::I64(int) => write!(f, "{int}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::I32(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::I64(value)
    }
}

/// An insertion ordered key-value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    entries: IndexMap<Key, Value>,
}

impl Map {
    /// Create a new, empty [`Map`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous value with the same key.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<Value>
    where
        K: Into<Key>,
        V: Into<Value>,
    {
        self.entries.insert(key.into(), value.into())
    }

    /// Insert an entry.
    ///
    /// Returns the [`Map`], so additional methods may be chained.
    #[inline]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
    {
        self.insert(key, value);
        self
    }

    /// Return the value stored under exactly this key.
    #[inline]
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Return the value whose key matches the given text, trying the text as
    /// a string key, then a 32-bit integer key, then a 64-bit integer key.
    pub fn lookup(&self, text: &str) -> Option<&Value> {
        if let Some(value) = self.entries.get(&Key::from(text)) {
            return Some(value);
        }
        if let Some(value) = text
            .parse::<i32>()
            .ok()
            .and_then(|int| self.entries.get(&Key::I32(int)))
        {
            return Some(value);
        }

        text.parse::<i64>()
            .ok()
            .and_then(|int| self.entries.get(&Key::I64(int)))
    }

    /// Return the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if the [`Map`] has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter()
    }
}

/// A structured record, such as a serialized struct.
///
/// Members keep their declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create a new, empty [`Record`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member, replacing any previous member with the same name.
    pub fn insert<K, V>(&mut self, name: K, value: V) -> Option<Value>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(name.into(), value.into())
    }

    /// Insert a member.
    ///
    /// Returns the [`Record`], so additional methods may be chained.
    #[inline]
    pub fn with<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.insert(name, value);
        self
    }

    /// Return the member with exactly this name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Return the member with this name, falling back to the first member
    /// whose name matches ignoring case.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).or_else(|| {
            self.fields
                .iter()
                .find(|(field, _)| field.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Return the number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Return true if the [`Record`] has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate the members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Key, Map, Record};
    use crate::Value;

    #[test]
    fn test_map_string_key_is_exact() {
        let map = Map::new().with("Foo", "x");

        assert!(map.lookup("Foo").is_some());
        assert!(map.lookup("foo").is_none());
    }

    #[test]
    fn test_map_string_key_wins_over_int() {
        let map = Map::new().with(Key::I32(1), "int").with("1", "string");

        assert_eq!(map.lookup("1"), Some(&Value::from("string")));
    }

    #[test]
    fn test_record_overwrite() {
        let mut record = Record::new().with("a", 1);
        record.insert("a", 2);

        assert_eq!(record.len(), 1);
        assert_eq!(record.get("a"), Some(&Value::from(2)));
    }
}
