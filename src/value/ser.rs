use super::{Key, Map, Number, Record, Value};
use crate::{report::ErrorKind, Error};
use serde::ser::{self, Impossible, Serialize};
use std::fmt::Display;

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::with_kind(ErrorKind::Serialize, msg.to_string())
    }
}

/// A [`serde::Serializer`] whose output is a [`Value`].
///
/// Structs serialize to [`Value::Record`], maps to [`Value::Map`] with
/// string, 32-bit or 64-bit integer keys, sequences and tuples to
/// [`Value::Array`].
pub struct Serializer;

impl ser::Serializer for Serializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeArray;
    type SerializeTuple = SerializeArray;
    type SerializeTupleStruct = SerializeArray;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeRecord;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value, Error> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, Error> {
        self.serialize_i64(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<Value, Error> {
        self.serialize_i64(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<Value, Error> {
        self.serialize_i64(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<Value, Error> {
        Ok(Value::Number(v.into()))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, Error> {
        self.serialize_u64(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<Value, Error> {
        self.serialize_u64(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<Value, Error> {
        self.serialize_u64(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<Value, Error> {
        Ok(Value::Number(v.into()))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, Error> {
        self.serialize_f64(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<Value, Error> {
        Ok(Number::from_f64(v).map_or(Value::Null, Value::Number))
    }

    fn serialize_char(self, v: char) -> Result<Value, Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, Error> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, Error> {
        Ok(Value::Array(v.iter().map(|b| Value::from(u64::from(*b))).collect()))
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value, Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value, Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error>
    where
        T: Serialize + ?Sized,
    {
        let mut record = Record::new();
        record.insert(variant, value.serialize(Serializer)?);
        Ok(Value::Record(record))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeArray, Error> {
        Ok(SerializeArray {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeArray, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeArray, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant, Error> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap, Error> {
        Ok(SerializeMap {
            map: Map::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeRecord, Error> {
        Ok(SerializeRecord {
            record: Record::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeStructVariant, Error> {
        Ok(SerializeStructVariant {
            variant,
            record: Record::new(),
        })
    }
}

pub struct SerializeArray {
    items: Vec<Value>,
}

impl ser::SerializeSeq for SerializeArray {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        self.items.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SerializeArray {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeArray {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, Error> {
        ser::SerializeSeq::end(self)
    }
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        self.items.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        let mut record = Record::new();
        record.insert(self.variant, Value::Array(self.items));
        Ok(Value::Record(record))
    }
}

pub struct SerializeMap {
    map: Map,
    next_key: Option<Key>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        self.next_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| <Error as ser::Error>::custom("map value serialized before its key"))?;
        self.map.insert(key, value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Map(self.map))
    }
}

pub struct SerializeRecord {
    record: Record,
}

impl ser::SerializeStruct for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        self.record.insert(key, value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Record(self.record))
    }
}

pub struct SerializeStructVariant {
    variant: &'static str,
    record: Record,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: Serialize + ?Sized,
    {
        self.record.insert(key, value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        let mut outer = Record::new();
        outer.insert(self.variant, Value::Record(self.record));
        Ok(Value::Record(outer))
    }
}

/// Serializes map keys, which must be strings or integers.
struct KeySerializer;

fn key_error() -> Error {
    <Error as ser::Error>::custom("map key must be a string or an integer")
}

impl ser::Serializer for KeySerializer {
    type Ok = Key;
    type Error = Error;

    type SerializeSeq = Impossible<Key, Error>;
    type SerializeTuple = Impossible<Key, Error>;
    type SerializeTupleStruct = Impossible<Key, Error>;
    type SerializeTupleVariant = Impossible<Key, Error>;
    type SerializeMap = Impossible<Key, Error>;
    type SerializeStruct = Impossible<Key, Error>;
    type SerializeStructVariant = Impossible<Key, Error>;

    fn serialize_bool(self, v: bool) -> Result<Key, Error> {
        Ok(Key::String(v.to_string()))
    }

    fn serialize_i8(self, v: i8) -> Result<Key, Error> {
        Ok(Key::I32(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Key, Error> {
        Ok(Key::I32(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Key, Error> {
        Ok(Key::I32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Key, Error> {
        Ok(Key::I64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Key, Error> {
        Ok(Key::I32(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Key, Error> {
        Ok(Key::I32(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Key, Error> {
        Ok(Key::I64(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Key, Error> {
        Ok(i64::try_from(v).map_or_else(|_| Key::String(v.to_string()), Key::I64))
    }

    fn serialize_f32(self, v: f32) -> Result<Key, Error> {
        Ok(Key::String(v.to_string()))
    }

    fn serialize_f64(self, v: f64) -> Result<Key, Error> {
        Ok(Key::String(v.to_string()))
    }

    fn serialize_char(self, v: char) -> Result<Key, Error> {
        Ok(Key::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Key, Error> {
        Ok(Key::String(v.to_owned()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Key, Error> {
        Err(key_error())
    }

    fn serialize_none(self) -> Result<Key, Error> {
        Err(key_error())
    }

    fn serialize_some<T>(self, value: &T) -> Result<Key, Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Key, Error> {
        Err(key_error())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Key, Error> {
        Err(key_error())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Key, Error> {
        Ok(Key::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Key, Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Key, Error>
    where
        T: Serialize + ?Sized,
    {
        Err(key_error())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Error> {
        Err(key_error())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Error> {
        Err(key_error())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Error> {
        Err(key_error())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Error> {
        Err(key_error())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Error> {
        Err(key_error())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Error> {
        Err(key_error())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Error> {
        Err(key_error())
    }
}

#[cfg(test)]
mod tests {
    use crate::{to_value, report::ErrorKind, Key, Value};
    use serde::Serialize;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize)]
    enum Shape {
        Dot,
        Circle { radius: u32 },
        Pair(u8, u8),
    }

    #[test]
    fn test_int_keys_keep_kind() {
        let mut ints = BTreeMap::new();
        ints.insert(42_i32, "hello");
        let mut longs = BTreeMap::new();
        longs.insert(100_000_000_000_017_i64, "world");

        let Value::Map(ints) = to_value(&ints).unwrap() else {
            panic!("expected a map");
        };
        let Value::Map(longs) = to_value(&longs).unwrap() else {
            panic!("expected a map");
        };

        assert!(ints.get(&Key::I32(42)).is_some());
        assert!(longs.get(&Key::I64(100_000_000_000_017)).is_some());
    }

    #[test]
    fn test_enum_variants() {
        assert_eq!(to_value(&Shape::Dot).unwrap(), Value::from("Dot"));

        let circle = to_value(&Shape::Circle { radius: 3 }).unwrap();
        let radius = circle
            .lookup_member("Circle")
            .and_then(|inner| inner.lookup_member("radius"));
        assert_eq!(radius, Some(&Value::from(3_u64)));

        let pair = to_value(&Shape::Pair(1, 2)).unwrap();
        assert_eq!(
            pair.lookup_member("Pair").and_then(Value::sequence_len),
            Some(2)
        );
    }

    #[test]
    fn test_unsupported_key() {
        let mut map = HashMap::new();
        map.insert(vec![1], "nope");

        let error = to_value(&map).unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::Serialize);
    }

    #[test]
    fn test_nan_is_null() {
        assert_eq!(to_value(&f64::NAN).unwrap(), Value::Null);
    }
}
