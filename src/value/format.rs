use super::Value;
use std::fmt::{Result, Write};

/// Return the text form of a non-string [`Value`].
pub(super) fn format_value(value: &Value) -> String {
    let mut buffer = String::new();
    // Writing into a String does not fail.
    let _ = write_value(&mut buffer, value);
    buffer
}

/// Write the given [`Value`] to the buffer.
///
/// Sequences are written as a comma separated list surrounded by brackets,
/// mappings and records as key/value pairs surrounded by curly braces.
fn write_value(buffer: &mut dyn Write, value: &Value) -> Result {
    match value {
        Value::Null => write!(buffer, "null"),
        Value::Bool(bool) => write!(buffer, "{bool}"),
        Value::Number(number) => write!(buffer, "{number}"),
        Value::String(string) => write!(buffer, "{string}"),
        Value::Array(array) => {
            write!(buffer, "[")?;
            let mut iter = array.iter();
            if let Some(item) = iter.next() {
                write_value(buffer, item)?;
                for item in iter {
                    write!(buffer, ", ")?;
                    write_value(buffer, item)?;
                }
            }
            write!(buffer, "]")
        }
        Value::Map(map) => write_pairs(
            buffer,
            map.iter().map(|(key, value)| (key.to_string(), value)),
        ),
        Value::Record(record) => write_pairs(
            buffer,
            record.iter().map(|(name, value)| (name.clone(), value)),
        ),
        Value::Dynamic(object) => {
            let values: Vec<_> = object
                .keys()
                .into_iter()
                .filter_map(|name| object.get(&name).map(|value| (name, value)))
                .collect();
            write_pairs(buffer, values.iter().map(|(name, value)| (name.clone(), value)))
        }
    }
}

fn write_pairs<'a, I>(buffer: &mut dyn Write, mut pairs: I) -> Result
where
    I: Iterator<Item = (String, &'a Value)>,
{
    write!(buffer, "{{")?;
    if let Some((key, value)) = pairs.next() {
        write!(buffer, "{key}: ")?;
        write_value(buffer, value)?;
        for (key, value) in pairs {
            write!(buffer, ", {key}: ")?;
            write_value(buffer, value)?;
        }
    }
    write!(buffer, "}}")
}
