use crate::Value;

/// Return true if the [`Value`] counts as true in a condition.
///
/// Null, `false`, an empty sequence, an empty string and a number equal to
/// zero are falsy. Every other value is truthy, including empty mappings,
/// records and dynamic objects.
///
/// # Examples
///
/// ```
/// use stache::{is_truthy, Value};
///
/// assert!(!is_truthy(&Value::from(0)));
/// assert!(is_truthy(&Value::from(-0.1)));
/// ```
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(bool) => *bool,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::String(string) => !string.is_empty(),
        Value::Array(array) => !array.is_empty(),
        Value::Map(_) | Value::Record(_) | Value::Dynamic(_) => true,
    }
}
