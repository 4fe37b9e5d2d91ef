use crate::Value;
use std::fmt::{Arguments, Result, Write};

/// Wraps some underlying buffer by providing methods that write to it
/// in different formats.
///
/// Text written through [`Write`] goes to the buffer as it is. Text written
/// through [`write_escaped`][`Pipe::write_escaped`] or
/// [`write_value`][`Pipe::write_value`] is HTML escaped first.
///
/// # Examples
///
/// ```
/// use stache::{Pipe, Value};
/// use std::fmt::Write;
///
/// let mut buffer = String::new();
/// let mut pipe = Pipe::new(&mut buffer);
///
/// pipe.write_escaped("<b>").unwrap();
/// pipe.write_str("<i>").unwrap();
/// pipe.write_value(&Value::from("'q'")).unwrap();
///
/// assert_eq!(buffer, "&lt;b&gt;<i>&#x27;q&#x27;");
/// ```
pub struct Pipe<'buffer> {
    buffer: &'buffer mut (dyn Write + 'buffer),
}

impl<'buffer> Pipe<'buffer> {
    /// Create a new Pipe that writes to the given buffer.
    pub fn new<W>(buffer: &'buffer mut W) -> Self
    where
        W: Write,
    {
        Self { buffer }
    }

    /// Write the text form of the given Value, escaped.
    pub fn write_value(&mut self, value: &Value) -> Result {
        self.write_escaped(&value.to_text())
    }

    /// Write the text form of the given Value as it is.
    pub fn write_value_raw(&mut self, value: &Value) -> Result {
        self.buffer.write_str(&value.to_text())
    }

    /// Write the given text with HTML special characters replaced by
    /// their entities.
    pub fn write_escaped(&mut self, text: &str) -> Result {
        let mut last = 0;
        for (i, byte) in text.bytes().enumerate() {
            let Some(entity) = escape(byte) else {
                continue;
            };
            // Every escaped character is one ASCII byte, so `i` is a char boundary.
            self.buffer.write_str(&text[last..i])?;
            self.buffer.write_str(entity)?;
            last = i + 1;
        }

        self.buffer.write_str(&text[last..])
    }
}

/// Return the entity that replaces the given byte, if any.
fn escape(byte: u8) -> Option<&'static str> {
    let entity = match byte {
        b'&' => "&amp;",
        b'<' => "&lt;",
        b'>' => "&gt;",
        b'"' => "&quot;",
        b'\'' => "&#x27;",
        b'`' => "&#x60;",
        b'=' => "&#x3D;",
        _ => return None,
    };

    Some(entity)
}

impl Write for Pipe<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> Result {
        Write::write_str(self.buffer, s)
    }

    #[inline]
    fn write_char(&mut self, c: char) -> Result {
        Write::write_char(self.buffer, c)
    }

    #[inline]
    fn write_fmt(&mut self, args: Arguments<'_>) -> Result {
        Write::write_fmt(self.buffer, args)
    }
}

#[cfg(test)]
mod tests {
    use super::Pipe;
    use crate::Value;
    use std::fmt::Write;

    fn helper_escape(text: &str) -> String {
        let mut buffer = String::new();
        Pipe::new(&mut buffer).write_escaped(text).unwrap();
        buffer
    }

    #[test]
    fn test_escape_table() {
        assert_eq!(
            helper_escape("&<>\"'`="),
            "&amp;&lt;&gt;&quot;&#x27;&#x60;&#x3D;"
        );
    }

    #[test]
    fn test_escape_keeps_multibyte_text() {
        assert_eq!(helper_escape("héllo <wörld>"), "héllo &lt;wörld&gt;");
        assert_eq!(helper_escape("plain"), "plain");
    }

    #[test]
    fn test_raw_channel() {
        let mut buffer = String::new();
        let mut pipe = Pipe::new(&mut buffer);
        pipe.write_str("<b>").unwrap();
        pipe.write_value_raw(&Value::from(10)).unwrap();
        pipe.write_value(&Value::Null).unwrap();

        assert_eq!(buffer, "<b>10");
    }
}
