use crate::{
    region::Region,
    report::{ErrorKind, INVALID_PATH},
    Error,
};

/// A parsed reference into the context stack, such as `../person.[first name]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Number of `..` hops taken before the lookup begins.
    pub depth: usize,
    /// True when the path is anchored with `@root`.
    pub root: bool,
    /// Name of the iteration metadata the path begins with, such as `index`
    /// for `@index`.
    pub metadata: Option<String>,
    /// Segments looked up one after another, starting from the selected frame.
    pub segments: Vec<String>,
    /// True when the path is one plain identifier, a candidate helper name.
    pub simple: bool,
    /// Location of the path in the source text.
    pub region: Region,
}

impl Path {
    /// Return the helper name this path could refer to.
    pub fn helper_name(&self) -> Option<&str> {
        self.segments
            .first()
            .filter(|_| self.simple)
            .map(String::as_str)
    }

    /// Return the path in dotted form, such as `../person.lastname` for
    /// `../person/lastname`.
    ///
    /// Segments that contain a separator or whitespace are written as
    /// `[segment literals]`.
    pub fn dotted(&self) -> String {
        let parents = "../".repeat(self.depth);
        let mut parts = Vec::with_capacity(self.segments.len() + 1);
        if self.root {
            parts.push("@root".to_owned());
        }
        let mut text = match &self.metadata {
            Some(name) => {
                parts.push(format!("@{parents}{name}"));
                String::new()
            }
            None => parents,
        };

        for segment in &self.segments {
            if segment.chars().any(|c| is_separator(c) || c.is_whitespace()) {
                parts.push(format!("[{segment}]"));
            } else {
                parts.push(segment.clone());
            }
        }
        if parts.is_empty() {
            parts.push("this".to_owned());
        }
        text.push_str(&parts.join("."));

        text
    }

    /// Return the final segment, or the full path text when the path has no
    /// segments of its own.
    pub fn last_segment<'a>(&'a self, source: &'a str) -> &'a str {
        self.segments
            .last()
            .map_or_else(|| self.region.literal(source), String::as_str)
    }
}

/// Parse the path text found at the given [`Region`] of the source.
///
/// # Errors
///
/// Returns an [`Error`] if the path is malformed, such as `a..b` or an
/// unterminated `[segment`.
pub fn parse_path(source: &str, region: Region) -> Result<Path, Error> {
    let text = region.literal(source);
    let mut path = Path {
        depth: 0,
        root: false,
        metadata: None,
        segments: vec![],
        simple: false,
        region,
    };

    let mut rest = text;
    if let Some(data) = rest.strip_prefix('@') {
        if data == "root" || data.starts_with("root.") || data.starts_with("root/") {
            path.root = true;
            rest = &data[4..];
            rest = rest.strip_prefix(is_separator).unwrap_or(rest);
        } else {
            let (depth, data) = strip_parents(data);
            let (name, remainder) = match data.find(is_separator) {
                Some(index) => (&data[..index], &data[index + 1..]),
                None => (data, ""),
            };
            if name.is_empty() {
                return Err(error_path(source, region, "expected a name after `@`"));
            }
            path.depth = depth;
            path.metadata = Some(name.to_owned());
            rest = remainder;
        }
    } else {
        let (depth, remainder) = strip_parents(rest);
        path.depth = depth;
        rest = match remainder {
            "." | "this" => "",
            _ => remainder
                .strip_prefix("./")
                .or_else(|| remainder.strip_prefix("this."))
                .or_else(|| remainder.strip_prefix("this/"))
                .unwrap_or(remainder),
        };
    }

    path.segments = split_segments(rest).ok_or_else(|| {
        error_path(
            source,
            region,
            "segments are separated by `.` or `/`, and may not be empty",
        )
    })?;
    path.simple = !path.root
        && path.depth == 0
        && path.metadata.is_none()
        && path.segments.len() == 1
        && path.segments[0] == text;

    Ok(path)
}

/// Strip leading `../` hops, returning how many were found.
fn strip_parents(text: &str) -> (usize, &str) {
    let mut depth = 0;
    let mut rest = text;
    loop {
        if rest == ".." {
            return (depth + 1, "");
        }
        match rest.strip_prefix("../") {
            Some(remainder) => {
                depth += 1;
                rest = remainder;
            }
            None => return (depth, rest),
        }
    }
}

/// Split path text into its segments.
///
/// Returns `None` if a segment is empty or a segment literal is never closed.
fn split_segments(text: &str) -> Option<Vec<String>> {
    let mut segments = vec![];
    if text.is_empty() {
        return Some(segments);
    }

    let mut chars = text.chars().peekable();
    loop {
        let mut segment = String::new();
        if chars.peek() == Some(&'[') {
            chars.next();
            loop {
                match chars.next()? {
                    ']' => break,
                    c => segment.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if is_separator(c) {
                    break;
                }
                if c == '[' || c == ']' {
                    return None;
                }
                segment.push(c);
                chars.next();
            }
            if segment.is_empty() {
                return None;
            }
        }
        segments.push(segment);

        match chars.next() {
            None => return Some(segments),
            Some(c) if is_separator(c) && chars.peek().is_some() => continue,
            Some(_) => return None,
        }
    }
}

fn is_separator(c: char) -> bool {
    c == '.' || c == '/'
}

fn error_path(source: &str, region: Region, help: &str) -> Error {
    Error::with_kind(ErrorKind::Parse, INVALID_PATH)
        .with_pointer(source, region)
        .with_help(help)
}

#[cfg(test)]
mod tests {
    use super::{parse_path, Path};

    fn helper_parse(text: &str) -> Path {
        parse_path(text, (0..text.len()).into()).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let path = helper_parse("name");

        assert_eq!(path.segments, vec!["name"]);
        assert_eq!(path.helper_name(), Some("name"));
    }

    #[test]
    fn test_parse_dotted_and_slashed() {
        assert_eq!(helper_parse("person.name").segments, vec!["person", "name"]);
        assert_eq!(helper_parse("person/name").segments, vec!["person", "name"]);
        assert_eq!(helper_parse("person.name").helper_name(), None);
    }

    #[test]
    fn test_parse_segment_literals() {
        let path = helper_parse("[my key].[another.key].1");

        assert_eq!(path.segments, vec!["my key", "another.key", "1"]);
        assert_eq!(helper_parse("[if]").helper_name(), None);
    }

    #[test]
    fn test_parse_this() {
        assert!(helper_parse("this").segments.is_empty());
        assert!(helper_parse(".").segments.is_empty());
        assert_eq!(helper_parse("this.name").segments, vec!["name"]);
        assert_eq!(helper_parse("./name").segments, vec!["name"]);
    }

    #[test]
    fn test_parse_parents() {
        let path = helper_parse("../../name");
        assert_eq!(path.depth, 2);
        assert_eq!(path.segments, vec!["name"]);

        let path = helper_parse("../.");
        assert_eq!(path.depth, 1);
        assert!(path.segments.is_empty());

        assert_eq!(helper_parse("..").depth, 1);
    }

    #[test]
    fn test_parse_root() {
        let path = helper_parse("@root.group");

        assert!(path.root);
        assert_eq!(path.segments, vec!["group"]);
        assert!(helper_parse("@root").segments.is_empty());
    }

    #[test]
    fn test_parse_metadata() {
        let path = helper_parse("@index");
        assert_eq!(path.metadata.as_deref(), Some("index"));
        assert_eq!(path.depth, 0);

        let path = helper_parse("@../key");
        assert_eq!(path.metadata.as_deref(), Some("key"));
        assert_eq!(path.depth, 1);
    }

    #[test]
    fn test_dotted() {
        assert_eq!(helper_parse("person/lastname").dotted(), "person.lastname");
        assert_eq!(helper_parse("../a/[b c]").dotted(), "../a.[b c]");
        assert_eq!(helper_parse("@root/group").dotted(), "@root.group");
        assert_eq!(helper_parse("@../index").dotted(), "@../index");
        assert_eq!(helper_parse("this").dotted(), "this");
    }

    #[test]
    fn test_parse_invalid() {
        for text in ["a..b", "a.", "[open", "a[b]", "@"] {
            assert!(
                parse_path(text, (0..text.len()).into()).is_err(),
                "{text} should be invalid"
            );
        }
    }
}
