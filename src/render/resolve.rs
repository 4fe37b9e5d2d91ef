use super::frame::Frame;
use crate::{compile::Path, Value};
use std::borrow::Cow;

/// Describes a [`Path`] that did not resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct Missing {
    /// The segment at which resolution failed.
    pub key: String,
}

/// Resolve the [`Path`] against the context stack.
///
/// The starting frame is chosen by the prefix of the path, then each segment
/// is looked up in the value found by the segment before it. The first
/// segment that does not resolve ends the walk.
pub fn resolve<'a>(path: &Path, frame: &'a Frame<'a>) -> Result<Cow<'a, Value>, Missing> {
    let start = if path.root {
        frame.root()
    } else {
        frame.ancestor(path.depth).ok_or_else(|| Missing {
            key: "..".to_owned(),
        })?
    };

    let mut value = match &path.metadata {
        Some(name) => start.metadata(name).ok_or_else(|| Missing {
            key: format!("@{name}"),
        })?,
        None => Cow::Borrowed(start.value()),
    };

    for segment in &path.segments {
        value = resolve_segment(value, segment).ok_or_else(|| Missing {
            key: segment.clone(),
        })?;
    }

    Ok(value)
}

/// Look up one segment inside the given value.
///
/// Values owned by the caller, such as properties computed by a dynamic
/// object, stay owned through the lookup.
pub fn resolve_segment<'a>(value: Cow<'a, Value>, segment: &str) -> Option<Cow<'a, Value>> {
    match value {
        Cow::Borrowed(value) => lookup(value, segment),
        Cow::Owned(value) => lookup(&value, segment).map(|found| Cow::Owned(found.into_owned())),
    }
}

/// Try each capability of the value in turn.
fn lookup<'v>(value: &'v Value, segment: &str) -> Option<Cow<'v, Value>> {
    if let Some(item) = segment
        .parse::<usize>()
        .ok()
        .and_then(|position| value.index_by_position(position))
    {
        return Some(Cow::Borrowed(item));
    }
    if let Some(item) = value.lookup_by_key(segment) {
        return Some(Cow::Borrowed(item));
    }
    if let Some(item) = value.lookup_dynamic(segment) {
        return Some(Cow::Owned(item));
    }
    if let Some(item) = value.lookup_member(segment) {
        return Some(Cow::Borrowed(item));
    }
    if segment.eq_ignore_ascii_case("length") || segment.eq_ignore_ascii_case("count") {
        return value
            .sequence_len()
            .map(|len| Cow::Owned(Value::from(len as u64)));
    }

    None
}
