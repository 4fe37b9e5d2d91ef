use crate::Value;
use std::borrow::Cow;

/// Describes the position of a [`Frame`] inside of an iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    /// The key of the current entry, a position for sequences or the native
    /// key of a mapping.
    pub key: Value,
    /// Zero-based position of the current entry.
    pub index: usize,
    /// True for the first entry.
    pub first: bool,
    /// True for the last entry.
    pub last: bool,
}

impl Iteration {
    /// Create the [`Iteration`] for entry `index` of `len` entries.
    pub fn new(key: Value, index: usize, len: usize) -> Self {
        Self {
            key,
            index,
            first: index == 0,
            last: index + 1 == len,
        }
    }
}

/// One link of the context stack.
///
/// Frames borrow their parent, so a child never outlives the render step
/// that created it.
#[derive(Debug)]
pub struct Frame<'a> {
    value: &'a Value,
    parent: Option<&'a Frame<'a>>,
    iteration: Option<Iteration>,
}

impl<'a> Frame<'a> {
    /// Create the outermost [`Frame`].
    pub fn new(value: &'a Value) -> Self {
        Self {
            value,
            parent: None,
            iteration: None,
        }
    }

    /// Create a [`Frame`] enclosed by this one.
    pub fn child<'b>(&'b self, value: &'b Value) -> Frame<'b> {
        Frame {
            value,
            parent: Some(self),
            iteration: None,
        }
    }

    /// Create a [`Frame`] enclosed by this one, for one entry of an iteration.
    pub fn item<'b>(&'b self, value: &'b Value, iteration: Iteration) -> Frame<'b> {
        Frame {
            value,
            parent: Some(self),
            iteration: Some(iteration),
        }
    }

    /// Return the current value.
    #[inline]
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Return the frame `depth` links up the chain, if the chain is that long.
    pub fn ancestor(&self, depth: usize) -> Option<&Frame<'a>> {
        let mut frame = self;
        for _ in 0..depth {
            frame = frame.parent?;
        }

        Some(frame)
    }

    /// Return the outermost frame.
    pub fn root(&self) -> &Frame<'a> {
        let mut frame = self;
        while let Some(parent) = frame.parent {
            frame = parent;
        }

        frame
    }

    /// Return the iteration metadata with the given name, such as `index`.
    ///
    /// Metadata belongs to the frame itself, so it is `None` outside of an
    /// iteration.
    pub fn metadata(&self, name: &str) -> Option<Cow<'a, Value>> {
        let iteration = self.iteration.as_ref()?;
        let value = match name {
            "key" => Cow::Owned(iteration.key.clone()),
            "index" => Cow::Owned(Value::from(iteration.index as u64)),
            "first" => Cow::Owned(Value::Bool(iteration.first)),
            "last" => Cow::Owned(Value::Bool(iteration.last)),
            "value" => Cow::Borrowed(self.value),
            _ => return None,
        };

        Some(value)
    }
}
