use std::{
    cmp::{max, min},
    ops::Range,
};

/// Represents an area within source text.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct Region {
    /// The beginning of the range, inclusive.
    pub begin: usize,
    /// The ending of the range, exclusive.
    pub end: usize,
}

impl Region {
    /// Create a new Region from the given range.
    pub fn new(position: Range<usize>) -> Self {
        Self {
            begin: position.start,
            end: position.end,
        }
    }

    /// Combine will merge the indices of two [`Region`] instances.
    pub fn combine(self, other: Self) -> Self {
        Self {
            begin: min(self.begin, other.begin),
            end: max(self.end, other.end),
        }
    }

    /// Return true if the [`Region`] covers no text.
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Access the literal value of a [`Region`].
    ///
    /// A `Region` that does not fit the source yields an empty string.
    pub fn literal<'source>(&self, source: &'source str) -> &'source str {
        source.get(self.begin..self.end).unwrap_or_default()
    }
}

impl From<Range<usize>> for Region {
    fn from(value: Range<usize>) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine() {
        let combined = Region::new(5..10).combine(Region::new(8..15));

        assert_eq!(combined.begin, 5);
        assert_eq!(combined.end, 15);
    }

    #[test]
    fn test_literal() {
        let source = "Hello, {{name}}!";

        assert_eq!(Region::new(9..13).literal(source), "name");
        assert_eq!(Region::new(9..40).literal(source), "");
    }

    #[test]
    fn test_is_empty() {
        assert!(Region::new(4..4).is_empty());
        assert!(!Region::new(4..5).is_empty());
    }
}
