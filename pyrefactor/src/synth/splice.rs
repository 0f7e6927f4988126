//! Byte-range splicing.
//!
//! An [`Edit`] replaces one byte range of the source. Everything outside the
//! range is copied unchanged.
//!
//! ```
//! use pyrefactor::synth::{splice, Edit};
//! use ruff_text_size::TextRange;
//!
//! let range = TextRange::new(6.into(), 17.into());
//! assert_eq!(splice("TAU = 3.14 + 3.14", range, "6.28").unwrap(), "TAU = 6.28");
//! assert_eq!(Edit::insert(0, "# hi\n").apply("x\n").unwrap(), "# hi\nx\n");
//! ```

use crate::error::UnparseError;
use ruff_text_size::TextRange;

/// A single edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start byte offset (inclusive)
    pub start_byte: usize,
    /// End byte offset (exclusive)
    pub end_byte: usize,
    /// Replacement content
    pub replacement: String,
}

impl Edit {
    /// Create a new edit
    #[must_use]
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    /// Replace the text covered by `range`
    #[must_use]
    pub fn replace(range: TextRange, replacement: impl Into<String>) -> Self {
        Self::new(range.start().to_usize(), range.end().to_usize(), replacement)
    }

    /// Create a deletion edit
    #[must_use]
    pub fn delete(start_byte: usize, end_byte: usize) -> Self {
        Self::new(start_byte, end_byte, "")
    }

    /// Create an insertion edit (insert before position)
    #[must_use]
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self::new(position, position, content)
    }

    /// Check the edit against `source` without applying it
    ///
    /// # Errors
    /// Returns error if the range is reversed, out of bounds, or splits a
    /// character
    pub fn validate(&self, source: &str) -> Result<(), UnparseError> {
        if self.start_byte > self.end_byte || self.end_byte > source.len() {
            return Err(UnparseError::OutOfBounds {
                start: self.start_byte,
                end: self.end_byte,
                len: source.len(),
            });
        }
        for offset in [self.start_byte, self.end_byte] {
            if !source.is_char_boundary(offset) {
                return Err(UnparseError::NotCharBoundary(offset));
            }
        }
        Ok(())
    }

    /// Apply the edit and return the modified source
    ///
    /// # Errors
    /// Returns error if the edit does not fit `source`
    pub fn apply(&self, source: &str) -> Result<String, UnparseError> {
        self.validate(source)?;
        let mut result = String::with_capacity(
            source.len() - (self.end_byte - self.start_byte) + self.replacement.len(),
        );
        result.push_str(&source[..self.start_byte]);
        result.push_str(&self.replacement);
        result.push_str(&source[self.end_byte..]);
        Ok(result)
    }
}

/// Replaces exactly `range` of `source` with `text`.
///
/// # Errors
/// Returns error if `range` does not fit `source`
pub fn splice(source: &str, range: TextRange, text: &str) -> Result<String, UnparseError> {
    Edit::replace(range, text).apply(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_replacement() {
        let result = Edit::new(0, 5, "hi").apply("hello world").unwrap();
        assert_eq!(result, "hi world");
    }

    #[test]
    fn test_out_of_bounds_error() {
        let result = Edit::new(0, 100, "long").apply("short");
        assert!(matches!(result, Err(UnparseError::OutOfBounds { .. })));
        let reversed = Edit::new(3, 1, "").apply("short");
        assert!(matches!(reversed, Err(UnparseError::OutOfBounds { .. })));
    }

    #[test]
    fn test_char_boundary_error() {
        let result = Edit::new(1, 2, "x").apply("é");
        assert_eq!(result, Err(UnparseError::NotCharBoundary(1)));
    }

    #[test]
    fn test_deletion_and_insertion() {
        assert_eq!(Edit::delete(5, 11).apply("hello world").unwrap(), "hello");
        assert_eq!(
            Edit::insert(5, " beautiful").apply("hello world").unwrap(),
            "hello beautiful world"
        );
    }

    #[test]
    fn test_preserves_surrounding_text() {
        let source = "def foo():\n    # important comment\n    return 42  # answer\n";
        let pos = source.find("42").unwrap();
        let range = TextRange::new(
            u32::try_from(pos).unwrap().into(),
            u32::try_from(pos + 2).unwrap().into(),
        );
        let result = splice(source, range, "100").unwrap();
        assert_eq!(result, "def foo():\n    # important comment\n    return 100  # answer\n");
        assert_eq!(&result[..pos], &source[..pos]);
        assert_eq!(&result[pos + 3..], &source[pos + 2..]);
    }
}
