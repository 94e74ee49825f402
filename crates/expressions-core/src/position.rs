//! Source location tracking for error reporting.
//!
//! Provides [`Position`] to track where tokens and errors occur in the
//! text handed to a tokenizer.

use std::fmt;

/// A position in source text.
///
/// Tokens and errors record the line:column of their first character.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, character-based; 0 before the first character of a line).
    pub column: u32,
}

impl Position {
    /// Create a new position from a line and column.
    #[inline]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
