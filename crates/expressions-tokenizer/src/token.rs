//! Token types produced by the tokenizer framework.

use std::fmt;

use expressions_core::Position;

/// A token from the source text.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token (empty for [`TokenKind::Eof`]).
    pub value: String,
    /// Location of the first character.
    pub position: Position,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, value: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            value: value.into(),
            position,
        }
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.position.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.position.column
    }

    /// Check kind and text at once.
    #[inline]
    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.value, self.position)
    }
}

/// Lexical categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A character no state could handle.
    Unknown,
    /// End of input; emitted once.
    Eof,
    /// End of line.
    Eol,
    /// Integer literal: `42`
    Integer,
    /// Float literal: `.5`, `1.5`, `1e10`
    Float,
    /// Integer or float when numbers are unified.
    Number,
    /// Operator or punctuation.
    Symbol,
    /// Quoted string: `'it''s'`, `"abc"`
    Quoted,
    /// Identifier.
    Word,
    /// Reserved word.
    Keyword,
    /// Run of whitespace.
    Whitespace,
    /// Comment.
    Comment,
    /// Text produced by a custom state (template literal text).
    Special,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug() {
        let token = Token::new(TokenKind::Word, "abc", Position::new(2, 5));
        assert_eq!(format!("{:?}", token), "Word(\"abc\" @ 2:5)");
        assert_eq!((token.line(), token.column()), (2, 5));
        assert!(token.is(TokenKind::Word, "abc"));
        assert!(!token.is(TokenKind::Symbol, "abc"));
    }
}
