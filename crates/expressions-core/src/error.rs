//! Unified error types for tokenizing, parsing and evaluating.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ExpressionsError (top-level wrapper)
//! ├── TokenizerError  - lexical errors (unterminated quote/comment, bad number)
//! ├── SyntaxError     - expression and template structure errors (with SyntaxErrorKind)
//! ├── EvaluationError - errors raised while evaluating or rendering
//! └── InternalError   - malformed postfix stream; a parser defect, not bad input
//! ```
//!
//! Each category can be handled directly or converted into
//! [`ExpressionsError`] with `?`.

use std::fmt;

use thiserror::Error;

use crate::ops::Operation;
use crate::variant::VariantKind;
use crate::Position;

// ============================================================================
// Tokenizer Errors
// ============================================================================

/// Errors that occur during lexical analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TokenizerError {
    /// A quoted string reached the end of input before its closing quote.
    #[error("unterminated quote at {position}")]
    UnterminatedQuote { position: Position },

    /// A block comment reached the end of input before `*/`.
    #[error("unterminated comment at {position}")]
    UnterminatedComment { position: Position },

    /// A numeric literal could not be represented.
    #[error("invalid number '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },

    /// A state wanted to delegate to the symbol state but none is configured.
    #[error("tokenizer has no symbol state to fall back to at {position}")]
    MissingSymbolState { position: Position },
}

impl TokenizerError {
    /// Get the position where this error occurred.
    pub fn position(&self) -> Position {
        match self {
            TokenizerError::UnterminatedQuote { position } => *position,
            TokenizerError::UnterminatedComment { position } => *position,
            TokenizerError::InvalidNumber { position, .. } => *position,
            TokenizerError::MissingSymbolState { position } => *position,
        }
    }
}

// ============================================================================
// Syntax Errors
// ============================================================================

/// Categories of syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    /// Input ended in the middle of a construct.
    UnexpectedEnd,
    /// A symbol that is not an operator of the language.
    UnknownSymbol,
    /// A token that cannot appear at this point.
    UnexpectedToken,
    /// A `(` without its `)`.
    MissingCloseParenthesis,
    /// A `[` without its `]`.
    MissingCloseBracket,
    /// A comma outside of a function argument list.
    MisplacedComma,
    /// Two operands with no operator between them.
    MissingOperator,
    /// A `{{` closed by `}}}` or a `{{{` closed by `}}`.
    MismatchedBrackets,
    /// A section end that does not match the open section, or an unclosed section.
    SectionMismatch,
    /// Parentheses, brackets or prefix operators nested past the parser's limit.
    NestingTooDeep,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyntaxErrorKind::UnexpectedEnd => "unexpected end of input",
            SyntaxErrorKind::UnknownSymbol => "unknown symbol",
            SyntaxErrorKind::UnexpectedToken => "unexpected token",
            SyntaxErrorKind::MissingCloseParenthesis => "missing ')'",
            SyntaxErrorKind::MissingCloseBracket => "missing ']'",
            SyntaxErrorKind::MisplacedComma => "misplaced comma",
            SyntaxErrorKind::MissingOperator => "missing operator",
            SyntaxErrorKind::MismatchedBrackets => "mismatched brackets",
            SyntaxErrorKind::SectionMismatch => "section mismatch",
            SyntaxErrorKind::NestingTooDeep => "nesting too deep",
        };
        write!(f, "{}", s)
    }
}

/// A syntax error with location and diagnostic information.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    /// The type of error that occurred.
    pub kind: SyntaxErrorKind,
    /// The location of the offending token.
    pub position: Position,
    /// Additional context.
    pub message: String,
}

impl SyntaxError {
    /// Create a new syntax error.
    pub fn new(kind: SyntaxErrorKind, position: Position, message: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Errors raised while evaluating an expression or rendering a template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// A variable was referenced but never given a value.
    #[error("variable '{name}' at {position} is not set")]
    UnresolvedVariable { name: String, position: Position },

    /// A function name is not registered.
    #[error("function '{name}' at {position} is not defined")]
    UnknownFunction { name: String, position: Position },

    /// Operand kinds are not compatible with an operation.
    #[error("cannot apply '{operation}' to {left} and {right}")]
    TypeMismatch {
        operation: Operation,
        left: VariantKind,
        right: VariantKind,
    },

    /// An operation is not defined for a kind.
    #[error("operation '{operation}' is not supported for {kind}")]
    UnsupportedOperation { operation: Operation, kind: VariantKind },

    /// A value could not be converted to another kind.
    #[error("cannot convert {from} to {to}: {detail}")]
    ConversionFailed {
        from: VariantKind,
        to: VariantKind,
        detail: String,
    },

    /// An index is outside of the indexed value.
    #[error("index {index} is out of range for length {length}")]
    IndexOutOfRange { index: i64, length: usize },

    /// An index is not an integer.
    #[error("index must be an integer, got {kind}")]
    NonIntegerIndex { kind: VariantKind },

    /// A function was called with the wrong number of arguments.
    #[error("function '{function}' expects {expected} argument(s), got {found}")]
    WrongParamCount {
        function: String,
        expected: String,
        found: usize,
    },

    /// A function argument has an unusable value.
    #[error("invalid argument for '{function}': {detail}")]
    InvalidArgument { function: String, detail: String },

    /// Integer division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Checked integer arithmetic overflowed.
    #[error("arithmetic overflow in '{operation}'")]
    Overflow { operation: Operation },

    /// A template referenced a partial.
    #[error("partial '{name}' at {position} is not supported")]
    PartialsNotSupported { name: String, position: Position },
}

// ============================================================================
// Internal Errors
// ============================================================================

/// A malformed postfix stream.
///
/// Indicates a defect in the parser rather than bad input; callers should
/// report it instead of retrying.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("internal error at {position}: {message}")]
pub struct InternalError {
    pub position: Position,
    pub message: String,
}

impl InternalError {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Top-level error covering every phase.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionsError {
    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("{0}")]
    Internal(#[from] InternalError),
}

impl ExpressionsError {
    /// Whether this error indicates a defect rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, ExpressionsError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_error_display() {
        let err = TokenizerError::UnterminatedQuote {
            position: Position::new(2, 7),
        };
        assert_eq!(err.to_string(), "unterminated quote at 2:7");
        assert_eq!(err.position(), Position::new(2, 7));
    }

    #[test]
    fn syntax_error_display() {
        let err = SyntaxError::new(SyntaxErrorKind::MisplacedComma, Position::new(1, 4), "");
        assert_eq!(err.to_string(), "misplaced comma at 1:4");

        let err = SyntaxError::new(SyntaxErrorKind::UnknownSymbol, Position::new(1, 1), "'@'");
        assert_eq!(err.to_string(), "unknown symbol at 1:1: '@'");
    }

    #[test]
    fn evaluation_error_display() {
        let err = EvaluationError::TypeMismatch {
            operation: Operation::Add,
            left: VariantKind::Integer,
            right: VariantKind::String,
        };
        assert_eq!(err.to_string(), "cannot apply '+' to Integer and String");
    }

    #[test]
    fn unified_error_from() {
        let err: ExpressionsError =
            InternalError::new(Position::new(1, 1), "stack underflow").into();
        assert!(err.is_internal());

        let err: ExpressionsError = EvaluationError::DivisionByZero.into();
        assert!(!err.is_internal());
        assert_eq!(err.to_string(), "evaluation error: division by zero");
    }
}
