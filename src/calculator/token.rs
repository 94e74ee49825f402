//! Tokens of the expression language.

use std::fmt;

use expressions_core::{Position, Variant};

/// Kinds of expression tokens.
///
/// The lexed stream uses the bracket, comma and keyword kinds; the postfix
/// stream produced by the parser never contains them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionTokenKind {
    /// `(`
    LeftBrace,
    /// `)`
    RightBrace,
    /// `[`
    LeftSquareBrace,
    /// `]`
    RightSquareBrace,
    /// `,`
    Comma,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Procent,
    /// `^`
    Power,
    /// `=`
    Equal,
    /// `<>` or `!=`
    NotEqual,
    /// `>`
    More,
    /// `<`
    Less,
    /// `>=`
    EqualMore,
    /// `<=`
    EqualLess,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `XOR`
    Xor,
    /// `NOT`
    Not,
    /// `IS` (lexed only; folded into `IsNull`/`IsNotNull`)
    Is,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
    /// Prefix minus.
    Unary,
    /// Indexing: pops the index, then the indexed value.
    Element,
    /// Literal value.
    Constant,
    /// Variable reference; the value holds the name.
    Variable,
    /// Function call; the value holds the name, the argument count is the
    /// constant right before it.
    Function,
}

impl ExpressionTokenKind {
    /// Whether a token of this kind begins an operand.
    pub fn starts_operand(self) -> bool {
        use ExpressionTokenKind::*;
        matches!(self, LeftBrace | Constant | Variable | Function | Not | Minus | Plus)
    }
}

/// A lexed or postfix expression token.
#[derive(Clone, PartialEq)]
pub struct ExpressionToken {
    pub kind: ExpressionTokenKind,
    /// Literal value, identifier name, or Null for operators.
    pub value: Variant,
    pub position: Position,
}

impl ExpressionToken {
    #[inline]
    pub fn new(kind: ExpressionTokenKind, value: Variant, position: Position) -> Self {
        Self {
            kind,
            value,
            position,
        }
    }

    /// An operator token without a value.
    #[inline]
    pub fn operator(kind: ExpressionTokenKind, position: Position) -> Self {
        Self::new(kind, Variant::Null, position)
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.position.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.position.column
    }

    /// The identifier of a Variable or Function token.
    pub fn name(&self) -> &str {
        self.value.as_str().unwrap_or_default()
    }
}

impl fmt::Debug for ExpressionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ExpressionTokenKind::Constant
            | ExpressionTokenKind::Variable
            | ExpressionTokenKind::Function => {
                write!(f, "{:?}({:?} @ {:?})", self.kind, self.value, self.position)
            }
            kind => write!(f, "{:?}(@ {:?})", kind, self.position),
        }
    }
}
