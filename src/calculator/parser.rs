//! Infix to postfix conversion.
//!
//! The parser lexes the token stream of an [`ExpressionTokenizer`] into
//! [`ExpressionToken`]s, then runs a Pratt parser over them that emits
//! postfix order directly instead of building a tree.

use expressions_core::{
    ExpressionsError, Position, SyntaxError, SyntaxErrorKind, TokenizerError, Variant,
};
use expressions_tokenizer::{Token, TokenKind, Tokenize, TokenizerFlags};
use rustc_hash::FxHashSet;
use tracing::debug;

use super::token::{ExpressionToken, ExpressionTokenKind as Kind};
use super::tokenizer::ExpressionTokenizer;

/// Binding power of prefix `NOT`.
const NOT_BP: u8 = 5;
/// Left binding power of the comparison level (`IN`, `LIKE`, `IS NULL`, ...).
const COMPARISON_BP: u8 = 7;
/// Binding power of prefix `+`/`-`.
const UNARY_BP: u8 = 15;
/// Binding power of indexing.
const POSTFIX_BP: u8 = 19;
/// Deepest sub-expression nesting accepted before the parse is rejected.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Binding powers of the binary operators as `(left, right)`.
///
/// Left-associative operators have `right = left + 1`; `^` is
/// right-associative.
fn infix_binding_power(kind: Kind) -> Option<(u8, u8)> {
    Some(match kind {
        Kind::Or | Kind::Xor => (1, 2),
        Kind::And => (3, 4),
        Kind::Equal
        | Kind::NotEqual
        | Kind::Less
        | Kind::EqualLess
        | Kind::More
        | Kind::EqualMore
        | Kind::In
        | Kind::Like => (COMPARISON_BP, COMPARISON_BP + 1),
        Kind::ShiftLeft | Kind::ShiftRight => (9, 10),
        Kind::Plus | Kind::Minus => (11, 12),
        Kind::Star | Kind::Slash | Kind::Procent => (13, 14),
        Kind::Power => (18, 17),
        _ => return None,
    })
}

/// Converts expression text into a postfix token stream.
#[derive(Debug, Default)]
pub struct ExpressionParser {
    expression: String,
    original_tokens: Vec<Token>,
    initial_tokens: Vec<ExpressionToken>,
    result_tokens: Vec<ExpressionToken>,
    variable_names: Vec<String>,
}

impl ExpressionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The text last given to [`set_expression`](Self::set_expression).
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Tokens as produced by the tokenizer.
    pub fn original_tokens(&self) -> &[Token] {
        &self.original_tokens
    }

    /// Lexed expression tokens in source order.
    pub fn initial_tokens(&self) -> &[ExpressionToken] {
        &self.initial_tokens
    }

    /// The postfix stream.
    pub fn result_tokens(&self) -> &[ExpressionToken] {
        &self.result_tokens
    }

    /// Referenced variable names, first spelling, unique ignoring case.
    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    /// Parse `expression`, replacing the previous result.
    ///
    /// On failure the parser is left empty.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn set_expression(&mut self, expression: &str) -> Result<(), ExpressionsError> {
        self.clear();
        self.expression = expression.to_string();

        let result = self.parse();
        if result.is_err() {
            let expression = std::mem::take(&mut self.expression);
            self.clear();
            self.expression = expression;
        }
        result
    }

    /// Forget the expression and every derived token.
    pub fn clear(&mut self) {
        self.expression.clear();
        self.original_tokens.clear();
        self.initial_tokens.clear();
        self.result_tokens.clear();
        self.variable_names.clear();
    }

    fn parse(&mut self) -> Result<(), ExpressionsError> {
        let mut tokenizer = ExpressionTokenizer::new();
        tokenizer.set_flag(TokenizerFlags::SKIP_EOF, false);
        let mut tokens = tokenizer.tokenize_buffer(&self.expression)?;
        let end = match tokens.pop() {
            Some(eof) if eof.kind == TokenKind::Eof => eof.position,
            Some(other) => {
                let position = other.position;
                tokens.push(other);
                position
            }
            None => Position::new(1, 1),
        };

        self.initial_tokens = lex(&tokens)?;
        self.original_tokens = tokens;

        if !self.initial_tokens.is_empty() {
            let mut builder = PostfixBuilder::new(&self.initial_tokens, end);
            builder.parse_expr(0)?;
            if let Some(token) = builder.peek() {
                return Err(builder.unexpected(token).into());
            }
            self.result_tokens = builder.output;
        }

        let mut seen = FxHashSet::default();
        for token in &self.result_tokens {
            if token.kind == Kind::Variable && seen.insert(token.name().to_lowercase()) {
                self.variable_names.push(token.name().to_string());
            }
        }

        debug!(
            expression = %self.expression,
            tokens = self.result_tokens.len(),
            variables = ?self.variable_names,
            "parsed expression"
        );
        Ok(())
    }
}

/// Map tokenizer output to expression tokens.
fn lex(tokens: &[Token]) -> Result<Vec<ExpressionToken>, ExpressionsError> {
    let mut result = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let called = tokens
            .get(i + 1)
            .is_some_and(|next| next.is(TokenKind::Symbol, "("));
        // `NULL(` is the Null() function, not the constant.
        if called && token.kind == TokenKind::Keyword && token.value.eq_ignore_ascii_case("NULL") {
            result.push(ExpressionToken::new(
                Kind::Variable,
                Variant::String(token.value.clone()),
                token.position,
            ));
            continue;
        }
        result.push(lex_token(token)?);
    }
    Ok(result)
}

fn lex_token(token: &Token) -> Result<ExpressionToken, ExpressionsError> {
    let position = token.position;
    let operator = |kind| Ok(ExpressionToken::operator(kind, position));
    let constant = |value| Ok(ExpressionToken::new(Kind::Constant, value, position));

    match token.kind {
        TokenKind::Integer => constant(parse_integer(token)?),
        TokenKind::Float => constant(parse_float(token)?),
        TokenKind::Quoted => constant(Variant::String(token.value.clone())),
        TokenKind::Word => Ok(ExpressionToken::new(
            Kind::Variable,
            Variant::String(token.value.clone()),
            position,
        )),
        TokenKind::Keyword => match token.value.to_ascii_uppercase().as_str() {
            "AND" => operator(Kind::And),
            "OR" => operator(Kind::Or),
            "XOR" => operator(Kind::Xor),
            "NOT" => operator(Kind::Not),
            "IS" => operator(Kind::Is),
            "IN" => operator(Kind::In),
            "LIKE" => operator(Kind::Like),
            "NULL" => constant(Variant::Null),
            "TRUE" => constant(Variant::Boolean(true)),
            "FALSE" => constant(Variant::Boolean(false)),
            _ => Err(unknown_symbol(token)),
        },
        TokenKind::Symbol => match token.value.as_str() {
            "(" => operator(Kind::LeftBrace),
            ")" => operator(Kind::RightBrace),
            "[" => operator(Kind::LeftSquareBrace),
            "]" => operator(Kind::RightSquareBrace),
            "," => operator(Kind::Comma),
            "+" => operator(Kind::Plus),
            "-" => operator(Kind::Minus),
            "*" => operator(Kind::Star),
            "/" => operator(Kind::Slash),
            "%" => operator(Kind::Procent),
            "^" => operator(Kind::Power),
            "=" => operator(Kind::Equal),
            "<>" | "!=" => operator(Kind::NotEqual),
            ">" => operator(Kind::More),
            "<" => operator(Kind::Less),
            ">=" => operator(Kind::EqualMore),
            "<=" => operator(Kind::EqualLess),
            "<<" => operator(Kind::ShiftLeft),
            ">>" => operator(Kind::ShiftRight),
            _ => Err(unknown_symbol(token)),
        },
        _ => Err(unknown_symbol(token)),
    }
}

fn unknown_symbol(token: &Token) -> ExpressionsError {
    SyntaxError::new(
        SyntaxErrorKind::UnknownSymbol,
        token.position,
        format!("'{}'", token.value),
    )
    .into()
}

fn invalid_number(token: &Token) -> TokenizerError {
    TokenizerError::InvalidNumber {
        text: token.value.clone(),
        position: token.position,
    }
}

/// Integer literals are `Integer` when they fit in 32 bits, `Long` otherwise.
fn parse_integer(token: &Token) -> Result<Variant, TokenizerError> {
    if let Ok(value) = token.value.parse::<i32>() {
        return Ok(Variant::Integer(value));
    }
    token
        .value
        .parse::<i64>()
        .map(Variant::Long)
        .map_err(|_| invalid_number(token))
}

fn parse_float(token: &Token) -> Result<Variant, TokenizerError> {
    match token.value.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Variant::from(value)),
        _ => Err(invalid_number(token)),
    }
}

/// Cursor over lexed tokens that appends postfix output.
struct PostfixBuilder<'a> {
    tokens: &'a [ExpressionToken],
    pos: usize,
    end: Position,
    depth: usize,
    output: Vec<ExpressionToken>,
}

impl<'a> PostfixBuilder<'a> {
    fn new(tokens: &'a [ExpressionToken], end: Position) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
            depth: 0,
            output: Vec::with_capacity(tokens.len()),
        }
    }

    #[inline]
    fn peek(&self) -> Option<&'a ExpressionToken> {
        self.tokens.get(self.pos)
    }

    #[inline]
    fn peek_kind(&self) -> Option<Kind> {
        self.peek().map(|t| t.kind)
    }

    #[inline]
    fn peek_nth_kind(&self, n: usize) -> Option<Kind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    #[inline]
    fn check(&self, kind: Kind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) -> Option<&'a ExpressionToken> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn emit(&mut self, kind: Kind, position: Position) {
        self.output.push(ExpressionToken::operator(kind, position));
    }

    fn error(
        &self,
        kind: SyntaxErrorKind,
        position: Position,
        message: impl Into<String>,
    ) -> SyntaxError {
        SyntaxError::new(kind, position, message)
    }

    /// Classify a token found where an operator or the end was expected.
    fn unexpected(&self, token: &ExpressionToken) -> SyntaxError {
        match token.kind {
            Kind::Comma => self.error(SyntaxErrorKind::MisplacedComma, token.position, ""),
            kind if kind.starts_operand() => {
                self.error(SyntaxErrorKind::MissingOperator, token.position, "")
            }
            Kind::RightBrace => {
                self.error(SyntaxErrorKind::UnexpectedToken, token.position, "unbalanced ')'")
            }
            Kind::RightSquareBrace => {
                self.error(SyntaxErrorKind::UnexpectedToken, token.position, "unbalanced ']'")
            }
            kind => {
                self.error(SyntaxErrorKind::UnexpectedToken, token.position, format!("{:?}", kind))
            }
        }
    }

    /// Consume `close`, or fail with `missing` at the offending token.
    fn expect_close(&mut self, close: Kind, missing: SyntaxErrorKind) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(token) if token.kind == close => {
                self.pos += 1;
                Ok(())
            }
            None => Err(self.error(missing, self.end, "")),
            Some(token) if matches!(token.kind, Kind::RightBrace | Kind::RightSquareBrace) => {
                Err(self.error(missing, token.position, ""))
            }
            Some(token) => Err(self.unexpected(token)),
        }
    }

    /// Parse an expression whose operators bind at least as tight as `min_bp`.
    fn parse_expr(&mut self, min_bp: u8) -> Result<(), SyntaxError> {
        if self.depth >= MAX_NESTING_DEPTH {
            let position = self.peek().map_or(self.end, |token| token.position);
            return Err(self.error(
                SyntaxErrorKind::NestingTooDeep,
                position,
                format!("more than {} nested sub-expressions", MAX_NESTING_DEPTH),
            ));
        }
        self.depth += 1;
        let result = self.parse_operations(min_bp);
        self.depth -= 1;
        result
    }

    fn parse_operations(&mut self, min_bp: u8) -> Result<(), SyntaxError> {
        self.parse_prefix()?;

        loop {
            let Some(token) = self.peek() else {
                break;
            };

            // Indexing
            if token.kind == Kind::LeftSquareBrace {
                if POSTFIX_BP < min_bp {
                    break;
                }
                self.pos += 1;
                self.parse_expr(0)?;
                self.expect_close(Kind::RightSquareBrace, SyntaxErrorKind::MissingCloseBracket)?;
                self.emit(Kind::Element, token.position);
                continue;
            }

            // NOT IN / NOT LIKE
            if token.kind == Kind::Not
                && matches!(self.peek_nth_kind(1), Some(Kind::In | Kind::Like))
            {
                if COMPARISON_BP < min_bp {
                    break;
                }
                let kind = match self.peek_nth_kind(1) {
                    Some(Kind::In) => Kind::NotIn,
                    _ => Kind::NotLike,
                };
                self.pos += 2;
                self.parse_expr(COMPARISON_BP + 1)?;
                self.emit(kind, token.position);
                continue;
            }

            // IS [NOT] NULL
            if token.kind == Kind::Is {
                if COMPARISON_BP < min_bp {
                    break;
                }
                self.pos += 1;
                let negated = self.check(Kind::Not);
                if negated {
                    self.pos += 1;
                }
                match self.advance() {
                    Some(null) if null.kind == Kind::Constant && null.value.is_null() => {}
                    Some(other) => {
                        return Err(self.error(
                            SyntaxErrorKind::UnexpectedToken,
                            other.position,
                            "expected NULL after IS",
                        ));
                    }
                    None => return Err(self.error(SyntaxErrorKind::UnexpectedEnd, self.end, "")),
                }
                let kind = if negated { Kind::IsNotNull } else { Kind::IsNull };
                self.emit(kind, token.position);
                continue;
            }

            let Some((l_bp, r_bp)) = infix_binding_power(token.kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.pos += 1;
            self.parse_expr(r_bp)?;
            self.emit(token.kind, token.position);
        }

        Ok(())
    }

    /// Parse an operand, including prefix operators and calls.
    fn parse_prefix(&mut self) -> Result<(), SyntaxError> {
        let Some(token) = self.advance() else {
            return Err(self.error(SyntaxErrorKind::UnexpectedEnd, self.end, ""));
        };

        match token.kind {
            Kind::Constant => self.output.push(token.clone()),
            Kind::Variable if self.check(Kind::LeftBrace) => {
                self.pos += 1;
                let count = self.parse_arguments()?;
                self.output.push(ExpressionToken::new(
                    Kind::Constant,
                    Variant::Integer(count),
                    token.position,
                ));
                self.output.push(ExpressionToken::new(
                    Kind::Function,
                    token.value.clone(),
                    token.position,
                ));
            }
            Kind::Variable => self.output.push(token.clone()),
            Kind::LeftBrace => {
                self.parse_expr(0)?;
                self.expect_close(Kind::RightBrace, SyntaxErrorKind::MissingCloseParenthesis)?;
            }
            Kind::Minus => {
                self.parse_expr(UNARY_BP)?;
                self.emit(Kind::Unary, token.position);
            }
            Kind::Plus => self.parse_expr(UNARY_BP)?,
            Kind::Not => {
                self.parse_expr(NOT_BP)?;
                self.emit(Kind::Not, token.position);
            }
            Kind::Comma => {
                return Err(self.error(SyntaxErrorKind::MisplacedComma, token.position, ""));
            }
            kind => {
                return Err(self.error(
                    SyntaxErrorKind::UnexpectedToken,
                    token.position,
                    format!("{:?} cannot start an operand", kind),
                ));
            }
        }

        Ok(())
    }

    /// Parse call arguments after `(`, through the closing `)`.
    fn parse_arguments(&mut self) -> Result<i32, SyntaxError> {
        if self.check(Kind::RightBrace) {
            self.pos += 1;
            return Ok(0);
        }

        let mut count = 0;
        loop {
            self.parse_expr(0)?;
            count += 1;
            if self.check(Kind::Comma) {
                self.pos += 1;
                continue;
            }
            self.expect_close(Kind::RightBrace, SyntaxErrorKind::MissingCloseParenthesis)?;
            return Ok(count);
        }
    }
}
