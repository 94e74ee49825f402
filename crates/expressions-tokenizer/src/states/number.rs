use expressions_core::TokenizerError;

use super::delegate_to_symbol;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use crate::tokenizer::{Tokenizer, TokenizerState};

/// Consumes a numeric literal.
///
/// Accepts an integer run, an optional `.` with a fractional run and,
/// when enabled, an exponent (`e`/`E`, optional sign, digits). An exponent
/// marker without digits after it is left for the next token. Text with no
/// digit at all is handed to the symbol state.
#[derive(Debug, Clone, Copy)]
pub struct GenericNumberState {
    leading_sign: bool,
    exponent: bool,
}

impl GenericNumberState {
    /// Accepts a leading `-`; no exponent.
    pub fn new() -> Self {
        Self {
            leading_sign: true,
            exponent: false,
        }
    }

    /// Whether a leading `-` belongs to the number.
    pub fn with_leading_sign(mut self, enabled: bool) -> Self {
        self.leading_sign = enabled;
        self
    }

    /// Whether `1e10`/`1.5E+10` forms are accepted.
    pub fn with_exponent(mut self, enabled: bool) -> Self {
        self.exponent = enabled;
        self
    }
}

impl Default for GenericNumberState {
    fn default() -> Self {
        Self::new()
    }
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

impl TokenizerState for GenericNumberState {
    fn next_token(
        &self,
        scanner: &mut Scanner,
        tokenizer: &Tokenizer,
    ) -> Result<Token, TokenizerError> {
        let position = scanner.peek_position();
        let start = scanner.offset();

        if self.leading_sign && scanner.peek() == Some('-') {
            scanner.read();
        }

        let integer_part = scanner.eat_while(is_digit);
        let mut kind = TokenKind::Integer;
        if scanner.peek() == Some('.') && scanner.peek_nth(1).is_some_and(is_digit) {
            scanner.read();
            scanner.eat_while(is_digit);
            kind = TokenKind::Float;
        }

        if integer_part.is_empty() && kind == TokenKind::Integer {
            scanner.unread_many(scanner.offset() - start);
            return delegate_to_symbol(scanner, tokenizer, position);
        }

        if self.exponent && matches!(scanner.peek(), Some('e' | 'E')) {
            let digits_at = match scanner.peek_nth(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if scanner.peek_nth(digits_at).is_some_and(is_digit) {
                for _ in 0..digits_at {
                    scanner.read();
                }
                scanner.eat_while(is_digit);
                kind = TokenKind::Float;
            }
        }

        Ok(Token::new(kind, scanner.slice_from(start), position))
    }
}
