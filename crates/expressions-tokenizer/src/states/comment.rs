use expressions_core::TokenizerError;

use super::delegate_to_symbol;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use crate::tokenizer::{Tokenizer, TokenizerState};

/// Consumes everything up to, but not including, the end of the line.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericCommentState;

impl GenericCommentState {
    pub fn new() -> Self {
        Self
    }
}

fn read_line(scanner: &mut Scanner) {
    scanner.eat_while(|ch| ch != '\n' && ch != '\r');
}

impl TokenizerState for GenericCommentState {
    fn next_token(
        &self,
        scanner: &mut Scanner,
        _tokenizer: &Tokenizer,
    ) -> Result<Token, TokenizerError> {
        let position = scanner.peek_position();
        let start = scanner.offset();
        read_line(scanner);
        Ok(Token::new(TokenKind::Comment, scanner.slice_from(start), position))
    }
}

/// Handles `/* ... */` and, unless built with [`c_style`](Self::c_style),
/// `// ...` comments.
///
/// A `/` that does not open a comment is handed to the symbol state.
#[derive(Debug, Clone, Copy)]
pub struct CppCommentState {
    line_comments: bool,
}

impl CppCommentState {
    /// Block and line comments.
    pub fn new() -> Self {
        Self { line_comments: true }
    }

    /// Block comments only.
    pub fn c_style() -> Self {
        Self { line_comments: false }
    }
}

impl Default for CppCommentState {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerState for CppCommentState {
    fn next_token(
        &self,
        scanner: &mut Scanner,
        tokenizer: &Tokenizer,
    ) -> Result<Token, TokenizerError> {
        let position = scanner.peek_position();
        let start = scanner.offset();

        match (scanner.peek(), scanner.peek_nth(1)) {
            (Some('/'), Some('*')) => {
                scanner.read();
                scanner.read();
                loop {
                    match scanner.read() {
                        None => return Err(TokenizerError::UnterminatedComment { position }),
                        Some('*') if scanner.peek() == Some('/') => {
                            scanner.read();
                            break;
                        }
                        Some(_) => {}
                    }
                }
            }
            (Some('/'), Some('/')) if self.line_comments => read_line(scanner),
            _ => return delegate_to_symbol(scanner, tokenizer, position),
        }

        Ok(Token::new(TokenKind::Comment, scanner.slice_from(start), position))
    }
}
