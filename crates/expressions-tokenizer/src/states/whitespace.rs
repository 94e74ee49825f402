use expressions_core::TokenizerError;

use crate::char_map::CharReferenceMap;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use crate::tokenizer::{Tokenizer, TokenizerState};

/// Consumes a run of whitespace characters.
#[derive(Debug, Clone)]
pub struct GenericWhitespaceState {
    whitespace_chars: CharReferenceMap<bool>,
}

impl GenericWhitespaceState {
    /// Treats every code point up to and including `' '` as whitespace.
    pub fn new() -> Self {
        let mut state = Self {
            whitespace_chars: CharReferenceMap::new(),
        };
        state.set_whitespace_chars('\0', ' ', true);
        state
    }

    pub fn set_whitespace_chars(&mut self, start: char, end: char, enabled: bool) {
        self.whitespace_chars.add_interval(start, end, enabled);
    }

    pub fn clear_whitespace_chars(&mut self) {
        self.whitespace_chars.clear();
    }

    #[inline]
    pub fn is_whitespace(&self, ch: char) -> bool {
        self.whitespace_chars.lookup(ch).copied().unwrap_or(false)
    }
}

impl Default for GenericWhitespaceState {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerState for GenericWhitespaceState {
    fn next_token(
        &self,
        scanner: &mut Scanner,
        _tokenizer: &Tokenizer,
    ) -> Result<Token, TokenizerError> {
        let position = scanner.peek_position();
        let value = scanner.eat_while(|ch| self.is_whitespace(ch));
        Ok(Token::new(TokenKind::Whitespace, value, position))
    }
}
