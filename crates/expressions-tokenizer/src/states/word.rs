use expressions_core::TokenizerError;

use crate::char_map::CharReferenceMap;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use crate::tokenizer::{Tokenizer, TokenizerState};

/// Consumes a run of word characters.
///
/// The first character is taken unconditionally since the character map
/// already routed it here.
#[derive(Debug, Clone)]
pub struct GenericWordState {
    word_chars: CharReferenceMap<bool>,
}

impl GenericWordState {
    /// Letters, digits, `-`, `_` and everything from `0xc0` up.
    pub fn new() -> Self {
        let mut state = Self {
            word_chars: CharReferenceMap::new(),
        };
        state.set_word_chars('a', 'z', true);
        state.set_word_chars('A', 'Z', true);
        state.set_word_chars('0', '9', true);
        state.set_word_chars('-', '-', true);
        state.set_word_chars('_', '_', true);
        state.set_word_chars('\u{c0}', char::MAX, true);
        state
    }

    pub fn set_word_chars(&mut self, start: char, end: char, enabled: bool) {
        self.word_chars.add_interval(start, end, enabled);
    }

    pub fn clear_word_chars(&mut self) {
        self.word_chars.clear();
    }

    #[inline]
    pub fn is_word_char(&self, ch: char) -> bool {
        self.word_chars.lookup(ch).copied().unwrap_or(false)
    }
}

impl Default for GenericWordState {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerState for GenericWordState {
    fn next_token(
        &self,
        scanner: &mut Scanner,
        _tokenizer: &Tokenizer,
    ) -> Result<Token, TokenizerError> {
        let position = scanner.peek_position();
        let start = scanner.offset();
        if scanner.read().is_some() {
            scanner.eat_while(|ch| self.is_word_char(ch));
        }
        Ok(Token::new(TokenKind::Word, scanner.slice_from(start), position))
    }
}
