//! The configurable tokenizer that drives the lexical states.

use std::sync::Arc;

use bitflags::bitflags;
use expressions_core::TokenizerError;
use tracing::trace;

use crate::char_map::CharReferenceMap;
use crate::scanner::Scanner;
use crate::states::decode_string;
use crate::token::{Token, TokenKind};

/// A handler that consumes the characters of one lexical category.
///
/// States are shared between the character map and the tokenizer's named
/// slots, and may delegate to other states (for example a number state that
/// finds no digits hands over to the symbol state).
pub trait TokenizerState: Send + Sync {
    /// Consume characters starting at the scanner's cursor and return one token.
    ///
    /// A token with an empty value means the state could not handle the
    /// character; the tokenizer then emits it as [`TokenKind::Unknown`].
    fn next_token(
        &self,
        scanner: &mut Scanner,
        tokenizer: &Tokenizer,
    ) -> Result<Token, TokenizerError>;
}

/// Shared reference to a state.
pub type StateRef = Arc<dyn TokenizerState>;

bitflags! {
    /// Post-processing applied to every token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TokenizerFlags: u8 {
        /// Drop `Unknown` tokens.
        const SKIP_UNKNOWN = 1 << 0;
        /// Drop `Whitespace` tokens.
        const SKIP_WHITESPACES = 1 << 1;
        /// Drop `Comment` tokens.
        const SKIP_COMMENTS = 1 << 2;
        /// Do not emit the final `Eof` token.
        const SKIP_EOF = 1 << 3;
        /// Report every whitespace run as a single space.
        const MERGE_WHITESPACES = 1 << 4;
        /// Report `Integer` and `Float` as `Number`.
        const UNIFY_NUMBERS = 1 << 5;
        /// Strip quotes and collapse doubled quotes in `Quoted` tokens.
        const DECODE_STRINGS = 1 << 6;
    }
}

/// Common interface of tokenizers.
pub trait Tokenize {
    /// Start tokenizing a new buffer.
    fn set_scanner(&mut self, scanner: Scanner);

    /// Rewind to the start of the current buffer.
    fn reset(&mut self);

    /// The next token, or `None` once the sequence is exhausted.
    fn next_token(&mut self) -> Result<Option<Token>, TokenizerError>;

    /// Whether another token is available.
    fn has_next_token(&mut self) -> Result<bool, TokenizerError>;

    /// Tokenize everything the scanner holds.
    fn tokenize_stream(&mut self, scanner: Scanner) -> Result<Vec<Token>, TokenizerError> {
        self.set_scanner(scanner);
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Tokenize a whole buffer.
    fn tokenize_buffer(&mut self, buffer: &str) -> Result<Vec<Token>, TokenizerError> {
        self.tokenize_stream(Scanner::new(buffer))
    }

    /// Tokenize a whole buffer and keep only the token texts.
    fn tokenize_buffer_to_strings(&mut self, buffer: &str) -> Result<Vec<String>, TokenizerError> {
        Ok(self
            .tokenize_buffer(buffer)?
            .into_iter()
            .map(|token| token.value)
            .collect())
    }

    /// Lazily iterate over the remaining tokens.
    fn tokens(&mut self) -> Tokens<'_, Self>
    where
        Self: Sized,
    {
        Tokens {
            tokenizer: self,
            done: false,
        }
    }
}

/// Iterator over the tokens of a [`Tokenize`] implementation.
///
/// Stops after the first error.
pub struct Tokens<'a, T> {
    tokenizer: &'a mut T,
    done: bool,
}

impl<T: Tokenize> Iterator for Tokens<'_, T> {
    type Item = Result<Token, TokenizerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.tokenizer.next_token().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Orchestrates a [`Scanner`], a character map and the lexical states.
///
/// Each state slot is optional; an empty slot disables that category. The
/// character map binds code point ranges to states.
pub struct Tokenizer {
    flags: TokenizerFlags,
    char_map: CharReferenceMap<StateRef>,
    symbol_state: Option<StateRef>,
    number_state: Option<StateRef>,
    quote_state: Option<StateRef>,
    whitespace_state: Option<StateRef>,
    word_state: Option<StateRef>,
    comment_state: Option<StateRef>,
    scanner: Option<Scanner>,
    lookahead: Option<Token>,
    last_kind: Option<TokenKind>,
}

impl Tokenizer {
    /// Create a tokenizer with no states and no flags.
    pub fn new() -> Self {
        Self {
            flags: TokenizerFlags::empty(),
            char_map: CharReferenceMap::new(),
            symbol_state: None,
            number_state: None,
            quote_state: None,
            whitespace_state: None,
            word_state: None,
            comment_state: None,
            scanner: None,
            lookahead: None,
            last_kind: None,
        }
    }

    #[inline]
    pub fn flags(&self) -> TokenizerFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: TokenizerFlags) {
        self.flags = flags;
    }

    /// Turn individual flags on or off.
    pub fn set_flag(&mut self, flag: TokenizerFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    /// The map from code points to states.
    pub fn char_map(&self) -> &CharReferenceMap<StateRef> {
        &self.char_map
    }

    pub fn char_map_mut(&mut self) -> &mut CharReferenceMap<StateRef> {
        &mut self.char_map
    }

    /// Route `start..=end` to `state`.
    pub fn classify(&mut self, start: char, end: char, state: &StateRef) {
        self.char_map.add_interval(start, end, Arc::clone(state));
    }

    pub fn symbol_state(&self) -> Option<&StateRef> {
        self.symbol_state.as_ref()
    }

    pub fn set_symbol_state(&mut self, state: Option<StateRef>) {
        self.symbol_state = state;
    }

    pub fn number_state(&self) -> Option<&StateRef> {
        self.number_state.as_ref()
    }

    pub fn set_number_state(&mut self, state: Option<StateRef>) {
        self.number_state = state;
    }

    pub fn quote_state(&self) -> Option<&StateRef> {
        self.quote_state.as_ref()
    }

    pub fn set_quote_state(&mut self, state: Option<StateRef>) {
        self.quote_state = state;
    }

    pub fn whitespace_state(&self) -> Option<&StateRef> {
        self.whitespace_state.as_ref()
    }

    pub fn set_whitespace_state(&mut self, state: Option<StateRef>) {
        self.whitespace_state = state;
    }

    pub fn word_state(&self) -> Option<&StateRef> {
        self.word_state.as_ref()
    }

    pub fn set_word_state(&mut self, state: Option<StateRef>) {
        self.word_state = state;
    }

    pub fn comment_state(&self) -> Option<&StateRef> {
        self.comment_state.as_ref()
    }

    pub fn set_comment_state(&mut self, state: Option<StateRef>) {
        self.comment_state = state;
    }

    /// The scanner of the current buffer.
    pub fn scanner_mut(&mut self) -> Option<&mut Scanner> {
        self.scanner.as_mut()
    }

    /// Kind of the last token handed out, `None` before the first one.
    pub fn last_kind(&self) -> Option<TokenKind> {
        self.last_kind
    }

    /// Read the next token from the scanner, applying the configured flags.
    ///
    /// Bypasses the lookahead used by [`Tokenize::has_next_token`]; wrappers
    /// that interleave their own states call this directly.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn read_next_token(&mut self) -> Result<Option<Token>, TokenizerError> {
        let Some(mut scanner) = self.scanner.take() else {
            return Ok(None);
        };
        let result = self.read_from(&mut scanner);
        self.scanner = Some(scanner);
        result
    }

    fn read_from(&mut self, scanner: &mut Scanner) -> Result<Option<Token>, TokenizerError> {
        while let Some(ch) = scanner.peek() {
            let position = scanner.peek_position();
            let state = self.char_map.lookup(ch).cloned();

            let mut token = match state {
                Some(state) => {
                    trace!(ch = %ch.escape_debug(), %position, "dispatching tokenizer state");
                    state.next_token(scanner, self)?
                }
                None => Token::new(TokenKind::Unknown, "", position),
            };
            if token.value.is_empty() {
                scanner.read();
                token = Token::new(TokenKind::Unknown, ch.to_string(), position);
            }

            match token.kind {
                TokenKind::Unknown if self.flags.contains(TokenizerFlags::SKIP_UNKNOWN) => continue,
                TokenKind::Comment if self.flags.contains(TokenizerFlags::SKIP_COMMENTS) => {
                    continue;
                }
                TokenKind::Whitespace if self.flags.contains(TokenizerFlags::SKIP_WHITESPACES) => {
                    continue;
                }
                TokenKind::Whitespace if self.flags.contains(TokenizerFlags::MERGE_WHITESPACES) => {
                    token.value = " ".to_string();
                }
                TokenKind::Integer | TokenKind::Float
                    if self.flags.contains(TokenizerFlags::UNIFY_NUMBERS) =>
                {
                    token.kind = TokenKind::Number;
                }
                TokenKind::Quoted if self.flags.contains(TokenizerFlags::DECODE_STRINGS) => {
                    token.value = decode_string(&token.value);
                }
                _ => {}
            }

            self.last_kind = Some(token.kind);
            return Ok(Some(token));
        }

        if !self.flags.contains(TokenizerFlags::SKIP_EOF)
            && self.last_kind != Some(TokenKind::Eof)
        {
            self.last_kind = Some(TokenKind::Eof);
            return Ok(Some(Token::new(TokenKind::Eof, "", scanner.peek_position())));
        }
        Ok(None)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenize for Tokenizer {
    fn set_scanner(&mut self, scanner: Scanner) {
        self.scanner = Some(scanner);
        self.lookahead = None;
        self.last_kind = None;
    }

    fn reset(&mut self) {
        if let Some(scanner) = self.scanner.as_mut() {
            scanner.reset();
        }
        self.lookahead = None;
        self.last_kind = None;
    }

    fn next_token(&mut self) -> Result<Option<Token>, TokenizerError> {
        match self.lookahead.take() {
            Some(token) => Ok(Some(token)),
            None => self.read_next_token(),
        }
    }

    fn has_next_token(&mut self) -> Result<bool, TokenizerError> {
        if self.lookahead.is_none() {
            self.lookahead = self.read_next_token()?;
        }
        Ok(self.lookahead.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::{GenericWhitespaceState, GenericWordState};

    fn words_only() -> Tokenizer {
        let mut tokenizer = Tokenizer::new();
        let word: StateRef = Arc::new(GenericWordState::new());
        let whitespace: StateRef = Arc::new(GenericWhitespaceState::new());
        tokenizer.classify('a', 'z', &word);
        tokenizer.classify('\0', ' ', &whitespace);
        tokenizer.set_word_state(Some(word));
        tokenizer.set_whitespace_state(Some(whitespace));
        tokenizer
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn unmapped_characters_are_unknown() {
        let mut tokenizer = words_only();
        let tokens = tokenizer.tokenize_buffer("ab+c").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Word, TokenKind::Unknown, TokenKind::Word, TokenKind::Eof]
        );
        assert_eq!(tokens[1].value, "+");
    }

    #[test]
    fn skip_flags() {
        let mut tokenizer = words_only();
        tokenizer.set_flags(
            TokenizerFlags::SKIP_UNKNOWN
                | TokenizerFlags::SKIP_WHITESPACES
                | TokenizerFlags::SKIP_EOF,
        );
        let values = tokenizer.tokenize_buffer_to_strings("ab + c").unwrap();
        assert_eq!(values, vec!["ab", "c"]);
    }

    #[test]
    fn merge_whitespaces() {
        let mut tokenizer = words_only();
        tokenizer.set_flag(TokenizerFlags::MERGE_WHITESPACES, true);
        let values = tokenizer.tokenize_buffer_to_strings("a \t\n b").unwrap();
        assert_eq!(values, vec!["a", " ", "b", ""]);
    }

    #[test]
    fn eof_is_emitted_once() {
        let mut tokenizer = words_only();
        tokenizer.set_scanner(Scanner::new(""));
        assert_eq!(tokenizer.next_token().unwrap().map(|t| t.kind), Some(TokenKind::Eof));
        assert_eq!(tokenizer.next_token().unwrap(), None);
        assert_eq!(tokenizer.next_token().unwrap(), None);
    }

    #[test]
    fn reset_replays_the_sequence() {
        let mut tokenizer = words_only();
        let first = tokenizer.tokenize_buffer("ab cd").unwrap();
        tokenizer.reset();
        let replay: Vec<Token> = tokenizer.tokens().collect::<Result<_, _>>().unwrap();
        assert_eq!(first, replay);
    }

    #[test]
    fn has_next_token_peeks() {
        let mut tokenizer = words_only();
        tokenizer.set_flag(TokenizerFlags::SKIP_EOF, true);
        tokenizer.set_scanner(Scanner::new("ab"));
        assert!(tokenizer.has_next_token().unwrap());
        assert!(tokenizer.has_next_token().unwrap());
        assert_eq!(tokenizer.next_token().unwrap().map(|t| t.value), Some("ab".to_string()));
        assert!(!tokenizer.has_next_token().unwrap());
    }
}
