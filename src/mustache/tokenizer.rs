//! Lexical layer of the template language.
//!
//! Outside of tags the text is read verbatim by [`MustacheSpecialState`];
//! between `{{`/`{{{` and `}}`/`}}}` the generic states take over.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use expressions_core::TokenizerError;
use expressions_tokenizer::states::{
    GenericQuoteState, GenericSymbolState, GenericWhitespaceState, GenericWordState,
};
use expressions_tokenizer::{
    Scanner, StateRef, Token, TokenKind, Tokenize, Tokenizer, TokenizerFlags,
};

/// Reads literal text up to the next `{{`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MustacheSpecialState;

impl MustacheSpecialState {
    pub fn new() -> Self {
        Self
    }

    /// Literal text as a [`TokenKind::Special`] token; empty at a tag or the end.
    pub fn read_text(&self, scanner: &mut Scanner) -> Token {
        let position = scanner.peek_position();
        let start = scanner.offset();
        while let Some(ch) = scanner.peek() {
            if ch == '{' && scanner.peek_nth(1) == Some('{') {
                break;
            }
            scanner.read();
        }
        Token::new(TokenKind::Special, scanner.slice_from(start), position)
    }

    /// A `!` comment body up to, not including, the closing `}}`.
    pub fn read_comment(&self, scanner: &mut Scanner) -> Token {
        let position = scanner.peek_position();
        let start = scanner.offset();
        while let Some(ch) = scanner.peek() {
            if ch == '}' && scanner.peek_nth(1) == Some('}') {
                break;
            }
            scanner.read();
        }
        Token::new(TokenKind::Comment, scanner.slice_from(start), position)
    }
}

/// Tokenizer for templates.
///
/// Emits [`TokenKind::Special`] for literal text, the `{{ }} {{{ }}}`
/// brackets and sigils as symbols, names as words (dotted paths and `.`
/// included) and `{{! ... }}` bodies as comments. Whitespace inside tags
/// and `Eof` are skipped.
pub struct MustacheTokenizer {
    inner: Tokenizer,
    special_state: MustacheSpecialState,
    special: bool,
    tag_opened: bool,
    lookahead: Option<Token>,
}

impl MustacheTokenizer {
    pub fn new() -> Self {
        let symbol: StateRef = Arc::new(
            GenericSymbolState::new()
                .with_symbol("{{")
                .with_symbol("}}")
                .with_symbol("{{{")
                .with_symbol("}}}"),
        );
        let quote: StateRef = Arc::new(GenericQuoteState::new());
        let whitespace: StateRef = Arc::new(GenericWhitespaceState::new());
        let mut words = GenericWordState::new();
        words.set_word_chars('.', '.', true);
        let word: StateRef = Arc::new(words);

        let mut inner = Tokenizer::new();
        inner.classify('\0', char::MAX, &symbol);
        inner.classify('\0', ' ', &whitespace);
        inner.classify('a', 'z', &word);
        inner.classify('A', 'Z', &word);
        inner.classify('0', '9', &word);
        inner.classify('_', '_', &word);
        inner.classify('.', '.', &word);
        inner.classify('\u{c0}', char::MAX, &word);
        inner.classify('"', '"', &quote);
        inner.classify('\'', '\'', &quote);

        inner.set_symbol_state(Some(symbol));
        inner.set_quote_state(Some(quote));
        inner.set_whitespace_state(Some(whitespace));
        inner.set_word_state(Some(word));
        inner.set_flags(
            TokenizerFlags::SKIP_WHITESPACES
                | TokenizerFlags::SKIP_COMMENTS
                | TokenizerFlags::SKIP_EOF,
        );

        Self {
            inner,
            special_state: MustacheSpecialState::new(),
            special: true,
            tag_opened: false,
            lookahead: None,
        }
    }

    fn restart(&mut self) {
        self.special = true;
        self.tag_opened = false;
        self.lookahead = None;
    }

    /// Read the next token, switching between literal text and tag contents.
    fn read_next_token(&mut self) -> Result<Option<Token>, TokenizerError> {
        let tag_opened = std::mem::take(&mut self.tag_opened);
        let Some(scanner) = self.inner.scanner_mut() else {
            return Ok(None);
        };

        if self.special {
            let token = self.special_state.read_text(scanner);
            if !token.value.is_empty() {
                return Ok(Some(token));
            }
        } else if tag_opened && scanner.peek() == Some('!') {
            return Ok(Some(self.special_state.read_comment(scanner)));
        }

        self.special = false;
        let token = self.inner.read_next_token()?;
        if let Some(token) = &token {
            match token.value.as_str() {
                "}}" | "}}}" => self.special = true,
                "{{" | "{{{" => self.tag_opened = true,
                _ => {}
            }
        }
        Ok(token)
    }
}

impl Default for MustacheTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MustacheTokenizer {
    type Target = Tokenizer;

    fn deref(&self) -> &Tokenizer {
        &self.inner
    }
}

impl DerefMut for MustacheTokenizer {
    fn deref_mut(&mut self) -> &mut Tokenizer {
        &mut self.inner
    }
}

impl Tokenize for MustacheTokenizer {
    fn set_scanner(&mut self, scanner: Scanner) {
        self.inner.set_scanner(scanner);
        self.restart();
    }

    fn reset(&mut self) {
        Tokenize::reset(&mut self.inner);
        self.restart();
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

    fn pairs(text: &str) -> Vec<(TokenKind, String)> {
        MustacheTokenizer::new()
            .tokenize_buffer(text)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    fn pair(kind: TokenKind, value: &str) -> (TokenKind, String) {
        (kind, value.to_string())
    }

    #[test]
    fn text_and_tags() {
        use TokenKind::*;
        assert_eq!(
            pairs("Hello, {{{NAME}}}{{#ESCLAMATION}}!{{/ESCLAMATION}}"),
            vec![
                pair(Special, "Hello, "),
                pair(Symbol, "{{{"),
                pair(Word, "NAME"),
                pair(Symbol, "}}}"),
                pair(Symbol, "{{"),
                pair(Symbol, "#"),
                pair(Word, "ESCLAMATION"),
                pair(Symbol, "}}"),
                pair(Special, "!"),
                pair(Symbol, "{{"),
                pair(Symbol, "/"),
                pair(Word, "ESCLAMATION"),
                pair(Symbol, "}}"),
            ]
        );
    }

    #[test]
    fn whitespace_inside_tags_is_skipped() {
        use TokenKind::*;
        assert_eq!(
            pairs(" a {{ user.name }} b{c} "),
            vec![
                pair(Special, " a "),
                pair(Symbol, "{{"),
                pair(Word, "user.name"),
                pair(Symbol, "}}"),
                pair(Special, " b{c} "),
            ]
        );
    }

    #[test]
    fn comments_are_read_verbatim() {
        use TokenKind::*;
        assert_eq!(
            pairs("{{! it's {here} }}x"),
            vec![
                pair(Symbol, "{{"),
                pair(Comment, "! it's {here} "),
                pair(Symbol, "}}"),
                pair(Special, "x"),
            ]
        );
    }

    #[test]
    fn reset_replays() {
        let mut tokenizer = MustacheTokenizer::new();
        let first = tokenizer.tokenize_buffer("a{{b}}c").unwrap();
        tokenizer.reset();
        let replay: Vec<Token> = tokenizer.tokens().collect::<Result<_, _>>().unwrap();
        assert_eq!(first, replay);
    }
}
