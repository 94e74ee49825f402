//! Lexical layer of the expression language.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use expressions_core::TokenizerError;
use expressions_tokenizer::states::{
    CppCommentState, GenericNumberState, GenericQuoteState, GenericSymbolState,
    GenericWhitespaceState, GenericWordState,
};
use expressions_tokenizer::{
    Scanner, StateRef, Token, TokenKind, Tokenize, Tokenizer, TokenizerFlags, TokenizerState,
};

/// Words with a meaning of their own in expressions.
pub const KEYWORDS: &[&str] = &[
    "AND", "OR", "XOR", "NOT", "IS", "IN", "LIKE", "NULL", "TRUE", "FALSE",
];

/// Multi-character operators.
const SYMBOLS: &[&str] = &["<=", ">=", "<>", "!=", "<<", ">>"];

/// Check if `word` is an expression keyword (case-insensitive).
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|keyword| keyword.eq_ignore_ascii_case(word))
}

/// Word state reporting [`KEYWORDS`] as [`TokenKind::Keyword`].
///
/// Identifiers consist of letters, digits and `_`; the character map only
/// routes letters and `_` here so an identifier never starts with a digit.
#[derive(Debug, Clone)]
pub struct ExpressionWordState {
    inner: GenericWordState,
}

impl ExpressionWordState {
    pub fn new() -> Self {
        let mut inner = GenericWordState::new();
        inner.set_word_chars('-', '-', false);
        Self { inner }
    }
}

impl Default for ExpressionWordState {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerState for ExpressionWordState {
    fn next_token(
        &self,
        scanner: &mut Scanner,
        tokenizer: &Tokenizer,
    ) -> Result<Token, TokenizerError> {
        let mut token = self.inner.next_token(scanner, tokenizer)?;
        if is_keyword(&token.value) {
            token.kind = TokenKind::Keyword;
        }
        Ok(token)
    }
}

/// Tokenizer for the expression language.
///
/// Numbers carry no sign (`-` is always an operator) but accept exponents,
/// words may be keywords, `//` and `/* */` comments are recognized. By
/// default whitespace, comments and `Eof` are skipped and quoted strings
/// are decoded.
pub struct ExpressionTokenizer {
    inner: Tokenizer,
}

impl ExpressionTokenizer {
    pub fn new() -> Self {
        let mut symbols = GenericSymbolState::new();
        for symbol in SYMBOLS {
            symbols.add(symbol, TokenKind::Symbol);
        }
        let symbol: StateRef = Arc::new(symbols);
        let number: StateRef = Arc::new(
            GenericNumberState::new()
                .with_leading_sign(false)
                .with_exponent(true),
        );
        let quote: StateRef = Arc::new(GenericQuoteState::new());
        let whitespace: StateRef = Arc::new(GenericWhitespaceState::new());
        let word: StateRef = Arc::new(ExpressionWordState::new());
        let comment: StateRef = Arc::new(CppCommentState::new());

        let mut inner = Tokenizer::new();
        inner.classify('\0', char::MAX, &symbol);
        inner.classify('\0', ' ', &whitespace);
        inner.classify('a', 'z', &word);
        inner.classify('A', 'Z', &word);
        inner.classify('_', '_', &word);
        inner.classify('\u{c0}', char::MAX, &word);
        inner.classify('0', '9', &number);
        inner.classify('.', '.', &number);
        inner.classify('"', '"', &quote);
        inner.classify('\'', '\'', &quote);
        inner.classify('/', '/', &comment);

        inner.set_symbol_state(Some(symbol));
        inner.set_number_state(Some(number));
        inner.set_quote_state(Some(quote));
        inner.set_whitespace_state(Some(whitespace));
        inner.set_word_state(Some(word));
        inner.set_comment_state(Some(comment));
        inner.set_flags(
            TokenizerFlags::SKIP_WHITESPACES
                | TokenizerFlags::SKIP_COMMENTS
                | TokenizerFlags::SKIP_EOF
                | TokenizerFlags::DECODE_STRINGS,
        );

        Self { inner }
    }
}

impl Default for ExpressionTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ExpressionTokenizer {
    type Target = Tokenizer;

    fn deref(&self) -> &Tokenizer {
        &self.inner
    }
}

impl DerefMut for ExpressionTokenizer {
    fn deref_mut(&mut self) -> &mut Tokenizer {
        &mut self.inner
    }
}

impl Tokenize for ExpressionTokenizer {
    fn set_scanner(&mut self, scanner: Scanner) {
        self.inner.set_scanner(scanner);
    }

    fn reset(&mut self) {
        Tokenize::reset(&mut self.inner);
    }

    fn next_token(&mut self) -> Result<Option<Token>, TokenizerError> {
        Tokenize::next_token(&mut self.inner)
    }

    fn has_next_token(&mut self) -> Result<bool, TokenizerError> {
        self.inner.has_next_token()
    }
}
