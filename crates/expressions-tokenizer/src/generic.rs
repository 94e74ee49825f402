//! The general purpose tokenizer preset.

use std::sync::Arc;

use crate::states::{
    GenericCommentState, GenericNumberState, GenericQuoteState, GenericSymbolState,
    GenericWhitespaceState, GenericWordState,
};
use crate::tokenizer::{StateRef, Tokenizer};

impl Tokenizer {
    /// A tokenizer for free-form text.
    ///
    /// Words, signed integers and floats, `'` and `"` quoted strings, `#`
    /// line comments, and the symbols `<>`, `<=`, `>=` on top of single
    /// characters. No flags are set, so whitespace and `Eof` are reported.
    pub fn generic() -> Self {
        let symbol: StateRef = Arc::new(
            GenericSymbolState::new()
                .with_symbol("<>")
                .with_symbol("<=")
                .with_symbol(">="),
        );
        let number: StateRef = Arc::new(GenericNumberState::new());
        let quote: StateRef = Arc::new(GenericQuoteState::new());
        let whitespace: StateRef = Arc::new(GenericWhitespaceState::new());
        let word: StateRef = Arc::new(GenericWordState::new());
        let comment: StateRef = Arc::new(GenericCommentState::new());

        let mut tokenizer = Tokenizer::new();
        tokenizer.classify('\0', '\u{ff}', &symbol);
        tokenizer.classify('\0', ' ', &whitespace);
        tokenizer.classify('a', 'z', &word);
        tokenizer.classify('A', 'Z', &word);
        tokenizer.classify('\u{c0}', char::MAX, &word);
        tokenizer.classify('-', '-', &number);
        tokenizer.classify('0', '9', &number);
        tokenizer.classify('.', '.', &number);
        tokenizer.classify('"', '"', &quote);
        tokenizer.classify('\'', '\'', &quote);
        tokenizer.classify('#', '#', &comment);

        tokenizer.set_symbol_state(Some(symbol));
        tokenizer.set_number_state(Some(number));
        tokenizer.set_quote_state(Some(quote));
        tokenizer.set_whitespace_state(Some(whitespace));
        tokenizer.set_word_state(Some(word));
        tokenizer.set_comment_state(Some(comment));
        tokenizer
    }
}
