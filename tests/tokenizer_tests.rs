//! Integration tests for the scanner and the tokenizer framework.

use std::sync::Arc;

use expressions::states::{
    CppCommentState, GenericSymbolState, GenericWhitespaceState, GenericWordState,
};
use expressions::{
    tokenize, ExpressionTokenizer, Scanner, StateRef, TokenKind, Tokenize, Tokenizer,
    TokenizerError, TokenizerFlags,
};

fn pairs(tokens: &[expressions::Token]) -> Vec<(TokenKind, String)> {
    tokens.iter().map(|t| (t.kind, t.value.clone())).collect()
}

/// Words, whitespace, `/` comments and single character symbols.
fn comment_tokenizer(comments: CppCommentState) -> Tokenizer {
    let symbol: StateRef = Arc::new(GenericSymbolState::new());
    let whitespace: StateRef = Arc::new(GenericWhitespaceState::new());
    let word: StateRef = Arc::new(GenericWordState::new());
    let comment: StateRef = Arc::new(comments);

    let mut tokenizer = Tokenizer::new();
    tokenizer.classify('\0', '\u{ff}', &symbol);
    tokenizer.classify('\0', ' ', &whitespace);
    tokenizer.classify('a', 'z', &word);
    tokenizer.classify('/', '/', &comment);
    tokenizer.set_symbol_state(Some(symbol));
    tokenizer.set_whitespace_state(Some(whitespace));
    tokenizer.set_word_state(Some(word));
    tokenizer.set_comment_state(Some(comment));
    tokenizer.set_flags(TokenizerFlags::SKIP_WHITESPACES | TokenizerFlags::SKIP_EOF);
    tokenizer
}

#[test]
fn test_unread_restores_every_position() {
    for text in ["", "a", "ab\ncd", "\r\n\r\nx", "one\rtwo\n\nthree", "ü\u{1f600}\nß"] {
        let mut scanner = Scanner::new(text);
        let mut history = vec![(scanner.line(), scanner.column())];
        while scanner.read().is_some() {
            history.push((scanner.line(), scanner.column()));
        }
        assert_eq!(scanner.read(), None);

        for expected in history.iter().rev().skip(1) {
            scanner.unread();
            assert_eq!((scanner.line(), scanner.column()), *expected, "text {:?}", text);
        }
        assert_eq!(scanner.offset(), 0);
    }
}

#[test]
fn test_generic_tokens() {
    let tokens = tokenize("A+B/123 - \t 'xyz'\n <>-10.11# This is a comment").unwrap();
    let expected = [
        (TokenKind::Word, "A"),
        (TokenKind::Symbol, "+"),
        (TokenKind::Word, "B"),
        (TokenKind::Symbol, "/"),
        (TokenKind::Integer, "123"),
        (TokenKind::Whitespace, " "),
        (TokenKind::Symbol, "-"),
        (TokenKind::Whitespace, " \t "),
        (TokenKind::Quoted, "'xyz'"),
        (TokenKind::Whitespace, "\n "),
        (TokenKind::Symbol, "<>"),
        (TokenKind::Float, "-10.11"),
        (TokenKind::Comment, "# This is a comment"),
        (TokenKind::Eof, ""),
    ];
    let expected: Vec<_> = expected.iter().map(|(k, v)| (*k, v.to_string())).collect();
    assert_eq!(pairs(&tokens), expected);
}

#[test]
fn test_streaming_matches_batch() {
    let text = "x = 'a' + 12.5 # tail";
    let batch = tokenize(text).unwrap();

    let mut tokenizer = Tokenizer::generic();
    tokenizer.set_scanner(Scanner::new(text));
    let mut streamed = Vec::new();
    while tokenizer.has_next_token().unwrap() {
        streamed.extend(tokenizer.next_token().unwrap());
    }
    assert_eq!(streamed, batch);

    tokenizer.reset();
    let iterated: Vec<_> = tokenizer.tokens().collect::<Result<_, _>>().unwrap();
    assert_eq!(iterated, batch);
}

#[test]
fn test_cpp_comments() {
    let mut tokenizer = comment_tokenizer(CppCommentState::new());
    let tokens = tokenizer.tokenize_buffer("a /* b */ c // d\n/e").unwrap();
    let expected = [
        (TokenKind::Word, "a"),
        (TokenKind::Comment, "/* b */"),
        (TokenKind::Word, "c"),
        (TokenKind::Comment, "// d"),
        (TokenKind::Symbol, "/"),
        (TokenKind::Word, "e"),
    ];
    let expected: Vec<_> = expected.iter().map(|(k, v)| (*k, v.to_string())).collect();
    assert_eq!(pairs(&tokens), expected);

    let mut tokenizer = comment_tokenizer(CppCommentState::c_style());
    let values = tokenizer.tokenize_buffer_to_strings("a//b").unwrap();
    assert_eq!(values, vec!["a", "/", "/", "b"]);

    let err = comment_tokenizer(CppCommentState::new())
        .tokenize_buffer("a /* open")
        .unwrap_err();
    assert!(matches!(err, TokenizerError::UnterminatedComment { .. }));
    assert_eq!(err.position().column, 3);
}

#[test]
fn test_skip_flags() {
    let mut tokenizer = comment_tokenizer(CppCommentState::new());
    tokenizer.set_flag(TokenizerFlags::SKIP_COMMENTS, true);
    let values = tokenizer.tokenize_buffer_to_strings("a /* b */ c").unwrap();
    assert_eq!(values, vec!["a", "c"]);
}

#[test]
fn test_expression_tokenizer() {
    let mut tokenizer = ExpressionTokenizer::new();
    let tokens = tokenizer.tokenize_buffer("a<>b AND 'it''s' /* note */ >= 1.5e3").unwrap();
    let expected = [
        (TokenKind::Word, "a"),
        (TokenKind::Symbol, "<>"),
        (TokenKind::Word, "b"),
        (TokenKind::Keyword, "AND"),
        (TokenKind::Quoted, "it's"),
        (TokenKind::Symbol, ">="),
        (TokenKind::Float, "1.5e3"),
    ];
    let expected: Vec<_> = expected.iter().map(|(k, v)| (*k, v.to_string())).collect();
    assert_eq!(pairs(&tokens), expected);
}
