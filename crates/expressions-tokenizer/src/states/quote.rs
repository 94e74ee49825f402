use expressions_core::TokenizerError;

use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use crate::tokenizer::{Tokenizer, TokenizerState};

/// Consumes a quoted string, quotes included.
///
/// The opening character is the quote; a doubled quote inside the string
/// stands for one literal quote.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericQuoteState;

impl GenericQuoteState {
    pub fn new() -> Self {
        Self
    }
}

impl TokenizerState for GenericQuoteState {
    fn next_token(
        &self,
        scanner: &mut Scanner,
        _tokenizer: &Tokenizer,
    ) -> Result<Token, TokenizerError> {
        let position = scanner.peek_position();
        let start = scanner.offset();
        let Some(quote) = scanner.read() else {
            return Ok(Token::new(TokenKind::Quoted, "", position));
        };

        loop {
            match scanner.read() {
                None => return Err(TokenizerError::UnterminatedQuote { position }),
                Some(ch) if ch == quote => {
                    if scanner.peek() == Some(quote) {
                        scanner.read();
                    } else {
                        break;
                    }
                }
                Some(_) => {}
            }
        }

        Ok(Token::new(TokenKind::Quoted, scanner.slice_from(start), position))
    }
}

/// Strip the surrounding quotes and collapse doubled quotes.
///
/// The first character is taken as the quote. Text that is not quoted is
/// returned unchanged.
pub fn decode_string(value: &str) -> String {
    let mut chars = value.chars();
    let Some(quote) = chars.next() else {
        return String::new();
    };
    if value.chars().count() < 2 || !value.ends_with(quote) {
        return value.to_string();
    }

    let inner = &value[quote.len_utf8()..value.len() - quote.len_utf8()];
    let doubled: String = [quote, quote].iter().collect();
    inner.replace(&doubled, &quote.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode() {
        assert_eq!(decode_string("'xyz'"), "xyz");
        assert_eq!(decode_string("'it''s'"), "it's");
        assert_eq!(decode_string("\"ab\"\"de\""), "ab\"de");
        assert_eq!(decode_string("''"), "");
        assert_eq!(decode_string("abc"), "abc");
    }
}
