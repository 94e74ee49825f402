//! Generic implementations of the lexical states.

mod comment;
mod number;
mod quote;
mod symbol;
mod whitespace;
mod word;

pub use comment::{CppCommentState, GenericCommentState};
pub use number::GenericNumberState;
pub use quote::{decode_string, GenericQuoteState};
pub use symbol::{GenericSymbolState, SymbolTree};
pub use whitespace::GenericWhitespaceState;
pub use word::GenericWordState;

use expressions_core::{Position, TokenizerError};

use crate::scanner::Scanner;
use crate::token::Token;
use crate::tokenizer::Tokenizer;

/// Hand the cursor over to the tokenizer's symbol state.
pub(crate) fn delegate_to_symbol(
    scanner: &mut Scanner,
    tokenizer: &Tokenizer,
    position: Position,
) -> Result<Token, TokenizerError> {
    match tokenizer.symbol_state() {
        Some(state) => state.next_token(scanner, tokenizer),
        None => Err(TokenizerError::MissingSymbolState { position }),
    }
}
