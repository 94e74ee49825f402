//! A configurable, state-driven tokenizer.
//!
//! A [`Tokenizer`] reads characters from a [`Scanner`] and hands each one to
//! the lexical state its [`CharReferenceMap`] routes it to. States consume a
//! run of characters and produce one [`Token`]; the tokenizer then applies
//! its [`TokenizerFlags`].
//!
//! # Example
//!
//! ```
//! use expressions_tokenizer::{Tokenize, Tokenizer, TokenizerFlags};
//!
//! let mut tokenizer = Tokenizer::generic();
//! tokenizer.set_flags(TokenizerFlags::SKIP_WHITESPACES | TokenizerFlags::SKIP_EOF);
//! let values = tokenizer.tokenize_buffer_to_strings("a <> 'b'").unwrap();
//! assert_eq!(values, vec!["a", "<>", "'b'"]);
//! ```

mod char_map;
mod generic;
mod scanner;
pub mod states;
mod token;
mod tokenizer;

pub use char_map::CharReferenceMap;
pub use scanner::Scanner;
pub use token::{Token, TokenKind};
pub use tokenizer::{StateRef, Tokenize, Tokenizer, TokenizerFlags, TokenizerState, Tokens};
