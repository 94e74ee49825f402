//! The logic-less template engine.
//!
//! [`MustacheTokenizer`] splits text into literal runs and tag contents,
//! [`MustacheParser`] groups them into [`MustacheToken`]s and nests sections
//! into a [`MustacheTree`], and [`MustacheTemplate`] renders the tree.

mod parser;
mod template;
mod token;
mod tokenizer;

pub use parser::MustacheParser;
pub use template::{MustacheTemplate, escape_html};
pub use token::{MustacheNode, MustacheToken, MustacheTokenKind, MustacheTree, NodeId};
pub use tokenizer::{MustacheSpecialState, MustacheTokenizer};
