//! The expression calculator.
//!
//! Text goes through the [`ExpressionTokenizer`], the [`ExpressionParser`]
//! turns it into a postfix stream of [`ExpressionToken`]s, and the
//! [`ExpressionCalculator`] executes that stream on a value stack against a
//! [`VariableCollection`] and a [`FunctionCollection`].

mod builtins;
mod calculator;
mod functions;
mod parser;
mod token;
mod tokenizer;
mod variables;

pub use calculator::ExpressionCalculator;
pub use functions::{ExpressionFunction, FunctionCalculator, FunctionCollection};
pub use parser::ExpressionParser;
pub use token::{ExpressionToken, ExpressionTokenKind};
pub use tokenizer::{ExpressionTokenizer, ExpressionWordState, KEYWORDS, is_keyword};
pub use variables::{Variable, VariableCollection};
