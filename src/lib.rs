//! Expressions: a tokenizer framework, a dynamically typed expression
//! calculator and a logic-less template engine.
//!
//! The building blocks live in two member crates that are re-exported here:
//! - [`expressions_core`]: positions, errors, [`Variant`] and the
//!   [`VariantOperations`] strategies
//! - [`expressions_tokenizer`]: [`Scanner`], [`CharReferenceMap`], the
//!   [`Tokenizer`] and its lexical states
//!
//! This crate adds the [`calculator`] and [`mustache`] modules and a few
//! one-shot helpers.
//!
//! # Example
//!
//! ```
//! use expressions::{ExpressionCalculator, Variant};
//!
//! let mut calculator = ExpressionCalculator::with_expression("A + b / (3 - Max(-123, 1)*2)").unwrap();
//! calculator.default_variables_mut().set("a", "xyz");
//! calculator.default_variables_mut().set("b", 123);
//! assert_eq!(calculator.evaluate().unwrap(), Variant::from("xyz123"));
//! ```

use std::sync::Arc;

pub mod calculator;
pub mod mustache;

pub use calculator::{
    ExpressionCalculator, ExpressionFunction, ExpressionParser, ExpressionToken,
    ExpressionTokenKind, ExpressionTokenizer, FunctionCollection, Variable, VariableCollection,
};
pub use expressions_core::{
    EvaluationError, ExpressionsError, InternalError, Operation, Position, SyntaxError,
    SyntaxErrorKind, TokenizerError, TypeSafeOperations, TypeUnsafeOperations, Variant,
    VariantKind, VariantOperations,
};
pub use expressions_tokenizer::{
    CharReferenceMap, Scanner, StateRef, Token, TokenKind, Tokenize, Tokenizer, TokenizerFlags,
    TokenizerState, states,
};
pub use mustache::{MustacheParser, MustacheTemplate, MustacheTree};

/// Tokenize `text` with the generic tokenizer.
pub fn tokenize(text: &str) -> Result<Vec<Token>, TokenizerError> {
    Tokenizer::generic().tokenize_buffer(text)
}

/// Parse an expression into its postfix token stream.
pub fn parse_expression(text: &str) -> Result<Vec<ExpressionToken>, ExpressionsError> {
    let mut parser = ExpressionParser::new();
    parser.set_expression(text)?;
    Ok(parser.result_tokens().to_vec())
}

/// Parse and evaluate an expression in one step.
pub fn evaluate(
    expression: &str,
    variables: &VariableCollection,
    functions: &FunctionCollection,
    operations: Arc<dyn VariantOperations>,
) -> Result<Variant, ExpressionsError> {
    let mut calculator = ExpressionCalculator::new();
    calculator.set_auto_variables(false);
    calculator.set_operations(operations);
    calculator.set_expression(expression)?;
    calculator.evaluate_with(Some(variables), Some(functions))
}

/// Parse a template.
pub fn parse_template(text: &str) -> Result<MustacheTemplate, ExpressionsError> {
    MustacheTemplate::with_template(text)
}

/// Render a parsed template with `variables` over its defaults.
pub fn render(
    template: &MustacheTemplate,
    variables: &VariableCollection,
) -> Result<String, ExpressionsError> {
    template.evaluate_with_variables(variables)
}
