//! Stack evaluation of postfix expressions.

use std::sync::Arc;

use expressions_core::{
    EvaluationError, ExpressionsError, InternalError, Position, TypeUnsafeOperations, Variant,
    VariantOperations,
};
use expressions_tokenizer::Token;
use tracing::{debug, trace};

use super::functions::FunctionCollection;
use super::parser::ExpressionParser;
use super::token::{ExpressionToken, ExpressionTokenKind as Kind};
use super::variables::VariableCollection;

/// Value stack of one evaluation.
///
/// Running out of values means the postfix stream is malformed, which is a
/// parser defect rather than bad input.
struct CalculationStack {
    values: Vec<Variant>,
}

impl CalculationStack {
    fn new() -> Self {
        Self { values: Vec::new() }
    }

    #[inline]
    fn push(&mut self, value: Variant) {
        self.values.push(value);
    }

    fn pop(&mut self, position: Position) -> Result<Variant, InternalError> {
        self.values
            .pop()
            .ok_or_else(|| InternalError::new(position, "value stack underflow"))
    }

    /// Pop two operands, returning them in push order.
    fn pop_pair(&mut self, position: Position) -> Result<(Variant, Variant), InternalError> {
        let right = self.pop(position)?;
        let left = self.pop(position)?;
        Ok((left, right))
    }

    /// Pop the top `count` values, oldest first.
    fn pop_many(
        &mut self,
        count: usize,
        position: Position,
    ) -> Result<Vec<Variant>, InternalError> {
        let start = self
            .values
            .len()
            .checked_sub(count)
            .ok_or_else(|| InternalError::new(position, "value stack underflow"))?;
        Ok(self.values.split_off(start))
    }
}

/// Parses an expression once and evaluates it any number of times.
///
/// Variables referenced by the expression are declared (unset) in the
/// default variable collection when the expression is set, unless
/// auto-variables are turned off.
///
/// # Example
///
/// ```
/// use expressions::{ExpressionCalculator, Variant};
///
/// let mut calculator = ExpressionCalculator::with_expression("price * (1 + rate)").unwrap();
/// calculator.default_variables_mut().set("price", 100);
/// calculator.default_variables_mut().set("rate", 0.5);
/// assert_eq!(calculator.evaluate().unwrap(), Variant::from(150.0));
/// ```
pub struct ExpressionCalculator {
    parser: ExpressionParser,
    default_variables: VariableCollection,
    default_functions: FunctionCollection,
    operations: Arc<dyn VariantOperations>,
    auto_variables: bool,
}

impl ExpressionCalculator {
    /// A calculator with no expression, the default functions and the
    /// type-unsafe operations.
    pub fn new() -> Self {
        Self {
            parser: ExpressionParser::new(),
            default_variables: VariableCollection::new(),
            default_functions: FunctionCollection::with_defaults(),
            operations: Arc::new(TypeUnsafeOperations::new()),
            auto_variables: true,
        }
    }

    /// A calculator with `expression` already parsed.
    pub fn with_expression(expression: &str) -> Result<Self, ExpressionsError> {
        let mut calculator = Self::new();
        calculator.set_expression(expression)?;
        Ok(calculator)
    }

    pub fn expression(&self) -> &str {
        self.parser.expression()
    }

    /// Parse a new expression.
    pub fn set_expression(&mut self, expression: &str) -> Result<(), ExpressionsError> {
        self.parser.set_expression(expression)?;
        if self.auto_variables {
            self.create_variables();
        }
        Ok(())
    }

    /// Declare every referenced variable in the default collection.
    pub fn create_variables(&mut self) {
        for name in self.parser.variable_names() {
            self.default_variables.locate(name);
        }
    }

    pub fn original_tokens(&self) -> &[Token] {
        self.parser.original_tokens()
    }

    pub fn initial_tokens(&self) -> &[ExpressionToken] {
        self.parser.initial_tokens()
    }

    pub fn result_tokens(&self) -> &[ExpressionToken] {
        self.parser.result_tokens()
    }

    pub fn variable_names(&self) -> &[String] {
        self.parser.variable_names()
    }

    pub fn default_variables(&self) -> &VariableCollection {
        &self.default_variables
    }

    pub fn default_variables_mut(&mut self) -> &mut VariableCollection {
        &mut self.default_variables
    }

    pub fn default_functions(&self) -> &FunctionCollection {
        &self.default_functions
    }

    pub fn default_functions_mut(&mut self) -> &mut FunctionCollection {
        &mut self.default_functions
    }

    pub fn operations(&self) -> &Arc<dyn VariantOperations> {
        &self.operations
    }

    /// Replace the operator strategy.
    pub fn set_operations(&mut self, operations: Arc<dyn VariantOperations>) {
        self.operations = operations;
    }

    pub fn auto_variables(&self) -> bool {
        self.auto_variables
    }

    pub fn set_auto_variables(&mut self, enabled: bool) {
        self.auto_variables = enabled;
    }

    /// Evaluate against the default variables and functions.
    pub fn evaluate(&self) -> Result<Variant, ExpressionsError> {
        self.evaluate_with(None, None)
    }

    /// Evaluate against `variables`.
    pub fn evaluate_with_variables(
        &self,
        variables: &VariableCollection,
    ) -> Result<Variant, ExpressionsError> {
        self.evaluate_with(Some(variables), None)
    }

    /// Evaluate against the given collections, each falling back to the
    /// default one when `None`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn evaluate_with(
        &self,
        variables: Option<&VariableCollection>,
        functions: Option<&FunctionCollection>,
    ) -> Result<Variant, ExpressionsError> {
        let variables = variables.unwrap_or(&self.default_variables);
        let functions = functions.unwrap_or(&self.default_functions);
        let tokens = self.parser.result_tokens();
        debug!(
            expression = %self.parser.expression(),
            instructions = tokens.len(),
            "evaluating expression"
        );

        if tokens.is_empty() {
            return Ok(Variant::Null);
        }

        let mut stack = CalculationStack::new();
        for token in tokens {
            trace!(kind = ?token.kind, position = %token.position, "executing instruction");
            self.execute(token, &mut stack, variables, functions)?;
        }

        let result = match stack.values.len() {
            1 => stack.pop(Position::default())?,
            n => {
                return Err(InternalError::new(
                    Position::default(),
                    format!("evaluation left {} values on the stack", n),
                )
                .into());
            }
        };
        debug!(result = %result, "evaluated expression");
        Ok(result)
    }

    fn execute(
        &self,
        token: &ExpressionToken,
        stack: &mut CalculationStack,
        variables: &VariableCollection,
        functions: &FunctionCollection,
    ) -> Result<(), ExpressionsError> {
        let ops = self.operations.as_ref();
        let at = token.position;

        let value = match token.kind {
            Kind::Constant => token.value.clone(),
            Kind::Variable => variables
                .get(token.name())
                .cloned()
                .ok_or_else(|| EvaluationError::UnresolvedVariable {
                    name: token.name().to_string(),
                    position: at,
                })?,
            Kind::Function => {
                let function = functions.find_by_name(token.name()).ok_or_else(|| {
                    EvaluationError::UnknownFunction {
                        name: token.name().to_string(),
                        position: at,
                    }
                })?;
                let count = stack
                    .pop(at)?
                    .as_i32()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| InternalError::new(at, "function call without argument count"))?;
                let args = stack.pop_many(count, at)?;
                function.calculate(&args, ops)?
            }

            Kind::Unary => ops.negative(&stack.pop(at)?)?,
            Kind::Not => ops.not(&stack.pop(at)?)?,
            Kind::IsNull => Variant::Boolean(stack.pop(at)?.is_null()),
            Kind::IsNotNull => Variant::Boolean(!stack.pop(at)?.is_null()),

            kind => {
                let (left, right) = stack.pop_pair(at)?;
                match kind {
                    Kind::Plus => ops.add(&left, &right)?,
                    Kind::Minus => ops.sub(&left, &right)?,
                    Kind::Star => ops.mul(&left, &right)?,
                    Kind::Slash => ops.div(&left, &right)?,
                    Kind::Procent => ops.rem(&left, &right)?,
                    Kind::Power => ops.pow(&left, &right)?,
                    Kind::ShiftLeft => ops.shift_left(&left, &right)?,
                    Kind::ShiftRight => ops.shift_right(&left, &right)?,
                    Kind::And => ops.and(&left, &right)?,
                    Kind::Or => ops.or(&left, &right)?,
                    Kind::Xor => ops.xor(&left, &right)?,
                    Kind::Equal => ops.equal(&left, &right)?,
                    Kind::NotEqual => ops.not_equal(&left, &right)?,
                    Kind::Less => ops.less(&left, &right)?,
                    Kind::EqualLess => ops.less_equal(&left, &right)?,
                    Kind::More => ops.more(&left, &right)?,
                    Kind::EqualMore => ops.more_equal(&left, &right)?,
                    Kind::In => ops.contains(&right, &left)?,
                    Kind::NotIn => negate(ops.contains(&right, &left)?),
                    Kind::Like => ops.like(&left, &right)?,
                    Kind::NotLike => negate(ops.like(&left, &right)?),
                    Kind::Element => ops.get_element(&left, &right)?,
                    other => {
                        return Err(InternalError::new(
                            at,
                            format!("{:?} is not an instruction", other),
                        )
                        .into());
                    }
                }
            }
        };

        stack.push(value);
        Ok(())
    }
}

impl Default for ExpressionCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Logical negation of a membership or match result; Null stays Null.
fn negate(value: Variant) -> Variant {
    match value {
        Variant::Boolean(b) => Variant::Boolean(!b),
        other => other,
    }
}
