//! Callable functions for expressions.

use std::fmt;
use std::sync::Arc;

use expressions_core::{EvaluationError, Variant, VariantOperations};
use rustc_hash::FxHashMap;

use super::builtins;

/// A function body: ordered arguments and the active operations strategy in,
/// one value out.
pub type FunctionCalculator = Arc<
    dyn Fn(&[Variant], &dyn VariantOperations) -> Result<Variant, EvaluationError> + Send + Sync,
>;

/// A named function.
#[derive(Clone)]
pub struct ExpressionFunction {
    name: String,
    calculator: FunctionCalculator,
}

impl ExpressionFunction {
    pub fn new<F>(name: impl Into<String>, calculator: F) -> Self
    where
        F: Fn(&[Variant], &dyn VariantOperations) -> Result<Variant, EvaluationError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            calculator: Arc::new(calculator),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function.
    pub fn calculate(
        &self,
        args: &[Variant],
        operations: &dyn VariantOperations,
    ) -> Result<Variant, EvaluationError> {
        (self.calculator)(args, operations)
    }
}

impl fmt::Debug for ExpressionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionFunction").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Registry of functions with unique, case-insensitive names.
#[derive(Debug, Clone, Default)]
pub struct FunctionCollection {
    functions: Vec<ExpressionFunction>,
    index: FxHashMap<String, usize>,
}

impl FunctionCollection {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection holding the standard library of functions.
    pub fn with_defaults() -> Self {
        let mut collection = Self::new();
        builtins::register(&mut collection);
        collection
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExpressionFunction> {
        self.functions.iter()
    }

    /// Register a function, replacing one with the same name.
    pub fn add(&mut self, function: ExpressionFunction) {
        let key = function.name.to_lowercase();
        match self.index.get(&key) {
            Some(&i) => self.functions[i] = function,
            None => {
                self.index.insert(key, self.functions.len());
                self.functions.push(function);
            }
        }
    }

    /// Register a closure under `name`.
    pub fn add_fn<F>(&mut self, name: &str, calculator: F)
    where
        F: Fn(&[Variant], &dyn VariantOperations) -> Result<Variant, EvaluationError>
            + Send
            + Sync
            + 'static,
    {
        self.add(ExpressionFunction::new(name, calculator));
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ExpressionFunction> {
        let i = *self.index.get(&name.to_lowercase())?;
        self.functions.get(i)
    }

    pub fn remove(&mut self, name: &str) -> Option<ExpressionFunction> {
        let i = self.index.remove(&name.to_lowercase())?;
        let removed = self.functions.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.functions.clear();
        self.index.clear();
    }
}
