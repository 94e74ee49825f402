//! Named variables bound to expressions.

use expressions_core::Variant;
use rustc_hash::FxHashMap;

/// A named value. `None` means declared but not yet set.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    pub value: Option<Variant>,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: Option<Variant>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// A variable without a value.
    pub fn unset(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered registry of variables with unique, case-insensitive names.
#[derive(Debug, Clone, Default)]
pub struct VariableCollection {
    variables: Vec<Variable>,
    index: FxHashMap<String, usize>,
}

impl VariableCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    /// Add a variable, replacing the value of one with the same name.
    ///
    /// A replaced variable keeps its position and original spelling.
    pub fn add(&mut self, variable: Variable) {
        match self.index.get(&variable.name.to_lowercase()) {
            Some(&i) => self.variables[i].value = variable.value,
            None => {
                self.index.insert(variable.name.to_lowercase(), self.variables.len());
                self.variables.push(variable);
            }
        }
    }

    /// Set `name` to `value`, declaring it if needed.
    pub fn set(&mut self, name: &str, value: impl Into<Variant>) {
        self.add(Variable::new(name, Some(value.into())));
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Variable> {
        let i = *self.index.get(&name.to_lowercase())?;
        self.variables.get(i)
    }

    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut Variable> {
        let i = *self.index.get(&name.to_lowercase())?;
        self.variables.get_mut(i)
    }

    /// The value of `name`, if declared and set.
    pub fn get(&self, name: &str) -> Option<&Variant> {
        self.find_by_name(name).and_then(|v| v.value.as_ref())
    }

    /// Find `name`, declaring it unset when absent.
    pub fn locate(&mut self, name: &str) -> &mut Variable {
        let key = name.to_lowercase();
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.index.insert(key, self.variables.len());
                self.variables.push(Variable::unset(name));
                self.variables.len() - 1
            }
        };
        &mut self.variables[i]
    }

    /// Remove `name`, returning it if it was declared.
    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        let i = self.index.remove(&name.to_lowercase())?;
        let removed = self.variables.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Unset every variable, keeping the declarations.
    pub fn clear_values(&mut self) {
        for variable in &mut self.variables {
            variable.value = None;
        }
    }

    pub fn clear(&mut self) {
        self.variables.clear();
        self.index.clear();
    }
}

impl<'a> IntoIterator for &'a VariableCollection {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}

impl<S: AsRef<str>, V: Into<Variant>> FromIterator<(S, V)> for VariableCollection {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (name, value) in iter {
            collection.set(name.as_ref(), value);
        }
        collection
    }
}
