//! Parameter tables and identity-keyed parameter interning.

use std::collections::HashMap;

use crate::ast::Value;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::value::SqlValue;

/// A named, bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Placeholder name as it appears in the SQL text (e.g. `@P1`).
    pub name: String,
    /// 1-based ordinal assigned by the scope's counter.
    pub index: u32,
    /// Bound value.
    pub value: SqlValue,
}

/// An ordered parameter table.
///
/// Parameters appear in the order they were first used, which is also the
/// order of their ordinals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<Parameter>,
}

impl Parameters {
    /// Creates an empty parameter table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a value by placeholder name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Iterates over the parameters in ordinal order.
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.entries.iter()
    }

    /// Returns the bound values in ordinal order.
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.entries.iter().map(|p| &p.value)
    }

    /// Returns the placeholder names in ordinal order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }

    pub(crate) fn push(&mut self, parameter: Parameter) {
        self.entries.push(parameter);
    }

    /// Merges another table into this one.
    ///
    /// A name that is already present is skipped when it carries the same
    /// value and rejected otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterCollision`] when a name is bound to two
    /// different values.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        for parameter in other {
            match self.entries.iter().find(|p| p.name == parameter.name) {
                Some(existing) if existing.value == parameter.value => {}
                Some(_) => {
                    return Err(Error::ParameterCollision {
                        name: parameter.name.clone(),
                    });
                }
                None => self.entries.push(parameter.clone()),
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Numbering state for one render or batch scope.
///
/// Names come from a single monotonic counter and are keyed by the identity
/// of the [`Value`] node, so rendering the same instance twice yields the
/// same name. The scope keeps a clone of every interned value alive; an
/// identity cannot be recycled while the scope exists.
#[derive(Debug, Default, Clone)]
pub struct ParameterScope {
    next: u32,
    interned: HashMap<usize, Parameter>,
    retained: Vec<Value>,
}

impl ParameterScope {
    /// Creates an empty scope whose first parameter is numbered 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of parameters issued so far.
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.next
    }

    /// Returns the parameter for `value`, creating it on first sight.
    ///
    /// The boolean is `true` when the parameter was created by this call.
    pub(crate) fn intern(&mut self, value: &Value, dialect: &dyn Dialect) -> (Parameter, bool) {
        if let Some(existing) = self.interned.get(&value.identity()) {
            return (existing.clone(), false);
        }
        self.next += 1;
        let parameter = Parameter {
            name: dialect.parameter_name(self.next),
            index: self.next,
            value: value.get().clone(),
        };
        self.interned.insert(value.identity(), parameter.clone());
        self.retained.push(value.clone());
        (parameter, true)
    }

    /// Marks the current position so a failed render can be undone.
    pub(crate) const fn checkpoint(&self) -> u32 {
        self.next
    }

    /// Forgets every parameter issued after `checkpoint`.
    pub(crate) fn rollback(&mut self, checkpoint: u32) {
        if checkpoint >= self.next {
            return;
        }
        self.interned.retain(|_, p| p.index <= checkpoint);
        self.retained.truncate(checkpoint as usize);
        self.next = checkpoint;
    }
}
