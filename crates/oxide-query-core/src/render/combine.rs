//! Merging rendered outputs into one executable unit.

use super::{Parameters, RenderedSql};
use crate::error::Result;

/// Concatenates already-rendered statements into a single unit that shares
/// one parameter namespace.
///
/// Each appended output keeps its own terminator; outputs are separated by a
/// newline.
#[derive(Debug, Default, Clone)]
pub struct CombineContext {
    sql: String,
    params: Parameters,
    statements: usize,
    parts: usize,
}

impl CombineContext {
    /// Creates an empty combine context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rendered output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterCollision`](crate::Error::ParameterCollision)
    /// when `rendered` binds a name already bound to a different value. On
    /// error the context is left unchanged.
    pub fn append(&mut self, rendered: &RenderedSql) -> Result<()> {
        let mut params = self.params.clone();
        params.merge(rendered.params())?;
        self.params = params;
        if !self.sql.is_empty() {
            self.sql.push('\n');
        }
        self.sql.push_str(rendered.sql());
        self.statements += rendered.statement_count();
        self.parts += 1;
        Ok(())
    }

    /// Returns whether nothing has been appended.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.parts == 0
    }

    /// Returns the number of appended outputs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.parts
    }

    /// Returns the total number of terminated statements.
    #[must_use]
    pub const fn statement_count(&self) -> usize {
        self.statements
    }

    /// Returns the combined SQL so far.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the merged parameters so far.
    #[must_use]
    pub const fn params(&self) -> &Parameters {
        &self.params
    }

    /// Produces the combined output.
    #[must_use]
    pub fn finish(self) -> RenderedSql {
        RenderedSql {
            sql: self.sql,
            params: self.params,
            statements: self.statements,
        }
    }
}
