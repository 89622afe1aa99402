//! An ordered list of statements bound to a dialect and an executor.

use std::sync::Arc;

use tracing::debug;

use crate::ast::Statement;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::processor::ResultProcessor;
use crate::render::{RenderContext, RenderedSql};
use crate::rows::RowSet;

/// A unit of work: statements rendered together with one local parameter
/// scope and handed to the executor in a single call.
///
/// ```rust
/// use std::sync::Arc;
///
/// use oxide_query_core::ast::{col, Insert, Select, Value};
/// use oxide_query_core::dialect::GenericDialect;
/// # use oxide_query_core::{Executor, Parameters, Result, RowSet};
/// # struct Noop;
/// # #[async_trait::async_trait]
/// # impl Executor for Noop {
/// #     async fn execute(&self, _: &str, _: &Parameters) -> Result<u64> { Ok(0) }
/// #     async fn query(&self, _: &str, _: &Parameters) -> Result<Vec<RowSet>> { Ok(vec![]) }
/// # }
/// use oxide_query_core::Command;
///
/// let command = Command::new(Arc::new(GenericDialect::new()), Arc::new(Noop))
///     .with(Insert::into("log").columns(["msg"]).values([Value::new("hi")]))
///     .with(Select::new().from("log").where_clause(col("id").gt(Value::new(1))));
/// let rendered = command.render().unwrap();
/// assert_eq!(
///     rendered.sql(),
///     "INSERT INTO log (msg)\nVALUES (@P1);\nSELECT *\nFROM log\nWHERE id > @P2;"
/// );
/// ```
pub struct Command {
    dialect: Arc<dyn Dialect>,
    executor: Arc<dyn Executor>,
    statements: Vec<Statement>,
}

impl Command {
    /// Creates an empty command.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>, executor: Arc<dyn Executor>) -> Self {
        Self {
            dialect,
            executor,
            statements: Vec::new(),
        }
    }

    /// Appends a statement.
    #[must_use]
    pub fn with(mut self, statement: impl Into<Statement>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Appends a statement in place.
    pub fn push(&mut self, statement: impl Into<Statement>) -> &mut Self {
        self.statements.push(statement.into());
        self
    }

    /// Returns the statements.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Renders every statement, newline separated, with one local parameter
    /// scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingElement`] for an empty command and the first
    /// structural error of any statement.
    pub fn render(&self) -> Result<RenderedSql> {
        if self.statements.is_empty() {
            return Err(Error::MissingElement {
                clause: "command",
                element: "statements",
            });
        }
        let mut ctx = RenderContext::new(self.dialect.as_ref());
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                ctx.write_char('\n');
            }
            ctx.render(statement)?;
        }
        let rendered = ctx.finish();
        debug!(
            dialect = self.dialect.name(),
            statements = rendered.statement_count(),
            params = rendered.params().len(),
            "rendered command"
        );
        Ok(rendered)
    }

    /// Renders and executes, returning the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns render errors and executor errors.
    pub async fn execute(&self) -> Result<u64> {
        let rendered = self.render()?;
        self.executor
            .execute(rendered.sql(), rendered.params())
            .await
    }

    /// Renders and queries, returning one row-set per statement.
    ///
    /// # Errors
    ///
    /// Returns render errors and executor errors.
    pub async fn query(&self) -> Result<Vec<RowSet>> {
        let rendered = self.render()?;
        self.executor.query(rendered.sql(), rendered.params()).await
    }

    /// Renders, queries, and processes the last statement's row-set.
    ///
    /// # Errors
    ///
    /// Returns render, executor, and processor errors.
    pub async fn query_as<T, P>(&self, processor: P) -> Result<T>
    where
        P: ResultProcessor<T>,
    {
        let sets = self.query().await?;
        Box::new(processor).process(last_set(sets))
    }

    /// Blocking form of [`Command::execute`].
    ///
    /// # Errors
    ///
    /// As for [`Command::execute`].
    pub fn execute_blocking(&self) -> Result<u64> {
        let rendered = self.render()?;
        self.executor
            .execute_blocking(rendered.sql(), rendered.params())
    }

    /// Blocking form of [`Command::query`].
    ///
    /// # Errors
    ///
    /// As for [`Command::query`].
    pub fn query_blocking(&self) -> Result<Vec<RowSet>> {
        let rendered = self.render()?;
        self.executor
            .query_blocking(rendered.sql(), rendered.params())
    }
}

fn last_set(sets: Vec<RowSet>) -> RowSet {
    sets.into_iter().last().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::ast::{col, Delete, Select, Value};
    use crate::dialect::GenericDialect;
    use crate::processor;
    use crate::render::Parameters;
    use crate::value::SqlValue;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl Executor for Recorder {
        async fn execute(&self, sql: &str, params: &Parameters) -> Result<u64> {
            self.calls.lock().unwrap().push((String::from(sql), params.len()));
            Ok(2)
        }

        async fn query(&self, sql: &str, params: &Parameters) -> Result<Vec<RowSet>> {
            self.calls.lock().unwrap().push((String::from(sql), params.len()));
            let mut set = RowSet::new(["n"]);
            set.push_row(vec![SqlValue::Int(5)])?;
            Ok(vec![RowSet::empty(), set])
        }
    }

    fn command(executor: Arc<Recorder>) -> Command {
        Command::new(Arc::new(GenericDialect::new()), executor)
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let err = command(Arc::new(Recorder::default())).render().unwrap_err();
        assert!(matches!(err, Error::MissingElement { clause: "command", .. }));
    }

    #[test]
    fn test_shared_value_numbered_once() {
        let id = Value::new(9);
        let mut cmd = command(Arc::new(Recorder::default()));
        cmd.push(Delete::from("a").where_clause(col("id").eq(id.clone())))
            .push(Delete::from("b").where_clause(col("id").eq(id)));
        let rendered = cmd.render().unwrap();
        assert_eq!(
            rendered.sql(),
            "DELETE FROM a\nWHERE id = @P1;\nDELETE FROM b\nWHERE id = @P1;"
        );
        assert_eq!(rendered.params().len(), 1);
        assert_eq!(rendered.statement_count(), 2);
    }

    #[tokio::test]
    async fn test_execute_and_query() {
        let recorder = Arc::new(Recorder::default());
        let cmd = command(Arc::clone(&recorder))
            .with(Delete::from("t"))
            .with(Select::new().from("t"));
        assert_eq!(cmd.execute().await.unwrap(), 2);
        let n: i64 = cmd.query_as(processor::scalar()).await.unwrap();
        assert_eq!(n, 5);
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "DELETE FROM t;\nSELECT *\nFROM t;");
    }

    #[test]
    fn test_blocking_paths() {
        let recorder = Arc::new(Recorder::default());
        let cmd = command(Arc::clone(&recorder)).with(Select::new().from("t"));
        assert_eq!(cmd.query_blocking().unwrap().len(), 2);
        assert_eq!(cmd.execute_blocking().unwrap(), 2);
    }
}
