//! INSERT, UPDATE, and DELETE statements.

use super::select::Select;
use super::{Condition, Expr};
use crate::dialect::{unsupported, OutputStyle};
use crate::error::{Error, Result};
use crate::render::{Render, RenderContext, RenderMode};

/// Where an INSERT takes its rows from.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// Literal rows.
    Values(Vec<Vec<Expr>>),
    /// Rows produced by a SELECT.
    Query(Box<Select>),
    /// A single row of column defaults.
    DefaultValues,
}

/// The columns a data-modifying statement hands back.
///
/// Dialects with an OUTPUT clause emit it right after the target (or the
/// SET list); RETURNING dialects append it at the end.
fn render_output(ctx: &mut RenderContext<'_>, columns: &[String], pseudo_table: &str) -> Result<()> {
    if columns.is_empty() {
        return Ok(());
    }
    let dialect = ctx.dialect();
    match dialect.output_style() {
        OutputStyle::None => Err(unsupported(dialect, "OUTPUT/RETURNING clauses")),
        OutputStyle::Output => {
            ctx.write("\nOUTPUT ");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    ctx.write(", ");
                }
                ctx.write(pseudo_table);
                ctx.write_char('.');
                ctx.identifier(column);
            }
            Ok(())
        }
        OutputStyle::Returning => Ok(()),
    }
}

fn render_returning(ctx: &mut RenderContext<'_>, columns: &[String]) {
    if !columns.is_empty() && ctx.dialect().output_style() == OutputStyle::Returning {
        ctx.write("\nRETURNING ");
        ctx.identifier_list(columns);
    }
}

fn render_where(ctx: &mut RenderContext<'_>, condition: Option<&Condition>) -> Result<()> {
    if let Some(condition) = condition {
        ctx.write("\nWHERE ");
        ctx.render(condition)?;
    }
    Ok(())
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    /// Target table.
    pub table: Option<String>,
    /// Target columns.
    pub columns: Vec<String>,
    /// Row source.
    pub source: InsertSource,
    /// Columns to hand back.
    pub returning: Vec<String>,
}

impl Default for Insert {
    fn default() -> Self {
        Self {
            table: None,
            columns: Vec::new(),
            source: InsertSource::Values(Vec::new()),
            returning: Vec::new(),
        }
    }
}

impl Insert {
    /// Creates an INSERT into `table`.
    #[must_use]
    pub fn into(table: &str) -> Self {
        Self {
            table: Some(String::from(table)),
            ..Self::default()
        }
    }

    /// Sets the target columns.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a row of values.
    #[must_use]
    pub fn values<I, E>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        let row = row.into_iter().map(Into::into).collect();
        match &mut self.source {
            InsertSource::Values(rows) => rows.push(row),
            _ => self.source = InsertSource::Values(vec![row]),
        }
        self
    }

    /// Takes rows from a SELECT.
    #[must_use]
    pub fn select(mut self, query: Select) -> Self {
        self.source = InsertSource::Query(Box::new(query));
        self
    }

    /// Inserts a single row of defaults.
    #[must_use]
    pub fn default_values(mut self) -> Self {
        self.source = InsertSource::DefaultValues;
        self
    }

    /// Hands back the given columns of the inserted rows.
    #[must_use]
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl Render for Insert {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let Some(table) = &self.table else {
            return Err(Error::MissingElement {
                clause: "INSERT",
                element: "target table",
            });
        };
        ctx.write("INSERT INTO ");
        ctx.identifier(table);
        if !self.columns.is_empty() {
            ctx.write(" (");
            ctx.identifier_list(&self.columns);
            ctx.write_char(')');
        }
        render_output(ctx, &self.returning, "INSERTED")?;
        match &self.source {
            InsertSource::Values(rows) if rows.is_empty() => {
                if !self.columns.is_empty() {
                    return Err(Error::MissingElement {
                        clause: "INSERT",
                        element: "VALUES rows",
                    });
                }
                ctx.write("\nDEFAULT VALUES");
            }
            InsertSource::Values(rows) => {
                ctx.write("\nVALUES ");
                for (i, row) in rows.iter().enumerate() {
                    if !self.columns.is_empty() && row.len() != self.columns.len() {
                        return Err(Error::InvalidElement {
                            clause: "INSERT",
                            reason: format!(
                                "row {} has {} values for {} columns",
                                i + 1,
                                row.len(),
                                self.columns.len()
                            ),
                        });
                    }
                    if i > 0 {
                        ctx.write(", ");
                    }
                    ctx.write_char('(');
                    ctx.render_list(row, ", ")?;
                    ctx.write_char(')');
                }
            }
            InsertSource::Query(query) => {
                ctx.write_char('\n');
                ctx.scoped(RenderMode::Nested, |ctx| ctx.render(query.as_ref()))?;
            }
            InsertSource::DefaultValues => {
                if !self.columns.is_empty() {
                    return Err(Error::InvalidElement {
                        clause: "INSERT",
                        reason: String::from("DEFAULT VALUES takes no column list"),
                    });
                }
                ctx.write("\nDEFAULT VALUES");
            }
        }
        render_returning(ctx, &self.returning);
        ctx.terminate();
        Ok(())
    }
}

/// A `column = value` pair in UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Target column.
    pub column: String,
    /// New value.
    pub value: Expr,
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    /// Target table.
    pub table: Option<String>,
    /// SET list.
    pub assignments: Vec<Assignment>,
    /// WHERE clause.
    pub where_clause: Option<Condition>,
    /// Columns to hand back.
    pub returning: Vec<String>,
}

impl Update {
    /// Creates an UPDATE of `table`.
    #[must_use]
    pub fn table(table: &str) -> Self {
        Self {
            table: Some(String::from(table)),
            ..Self::default()
        }
    }

    /// Adds an assignment.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<Expr>) -> Self {
        self.assignments.push(Assignment {
            column: String::from(column),
            value: value.into(),
        });
        self
    }

    /// Sets the WHERE clause; a second call ANDs onto the first.
    #[must_use]
    pub fn where_clause(mut self, condition: Condition) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Hands back the given columns of the updated rows.
    #[must_use]
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl Render for Update {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let Some(table) = &self.table else {
            return Err(Error::MissingElement {
                clause: "UPDATE",
                element: "target table",
            });
        };
        if self.assignments.is_empty() {
            return Err(Error::MissingElement {
                clause: "UPDATE",
                element: "SET assignments",
            });
        }
        ctx.write("UPDATE ");
        ctx.identifier(table);
        ctx.write("\nSET ");
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                ctx.write(", ");
            }
            ctx.identifier(&assignment.column);
            ctx.write(" = ");
            ctx.render(&assignment.value)?;
        }
        render_output(ctx, &self.returning, "INSERTED")?;
        render_where(ctx, self.where_clause.as_ref())?;
        render_returning(ctx, &self.returning);
        ctx.terminate();
        Ok(())
    }
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Delete {
    /// Target table.
    pub table: Option<String>,
    /// WHERE clause.
    pub where_clause: Option<Condition>,
    /// Columns to hand back.
    pub returning: Vec<String>,
}

impl Delete {
    /// Creates a DELETE from `table`.
    #[must_use]
    pub fn from(table: &str) -> Self {
        Self {
            table: Some(String::from(table)),
            ..Self::default()
        }
    }

    /// Sets the WHERE clause; a second call ANDs onto the first.
    #[must_use]
    pub fn where_clause(mut self, condition: Condition) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Hands back the given columns of the deleted rows.
    #[must_use]
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl Render for Delete {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let Some(table) = &self.table else {
            return Err(Error::MissingElement {
                clause: "DELETE",
                element: "target table",
            });
        };
        ctx.write("DELETE FROM ");
        ctx.identifier(table);
        render_output(ctx, &self.returning, "DELETED")?;
        render_where(ctx, self.where_clause.as_ref())?;
        render_returning(ctx, &self.returning);
        ctx.terminate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit, Value};
    use crate::dialect::{CustomDialect, GenericDialect, OutputStyle};
    use crate::render::render;

    fn sql<R: Render>(node: &R) -> String {
        render(node, &GenericDialect::new()).unwrap().sql().to_owned()
    }

    #[test]
    fn test_insert_values() {
        let insert = Insert::into("users")
            .columns(["name", "age"])
            .values([Value::new("ann"), Value::new(30)])
            .values([Value::new("bob"), Value::new(41)]);
        let rendered = render(&insert, &GenericDialect::new()).unwrap();
        assert_eq!(
            rendered.sql(),
            "INSERT INTO users (name, age)\nVALUES (@P1, @P2), (@P3, @P4);"
        );
        assert_eq!(rendered.params().len(), 4);
    }

    #[test]
    fn test_insert_default_values() {
        assert_eq!(sql(&Insert::into("audit")), "INSERT INTO audit\nDEFAULT VALUES;");
        assert_eq!(
            sql(&Insert::into("audit").default_values()),
            "INSERT INTO audit\nDEFAULT VALUES;"
        );
    }

    #[test]
    fn test_insert_errors() {
        let dialect = GenericDialect::new();
        let err = render(&Insert::default(), &dialect).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingElement {
                clause: "INSERT",
                element: "target table"
            }
        ));

        let mismatched = Insert::into("t").columns(["a", "b"]).values([lit(1)]);
        let err = render(&mismatched, &dialect).unwrap_err();
        assert!(matches!(err, Error::InvalidElement { clause: "INSERT", .. }));
    }

    #[test]
    fn test_insert_select() {
        let query = Select::new().columns([col("name")]).from("staging");
        let insert = Insert::into("users").columns(["name"]).select(query);
        assert_eq!(sql(&insert), "INSERT INTO users (name)\nSELECT name\nFROM staging;");
    }

    #[test]
    fn test_output_and_returning() {
        let insert = Insert::into("users")
            .columns(["name"])
            .values([Value::new("ann")])
            .returning(["id"]);

        let mssql = CustomDialect::new("mssql")
            .quote('[', ']')
            .output_style(OutputStyle::Output);
        assert_eq!(
            render(&insert, &mssql).unwrap().sql(),
            "INSERT INTO [users] ([name])\nOUTPUT INSERTED.[id]\nVALUES (@P1);"
        );

        let pg = CustomDialect::new("postgres")
            .no_quoting()
            .parameter_prefix("$")
            .output_style(OutputStyle::Returning);
        assert_eq!(
            render(&insert, &pg).unwrap().sql(),
            "INSERT INTO users (name)\nVALUES ($1)\nRETURNING id;"
        );

        let err = render(&insert, &GenericDialect::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_update() {
        let update = Update::table("users")
            .set("name", Value::new("ann"))
            .set("age", col("age") + lit(1))
            .where_clause(col("id").eq(Value::new(7)));
        assert_eq!(
            sql(&update),
            "UPDATE users\nSET name = @P1, age = age + 1\nWHERE id = @P2;"
        );

        let err = render(&Update::table("users"), &GenericDialect::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingElement {
                element: "SET assignments",
                ..
            }
        ));
    }

    #[test]
    fn test_delete() {
        let delete = Delete::from("sessions").where_clause(col("expired").eq(lit(true)));
        assert_eq!(sql(&delete), "DELETE FROM sessions\nWHERE expired = TRUE;");

        let mssql = CustomDialect::new("mssql")
            .no_quoting()
            .output_style(OutputStyle::Output);
        let delete = Delete::from("sessions").returning(["id"]);
        assert_eq!(
            render(&delete, &mssql).unwrap().sql(),
            "DELETE FROM sessions\nOUTPUT DELETED.id;"
        );
        assert!(render(&Delete::default(), &mssql).is_err());
    }
}
