//! SQL dialect support.
//!
//! Different databases format identifiers, literals, paging, and
//! transaction control differently. A [`Dialect`] is a pure policy object the
//! [`RenderContext`] consults while rendering, so the same element tree can
//! produce different text per backend.

mod custom;
mod generic;

pub use custom::{BooleanLiterals, CustomDialect, DialectConfig, TransactionSyntax};
pub use generic::GenericDialect;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::ast::DataType;
use crate::error::{Error, Result};
use crate::render::RenderContext;

/// How a dialect limits and skips rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    /// `OFFSET n ROWS FETCH FIRST m ROWS ONLY`.
    FetchFirst,
    /// `SELECT TOP m ...`.
    Top,
    /// `LIMIT m OFFSET n`.
    #[default]
    Limit,
    /// `LIMIT n, m`.
    LimitWithOffset,
    /// Wraps the query and filters on `ROW_NUMBER() OVER (...)`.
    RowNumber,
    /// Wraps the query and filters on an engine-provided row number
    /// (`ROWNUM`).
    RowNumberAutomatic,
}

/// How a dialect returns rows from data-modifying statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStyle {
    /// No output clause.
    #[default]
    None,
    /// `OUTPUT INSERTED.col` before the data source.
    Output,
    /// Trailing `RETURNING col`.
    Returning,
}

/// Transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// READ UNCOMMITTED.
    ReadUncommitted,
    /// READ COMMITTED.
    ReadCommitted,
    /// REPEATABLE READ.
    RepeatableRead,
    /// SERIALIZABLE.
    Serializable,
    /// SNAPSHOT (SQL Server).
    Snapshot,
}

impl IsolationLevel {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
            Self::Snapshot => "SNAPSHOT",
        }
    }
}

/// Options for beginning a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct TransactionOptions {
    /// Isolation level; the engine default when `None`.
    pub isolation: Option<IsolationLevel>,
    /// Whether the transaction is read-only.
    pub read_only: bool,
}

impl TransactionOptions {
    /// Creates options with the engine defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            isolation: None,
            read_only: false,
        }
    }

    /// Sets the isolation level.
    #[must_use]
    pub const fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    /// Marks the transaction read-only.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Trait for SQL dialect-specific behavior.
///
/// Every method has an ANSI-flavoured default; dialects override what
/// differs.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &str;

    /// Returns the opening and closing identifier quote characters, or
    /// `None` when identifiers are emitted verbatim.
    fn identifier_quote(&self) -> Option<(char, char)> {
        Some(('"', '"'))
    }

    /// Quotes an identifier. Dotted names are quoted per part and `*` is
    /// never quoted.
    fn quote_identifier(&self, name: &str) -> String {
        let Some((open, close)) = self.identifier_quote() else {
            return String::from(name);
        };
        let escaped_close: String = [close, close].iter().collect();
        name.split('.')
            .map(|part| {
                if part == "*" {
                    String::from(part)
                } else {
                    let escaped = part.replace(close, &escaped_close);
                    format!("{open}{escaped}{close}")
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Returns the placeholder name for the parameter with the given
    /// 1-based ordinal.
    fn parameter_name(&self, index: u32) -> String {
        format!("@P{index}")
    }

    /// Returns the statement terminator.
    fn statement_terminator(&self) -> &str {
        ";"
    }

    /// Formats a string literal, escaping single quotes by doubling them.
    fn format_string(&self, value: &str) -> String {
        let escaped = value.replace('\'', "''");
        format!("'{escaped}'")
    }

    /// Formats a boolean literal.
    fn format_bool(&self, value: bool) -> String {
        String::from(if value { "TRUE" } else { "FALSE" })
    }

    /// Formats a date literal.
    fn format_date(&self, value: NaiveDate) -> String {
        format!("DATE '{}'", value.format("%Y-%m-%d"))
    }

    /// Formats a timestamp literal.
    fn format_timestamp(&self, value: NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", value.format("%Y-%m-%d %H:%M:%S%.f"))
    }

    /// Formats a type name for CAST and column definitions.
    fn format_type(&self, data_type: &DataType) -> String {
        data_type.to_sql()
    }

    /// Returns the string concatenation operator.
    fn concat_operator(&self) -> &str {
        "||"
    }

    /// Returns the paging strategy.
    fn pagination(&self) -> Pagination {
        Pagination::Limit
    }

    /// Returns whether OFFSET can be expressed at all.
    fn supports_offset(&self) -> bool {
        true
    }

    /// Returns the row count used when an offset is given without a limit
    /// and the dialect requires a LIMIT before OFFSET.
    fn unbounded_limit(&self) -> Option<&str> {
        None
    }

    /// Returns the output clause style for data-modifying statements.
    fn output_style(&self) -> OutputStyle {
        OutputStyle::None
    }

    /// Renders a begin-transaction statement, terminator included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFeature`] for option combinations the
    /// engine cannot express.
    fn render_begin(&self, ctx: &mut RenderContext<'_>, options: &TransactionOptions) -> Result<()> {
        render_start_transaction(ctx, options)
    }

    /// Renders a commit statement, terminator included.
    ///
    /// # Errors
    ///
    /// The default implementation never fails.
    fn render_commit(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.write("COMMIT");
        ctx.terminate();
        Ok(())
    }

    /// Renders a rollback statement, terminator included.
    ///
    /// # Errors
    ///
    /// The default implementation never fails.
    fn render_rollback(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.write("ROLLBACK");
        ctx.terminate();
        Ok(())
    }
}

/// Creates the error for a feature the active dialect lacks.
pub(crate) fn unsupported(dialect: &dyn Dialect, feature: &'static str) -> Error {
    Error::UnsupportedFeature {
        dialect: String::from(dialect.name()),
        feature,
    }
}

fn reject_snapshot(ctx: &RenderContext<'_>, options: &TransactionOptions) -> Result<()> {
    if options.isolation == Some(IsolationLevel::Snapshot) {
        return Err(unsupported(ctx.dialect(), "SNAPSHOT isolation"));
    }
    Ok(())
}

/// `START TRANSACTION [ISOLATION LEVEL x][, READ ONLY]`.
///
/// # Errors
///
/// Rejects SNAPSHOT isolation.
pub fn render_start_transaction(
    ctx: &mut RenderContext<'_>,
    options: &TransactionOptions,
) -> Result<()> {
    reject_snapshot(ctx, options)?;
    let mut modes = Vec::new();
    if let Some(level) = options.isolation {
        modes.push(format!("ISOLATION LEVEL {}", level.as_str()));
    }
    if options.read_only {
        modes.push(String::from("READ ONLY"));
    }
    ctx.write("START TRANSACTION");
    if !modes.is_empty() {
        ctx.write_char(' ');
        ctx.write(&modes.join(", "));
    }
    ctx.terminate();
    Ok(())
}

/// `BEGIN [ISOLATION LEVEL x] [READ ONLY]` (PostgreSQL style).
///
/// # Errors
///
/// Rejects SNAPSHOT isolation.
pub fn render_begin_with_modes(
    ctx: &mut RenderContext<'_>,
    options: &TransactionOptions,
) -> Result<()> {
    reject_snapshot(ctx, options)?;
    ctx.write("BEGIN");
    if let Some(level) = options.isolation {
        ctx.write(" ISOLATION LEVEL ");
        ctx.write(level.as_str());
    }
    if options.read_only {
        ctx.write(" READ ONLY");
    }
    ctx.terminate();
    Ok(())
}

/// `SET TRANSACTION ISOLATION LEVEL x;` followed by `BEGIN TRANSACTION;`
/// (SQL Server style). Read-only transactions cannot be expressed.
///
/// # Errors
///
/// Rejects read-only transactions.
pub fn render_set_then_begin(
    ctx: &mut RenderContext<'_>,
    options: &TransactionOptions,
) -> Result<()> {
    if options.read_only {
        return Err(unsupported(ctx.dialect(), "read-only transactions"));
    }
    if let Some(level) = options.isolation {
        ctx.write("SET TRANSACTION ISOLATION LEVEL ");
        ctx.write(level.as_str());
        ctx.terminate();
        ctx.write_char('\n');
    }
    ctx.write("BEGIN TRANSACTION");
    ctx.terminate();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ansi;

    impl Dialect for Ansi {
        fn name(&self) -> &str {
            "ansi"
        }
    }

    #[test]
    fn test_default_quoting() {
        assert_eq!(Ansi.quote_identifier("users"), "\"users\"");
        assert_eq!(Ansi.quote_identifier("dbo.users"), "\"dbo\".\"users\"");
        assert_eq!(Ansi.quote_identifier("u.*"), "\"u\".*");
        assert_eq!(Ansi.quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_default_literals() {
        assert_eq!(Ansi.format_string("it's"), "'it''s'");
        assert_eq!(Ansi.format_bool(true), "TRUE");
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(Ansi.format_date(date), "DATE '2024-01-31'");
        assert_eq!(
            Ansi.format_timestamp(date.and_hms_opt(8, 30, 0).unwrap()),
            "TIMESTAMP '2024-01-31 08:30:00'"
        );
    }

    #[test]
    fn test_default_capabilities() {
        assert_eq!(Ansi.parameter_name(3), "@P3");
        assert_eq!(Ansi.pagination(), Pagination::Limit);
        assert!(Ansi.supports_offset());
        assert_eq!(Ansi.output_style(), OutputStyle::None);
    }

    #[test]
    fn test_start_transaction_modes() {
        let mut ctx = RenderContext::new(&Ansi);
        let options = TransactionOptions::new()
            .isolation(IsolationLevel::Serializable)
            .read_only();
        Ansi.render_begin(&mut ctx, &options).unwrap();
        let out = ctx.finish();
        assert_eq!(
            out.sql(),
            "START TRANSACTION ISOLATION LEVEL SERIALIZABLE, READ ONLY;"
        );
        assert_eq!(out.statement_count(), 1);
    }

    #[test]
    fn test_set_then_begin_counts_two_statements() {
        let mut ctx = RenderContext::new(&Ansi);
        let options = TransactionOptions::new().isolation(IsolationLevel::Snapshot);
        render_set_then_begin(&mut ctx, &options).unwrap();
        let out = ctx.finish();
        assert_eq!(
            out.sql(),
            "SET TRANSACTION ISOLATION LEVEL SNAPSHOT;\nBEGIN TRANSACTION;"
        );
        assert_eq!(out.statement_count(), 2);
    }

    #[test]
    fn test_snapshot_rejected_by_standard_syntax() {
        let mut ctx = RenderContext::new(&Ansi);
        let options = TransactionOptions::new().isolation(IsolationLevel::Snapshot);
        let err = render_begin_with_modes(&mut ctx, &options).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { feature, .. } if feature == "SNAPSHOT isolation"));
    }
}
