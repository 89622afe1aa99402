//! A dialect assembled from configuration.
//!
//! [`CustomDialect`] exposes every knob of the [`Dialect`] contract either
//! through builder methods or through a serde-deserializable
//! [`DialectConfig`], so applications can describe an engine without writing
//! a new type.

use serde::Deserialize;

use super::{
    render_begin_with_modes, render_set_then_begin, render_start_transaction, Dialect,
    OutputStyle, Pagination, TransactionOptions,
};
use crate::error::Result;
use crate::render::RenderContext;

/// How boolean constants are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanLiterals {
    /// `TRUE` / `FALSE`.
    #[default]
    Keywords,
    /// `1` / `0`.
    Numeric,
}

/// Which begin-transaction syntax the engine speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSyntax {
    /// `START TRANSACTION ISOLATION LEVEL x, READ ONLY`.
    #[default]
    StartTransaction,
    /// `BEGIN ISOLATION LEVEL x READ ONLY`.
    BeginWithModes,
    /// `SET TRANSACTION ISOLATION LEVEL x;` then `BEGIN TRANSACTION;`.
    SetThenBegin,
}

/// Configuration for a [`CustomDialect`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    /// Dialect name, used in error messages.
    pub name: String,
    /// Opening and closing identifier quotes; `None` emits identifiers
    /// verbatim.
    pub identifier_quote: Option<(char, char)>,
    /// Placeholder prefix; the ordinal is appended.
    pub parameter_prefix: String,
    /// Paging strategy.
    pub pagination: Pagination,
    /// Whether OFFSET can be expressed.
    pub supports_offset: bool,
    /// Output clause style.
    pub output_style: OutputStyle,
    /// Boolean literal spelling.
    pub boolean_literals: BooleanLiterals,
    /// Begin-transaction syntax.
    pub transaction_syntax: TransactionSyntax,
    /// String concatenation operator.
    pub concat_operator: String,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            name: String::from("custom"),
            identifier_quote: Some(('"', '"')),
            parameter_prefix: String::from("@P"),
            pagination: Pagination::Limit,
            supports_offset: true,
            output_style: OutputStyle::None,
            boolean_literals: BooleanLiterals::Keywords,
            transaction_syntax: TransactionSyntax::StartTransaction,
            concat_operator: String::from("||"),
        }
    }
}

/// A dialect whose behavior is entirely described by a [`DialectConfig`].
///
/// ```rust
/// use oxide_query_core::dialect::{CustomDialect, Dialect, Pagination};
///
/// let mssql = CustomDialect::new("mssql")
///     .quote('[', ']')
///     .pagination(Pagination::Top)
///     .offset_support(false);
/// assert_eq!(mssql.quote_identifier("dbo.Users"), "[dbo].[Users]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomDialect {
    config: DialectConfig,
}

impl CustomDialect {
    /// Creates a dialect with ANSI defaults and the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: DialectConfig {
                name: name.into(),
                ..DialectConfig::default()
            },
        }
    }

    /// Creates a dialect from configuration.
    #[must_use]
    pub const fn from_config(config: DialectConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &DialectConfig {
        &self.config
    }

    /// Sets the identifier quote characters.
    #[must_use]
    pub const fn quote(mut self, open: char, close: char) -> Self {
        self.config.identifier_quote = Some((open, close));
        self
    }

    /// Emits identifiers verbatim.
    #[must_use]
    pub const fn no_quoting(mut self) -> Self {
        self.config.identifier_quote = None;
        self
    }

    /// Sets the placeholder prefix.
    #[must_use]
    pub fn parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.parameter_prefix = prefix.into();
        self
    }

    /// Sets the paging strategy.
    #[must_use]
    pub const fn pagination(mut self, pagination: Pagination) -> Self {
        self.config.pagination = pagination;
        self
    }

    /// Sets whether OFFSET can be expressed.
    #[must_use]
    pub const fn offset_support(mut self, supported: bool) -> Self {
        self.config.supports_offset = supported;
        self
    }

    /// Sets the output clause style.
    #[must_use]
    pub const fn output_style(mut self, style: OutputStyle) -> Self {
        self.config.output_style = style;
        self
    }

    /// Spells booleans as `1` / `0`.
    #[must_use]
    pub const fn numeric_booleans(mut self) -> Self {
        self.config.boolean_literals = BooleanLiterals::Numeric;
        self
    }

    /// Sets the begin-transaction syntax.
    #[must_use]
    pub const fn transaction_syntax(mut self, syntax: TransactionSyntax) -> Self {
        self.config.transaction_syntax = syntax;
        self
    }

    /// Sets the concatenation operator.
    #[must_use]
    pub fn concat_operator(mut self, operator: impl Into<String>) -> Self {
        self.config.concat_operator = operator.into();
        self
    }
}

impl Dialect for CustomDialect {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn identifier_quote(&self) -> Option<(char, char)> {
        self.config.identifier_quote
    }

    fn parameter_name(&self, index: u32) -> String {
        format!("{}{index}", self.config.parameter_prefix)
    }

    fn format_bool(&self, value: bool) -> String {
        match self.config.boolean_literals {
            BooleanLiterals::Keywords => String::from(if value { "TRUE" } else { "FALSE" }),
            BooleanLiterals::Numeric => String::from(if value { "1" } else { "0" }),
        }
    }

    fn concat_operator(&self) -> &str {
        &self.config.concat_operator
    }

    fn pagination(&self) -> Pagination {
        self.config.pagination
    }

    fn supports_offset(&self) -> bool {
        self.config.supports_offset
    }

    fn output_style(&self) -> OutputStyle {
        self.config.output_style
    }

    fn render_begin(&self, ctx: &mut RenderContext<'_>, options: &TransactionOptions) -> Result<()> {
        match self.config.transaction_syntax {
            TransactionSyntax::StartTransaction => render_start_transaction(ctx, options),
            TransactionSyntax::BeginWithModes => render_begin_with_modes(ctx, options),
            TransactionSyntax::SetThenBegin => render_set_then_begin(ctx, options),
        }
    }

    fn render_commit(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self.config.transaction_syntax {
            TransactionSyntax::SetThenBegin => ctx.write("COMMIT TRANSACTION"),
            _ => ctx.write("COMMIT"),
        }
        ctx.terminate();
        Ok(())
    }

    fn render_rollback(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self.config.transaction_syntax {
            TransactionSyntax::SetThenBegin => ctx.write("ROLLBACK TRANSACTION"),
            _ => ctx.write("ROLLBACK"),
        }
        ctx.terminate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_knobs() {
        let dialect = CustomDialect::new("oracle")
            .parameter_prefix(":p")
            .pagination(Pagination::RowNumberAutomatic)
            .offset_support(true)
            .output_style(OutputStyle::Returning)
            .numeric_booleans();
        assert_eq!(dialect.name(), "oracle");
        assert_eq!(dialect.parameter_name(2), ":p2");
        assert_eq!(dialect.format_bool(false), "0");
        assert_eq!(Dialect::pagination(&dialect), Pagination::RowNumberAutomatic);
        assert_eq!(Dialect::output_style(&dialect), OutputStyle::Returning);
    }

    #[test]
    fn test_no_quoting() {
        let dialect = CustomDialect::new("plain").no_quoting();
        assert_eq!(dialect.quote_identifier("Order"), "Order");
    }

    #[test]
    fn test_commit_spelling_follows_syntax() {
        let dialect = CustomDialect::new("mssql").transaction_syntax(TransactionSyntax::SetThenBegin);
        let mut ctx = RenderContext::new(&dialect);
        dialect.render_commit(&mut ctx).unwrap();
        assert_eq!(ctx.finish().sql(), "COMMIT TRANSACTION;");
    }
}
