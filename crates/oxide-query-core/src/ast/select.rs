//! SELECT and compound (UNION-style) statements.
//!
//! Paging is the one part of SELECT whose *shape* depends on the dialect:
//! some engines append `LIMIT`, some put `TOP` after `SELECT`, and some need
//! the whole query wrapped in a row-numbering outer query. See
//! [`Pagination`] for the strategies.

use super::expression::render_subquery;
use super::{Condition, Expr};
use crate::dialect::{unsupported, Pagination};
use crate::error::{Error, Result};
use crate::render::{Render, RenderContext, RenderMode};

/// Row count used by `LIMIT offset, count` dialects when only an offset is
/// given.
const MAX_ROW_COUNT: &str = "18446744073709551615";

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// The expression to order by.
    pub expr: Expr,
    /// Explicit direction; the engine default when `None`.
    pub direction: Option<OrderDirection>,
}

impl From<Expr> for OrderBy {
    fn from(expr: Expr) -> Self {
        Self {
            expr,
            direction: None,
        }
    }
}

impl Render for OrderBy {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.render(&self.expr)?;
        if let Some(direction) = self.direction {
            ctx.write_char(' ');
            ctx.write(direction.as_str());
        }
        Ok(())
    }
}

/// A projected column.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    /// The expression.
    pub expr: Expr,
    /// Column alias.
    pub alias: Option<String>,
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        Self { expr, alias: None }
    }
}

impl Render for SelectItem {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.render(&self.expr)?;
        if let Some(alias) = &self.alias {
            ctx.write(" AS ");
            ctx.identifier(alias);
        }
        Ok(())
    }
}

/// A table reference in FROM or JOIN.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// A named table.
    Table {
        /// Table name, optionally schema-qualified.
        name: String,
        /// Alias.
        alias: Option<String>,
    },
    /// A derived table.
    Subquery {
        /// The subquery.
        query: Box<Select>,
        /// Alias (required for subqueries).
        alias: String,
    },
}

impl TableRef {
    /// A named table without alias.
    #[must_use]
    pub fn table(name: &str) -> Self {
        Self::Table {
            name: String::from(name),
            alias: None,
        }
    }

    /// A named table with alias.
    #[must_use]
    pub fn aliased(name: &str, alias: &str) -> Self {
        Self::Table {
            name: String::from(name),
            alias: Some(String::from(alias)),
        }
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        Self::table(name)
    }
}

impl Render for TableRef {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self {
            Self::Table { name, alias } => {
                ctx.identifier(name);
                if let Some(alias) = alias {
                    ctx.write(" AS ");
                    ctx.identifier(alias);
                }
                Ok(())
            }
            Self::Subquery { query, alias } => {
                render_subquery(ctx, query)?;
                ctx.write(" AS ");
                ctx.identifier(alias);
                Ok(())
            }
        }
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
    /// RIGHT JOIN.
    Right,
    /// FULL JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinKind {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// The type of join.
    pub kind: JoinKind,
    /// The joined table.
    pub table: TableRef,
    /// The join condition; required for every kind but CROSS.
    pub on: Option<Condition>,
}

impl Render for Join {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.write(self.kind.as_str());
        ctx.write_char(' ');
        ctx.render(&self.table)?;
        match (&self.on, self.kind) {
            (Some(on), _) => {
                ctx.write(" ON ");
                ctx.render(on)
            }
            (None, JoinKind::Cross) => Ok(()),
            (None, _) => Err(Error::MissingElement {
                clause: "JOIN",
                element: "ON condition",
            }),
        }
    }
}

/// A SELECT statement.
///
/// ```rust
/// use oxide_query_core::ast::{col, Select, Value};
/// use oxide_query_core::dialect::GenericDialect;
/// use oxide_query_core::render::render;
///
/// let query = Select::new()
///     .columns([col("id"), col("name")])
///     .from("users")
///     .where_clause(col("age").gt(Value::new(18)))
///     .order_by(col("name").asc())
///     .limit(10);
/// let rendered = render(&query, &GenericDialect::new()).unwrap();
/// assert_eq!(
///     rendered.sql(),
///     "SELECT id, name\nFROM users\nWHERE age > @P1\nORDER BY name ASC\nLIMIT 10;"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    /// Whether DISTINCT was specified.
    pub distinct: bool,
    /// Projected columns; `*` when empty.
    pub columns: Vec<SelectItem>,
    /// FROM clause.
    pub from: Option<TableRef>,
    /// JOIN clauses.
    pub joins: Vec<Join>,
    /// WHERE clause.
    pub where_clause: Option<Condition>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING clause.
    pub having: Option<Condition>,
    /// ORDER BY entries.
    pub order_by: Vec<OrderBy>,
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
}

impl Select {
    /// Creates an empty SELECT.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds DISTINCT.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds one projected column.
    #[must_use]
    pub fn column(mut self, item: impl Into<SelectItem>) -> Self {
        self.columns.push(item.into());
        self
    }

    /// Adds projected columns.
    #[must_use]
    pub fn columns<I, C>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<SelectItem>,
    {
        self.columns.extend(items.into_iter().map(Into::into));
        self
    }

    /// Sets the FROM table.
    #[must_use]
    pub fn from(mut self, table: impl Into<TableRef>) -> Self {
        self.from = Some(table.into());
        self
    }

    /// Adds a JOIN.
    #[must_use]
    pub fn join(mut self, kind: JoinKind, table: impl Into<TableRef>, on: Option<Condition>) -> Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            on,
        });
        self
    }

    /// Adds an INNER JOIN.
    #[must_use]
    pub fn inner_join(self, table: impl Into<TableRef>, on: Condition) -> Self {
        self.join(JoinKind::Inner, table, Some(on))
    }

    /// Adds a LEFT JOIN.
    #[must_use]
    pub fn left_join(self, table: impl Into<TableRef>, on: Condition) -> Self {
        self.join(JoinKind::Left, table, Some(on))
    }

    /// Adds a CROSS JOIN.
    #[must_use]
    pub fn cross_join(self, table: impl Into<TableRef>) -> Self {
        self.join(JoinKind::Cross, table, None)
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

    /// Adds a GROUP BY expression.
    #[must_use]
    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    /// Sets the HAVING clause.
    #[must_use]
    pub fn having(mut self, condition: Condition) -> Self {
        self.having = Some(condition);
        self
    }

    /// Adds an ORDER BY entry.
    #[must_use]
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order_by.push(order.into());
        self
    }

    /// Sets the row limit.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the row offset.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    const fn is_paged(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }

    /// Renders everything up to and including ORDER BY.
    ///
    /// `top` goes right after SELECT/DISTINCT. With `row_number` set, the
    /// caller's ordering moves into a `ROW_NUMBER()` column and no ORDER BY
    /// is emitted.
    fn render_body(&self, ctx: &mut RenderContext<'_>, top: Option<u64>, row_number: bool) -> Result<()> {
        ctx.write("SELECT ");
        if self.distinct {
            ctx.write("DISTINCT ");
        }
        if let Some(top) = top {
            ctx.write(&format!("TOP {top} "));
        }
        if self.columns.is_empty() {
            ctx.write_char('*');
        } else {
            ctx.render_list(&self.columns, ", ")?;
        }
        if row_number {
            ctx.write(", ROW_NUMBER() OVER (ORDER BY ");
            if self.order_by.is_empty() {
                ctx.write("(SELECT NULL)");
            } else {
                ctx.render_list(&self.order_by, ", ")?;
            }
            ctx.write(") AS RowNumber");
        }
        if let Some(from) = &self.from {
            ctx.write("\nFROM ");
            ctx.render(from)?;
        }
        for join in &self.joins {
            ctx.write_char('\n');
            ctx.render(join)?;
        }
        if let Some(condition) = &self.where_clause {
            ctx.write("\nWHERE ");
            ctx.render(condition)?;
        }
        if !self.group_by.is_empty() {
            ctx.write("\nGROUP BY ");
            ctx.render_list(&self.group_by, ", ")?;
        }
        if let Some(condition) = &self.having {
            ctx.write("\nHAVING ");
            ctx.render(condition)?;
        }
        if !row_number && !self.order_by.is_empty() {
            ctx.write("\nORDER BY ");
            ctx.render_list(&self.order_by, ", ")?;
        }
        Ok(())
    }

    /// Appends the paging tail for clause-based strategies.
    fn render_tail(&self, ctx: &mut RenderContext<'_>, pagination: Pagination) -> Result<()> {
        match pagination {
            Pagination::FetchFirst => self.render_fetch(ctx, "FIRST"),
            Pagination::Top => {
                if self.offset.is_some() {
                    if self.order_by.is_empty() {
                        return Err(Error::MissingElement {
                            clause: "SELECT",
                            element: "ORDER BY for OFFSET paging",
                        });
                    }
                    self.render_fetch(ctx, "NEXT")
                } else {
                    Ok(())
                }
            }
            Pagination::Limit => {
                match (self.limit, self.offset) {
                    (Some(limit), Some(offset)) => {
                        ctx.write(&format!("\nLIMIT {limit} OFFSET {offset}"));
                    }
                    (Some(limit), None) => ctx.write(&format!("\nLIMIT {limit}")),
                    (None, Some(offset)) => match ctx.dialect().unbounded_limit() {
                        Some(all) => ctx.write(&format!("\nLIMIT {all} OFFSET {offset}")),
                        None => ctx.write(&format!("\nOFFSET {offset}")),
                    },
                    (None, None) => {}
                }
                Ok(())
            }
            Pagination::LimitWithOffset => {
                match (self.limit, self.offset) {
                    (Some(limit), Some(offset)) => {
                        ctx.write(&format!("\nLIMIT {offset}, {limit}"));
                    }
                    (Some(limit), None) => ctx.write(&format!("\nLIMIT {limit}")),
                    (None, Some(offset)) => {
                        ctx.write(&format!("\nLIMIT {offset}, {MAX_ROW_COUNT}"));
                    }
                    (None, None) => {}
                }
                Ok(())
            }
            // Unpaged queries under the wrapping strategies need no tail.
            Pagination::RowNumber | Pagination::RowNumberAutomatic => Ok(()),
        }
    }

    fn render_fetch(&self, ctx: &mut RenderContext<'_>, first: &str) -> Result<()> {
        if let Some(offset) = self.offset {
            ctx.write(&format!("\nOFFSET {offset} ROWS"));
        }
        if let Some(limit) = self.limit {
            let word = if self.offset.is_some() { "NEXT" } else { first };
            ctx.write(&format!("\nFETCH {word} {limit} ROWS ONLY"));
        }
        Ok(())
    }

    fn render_row_number(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        if self.order_by.is_empty() {
            tracing::warn!("row-number paging without ORDER BY yields an arbitrary row order");
        }
        ctx.write("SELECT * FROM (\n");
        ctx.scoped(RenderMode::Nested, |ctx| self.render_body(ctx, None, true))?;
        ctx.write("\n) AS PagedQuery\nWHERE ");
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                let low = offset.saturating_add(1);
                let high = offset.saturating_add(limit);
                ctx.write(&format!("RowNumber BETWEEN {low} AND {high}"));
            }
            (Some(limit), None) => ctx.write(&format!("RowNumber <= {limit}")),
            (None, Some(offset)) => ctx.write(&format!("RowNumber > {offset}")),
            (None, None) => {}
        }
        ctx.write("\nORDER BY RowNumber");
        Ok(())
    }

    fn render_rownum(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match (self.limit, self.offset) {
            (Some(limit), None) => {
                ctx.write("SELECT * FROM (\n");
                ctx.scoped(RenderMode::Nested, |ctx| self.render_body(ctx, None, false))?;
                ctx.write(&format!("\n) PagedQuery\nWHERE ROWNUM <= {limit}"));
            }
            (limit, offset) => {
                let offset = offset.unwrap_or(0);
                ctx.write("SELECT * FROM (\nSELECT PagedQuery.*, ROWNUM AS RowNumber FROM (\n");
                ctx.scoped(RenderMode::Nested, |ctx| self.render_body(ctx, None, false))?;
                ctx.write("\n) PagedQuery");
                if let Some(limit) = limit {
                    let high = offset.saturating_add(limit);
                    ctx.write(&format!("\nWHERE ROWNUM <= {high}"));
                }
                ctx.write(&format!("\n)\nWHERE RowNumber > {offset}"));
            }
        }
        Ok(())
    }
}

impl Render for Select {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let dialect = ctx.dialect();
        if self.offset.is_some() && !dialect.supports_offset() {
            return Err(unsupported(dialect, "OFFSET"));
        }
        let pagination = dialect.pagination();
        match pagination {
            Pagination::RowNumber if self.is_paged() => self.render_row_number(ctx)?,
            Pagination::RowNumberAutomatic if self.is_paged() => self.render_rownum(ctx)?,
            _ => {
                let top = match pagination {
                    Pagination::Top if self.offset.is_none() => self.limit,
                    _ => None,
                };
                self.render_body(ctx, top, false)?;
                self.render_tail(ctx, pagination)?;
            }
        }
        ctx.terminate();
        Ok(())
    }
}

/// Set operators joining compound members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    /// UNION.
    Union,
    /// UNION ALL.
    UnionAll,
    /// INTERSECT.
    Intersect,
    /// EXCEPT.
    Except,
}

impl SetOperator {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// Several SELECTs joined by one set operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    /// The set operator.
    pub op: SetOperator,
    /// Members, at least two.
    pub members: Vec<Select>,
}

impl Compound {
    /// Creates a compound from its members.
    #[must_use]
    pub fn new(op: SetOperator, members: impl IntoIterator<Item = Select>) -> Self {
        Self {
            op,
            members: members.into_iter().collect(),
        }
    }

    /// Creates a UNION.
    #[must_use]
    pub fn union(members: impl IntoIterator<Item = Select>) -> Self {
        Self::new(SetOperator::Union, members)
    }

    /// Creates a UNION ALL.
    #[must_use]
    pub fn union_all(members: impl IntoIterator<Item = Select>) -> Self {
        Self::new(SetOperator::UnionAll, members)
    }
}

impl Render for Compound {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        if self.members.len() < 2 {
            return Err(Error::InvalidElement {
                clause: self.op.as_str(),
                reason: format!("needs at least two members, found {}", self.members.len()),
            });
        }
        let separator = format!("\n{}\n", self.op.as_str());
        ctx.scoped(RenderMode::MultiStatement, |ctx| {
            ctx.render_list(&self.members, &separator)
        })?;
        ctx.terminate();
        Ok(())
    }
}
