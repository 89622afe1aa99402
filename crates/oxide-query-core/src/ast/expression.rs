//! Expression nodes.

use std::ops;

use super::condition::{CompareOp, Condition, InSource};
use super::select::{OrderBy, OrderDirection, Select, SelectItem};
use super::{Constant, DataType, Value};
use crate::error::{Error, Result};
use crate::render::{Render, RenderContext, RenderMode};
use crate::value::ToSqlValue;

/// Arithmetic and string operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Addition; accepts two or more operands.
    Add,
    /// Subtraction; exactly two operands.
    Sub,
    /// Multiplication; accepts two or more operands.
    Mul,
    /// Division; exactly two operands.
    Div,
    /// Modulo; exactly two operands.
    Mod,
    /// String concatenation; accepts two or more operands.
    Concat,
}

impl Operator {
    /// Returns the SQL representation of the operator. Concatenation is
    /// spelled by the dialect at render time.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Concat => "||",
        }
    }

    /// Returns whether the operator takes exactly two operands.
    #[must_use]
    pub const fn is_binary_only(&self) -> bool {
        matches!(self, Self::Sub | Self::Div | Self::Mod)
    }

    fn check_arity(self, found: usize) -> Result<()> {
        let (ok, expected) = if self.is_binary_only() {
            (found == 2, "exactly 2")
        } else {
            (found >= 2, "at least 2")
        };
        if ok {
            Ok(())
        } else {
            Err(Error::OperatorArity {
                operator: self.as_str(),
                expected,
                found,
            })
        }
    }
}

/// A possibly table-qualified column reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Table name or alias.
    pub table: Option<String>,
    /// Column name.
    pub name: String,
}

impl ColumnRef {
    /// Parses `name` or `table.name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((table, column)) => Self {
                table: Some(String::from(table)),
                name: String::from(column),
            },
            None => Self {
                table: None,
                name: String::from(name),
            },
        }
    }
}

impl Render for ColumnRef {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        if let Some(table) = &self.table {
            ctx.identifier(table);
            ctx.write_char('.');
        }
        ctx.identifier(&self.name);
        Ok(())
    }
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The function name, emitted verbatim.
    pub name: String,
    /// The arguments.
    pub args: Vec<Expr>,
    /// Whether DISTINCT was specified.
    pub distinct: bool,
}

impl FunctionCall {
    /// Applies DISTINCT to the arguments.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// A searched CASE expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaseExpr {
    /// WHEN/THEN branches.
    pub branches: Vec<(Condition, Expr)>,
    /// ELSE branch.
    pub otherwise: Option<Box<Expr>>,
}

impl CaseExpr {
    /// Adds a WHEN branch.
    #[must_use]
    pub fn when(mut self, condition: Condition, then: impl Into<Expr>) -> Self {
        self.branches.push((condition, then.into()));
        self
    }

    /// Sets the ELSE branch.
    #[must_use]
    pub fn otherwise(mut self, expr: impl Into<Expr>) -> Self {
        self.otherwise = Some(Box::new(expr.into()));
        self
    }
}

/// An SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reference.
    Column(ColumnRef),
    /// A bound parameter.
    Value(Value),
    /// An inlined literal.
    Constant(Constant),
    /// `*` or `table.*`.
    Wildcard(Option<String>),
    /// An arithmetic or string operation.
    Operation {
        /// Operator.
        op: Operator,
        /// Operands, left to right.
        operands: Vec<Expr>,
    },
    /// Unary minus.
    Negate(Box<Expr>),
    /// A function call.
    Function(FunctionCall),
    /// CAST; the target is inferred from a typed value when absent.
    Cast {
        /// Expression to cast.
        expr: Box<Expr>,
        /// Target type.
        target: Option<DataType>,
    },
    /// A searched CASE expression.
    Case(CaseExpr),
    /// A scalar subquery.
    Subquery(Box<Select>),
    /// Raw SQL, emitted verbatim.
    Raw(String),
}

/// Creates a column reference; `table.column` is split on the last dot.
#[must_use]
pub fn col(name: &str) -> Expr {
    Expr::Column(ColumnRef::new(name))
}

/// Creates a bound parameter from a runtime value.
pub fn val(value: impl ToSqlValue) -> Expr {
    Expr::Value(Value::new(value))
}

/// Creates an inlined literal.
pub fn lit(value: impl Into<Constant>) -> Expr {
    Expr::Constant(value.into())
}

/// Creates a function call.
pub fn func<I, E>(name: &str, args: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::Function(FunctionCall {
        name: String::from(name),
        args: args.into_iter().map(Into::into).collect(),
        distinct: false,
    })
}

impl Expr {
    /// Creates `*`.
    #[must_use]
    pub const fn wildcard() -> Self {
        Self::Wildcard(None)
    }

    /// Creates `table.*`.
    #[must_use]
    pub fn all_of(table: &str) -> Self {
        Self::Wildcard(Some(String::from(table)))
    }

    /// Creates a raw SQL fragment.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// Starts a searched CASE expression.
    #[must_use]
    pub fn case() -> CaseExpr {
        CaseExpr::default()
    }

    /// Returns a short name for the node kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Column(_) => "column",
            Self::Value(_) => "value",
            Self::Constant(_) => "constant",
            Self::Wildcard(_) => "wildcard",
            Self::Operation { .. } => "operation",
            Self::Negate(_) => "negation",
            Self::Function(_) => "function",
            Self::Cast { .. } => "cast",
            Self::Case(_) => "case",
            Self::Subquery(_) => "subquery",
            Self::Raw(_) => "raw",
        }
    }

    /// Builds an operation from explicit operands. Arity is checked at
    /// render time.
    #[must_use]
    pub fn operation(op: Operator, operands: Vec<Self>) -> Self {
        Self::Operation { op, operands }
    }

    /// Appends to an operation of the same variadic operator, or starts a
    /// new one.
    fn chain(self, op: Operator, rhs: Self) -> Self {
        match self {
            Self::Operation { op: lhs_op, mut operands } if lhs_op == op && !op.is_binary_only() => {
                operands.push(rhs);
                Self::Operation { op, operands }
            }
            lhs => Self::Operation {
                op,
                operands: vec![lhs, rhs],
            },
        }
    }

    /// String concatenation.
    #[must_use]
    pub fn concat(self, rhs: impl Into<Self>) -> Self {
        self.chain(Operator::Concat, rhs.into())
    }

    /// CAST to an explicit type.
    #[must_use]
    pub fn cast(self, target: DataType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            target: Some(target),
        }
    }

    /// CAST to the type of the wrapped value.
    #[must_use]
    pub fn cast_inferred(self) -> Self {
        Self::Cast {
            expr: Box::new(self),
            target: None,
        }
    }

    /// Gives the expression a column alias.
    #[must_use]
    pub fn alias(self, alias: &str) -> SelectItem {
        SelectItem {
            expr: self,
            alias: Some(String::from(alias)),
        }
    }

    /// Ascending sort key.
    #[must_use]
    pub const fn asc(self) -> OrderBy {
        OrderBy {
            expr: self,
            direction: Some(OrderDirection::Asc),
        }
    }

    /// Descending sort key.
    #[must_use]
    pub const fn desc(self) -> OrderBy {
        OrderBy {
            expr: self,
            direction: Some(OrderDirection::Desc),
        }
    }

    fn compare(self, op: CompareOp, rhs: Self) -> Condition {
        Condition::Compare {
            left: self,
            op,
            right: rhs,
        }
    }

    /// `self = rhs`.
    #[must_use]
    pub fn eq(self, rhs: impl Into<Self>) -> Condition {
        self.compare(CompareOp::Eq, rhs.into())
    }

    /// `self <> rhs`.
    #[must_use]
    pub fn not_eq(self, rhs: impl Into<Self>) -> Condition {
        self.compare(CompareOp::NotEq, rhs.into())
    }

    /// `self < rhs`.
    #[must_use]
    pub fn lt(self, rhs: impl Into<Self>) -> Condition {
        self.compare(CompareOp::Lt, rhs.into())
    }

    /// `self <= rhs`.
    #[must_use]
    pub fn lt_eq(self, rhs: impl Into<Self>) -> Condition {
        self.compare(CompareOp::LtEq, rhs.into())
    }

    /// `self > rhs`.
    #[must_use]
    pub fn gt(self, rhs: impl Into<Self>) -> Condition {
        self.compare(CompareOp::Gt, rhs.into())
    }

    /// `self >= rhs`.
    #[must_use]
    pub fn gt_eq(self, rhs: impl Into<Self>) -> Condition {
        self.compare(CompareOp::GtEq, rhs.into())
    }

    /// `self IS NULL`.
    #[must_use]
    pub const fn is_null(self) -> Condition {
        Condition::IsNull {
            expr: self,
            negated: false,
        }
    }

    /// `self IS NOT NULL`.
    #[must_use]
    pub const fn is_not_null(self) -> Condition {
        Condition::IsNull {
            expr: self,
            negated: true,
        }
    }

    /// `self LIKE pattern`.
    #[must_use]
    pub fn like(self, pattern: impl Into<Self>) -> Condition {
        Condition::Like {
            expr: self,
            pattern: pattern.into(),
            negated: false,
        }
    }

    /// `self NOT LIKE pattern`.
    #[must_use]
    pub fn not_like(self, pattern: impl Into<Self>) -> Condition {
        Condition::Like {
            expr: self,
            pattern: pattern.into(),
            negated: true,
        }
    }

    /// `self BETWEEN low AND high`.
    #[must_use]
    pub fn between(self, low: impl Into<Self>, high: impl Into<Self>) -> Condition {
        Condition::Between {
            expr: self,
            low: low.into(),
            high: high.into(),
            negated: false,
        }
    }

    /// `self NOT BETWEEN low AND high`.
    #[must_use]
    pub fn not_between(self, low: impl Into<Self>, high: impl Into<Self>) -> Condition {
        Condition::Between {
            expr: self,
            low: low.into(),
            high: high.into(),
            negated: true,
        }
    }

    /// `self IN (items)`. An empty list fails at render time.
    #[must_use]
    pub fn in_list<I, E>(self, items: I) -> Condition
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        Condition::In {
            expr: self,
            source: InSource::List(items.into_iter().map(Into::into).collect()),
            negated: false,
        }
    }

    /// `self NOT IN (items)`.
    #[must_use]
    pub fn not_in_list<I, E>(self, items: I) -> Condition
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        Condition::In {
            expr: self,
            source: InSource::List(items.into_iter().map(Into::into).collect()),
            negated: true,
        }
    }

    /// `self IN (SELECT ...)`.
    #[must_use]
    pub fn in_query(self, query: Select) -> Condition {
        Condition::In {
            expr: self,
            source: InSource::Query(Box::new(query)),
            negated: false,
        }
    }

    /// `self NOT IN (SELECT ...)`.
    #[must_use]
    pub fn not_in_query(self, query: Select) -> Condition {
        Condition::In {
            expr: self,
            source: InSource::Query(Box::new(query)),
            negated: true,
        }
    }
}

/// Renders a child, parenthesizing compound operands.
fn render_operand(ctx: &mut RenderContext<'_>, operand: &Expr) -> Result<()> {
    if matches!(operand, Expr::Operation { .. }) {
        ctx.write_char('(');
        ctx.render(operand)?;
        ctx.write_char(')');
        Ok(())
    } else {
        ctx.render(operand)
    }
}

/// Renders `(SELECT ...)` in nested mode.
pub(crate) fn render_subquery(ctx: &mut RenderContext<'_>, query: &Select) -> Result<()> {
    ctx.write_char('(');
    ctx.scoped(RenderMode::Nested, |ctx| ctx.render(query))?;
    ctx.write_char(')');
    Ok(())
}

impl Render for Expr {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self {
            Self::Column(column) => ctx.render(column),
            Self::Value(value) => ctx.render(value),
            Self::Constant(constant) => ctx.render(constant),
            Self::Wildcard(table) => {
                if let Some(table) = table {
                    ctx.identifier(table);
                    ctx.write_char('.');
                }
                ctx.write_char('*');
                Ok(())
            }
            Self::Operation { op, operands } => {
                op.check_arity(operands.len())?;
                let symbol = match op {
                    Operator::Concat => ctx.dialect().concat_operator(),
                    other => other.as_str(),
                };
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        ctx.write_char(' ');
                        ctx.write(symbol);
                        ctx.write_char(' ');
                    }
                    render_operand(ctx, operand)?;
                }
                Ok(())
            }
            Self::Negate(operand) => {
                ctx.write_char('-');
                render_operand(ctx, operand)
            }
            Self::Function(call) => {
                ctx.write(&call.name);
                ctx.write_char('(');
                if call.distinct {
                    ctx.write("DISTINCT ");
                }
                ctx.render_list(&call.args, ", ")?;
                ctx.write_char(')');
                Ok(())
            }
            Self::Cast { expr, target } => {
                let inferred = match expr.as_ref() {
                    Self::Value(value) => DataType::of_value(value.get()),
                    Self::Constant(constant) => constant.data_type(),
                    _ => None,
                };
                let Some(data_type) = target.clone().or(inferred) else {
                    return Err(Error::MissingElement {
                        clause: "CAST",
                        element: "target type",
                    });
                };
                ctx.write("CAST(");
                ctx.render(expr.as_ref())?;
                ctx.write(" AS ");
                let name = ctx.dialect().format_type(&data_type);
                ctx.write(&name);
                ctx.write_char(')');
                Ok(())
            }
            Self::Case(case) => {
                if case.branches.is_empty() {
                    return Err(Error::MissingElement {
                        clause: "CASE",
                        element: "WHEN branch",
                    });
                }
                ctx.write("CASE");
                for (condition, then) in &case.branches {
                    ctx.write(" WHEN ");
                    ctx.render(condition)?;
                    ctx.write(" THEN ");
                    ctx.render(then)?;
                }
                if let Some(otherwise) = &case.otherwise {
                    ctx.write(" ELSE ");
                    ctx.render(otherwise.as_ref())?;
                }
                ctx.write(" END");
                Ok(())
            }
            Self::Subquery(query) => render_subquery(ctx, query),
            Self::Raw(sql) => {
                ctx.write(sql);
                Ok(())
            }
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Constant> for Expr {
    fn from(constant: Constant) -> Self {
        Self::Constant(constant)
    }
}

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Self::Column(column)
    }
}

impl From<FunctionCall> for Expr {
    fn from(call: FunctionCall) -> Self {
        Self::Function(call)
    }
}

impl From<CaseExpr> for Expr {
    fn from(case: CaseExpr) -> Self {
        Self::Case(case)
    }
}

impl From<Select> for Expr {
    fn from(query: Select) -> Self {
        Self::Subquery(Box::new(query))
    }
}

impl<R: Into<Self>> ops::Add<R> for Expr {
    type Output = Self;

    fn add(self, rhs: R) -> Self {
        self.chain(Operator::Add, rhs.into())
    }
}

impl<R: Into<Self>> ops::Sub<R> for Expr {
    type Output = Self;

    fn sub(self, rhs: R) -> Self {
        self.chain(Operator::Sub, rhs.into())
    }
}

impl<R: Into<Self>> ops::Mul<R> for Expr {
    type Output = Self;

    fn mul(self, rhs: R) -> Self {
        self.chain(Operator::Mul, rhs.into())
    }
}

impl<R: Into<Self>> ops::Div<R> for Expr {
    type Output = Self;

    fn div(self, rhs: R) -> Self {
        self.chain(Operator::Div, rhs.into())
    }
}

impl<R: Into<Self>> ops::Rem<R> for Expr {
    type Output = Self;

    fn rem(self, rhs: R) -> Self {
        self.chain(Operator::Mod, rhs.into())
    }
}

impl ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self {
        Self::Negate(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{CustomDialect, GenericDialect};
    use crate::render::render;

    fn sql(expr: &Expr) -> String {
        render(expr, &GenericDialect::new()).unwrap().sql().to_owned()
    }

    #[test]
    fn test_column_split() {
        assert_eq!(ColumnRef::new("u.id").table.as_deref(), Some("u"));
        assert_eq!(sql(&col("u.id")), "u.id");
        let quoted = CustomDialect::new("ansi");
        assert_eq!(render(&col("u.id"), &quoted).unwrap().sql(), "\"u\".\"id\"");
    }

    #[test]
    fn test_variadic_add_flattens() {
        let expr = col("a") + col("b") + lit(1);
        assert!(matches!(&expr, Expr::Operation { operands, .. } if operands.len() == 3));
        assert_eq!(sql(&expr), "a + b + 1");
    }

    #[test]
    fn test_nested_operations_parenthesized() {
        let expr = (col("a") - col("b")) * lit(2);
        assert_eq!(sql(&expr), "(a - b) * 2");
        assert_eq!(sql(&-(col("a") + col("b"))), "-(a + b)");
    }

    #[test]
    fn test_binary_only_arity() {
        let expr = Expr::operation(Operator::Sub, vec![col("a"), col("b"), col("c")]);
        let err = render(&expr, &GenericDialect::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::OperatorArity {
                operator: "-",
                found: 3,
                ..
            }
        ));

        let single = Expr::operation(Operator::Add, vec![col("a")]);
        assert!(render(&single, &GenericDialect::new()).is_err());
    }

    #[test]
    fn test_concat_uses_dialect_operator() {
        let dialect = CustomDialect::new("mssql").no_quoting().concat_operator("+");
        let expr = col("first").concat(lit(Constant::unsafe_string(" "))).concat(col("last"));
        assert_eq!(render(&expr, &dialect).unwrap().sql(), "first + ' ' + last");
    }

    #[test]
    fn test_cast_inference() {
        assert_eq!(sql(&val(5).cast_inferred()), "CAST(@P1 AS BIGINT)");
        assert_eq!(sql(&col("a").cast(DataType::Varchar(Some(20)))), "CAST(a AS VARCHAR(20))");

        let err = render(&col("a").cast_inferred(), &GenericDialect::new()).unwrap_err();
        assert!(matches!(err, Error::MissingElement { clause: "CAST", .. }));
        assert!(render(&val(None::<i64>).cast_inferred(), &GenericDialect::new()).is_err());
    }

    #[test]
    fn test_function_and_case() {
        let count = func("COUNT", [col("id")]);
        let Expr::Function(call) = count else {
            panic!("expected function");
        };
        assert_eq!(sql(&call.distinct().into()), "COUNT(DISTINCT id)");
        assert_eq!(sql(&func("COUNT", [Expr::wildcard()])), "COUNT(*)");

        let case = Expr::case()
            .when(col("age").lt(lit(18)), lit(Constant::unsafe_string("minor")))
            .otherwise(lit(Constant::unsafe_string("adult")));
        assert_eq!(
            sql(&case.into()),
            "CASE WHEN age < 18 THEN 'minor' ELSE 'adult' END"
        );
        assert!(render(&Expr::from(Expr::case()), &GenericDialect::new()).is_err());
    }
}
