//! Boolean conditions and their AND/OR combinations.

use super::expression::render_subquery;
use super::select::Select;
use super::Expr;
use crate::error::{Error, Result};
use crate::render::{Render, RenderContext};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl CompareOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

/// How the members of a pair or collection are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Junction {
    /// All members must hold.
    #[default]
    And,
    /// Any member may hold.
    Or,
}

impl Junction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Right-hand side of an IN test.
#[derive(Debug, Clone, PartialEq)]
pub enum InSource {
    /// A literal list; must not be empty.
    List(Vec<Expr>),
    /// A sub-select.
    Query(Box<Select>),
}

/// Two conditions joined by AND or OR.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionPair {
    /// Left side.
    pub left: Condition,
    /// Right side.
    pub right: Condition,
    /// Joining keyword.
    pub junction: Junction,
    /// Whether the pair is wrapped in parentheses.
    pub nested: bool,
}

/// Any number of conditions joined by the same keyword.
///
/// An empty collection renders as a tautology for AND (`1 = 1`) and a
/// contradiction for OR (`1 = 0`), so it can always be embedded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionCollection {
    /// Members.
    pub items: Vec<Condition>,
    /// Joining keyword.
    pub junction: Junction,
    /// Whether the collection is wrapped in parentheses.
    pub nested: bool,
}

impl ConditionCollection {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new(junction: Junction) -> Self {
        Self {
            items: Vec::new(),
            junction,
            nested: false,
        }
    }

    /// Creates an AND collection.
    #[must_use]
    pub fn and(items: impl IntoIterator<Item = Condition>) -> Self {
        Self {
            items: items.into_iter().collect(),
            junction: Junction::And,
            nested: false,
        }
    }

    /// Creates an OR collection.
    #[must_use]
    pub fn or(items: impl IntoIterator<Item = Condition>) -> Self {
        Self {
            items: items.into_iter().collect(),
            junction: Junction::Or,
            nested: false,
        }
    }

    /// Adds a member.
    pub fn push(&mut self, condition: Condition) {
        self.items.push(condition);
    }

    /// Returns whether the collection has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// A boolean condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `left <op> right`.
    Compare {
        /// Left operand.
        left: Expr,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: Expr,
    },
    /// `expr IS [NOT] NULL`.
    IsNull {
        /// Tested expression.
        expr: Expr,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },
    /// `expr [NOT] BETWEEN low AND high`.
    Between {
        /// Tested expression.
        expr: Expr,
        /// Lower bound.
        low: Expr,
        /// Upper bound.
        high: Expr,
        /// Whether this is NOT BETWEEN.
        negated: bool,
    },
    /// `expr [NOT] IN (...)`.
    In {
        /// Tested expression.
        expr: Expr,
        /// The list or sub-select.
        source: InSource,
        /// Whether this is NOT IN.
        negated: bool,
    },
    /// `expr [NOT] LIKE pattern`.
    Like {
        /// Tested expression.
        expr: Expr,
        /// Pattern.
        pattern: Expr,
        /// Whether this is NOT LIKE.
        negated: bool,
    },
    /// `[NOT] EXISTS (SELECT ...)`.
    Exists {
        /// The sub-select.
        query: Box<Select>,
        /// Whether this is NOT EXISTS.
        negated: bool,
    },
    /// `NOT (condition)`.
    Not(Box<Condition>),
    /// Two conditions.
    Pair(Box<ConditionPair>),
    /// Many conditions.
    Collection(ConditionCollection),
    /// Raw SQL, emitted verbatim.
    Raw(String),
}

impl Condition {
    /// Creates a raw SQL condition.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// `EXISTS (query)`.
    #[must_use]
    pub fn exists(query: Select) -> Self {
        Self::Exists {
            query: Box::new(query),
            negated: false,
        }
    }

    /// `NOT EXISTS (query)`.
    #[must_use]
    pub fn not_exists(query: Select) -> Self {
        Self::Exists {
            query: Box::new(query),
            negated: true,
        }
    }

    /// Joins `self` and `other` with AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.pair(other, Junction::And)
    }

    /// Joins `self` and `other` with OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.pair(other, Junction::Or)
    }

    /// Wraps the condition in `NOT (...)`.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Marks a pair or collection for explicit parentheses. Other
    /// conditions are returned unchanged.
    #[must_use]
    pub fn nested(self) -> Self {
        match self {
            Self::Pair(mut pair) => {
                pair.nested = true;
                Self::Pair(pair)
            }
            Self::Collection(mut collection) => {
                collection.nested = true;
                Self::Collection(collection)
            }
            other => other,
        }
    }

    fn pair(self, other: Self, junction: Junction) -> Self {
        Self::Pair(Box::new(ConditionPair {
            left: self,
            right: other,
            junction,
            nested: false,
        }))
    }

    /// The junction of a combining node.
    const fn junction(&self) -> Option<Junction> {
        match self {
            Self::Pair(pair) => Some(pair.junction),
            Self::Collection(collection) => Some(collection.junction),
            _ => None,
        }
    }
}

impl From<ConditionCollection> for Condition {
    fn from(collection: ConditionCollection) -> Self {
        Self::Collection(collection)
    }
}

impl From<ConditionPair> for Condition {
    fn from(pair: ConditionPair) -> Self {
        Self::Pair(Box::new(pair))
    }
}

/// Renders a member of a pair or collection. A combining member whose
/// junction differs from its parent's is parenthesized so precedence is
/// preserved.
fn render_member(ctx: &mut RenderContext<'_>, member: &Condition, parent: Junction) -> Result<()> {
    let needs_parens = member.junction().is_some_and(|j| j != parent)
        && !matches!(member, Condition::Pair(p) if p.nested)
        && !matches!(member, Condition::Collection(c) if c.nested);
    if needs_parens {
        ctx.write_char('(');
        ctx.render(member)?;
        ctx.write_char(')');
        Ok(())
    } else {
        ctx.render(member)
    }
}

fn render_grouped<F>(ctx: &mut RenderContext<'_>, nested: bool, f: F) -> Result<()>
where
    F: FnOnce(&mut RenderContext<'_>) -> Result<()>,
{
    if nested {
        ctx.write_char('(');
    }
    f(ctx)?;
    if nested {
        ctx.write_char(')');
    }
    Ok(())
}

const fn not_kw(negated: bool) -> &'static str {
    if negated {
        "NOT "
    } else {
        ""
    }
}

impl Render for Condition {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self {
            Self::Compare { left, op, right } => {
                ctx.render(left)?;
                ctx.write_char(' ');
                ctx.write(op.as_str());
                ctx.write_char(' ');
                ctx.render(right)
            }
            Self::IsNull { expr, negated } => {
                ctx.render(expr)?;
                ctx.write(if *negated { " IS NOT NULL" } else { " IS NULL" });
                Ok(())
            }
            Self::Between {
                expr,
                low,
                high,
                negated,
            } => {
                ctx.render(expr)?;
                ctx.write_char(' ');
                ctx.write(not_kw(*negated));
                ctx.write("BETWEEN ");
                ctx.render(low)?;
                ctx.write(" AND ");
                ctx.render(high)
            }
            Self::In {
                expr,
                source,
                negated,
            } => {
                if matches!(source, InSource::List(items) if items.is_empty()) {
                    return Err(Error::InvalidElement {
                        clause: "IN",
                        reason: String::from("value list is empty"),
                    });
                }
                ctx.render(expr)?;
                ctx.write_char(' ');
                ctx.write(not_kw(*negated));
                ctx.write("IN ");
                match source {
                    InSource::List(items) => {
                        ctx.write_char('(');
                        ctx.render_list(items, ", ")?;
                        ctx.write_char(')');
                        Ok(())
                    }
                    InSource::Query(query) => render_subquery(ctx, query),
                }
            }
            Self::Like {
                expr,
                pattern,
                negated,
            } => {
                ctx.render(expr)?;
                ctx.write_char(' ');
                ctx.write(not_kw(*negated));
                ctx.write("LIKE ");
                ctx.render(pattern)
            }
            Self::Exists { query, negated } => {
                ctx.write(not_kw(*negated));
                ctx.write("EXISTS ");
                render_subquery(ctx, query)
            }
            Self::Not(inner) => {
                ctx.write("NOT (");
                ctx.render(inner.as_ref())?;
                ctx.write_char(')');
                Ok(())
            }
            Self::Pair(pair) => render_grouped(ctx, pair.nested, |ctx| {
                render_member(ctx, &pair.left, pair.junction)?;
                ctx.write_char(' ');
                ctx.write(pair.junction.as_str());
                ctx.write_char(' ');
                render_member(ctx, &pair.right, pair.junction)
            }),
            Self::Collection(collection) => {
                render_grouped(ctx, collection.nested, |ctx| {
                    if collection.items.is_empty() {
                        ctx.write(match collection.junction {
                            Junction::And => "1 = 1",
                            Junction::Or => "1 = 0",
                        });
                        return Ok(());
                    }
                    for (i, item) in collection.items.iter().enumerate() {
                        if i > 0 {
                            ctx.write_char(' ');
                            ctx.write(collection.junction.as_str());
                            ctx.write_char(' ');
                        }
                        render_member(ctx, item, collection.junction)?;
                    }
                    Ok(())
                })
            }
            Self::Raw(sql) => {
                ctx.write(sql);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{col, lit, val, Value};
    use crate::dialect::GenericDialect;
    use crate::render::render;

    fn sql(condition: &Condition) -> String {
        render(condition, &GenericDialect::new())
            .unwrap()
            .sql()
            .to_owned()
    }

    #[test]
    fn test_mixed_junctions_are_parenthesized() {
        let condition = col("a")
            .eq(lit(1))
            .or(col("b").eq(lit(2)))
            .and(col("c").eq(lit(3)));
        assert_eq!(sql(&condition), "(a = 1 OR b = 2) AND c = 3");
    }

    #[test]
    fn test_same_junction_is_flat() {
        let condition = col("a")
            .eq(lit(1))
            .and(col("b").eq(lit(2)))
            .and(col("c").eq(lit(3)));
        assert_eq!(sql(&condition), "a = 1 AND b = 2 AND c = 3");
        assert_eq!(sql(&condition.nested()), "(a = 1 AND b = 2 AND c = 3)");
    }

    #[test]
    fn test_empty_collections() {
        assert_eq!(sql(&ConditionCollection::and([]).into()), "1 = 1");
        assert_eq!(sql(&ConditionCollection::or([]).into()), "1 = 0");
    }

    #[test]
    fn test_collection_members() {
        let collection = ConditionCollection::or([
            col("x").is_null(),
            col("y").between(lit(1), lit(5)),
            col("z").not_like(val("a%")),
        ]);
        assert_eq!(
            sql(&collection.into()),
            "x IS NULL OR y BETWEEN 1 AND 5 OR z NOT LIKE @P1"
        );
    }

    #[test]
    fn test_in_list() {
        let shared = Value::new(7);
        let condition = col("id").in_list([shared.clone(), Value::new(8), shared]);
        let rendered = render(&condition, &GenericDialect::new()).unwrap();
        assert_eq!(rendered.sql(), "id IN (@P1, @P2, @P1)");
        assert_eq!(rendered.params().len(), 2);
    }

    #[test]
    fn test_empty_in_list_is_rejected() {
        let condition = col("id").not_in_list(Vec::<Expr>::new());
        let err = render(&condition, &GenericDialect::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidElement { clause: "IN", .. }));
    }

    #[test]
    fn test_not_wraps() {
        let condition = col("a").eq(lit(1)).negate();
        assert_eq!(sql(&condition), "NOT (a = 1)");
    }
}
