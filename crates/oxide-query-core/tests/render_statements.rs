//! Tests for rendering statements: parameter identity, render-mode
//! restoration, statement layout, and structural errors.

mod common;
use common::*;

use oxide_query_core::ast::{
    col, func, lit, Compound, Condition, ConditionCollection, Constant, DataType, Delete,
    Expr, Insert, Operator, Select, Statement, Update, Value,
};
use oxide_query_core::dialect::GenericDialect;
use oxide_query_core::render::{render, RenderContext, RenderMode};
use oxide_query_core::{Error, Render, Result, SqlValue};

#[test]
fn greater_than_binds_one_parameter() {
    let age = Value::new(10);
    let rendered = render(&col("Age").gt(age), &GenericDialect::new()).unwrap();
    assert_eq!(rendered.sql(), "Age > @P1");
    assert_eq!(rendered.params().len(), 1);
    assert_eq!(rendered.params().get("@P1"), Some(&SqlValue::Int(10)));
}

#[test]
fn same_value_instance_shares_a_name() {
    let id = Value::new(7);
    let query = Select::new()
        .from("t")
        .where_clause(col("a").eq(id.clone()).or(col("b").eq(id)));
    let rendered = render(&query, &GenericDialect::new()).unwrap();
    assert_eq!(rendered.sql(), "SELECT *\nFROM t\nWHERE a = @P1 OR b = @P1;");
    assert_eq!(rendered.params().len(), 1);
}

#[test]
fn equal_values_are_distinct_parameters() {
    let query = Select::new()
        .from("t")
        .where_clause(col("a").eq(Value::new(7)).and(col("b").eq(Value::new(7))));
    let rendered = render(&query, &GenericDialect::new()).unwrap();
    assert_eq!(rendered.sql(), "SELECT *\nFROM t\nWHERE a = @P1 AND b = @P2;");
    assert_eq!(rendered.params().names().collect::<Vec<_>>(), ["@P1", "@P2"]);
}

#[test]
fn parameters_number_in_traversal_order() {
    let update = Update::table("users")
        .set("name", Value::new("ann"))
        .set("age", Value::new(30))
        .where_clause(col("id").eq(Value::new(4)));
    let rendered = render(&update, &GenericDialect::new()).unwrap();
    assert_eq!(
        rendered.sql(),
        "UPDATE users\nSET name = @P1, age = @P2\nWHERE id = @P3;"
    );
    let values: Vec<_> = rendered.params().values().cloned().collect();
    assert_eq!(
        values,
        [
            SqlValue::Text(String::from("ann")),
            SqlValue::Int(30),
            SqlValue::Int(4)
        ]
    );
}

#[test]
fn rerendering_is_idempotent() {
    let query = Select::new()
        .from("t")
        .where_clause(col("a").in_list([Value::new(1), Value::new(2)]));
    let first = render(&query, &GenericDialect::new()).unwrap();
    let second = render(&query, &GenericDialect::new()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.sql(), "SELECT *\nFROM t\nWHERE a IN (@P1, @P2);");
}

#[test]
fn insert_default_values() {
    assert_eq!(
        sql(&Insert::into("audit").default_values()),
        "INSERT INTO audit\nDEFAULT VALUES;"
    );
    assert_eq!(sql(&Insert::into("audit")), "INSERT INTO audit\nDEFAULT VALUES;");
}

#[test]
fn insert_from_select_suppresses_inner_terminator() {
    let insert = Insert::into("archive")
        .columns(["id"])
        .select(Select::new().columns([col("id")]).from("live"));
    assert_eq!(sql(&insert), "INSERT INTO archive (id)\nSELECT id\nFROM live;");
}

#[test]
fn subqueries_render_nested() {
    let admins = Select::new().columns([col("user_id")]).from("admins");
    let query = Select::new()
        .from("users")
        .where_clause(col("id").in_query(admins.clone()).and(Condition::exists(admins)));
    assert_eq!(
        sql(&query),
        "SELECT *\nFROM users\nWHERE id IN (SELECT user_id\nFROM admins) AND EXISTS (SELECT user_id\nFROM admins);"
    );
}

#[test]
fn compound_emits_one_terminator() {
    let union = Compound::union([
        Select::new().columns([col("id")]).from("a"),
        Select::new().columns([col("id")]).from("b"),
    ]);
    let rendered = render(&union, &GenericDialect::new()).unwrap();
    assert_eq!(
        rendered.sql(),
        "SELECT id\nFROM a\nUNION\nSELECT id\nFROM b;"
    );
    assert_eq!(rendered.statement_count(), 1);
}

#[test]
fn mixed_junctions_are_parenthesized() {
    let filter = ConditionCollection::and([
        col("active").eq(lit(true)),
        col("role").eq(Value::new("admin")).or(col("role").eq(Value::new("owner"))),
    ]);
    assert_eq!(
        sql(&Condition::from(filter)),
        "active = TRUE AND (role = @P1 OR role = @P2)"
    );
    assert_eq!(sql(&Condition::from(ConditionCollection::or([]))), "1 = 0");
}

#[test]
fn expressions_render_with_dialect_operators() {
    let total = (col("price") * Value::new(2)) + col("fee");
    assert_eq!(sql(&total), "(price * @P1) + fee");
    let label = col("first")
        .concat(lit(Constant::unsafe_string(" ")))
        .concat(col("last"));
    assert_eq!(sql(&label), "first || ' ' || last");
    let case: Expr = Expr::case()
        .when(col("n").gt(lit(0)), lit(Constant::unsafe_string("pos")))
        .otherwise(lit(Constant::unsafe_string("other")))
        .into();
    assert_eq!(sql(&case), "CASE WHEN n > 0 THEN 'pos' ELSE 'other' END");
    assert_eq!(sql(&func("COUNT", [Expr::wildcard()]).alias("n")), "COUNT(*) AS n");
}

#[test]
fn cast_infers_type_from_value() {
    assert_eq!(sql(&Expr::from(Value::new(5)).cast_inferred()), "CAST(@P1 AS BIGINT)");
    assert_eq!(sql(&col("x").cast(DataType::Text)), "CAST(x AS TEXT)");
    let err = render_err(&col("x").cast_inferred(), &GenericDialect::new());
    assert!(matches!(err, Error::MissingElement { clause: "CAST", .. }));
}

#[test]
fn missing_elements_are_render_errors() {
    let dialect = GenericDialect::new();
    let err = render_err(&Insert::default(), &dialect);
    assert!(matches!(
        err,
        Error::MissingElement {
            clause: "INSERT",
            element: "target table"
        }
    ));
    let err = render_err(&Update::table("t"), &dialect);
    assert!(matches!(err, Error::MissingElement { clause: "UPDATE", .. }));
    let err = render_err(&Delete::default(), &dialect);
    assert!(err.is_structural());
    let err = render_err(&Expr::operation(Operator::Sub, vec![col("a")]), &dialect);
    assert!(matches!(err, Error::OperatorArity { found: 1, .. }));
    let err = render_err(&Compound::union([Select::new().from("a")]), &dialect);
    assert!(matches!(err, Error::InvalidElement { .. }));
}

#[test]
fn value_from_expression_is_misuse() {
    let err = Value::try_from(col("a")).unwrap_err();
    assert!(matches!(err, Error::ParameterMisuse { .. }));
    assert!(Value::try_from(Expr::from(Value::new(1))).is_ok());
}

#[test]
fn statements_wrap_every_kind() {
    let statements: Vec<Statement> = vec![
        Select::new().from("a").into(),
        Delete::from("a").into(),
        Statement::raw("VACUUM"),
    ];
    let dialect = GenericDialect::new();
    let mut ctx = RenderContext::new(&dialect);
    for (i, statement) in statements.iter().enumerate() {
        if i > 0 {
            ctx.write_char('\n');
        }
        ctx.render(statement).unwrap();
    }
    assert_eq!(ctx.statement_count(), 3);
    assert_eq!(ctx.finish().sql(), "SELECT *\nFROM a;\nDELETE FROM a;\nVACUUM;");
}

/// Records the mode it was rendered in, then optionally fails.
struct Probe {
    fail: bool,
}

impl Render for Probe {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let mode = format!("{:?}@{}", ctx.mode(), ctx.depth());
        ctx.write(&mode);
        if self.fail {
            return Err(Error::InvalidElement {
                clause: "probe",
                reason: String::from("asked to fail"),
            });
        }
        Ok(())
    }
}

#[test]
fn modes_restore_after_nesting() {
    let dialect = GenericDialect::new();
    let mut ctx = RenderContext::new(&dialect);
    ctx.scoped(RenderMode::MultiStatement, |ctx| {
        ctx.scoped(RenderMode::Nested, |ctx| ctx.render(&Probe { fail: false }))?;
        assert_eq!(ctx.mode(), RenderMode::MultiStatement);
        Ok(())
    })
    .unwrap();
    assert_eq!(ctx.mode(), RenderMode::Statement);
    assert_eq!(ctx.depth(), 1);
    assert_eq!(ctx.sql(), "Nested@3");
}

#[test]
fn modes_restore_on_error_exit() {
    let dialect = GenericDialect::new();
    let mut ctx = RenderContext::new(&dialect);
    let result = ctx.scoped(RenderMode::Nested, |ctx| {
        ctx.scoped(RenderMode::Nested, |ctx| {
            ctx.scoped(RenderMode::MultiStatement, |ctx| ctx.render(&Probe { fail: true }))
        })
    });
    assert!(result.is_err());
    assert_eq!(ctx.mode(), RenderMode::Statement);
    assert_eq!(ctx.depth(), 1);
}

#[test]
fn mode_guard_restores_at_arbitrary_depth() {
    let dialect = GenericDialect::new();
    let mut ctx = RenderContext::new(&dialect);
    fn descend(ctx: &mut RenderContext<'_>, levels: usize) {
        if levels == 0 {
            assert_eq!(ctx.depth(), 33);
            return;
        }
        let mut guard = ctx.enter(RenderMode::Nested);
        descend(&mut guard, levels - 1);
    }
    descend(&mut ctx, 32);
    assert_eq!(ctx.depth(), 1);
    assert_eq!(ctx.mode(), RenderMode::Statement);
}
