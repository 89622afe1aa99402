//! Top-level statements.

use super::{Compound, CreateTable, Delete, DropTable, Insert, Select, Update};
use crate::dialect::TransactionOptions;
use crate::error::Result;
use crate::render::{Render, RenderContext};

/// A statement usable inside a [`Command`](crate::Command) or a deferred
/// batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT.
    Select(Select),
    /// INSERT.
    Insert(Insert),
    /// UPDATE.
    Update(Update),
    /// DELETE.
    Delete(Delete),
    /// UNION-style compound.
    Compound(Compound),
    /// CREATE TABLE.
    CreateTable(CreateTable),
    /// DROP TABLE.
    DropTable(DropTable),
    /// Begin a transaction; spelled by the dialect.
    Begin(TransactionOptions),
    /// COMMIT.
    Commit,
    /// ROLLBACK.
    Rollback,
    /// Raw SQL, emitted verbatim and terminated.
    Raw(String),
}

impl Statement {
    /// Creates a raw statement.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }
}

impl Render for Statement {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        match self {
            Self::Select(s) => ctx.render(s),
            Self::Insert(s) => ctx.render(s),
            Self::Update(s) => ctx.render(s),
            Self::Delete(s) => ctx.render(s),
            Self::Compound(s) => ctx.render(s),
            Self::CreateTable(s) => ctx.render(s),
            Self::DropTable(s) => ctx.render(s),
            Self::Begin(options) => {
                let dialect = ctx.dialect();
                dialect.render_begin(ctx, options)
            }
            Self::Commit => {
                let dialect = ctx.dialect();
                dialect.render_commit(ctx)
            }
            Self::Rollback => {
                let dialect = ctx.dialect();
                dialect.render_rollback(ctx)
            }
            Self::Raw(sql) => {
                ctx.write(sql);
                ctx.terminate();
                Ok(())
            }
        }
    }
}

macro_rules! impl_from_statement {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Statement {
                fn from(statement: $variant) -> Self {
                    Self::$variant(statement)
                }
            }
        )*
    };
}

impl_from_statement!(Select, Insert, Update, Delete, Compound, CreateTable, DropTable);

impl From<TransactionOptions> for Statement {
    fn from(options: TransactionOptions) -> Self {
        Self::Begin(options)
    }
}
