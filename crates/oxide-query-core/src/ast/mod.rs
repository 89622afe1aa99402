//! Element tree for SQL statements.
//!
//! Every node implements [`Render`](crate::render::Render). Nodes are plain
//! data: rendering never mutates them, so one tree can be rendered any number
//! of times and against different dialects.

mod condition;
mod ddl;
mod dml;
mod expression;
mod literal;
mod select;
mod statement;
mod types;

pub use condition::{CompareOp, Condition, ConditionCollection, ConditionPair, InSource, Junction};
pub use ddl::{CreateTable, DropTable};
pub use dml::{Assignment, Delete, Insert, InsertSource, Update};
pub use expression::{col, func, lit, val, CaseExpr, ColumnRef, Expr, FunctionCall, Operator};
pub use literal::{Constant, Value};
pub use select::{
    Compound, Join, JoinKind, OrderBy, OrderDirection, Select, SelectItem, SetOperator, TableRef,
};
pub use statement::Statement;
pub use types::{ColumnDef, DataType};
