//! # oxide-query-core
//!
//! SQL element trees, dialect-aware rendering, and deferred statement
//! batching.
//!
//! This crate provides:
//! - An element tree for statements, conditions, and expressions
//! - A [`RenderContext`](render::RenderContext) that renders trees into
//!   dialect-specific SQL with every runtime value bound as a parameter
//! - A [`Dialect`](dialect::Dialect) abstraction covering quoting, paging,
//!   output clauses, and transaction syntax
//! - A [`DeferContext`] that batches independent statements into one round
//!   trip and hands each caller its own result
//!
//! ## Rendering
//!
//! Runtime values are [`Value`](ast::Value) nodes. They are never inlined;
//! each distinct instance becomes one named parameter:
//!
//! ```rust
//! use oxide_query_core::ast::{col, Select, Value};
//! use oxide_query_core::dialect::GenericDialect;
//! use oxide_query_core::render::render;
//!
//! let user_input = Value::new("'; DROP TABLE users; --");
//! let rendered = render(
//!     &Select::new()
//!         .columns([col("id")])
//!         .from("users")
//!         .where_clause(col("name").eq(user_input)),
//!     &GenericDialect::new(),
//! )
//! .unwrap();
//!
//! assert_eq!(rendered.sql(), "SELECT id\nFROM users\nWHERE name = @P1;");
//! assert_eq!(rendered.params().len(), 1);
//! ```
//!
//! ## Batching
//!
//! See [`DeferContext`] for queueing statements against one shared parameter
//! namespace and resolving their results through [`Deferred`] handles.

pub mod ast;
pub mod command;
pub mod defer;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod processor;
pub mod render;
pub mod rows;
pub mod value;

pub use command::Command;
pub use defer::{BatchPhase, DeferContext, DeferOptions, Deferred};
pub use error::{Error, Result};
pub use executor::Executor;
pub use processor::{ColumnMatching, FromRow, MappingConfig, ResultProcessor};
pub use render::{Parameter, Parameters, Render, RenderedSql};
pub use rows::{ColumnIndex, Row, RowSet};
pub use value::{FromSqlValue, SqlValue, ToSqlValue};
