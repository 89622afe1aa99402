//! # oxide-query-sqlite
//!
//! SQLite support for `oxide-query-core`: a [`SqliteDialect`] and an
//! sqlx-backed [`SqliteExecutor`].
//!
//! # How SQLite differs from other dialects
//!
//! - **Parameters**: placeholders are numbered `?NNN`, so a value shared by
//!   several statements of one batch is bound once and referenced by
//!   ordinal.
//! - **[RETURNING]**: SQLite supports `RETURNING` clauses on
//!   INSERT, UPDATE, and DELETE (since SQLite 3.35.0).
//! - **Identifier quoting**: SQLite uses double quotes (`"`) as
//!   the standard quoting style, though it also accepts backticks
//!   and square brackets. See [SQLite keywords].
//! - **[Type affinity]**: declared types collapse onto the INTEGER, REAL,
//!   TEXT, BLOB, and NUMERIC affinities. Dates and timestamps are stored as
//!   ISO-8601 text and booleans as `1`/`0`.
//! - **Paging**: `LIMIT m OFFSET n`; an offset without a limit uses
//!   `LIMIT -1`.
//! - **Transactions**: always serializable. `BEGIN` accepts no isolation
//!   level and no read-only mode.
//!
//! [RETURNING]: https://www.sqlite.org/lang_returning.html
//! [SQLite keywords]: https://www.sqlite.org/lang_keywords.html
//! [Type affinity]: https://www.sqlite.org/datatype3.html
//!
//! ## Example
//!
//! ```rust
//! use oxide_query_core::ast::{col, Select, Value};
//! use oxide_query_core::render::render;
//! use oxide_query_sqlite::SqliteDialect;
//!
//! let rendered = render(
//!     &Select::new()
//!         .from("users")
//!         .where_clause(col("age").gt(Value::new(10)))
//!         .limit(5),
//!     &SqliteDialect::new(),
//! )
//! .unwrap();
//! assert_eq!(
//!     rendered.sql(),
//!     "SELECT *\nFROM \"users\"\nWHERE \"age\" > ?1\nLIMIT 5;"
//! );
//! ```

mod dialect;
mod error;
mod executor;

pub use dialect::SqliteDialect;
pub use error::SqliteError;
pub use executor::SqliteExecutor;
