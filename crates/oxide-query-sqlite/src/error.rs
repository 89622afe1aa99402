//! Error types for the SQLite executor.

/// Errors raised by [`SqliteExecutor`](crate::SqliteExecutor).
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    /// The database rejected the statement or the connection failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A blocking call was made without a runtime that can drive it.
    #[error("blocking execution needs a multi-threaded tokio runtime or an attached runtime handle")]
    RuntimeRequired,

    /// A column held a value the row decoder does not understand.
    #[error("Unsupported column type `{type_name}` in column `{column}`")]
    UnsupportedType {
        /// Column name.
        column: String,
        /// SQLite type name reported for the value.
        type_name: String,
    },

    /// A decoded row did not fit its row-set.
    #[error("Malformed row: {0}")]
    RowShape(String),
}

impl From<SqliteError> for oxide_query_core::Error {
    fn from(err: SqliteError) -> Self {
        Self::executor(err)
    }
}

/// Result type for SQLite executor internals.
pub type Result<T> = std::result::Result<T, SqliteError>;
