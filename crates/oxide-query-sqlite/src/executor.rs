//! An [`Executor`] backed by an sqlx SQLite pool.

use async_trait::async_trait;
use futures::TryStreamExt;
use oxide_query_core::{Executor, Parameters, RowSet, SqlValue};
use sqlx::Either;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;

use crate::error::{Result, SqliteError};

type Query<'q> = sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>;

/// Runs rendered SQL against a SQLite pool.
///
/// Statement text may hold several `;`-terminated statements. Parameters
/// are bound by ordinal, so `?N` placeholders may repeat across statements.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
    runtime: Option<Handle>,
}

impl SqliteExecutor {
    /// Creates an executor over `pool`. The runtime the call is made from,
    /// if any, is remembered for blocking calls made outside of it.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Uses `handle` to drive blocking calls made outside a runtime.
    #[must_use]
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Returns the pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_query(&self, sql: &str, params: &Parameters) -> Result<Vec<RowSet>> {
        debug!(sql = %sql, params = params.len(), "sqlite query");
        let mut sets = Vec::new();
        let mut current: Option<RowSet> = None;
        #[allow(deprecated)]
        let mut stream = bind_all(sqlx::query(sql), params).fetch_many(&self.pool);
        while let Some(item) = stream.try_next().await? {
            match item {
                Either::Left(done) => {
                    let set = current.take().unwrap_or_default();
                    sets.push(set.with_rows_affected(done.rows_affected()));
                }
                Either::Right(row) => {
                    let set = current.get_or_insert_with(|| {
                        RowSet::new(row.columns().iter().map(|c| c.name().to_string()))
                    });
                    let values = decode_row(&row)?;
                    set.push_row(values)
                        .map_err(|err| SqliteError::RowShape(err.to_string()))?;
                }
            }
        }
        if let Some(set) = current {
            sets.push(set);
        }
        Ok(sets)
    }

    async fn run_execute(&self, sql: &str, params: &Parameters) -> Result<u64> {
        debug!(sql = %sql, params = params.len(), "sqlite execute");
        let done = bind_all(sqlx::query(sql), params)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    fn block_on<F: std::future::Future>(&self, future: F) -> Result<F::Output> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Ok(tokio::task::block_in_place(|| handle.block_on(future)))
            }
            Ok(_) => Err(SqliteError::RuntimeRequired),
            Err(_) => match &self.runtime {
                Some(handle) => Ok(handle.block_on(future)),
                None => Err(SqliteError::RuntimeRequired),
            },
        }
    }
}

#[async_trait]
impl Executor for SqliteExecutor {
    async fn execute(&self, sql: &str, params: &Parameters) -> oxide_query_core::Result<u64> {
        Ok(self.run_execute(sql, params).await?)
    }

    async fn query(&self, sql: &str, params: &Parameters) -> oxide_query_core::Result<Vec<RowSet>> {
        Ok(self.run_query(sql, params).await?)
    }

    fn execute_blocking(&self, sql: &str, params: &Parameters) -> oxide_query_core::Result<u64> {
        Ok(self.block_on(self.run_execute(sql, params))??)
    }

    fn query_blocking(&self, sql: &str, params: &Parameters) -> oxide_query_core::Result<Vec<RowSet>> {
        Ok(self.block_on(self.run_query(sql, params))??)
    }
}

/// Binds every parameter at its ordinal. Ordinals never bound (none are
/// issued by a single scope, but merged tables may skip) are bound as NULL.
fn bind_all<'q>(mut query: Query<'q>, params: &Parameters) -> Query<'q> {
    let width = params.iter().map(|p| p.index).max().unwrap_or(0);
    let mut slots: Vec<SqlValue> = vec![SqlValue::Null; width as usize];
    for param in params.iter() {
        if let Some(slot) = (param.index as usize).checked_sub(1).and_then(|i| slots.get_mut(i)) {
            *slot = param.value.clone();
        }
    }
    for value in slots {
        query = bind_param(query, value);
    }
    query
}

fn bind_param(query: Query<'_>, value: SqlValue) -> Query<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
        SqlValue::Date(d) => query.bind(d),
        SqlValue::Timestamp(ts) => query.bind(ts),
    }
}

/// Decodes a row by the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Vec<SqlValue>> {
    let mut values = Vec::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            values.push(SqlValue::Null);
            continue;
        }
        let type_name = raw.type_info().name().to_string();
        let value = match type_name.as_str() {
            "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(i)?),
            "REAL" => SqlValue::Float(row.try_get_unchecked(i)?),
            "TEXT" | "NUMERIC" | "DATE" | "TIME" | "DATETIME" => {
                SqlValue::Text(row.try_get_unchecked(i)?)
            }
            "BLOB" => SqlValue::Blob(row.try_get_unchecked(i)?),
            _ => {
                return Err(SqliteError::UnsupportedType {
                    column: column.name().to_string(),
                    type_name,
                })
            }
        };
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool")
    }

    #[tokio::test]
    async fn test_one_row_set_per_statement() {
        let executor = SqliteExecutor::new(create_test_pool().await);
        executor
            .execute("CREATE TABLE t (id INTEGER, name TEXT);", &Parameters::new())
            .await
            .unwrap();
        let sets = executor
            .query(
                "INSERT INTO t VALUES (1, 'a'), (2, NULL);\nSELECT id, name FROM t ORDER BY id;\nSELECT id FROM t WHERE id > 5;",
                &Parameters::new(),
            )
            .await
            .unwrap();
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].rows_affected(), 2);
        assert!(sets[0].is_empty());
        assert_eq!(sets[1].columns(), ["id", "name"]);
        assert_eq!(sets[1].rows()[0].values(), [SqlValue::Int(1), SqlValue::Text(String::from("a"))]);
        assert_eq!(sets[1].rows()[1].values()[1], SqlValue::Null);
        assert!(sets[2].is_empty());
    }

    #[tokio::test]
    async fn test_database_error_is_wrapped() {
        let executor = SqliteExecutor::new(create_test_pool().await);
        let err = executor
            .query("SELECT * FROM missing;", &Parameters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, oxide_query_core::Error::Executor(_)));
        assert!(err.to_string().contains("Database error"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_blocking_on_current_thread_runtime_is_refused() {
        let executor = SqliteExecutor::new(create_test_pool().await);
        let err = executor
            .query_blocking("SELECT 1;", &Parameters::new())
            .unwrap_err();
        assert!(err.to_string().contains("runtime"));
    }
}
