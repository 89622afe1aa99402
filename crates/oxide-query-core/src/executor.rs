//! The boundary to a backing store.

use async_trait::async_trait;

use crate::error::Result;
use crate::render::Parameters;
use crate::rows::RowSet;

/// Runs rendered SQL against a backing store.
///
/// The SQL text and its [`Parameters`] are the only things that cross this
/// boundary. The text may hold several terminated statements; `query` must
/// return one [`RowSet`] per statement, in order.
///
/// The blocking variants default to driving the async forms to completion on
/// the calling thread. Executors whose futures need a reactor (most network
/// drivers) override them.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs the SQL and returns the total number of rows changed.
    async fn execute(&self, sql: &str, params: &Parameters) -> Result<u64>;

    /// Runs the SQL and returns one row-set per statement.
    async fn query(&self, sql: &str, params: &Parameters) -> Result<Vec<RowSet>>;

    /// Blocking form of [`Executor::execute`].
    ///
    /// # Errors
    ///
    /// As for [`Executor::execute`].
    fn execute_blocking(&self, sql: &str, params: &Parameters) -> Result<u64> {
        futures::executor::block_on(self.execute(sql, params))
    }

    /// Blocking form of [`Executor::query`].
    ///
    /// # Errors
    ///
    /// As for [`Executor::query`].
    fn query_blocking(&self, sql: &str, params: &Parameters) -> Result<Vec<RowSet>> {
        futures::executor::block_on(self.query(sql, params))
    }
}
