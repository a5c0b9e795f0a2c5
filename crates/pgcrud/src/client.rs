//! Generic client trait for unified database access.

use crate::error::{StoreError, StoreResult};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Emit the statement about to run on the `pgcrud.sql` target.
pub(crate) fn trace_sql(kind: &'static str, sql: &str, param_count: usize) {
    tracing::debug!(target: "pgcrud.sql", kind, param_count, sql = %sql);
}

/// A trait that unifies database clients, pooled connections and transactions.
///
/// Every method is a single round trip; none of them retries. Dropping the returned future
/// abandons the in-flight statement.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = StoreResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = StoreResult<u64>> + Send;

    /// Execute one or more `;`-separated statements without parameters.
    fn batch_execute(&self, sql: &str) -> impl std::future::Future<Output = StoreResult<()>> + Send;
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        trace_sql("query", sql, params.len());
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(StoreError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        trace_sql("execute", sql, params.len());
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(StoreError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> StoreResult<()> {
        trace_sql("batch", sql, 0);
        tokio_postgres::Client::batch_execute(self, sql)
            .await
            .map_err(StoreError::from_db_error)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        trace_sql("query", sql, params.len());
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(StoreError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        trace_sql("execute", sql, params.len());
        tokio_postgres::Transaction::execute(self, sql, params)
            .await
            .map_err(StoreError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> StoreResult<()> {
        trace_sql("batch", sql, 0);
        tokio_postgres::Transaction::batch_execute(self, sql)
            .await
            .map_err(StoreError::from_db_error)
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        let client: &tokio_postgres::Client = self;
        GenericClient::query(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        let client: &tokio_postgres::Client = self;
        GenericClient::execute(client, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> StoreResult<()> {
        let client: &tokio_postgres::Client = self;
        GenericClient::batch_execute(client, sql).await
    }
}
