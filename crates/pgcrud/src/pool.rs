//! Connection pool

use crate::client::GenericClient;
use crate::config::{DEFAULT_MAX_CONNECTIONS, DbConfig};
use crate::error::{StoreError, StoreResult};
use crate::row::RowSet;
use crate::value::Value;
use deadpool_postgres::{Manager, ManagerConfig, RecyclingMethod, Status};
use tokio_postgres::NoTls;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A shared pool of PostgreSQL connections.
///
/// Created once at process start with [`Pool::open`], cloned freely into request handlers, and
/// closed once at shutdown. The pool hands out physical connections one caller at a time; every
/// method here is a single round trip and never retries.
///
/// # Example
///
/// ```ignore
/// let pool = pgcrud::Pool::open(&config).await?;
/// let affected = pool.execute("DELETE FROM tasks WHERE id = $1", &[5.into()]).await?;
/// pool.close();
/// ```
#[derive(Clone)]
pub struct Pool {
    inner: deadpool_postgres::Pool,
}

impl Pool {
    /// Open a pool from configuration and ping the server before returning.
    pub async fn open(config: &DbConfig) -> StoreResult<Self> {
        config.validate()?;
        let dsn = config.dsn()?;
        tracing::info!(
            dsn = %config.redacted_dsn()?,
            max_connections = config.max_connections,
            "opening connection pool"
        );
        Self::connect_with(&dsn, config.max_connections).await
    }

    /// Open a pool from a connection string with default sizing.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        Self::connect_with(database_url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Open a pool from a connection string with at most `max_size` connections.
    ///
    /// Fails with [`StoreError::Connection`] if the string is malformed or the liveness ping
    /// fails. There is no internal retry.
    pub async fn connect_with(database_url: &str, max_size: usize) -> StoreResult<Self> {
        let pg_config: tokio_postgres::Config = database_url
            .parse()
            .map_err(|e: tokio_postgres::Error| StoreError::Connection(e.to_string()))?;

        let mgr = Manager::from_config(pg_config, NoTls, default_manager_config());
        let inner = deadpool_postgres::Pool::builder(mgr)
            .max_size(max_size)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let pool = Self { inner };
        if let Err(err) = pool.ping().await {
            pool.inner.close();
            return Err(StoreError::Connection(format!("database is unreachable: {err}")));
        }
        Ok(pool)
    }

    /// Wrap an already configured deadpool pool. No ping is run.
    pub fn from_deadpool(inner: deadpool_postgres::Pool) -> Self {
        Self { inner }
    }

    /// Run `SELECT 1` on a pooled connection.
    pub async fn ping(&self) -> StoreResult<()> {
        let client = self.get().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(StoreError::from_db_error)?;
        Ok(())
    }

    /// Check out a connection.
    pub async fn get(&self) -> StoreResult<deadpool_postgres::Client> {
        Ok(self.inner.get().await?)
    }

    /// Execute a statement and return the number of affected rows.
    pub async fn execute(&self, sql: &str, args: &[Value]) -> StoreResult<u64> {
        GenericClient::execute(self, sql, &as_params(args)).await
    }

    /// Execute a query and return its rows.
    pub async fn query(&self, sql: &str, args: &[Value]) -> StoreResult<RowSet> {
        let rows = GenericClient::query(self, sql, &as_params(args)).await?;
        Ok(RowSet::new(rows))
    }

    /// Close the pool. Idle connections are dropped now, checked-out ones when returned.
    ///
    /// Calling this more than once is harmless.
    pub fn close(&self) {
        if !self.inner.is_closed() {
            tracing::info!("closing connection pool");
            self.inner.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Current size and availability of the pool.
    pub fn status(&self) -> Status {
        self.inner.status()
    }

    /// Access the underlying deadpool pool.
    pub fn inner(&self) -> &deadpool_postgres::Pool {
        &self.inner
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("status", &self.inner.status())
            .field("closed", &self.inner.is_closed())
            .finish()
    }
}

impl GenericClient for Pool {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        let client = self.get().await?;
        GenericClient::query(&client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        let client = self.get().await?;
        GenericClient::execute(&client, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> StoreResult<()> {
        let client = self.get().await?;
        GenericClient::batch_execute(&client, sql).await
    }
}

fn as_params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}
