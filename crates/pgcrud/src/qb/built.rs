//! The output of every builder: SQL text plus its ordered arguments.

use crate::client::GenericClient;
use crate::error::StoreResult;
use crate::row::{FromRow, RowSet};
use crate::value::Value;
use std::collections::BTreeSet;
use tokio_postgres::types::ToSql;

/// A parameterized statement.
///
/// `sql` uses positional placeholders (`$1`, `$2`, ...) and `args[k - 1]` is bound to `$k`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    sql: String,
    args: Vec<Value>,
}

impl BuiltQuery {
    pub(crate) fn new(sql: String, args: Vec<Value>) -> Self {
        Self { sql, args }
    }

    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The arguments, in placeholder order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }

    /// Number of distinct `$n` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        let bytes = self.sql.as_bytes();
        let mut seen = BTreeSet::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end > start {
                    seen.insert(&self.sql[start..end]);
                }
                i = end.max(start);
            } else {
                i += 1;
            }
        }
        seen.len()
    }

    /// Get parameters as references compatible with tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }

    /// Execute and return the affected row count.
    pub async fn execute(&self, conn: &impl GenericClient) -> StoreResult<u64> {
        conn.execute(&self.sql, &self.params_ref()).await
    }

    /// Execute and return the raw result rows.
    pub async fn fetch_rows(&self, conn: &impl GenericClient) -> StoreResult<RowSet> {
        let rows = conn.query(&self.sql, &self.params_ref()).await?;
        Ok(RowSet::new(rows))
    }

    /// Execute and map exactly one row to `T`.
    ///
    /// Zero rows is [`StoreError::NotFound`](crate::StoreError::NotFound), more than one is
    /// [`StoreError::TooManyRows`](crate::StoreError::TooManyRows).
    pub async fn fetch_one<T: FromRow>(&self, conn: &impl GenericClient) -> StoreResult<T> {
        self.fetch_rows(conn).await?.collect_one()
    }

    /// Execute and map every row to `T`.
    pub async fn fetch_all<T: FromRow>(&self, conn: &impl GenericClient) -> StoreResult<Vec<T>> {
        self.fetch_rows(conn).await?.collect_many()
    }
}
