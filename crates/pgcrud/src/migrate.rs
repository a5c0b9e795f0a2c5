//! Versioned SQL migrations tracked in a database table.
//!
//! A [`Migrator`] reads migrations from a [`MigrationSource`], compares them with the versions
//! recorded in the tracking table and applies the pending ones in ascending version order.
//! Running it again once everything is applied is a no-op that reports zero applied
//! migrations.
//!
//! # Example (migrations directory)
//!
//! ```ignore
//! use pgcrud::migrate::{DirSource, Migrator};
//!
//! let mut migrator = Migrator::from_config(DirSource::new("./migrations"), &config)?;
//! let applied = migrator.up(&pool).await?;
//! tracing::info!(applied, "database is up to date");
//! ```
//!
//! # Example (embedded SQL)
//!
//! ```ignore
//! use pgcrud::migrate::{EmbeddedMigration, EmbeddedSource, Migrator};
//!
//! static MIGRATIONS: &[EmbeddedMigration] = &[
//!     EmbeddedMigration::new(1, "create_tasks", include_str!("../migrations/V1__create_tasks.sql")),
//! ];
//!
//! Migrator::new(EmbeddedSource::new(MIGRATIONS)).up(&pool).await?;
//! ```

use crate::client::GenericClient;
use crate::config::{DEFAULT_MIGRATIONS_TABLE, DbConfig};
use crate::error::{StoreError, StoreResult};
use crate::ident::Ident;
use crate::qb::{self, WhereClause};
use crate::row::{FromRow, RowExt, RowSet};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tokio_postgres::Row;

/// One migration: a version key, a descriptive name and the SQL to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: i64,
    pub name: String,
    pub sql: String,
}

/// Applied migration row from the tracking table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub applied_at: DateTime<Utc>,
}

impl FromRow for AppliedMigration {
    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            version: row.try_get_column("version")?,
            applied_at: row.try_get_column("applied_at")?,
        })
    }
}

/// Computed migration status for a source + database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub local: Vec<Migration>,
    pub applied: Vec<AppliedMigration>,
    pub pending: Vec<Migration>,
    pub missing_local: Vec<AppliedMigration>,
}

/// Where migrations come from.
pub trait MigrationSource {
    /// All migrations, sorted ascending by version with no duplicate versions.
    fn migrations(&self) -> StoreResult<Vec<Migration>>;

    /// Release whatever the source holds. Called once after every run.
    fn close(&mut self) -> StoreResult<()> {
        Ok(())
    }
}

impl<S: MigrationSource + ?Sized> MigrationSource for Box<S> {
    fn migrations(&self) -> StoreResult<Vec<Migration>> {
        (**self).migrations()
    }

    fn close(&mut self) -> StoreResult<()> {
        (**self).close()
    }
}

/// Sort by version and reject duplicates.
fn ordered(migrations: Vec<Migration>) -> StoreResult<Vec<Migration>> {
    let mut by_version: BTreeMap<i64, Migration> = BTreeMap::new();
    for m in migrations {
        if let Some(existing) = by_version.get(&m.version) {
            return Err(StoreError::MigrationSource(format!(
                "duplicate migration version {}: '{}' vs '{}'",
                m.version, existing.name, m.name
            )));
        }
        by_version.insert(m.version, m);
    }
    Ok(by_version.into_values().collect())
}

/// A migration compiled into the binary.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedMigration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

impl EmbeddedMigration {
    pub const fn new(version: i64, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }
}

/// Migrations from a static list, typically built with `include_str!`.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedSource {
    migrations: &'static [EmbeddedMigration],
}

impl EmbeddedSource {
    pub const fn new(migrations: &'static [EmbeddedMigration]) -> Self {
        Self { migrations }
    }
}

impl MigrationSource for EmbeddedSource {
    fn migrations(&self) -> StoreResult<Vec<Migration>> {
        ordered(
            self.migrations
                .iter()
                .map(|m| Migration {
                    version: m.version,
                    name: m.name.to_string(),
                    sql: m.sql.to_string(),
                })
                .collect(),
        )
    }
}

/// Migrations from in-memory values.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    migrations: Vec<Migration>,
}

impl MemorySource {
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }
}

impl MigrationSource for MemorySource {
    fn migrations(&self) -> StoreResult<Vec<Migration>> {
        ordered(self.migrations.clone())
    }
}

/// Migrations read from `*.sql` files in a directory.
///
/// Supported file names:
/// - `V1__create_tasks.sql`, `V1__create_tasks.up.sql`
/// - `20240101120000_create_tasks.up.sql`, `1_create_tasks.sql`
///
/// `*.down.sql` files are skipped; other files are ignored.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MigrationSource for DirSource {
    fn migrations(&self) -> StoreResult<Vec<Migration>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            StoreError::MigrationSource(format!(
                "failed to read migrations dir {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                StoreError::MigrationSource(format!(
                    "failed to read entry in {}: {e}",
                    self.dir.display()
                ))
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some((version, name)) = parse_migration_filename(file_name) else {
                continue;
            };

            let sql = fs::read_to_string(&path).map_err(|e| {
                StoreError::MigrationSource(format!(
                    "failed to read migration {}: {e}",
                    path.display()
                ))
            })?;
            out.push(Migration { version, name, sql });
        }

        ordered(out)
    }
}

/// Parse an up-migration file name into `(version, name)`.
pub fn parse_migration_filename(file_name: &str) -> Option<(i64, String)> {
    if file_name.ends_with(".down.sql") {
        return None;
    }
    let stem = file_name
        .strip_suffix(".up.sql")
        .or_else(|| file_name.strip_suffix(".sql"))?;

    let (version_str, name) = match stem.strip_prefix('V') {
        Some(rest) => rest.split_once("__")?,
        None => stem.split_once('_')?,
    };
    if name.is_empty() || version_str.is_empty() || !version_str.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let version = version_str.parse::<i64>().ok()?;
    if version <= 0 {
        return None;
    }
    Some((version, name.to_string()))
}

/// Combine the outcome of a run with the outcome of closing its resources.
///
/// The run error wins. Otherwise the source-side close error is reported, and the store-side
/// close error only when both the run and the source close succeeded.
fn settle<T>(
    result: StoreResult<T>,
    source_closed: StoreResult<()>,
    store_closed: StoreResult<()>,
) -> StoreResult<T> {
    match (result, source_closed, store_closed) {
        (Err(err), source, store) => {
            if let Err(e) = source {
                tracing::warn!(error = %e, "failed to close migration source");
            }
            if let Err(e) = store {
                tracing::warn!(error = %e, "failed to release migration lock");
            }
            Err(err)
        }
        (Ok(_), Err(err), store) => {
            if let Err(e) = store {
                tracing::warn!(error = %e, "failed to release migration lock");
            }
            Err(err)
        }
        (Ok(_), Ok(()), Err(err)) => Err(err),
        (Ok(value), Ok(()), Ok(())) => Ok(value),
    }
}

/// Stable advisory-lock key for a tracking table (64-bit FNV-1a).
fn lock_key(table: &Ident) -> i64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in b"pgcrud:".iter().chain(table.as_str().as_bytes()) {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash as i64
}

/// Applies pending migrations and records them in the tracking table.
///
/// `up` is meant to run once at startup, before the pool serves requests. Concurrent runs
/// against the same tracking table are serialized by a session-level advisory lock.
#[derive(Debug)]
pub struct Migrator<S> {
    source: S,
    table: Ident,
    atomic: bool,
}

impl<S: MigrationSource> Migrator<S> {
    /// Create a migrator using the default tracking table.
    pub fn new(source: S) -> Self {
        Self {
            source,
            table: Ident::trusted(DEFAULT_MIGRATIONS_TABLE),
            atomic: true,
        }
    }

    /// Create a migrator using the tracking table named in `config`.
    pub fn from_config(source: S, config: &DbConfig) -> StoreResult<Self> {
        Self::new(source).table(&config.migrations_table)
    }

    /// Use a different tracking table.
    pub fn table(mut self, name: &str) -> StoreResult<Self> {
        self.table = Ident::parse(name)?;
        Ok(self)
    }

    /// Run each migration and its tracking row in one transaction (default `true`).
    ///
    /// Turn this off for migrations containing statements PostgreSQL refuses to run inside a
    /// transaction block, such as `CREATE INDEX CONCURRENTLY`. A body that then fails halfway
    /// leaves its earlier statements applied and its version unrecorded.
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn table_name(&self) -> &str {
        self.table.as_str()
    }

    /// Apply pending migrations on a pooled connection; returns how many were applied.
    ///
    /// The connection is detached from the pool and closed afterwards, so dropping this future
    /// mid-run ends the session and releases the advisory lock with it.
    #[cfg(feature = "pool")]
    pub async fn up(&mut self, pool: &crate::pool::Pool) -> StoreResult<usize> {
        let mut client = deadpool_postgres::Object::take(pool.get().await?);
        self.run(&mut client).await
    }

    /// Apply pending migrations on a single connection; returns how many were applied.
    ///
    /// Migrations are applied in ascending version order and each version is recorded right
    /// after its SQL succeeds. The first failure stops the run with [`StoreError::Migration`];
    /// migrations applied earlier in the same run stay applied. Failing to lock, create or read
    /// the tracking table yields [`StoreError::MigrationSetup`].
    ///
    /// The advisory lock is session-scoped: if this future is dropped before it finishes, the lock
    /// is held until `client` is closed.
    pub async fn run(&mut self, client: &mut tokio_postgres::Client) -> StoreResult<usize> {
        let key = lock_key(&self.table);
        let (result, locked) =
            match GenericClient::execute(&*client, "SELECT pg_advisory_lock($1)", &[&key]).await {
                Ok(_) => (self.apply_pending(client).await, true),
                Err(err) => (Err(StoreError::migration_setup(err)), false),
            };

        let source_closed = self.source.close();
        let store_closed = if locked {
            GenericClient::execute(&*client, "SELECT pg_advisory_unlock($1)", &[&key])
                .await
                .map(|_| ())
                .map_err(StoreError::migration_setup)
        } else {
            Ok(())
        };

        settle(result, source_closed, store_closed)
    }

    async fn apply_pending(&self, client: &mut tokio_postgres::Client) -> StoreResult<usize> {
        ensure_table(&*client, &self.table)
            .await
            .map_err(StoreError::migration_setup)?;
        let applied: HashSet<i64> = fetch_applied(&*client, &self.table)
            .await
            .map_err(StoreError::migration_setup)?
            .into_iter()
            .map(|m| m.version)
            .collect();

        let pending: Vec<Migration> = self
            .source
            .migrations()?
            .into_iter()
            .filter(|m| !applied.contains(&m.version))
            .collect();

        if pending.is_empty() {
            tracing::info!(table = %self.table, "no pending migrations");
            return Ok(0);
        }

        let mut count = 0;
        for m in &pending {
            self.apply_one(client, m)
                .await
                .map_err(|e| StoreError::migration(m.version, e))?;
            tracing::info!(version = m.version, name = %m.name, "applied migration");
            count += 1;
        }
        Ok(count)
    }

    async fn apply_one(
        &self,
        client: &mut tokio_postgres::Client,
        migration: &Migration,
    ) -> StoreResult<()> {
        let record = qb::build_insert(
            self.table.as_str(),
            &["version"],
            [Value::Int(migration.version)],
        )?;

        if self.atomic {
            let tx = client
                .transaction()
                .await
                .map_err(StoreError::from_db_error)?;
            GenericClient::batch_execute(&tx, &migration.sql).await?;
            record.execute(&tx).await?;
            tx.commit().await.map_err(StoreError::from_db_error)?;
        } else {
            GenericClient::batch_execute(&*client, &migration.sql).await?;
            record.execute(&*client).await?;
        }
        Ok(())
    }

    /// Compare the source with the tracking table without changing anything.
    pub async fn status(&self, client: &impl GenericClient) -> StoreResult<MigrationStatus> {
        let local = self.source.migrations()?;
        let applied = match fetch_applied(client, &self.table).await {
            Ok(applied) => applied,
            Err(StoreError::Query(err))
                if err
                    .as_db_error()
                    .is_some_and(|db| db.code().code() == "42P01") =>
            {
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        let applied_versions: HashSet<i64> = applied.iter().map(|m| m.version).collect();
        let local_versions: HashSet<i64> = local.iter().map(|m| m.version).collect();

        let pending = local
            .iter()
            .filter(|m| !applied_versions.contains(&m.version))
            .cloned()
            .collect();
        let missing_local = applied
            .iter()
            .filter(|m| !local_versions.contains(&m.version))
            .cloned()
            .collect();

        Ok(MigrationStatus {
            local,
            applied,
            pending,
            missing_local,
        })
    }

    /// Give the source back.
    pub fn into_source(self) -> S {
        self.source
    }
}

async fn ensure_table(client: &impl GenericClient, table: &Ident) -> StoreResult<()> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
         version BIGINT PRIMARY KEY, \
         applied_at TIMESTAMPTZ NOT NULL DEFAULT now())"
    );
    client.batch_execute(&sql).await
}

async fn fetch_applied(
    client: &impl GenericClient,
    table: &Ident,
) -> StoreResult<Vec<AppliedMigration>> {
    let rows: RowSet = qb::build_select(
        table.as_str(),
        &["version", "applied_at"],
        WhereClause::new(),
    )?
    .fetch_rows(client)
    .await?;

    let mut applied: Vec<AppliedMigration> = rows.collect_many()?;
    applied.sort_by_key(|m| m.version);
    Ok(applied)
}

#[cfg(test)]
mod tests;
