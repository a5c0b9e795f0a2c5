//! # pgcrud
//!
//! A small PostgreSQL data-access layer: parameterized CRUD statements, row mapping and
//! versioned SQL migrations over a shared connection pool.
//!
//! ## Features
//!
//! - **Parameterized only**: values never appear in SQL text; builders emit `$n` placeholders
//! - **Validated identifiers**: table and column names are checked before SQL is produced
//! - **Safe defaults**: UPDATE and DELETE refuse to run without a WHERE clause
//! - **Type-safe mapping**: Row → Struct via the `FromRow` trait (derivable)
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//! - **Migrations**: apply pending `.sql` migrations at startup, tracked in a configurable table
//!
//! ## Quick start
//!
//! ```ignore
//! use pgcrud::prelude::*;
//! use pgcrud::migrate::{DirSource, Migrator};
//!
//! #[derive(FromRow)]
//! struct Task {
//!     id: i64,
//!     title: String,
//!     status: String,
//! }
//!
//! let pool = Pool::open(&config).await?;
//! Migrator::from_config(DirSource::new("./migrations"), &config)?.up(&pool).await?;
//!
//! let task: Task = qb::build_insert("tasks", &["title", "status"], ["buy milk", "new"])?
//!     .fetch_one(&pool)
//!     .await?;
//!
//! let tasks: Vec<Task> = qb::build_select("tasks", &["id", "title", "status"], WhereClause::new())?
//!     .fetch_all(&pool)
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod migrate;
pub mod prelude;
pub mod qb;
pub mod row;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::GenericClient;
pub use config::DbConfig;
pub use error::{StoreError, StoreResult, ValidationError};
pub use ident::Ident;
pub use migrate::{Migration, MigrationSource, Migrator};
pub use qb::{BuiltQuery, WhereClause};
pub use row::{FromRow, Record, RowExt, RowSet, collect_many, collect_one};
pub use value::Value;

pub use tokio_postgres;

#[cfg(feature = "pool")]
pub use pool::Pool;

#[cfg(feature = "derive")]
pub use pgcrud_derive::FromRow;
