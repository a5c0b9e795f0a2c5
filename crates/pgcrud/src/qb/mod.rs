//! Parameterized CRUD statement builders.
//!
//! Four pure functions turn caller intent into a [`BuiltQuery`]: SQL text with positional
//! placeholders plus the matching argument list. They validate everything up front and never
//! touch the database; a rejected input produces a [`ValidationError`](crate::ValidationError)
//! and no SQL.
//!
//! - **Ordered**: columns, values and WHERE pairs keep caller order, so the same input always
//!   yields the same SQL and argument order
//! - **No string replacement**: placeholder indices are assigned while rendering
//! - **Safe defaults**: UPDATE and DELETE require a WHERE clause
//!
//! # Usage
//!
//! ```ignore
//! use pgcrud::qb::{self, WhereClause};
//!
//! // INSERT ... RETURNING *
//! let task: Task = qb::build_insert("tasks", &["title", "status"], ["buy milk", "new"])?
//!     .fetch_one(&pool)
//!     .await?;
//!
//! // SELECT
//! let open: Vec<Task> = qb::build_select("tasks", &[] as &[&str], WhereClause::new().eq("status", "new"))?
//!     .fetch_all(&pool)
//!     .await?;
//!
//! // UPDATE
//! qb::build_update("tasks", &["title"], ["done task"], WhereClause::new().eq("id", 5))?
//!     .execute(&pool)
//!     .await?;
//!
//! // DELETE
//! qb::build_delete("tasks", WhereClause::new().eq("id", 5))?
//!     .execute(&pool)
//!     .await?;
//! ```

mod built;
mod delete;
mod insert;
mod param;
mod select;
mod update;
mod where_clause;

pub use built::BuiltQuery;
pub use delete::build_delete;
pub use insert::build_insert;
pub use select::build_select;
pub use update::build_update;
pub use where_clause::WhereClause;
