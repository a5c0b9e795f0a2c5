//! Convenient imports for typical `pgcrud` usage.
//!
//! ```ignore
//! use pgcrud::prelude::*;
//! ```

pub use crate::qb;
pub use crate::{
    DbConfig, FromRow, GenericClient, Record, RowExt, RowSet, StoreError, StoreResult,
    Value, WhereClause,
};

#[cfg(feature = "pool")]
pub use crate::Pool;
