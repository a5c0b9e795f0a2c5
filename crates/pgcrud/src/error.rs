//! Error types for pgcrud

use thiserror::Error;

/// Result type alias for pgcrud operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Rejections raised while building a query, before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Column list and value list differ in length
    #[error("columns and values length mismatch: {columns} column(s), {values} value(s)")]
    ColumnValueMismatch { columns: usize, values: usize },

    /// UPDATE/DELETE without any WHERE predicate
    #[error("refusing to {statement} without a WHERE clause")]
    EmptyWhereClause { statement: &'static str },

    /// INSERT/UPDATE without any column
    #[error("{statement} requires at least one column")]
    EmptyColumns { statement: &'static str },

    /// Table or column name that is not a plain SQL identifier
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

/// Error types for database operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query could not be built
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// More rows than the caller asked for
    #[error("Too many rows: expected {expected}, got {got}")]
    TooManyRows { expected: usize, got: usize },

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row scan/mapping error
    #[error("Scan error on column '{column}': {message}")]
    Scan { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Migration source could not be read or is malformed
    #[error("Migration source error: {0}")]
    MigrationSource(String),

    /// A migration failed to apply or to be recorded
    #[error("Migration {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: Box<StoreError>,
    },

    /// The runner could not lock, create or read the tracking table
    #[error("Migration setup failed: {source}")]
    MigrationSetup {
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Create a scan error for a specific column
    pub fn scan(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scan {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a too-many-rows error
    pub fn too_many_rows(expected: usize, got: usize) -> Self {
        Self::TooManyRows { expected, got }
    }

    /// Wrap the failure of a single migration
    pub fn migration(version: i64, source: StoreError) -> Self {
        Self::Migration {
            version,
            source: Box::new(source),
        }
    }

    /// Wrap a failure of the runner's own bookkeeping
    pub fn migration_setup(source: StoreError) -> Self {
        Self::MigrationSetup {
            source: Box::new(source),
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a too-many-rows error
    pub fn is_too_many_rows(&self) -> bool {
        matches!(self, Self::TooManyRows { .. })
    }

    /// Check if this is a migration error
    pub fn is_migration(&self) -> bool {
        matches!(
            self,
            Self::Migration { .. } | Self::MigrationSetup { .. } | Self::MigrationSource(_)
        )
    }

    /// Parse a tokio_postgres error into a more specific StoreError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Closed => Self::Connection("pool is closed".to_string()),
            deadpool_postgres::PoolError::Backend(e) => Self::from_db_error(e),
            other => Self::Pool(other.to_string()),
        }
    }
}
