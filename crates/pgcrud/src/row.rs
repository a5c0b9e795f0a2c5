//! Row mapping traits and utilities

use crate::error::{StoreError, StoreResult};
use crate::value::Value;
use tokio_postgres::Row;

/// Trait for converting a database row into a Rust struct.
///
/// Columns are matched to fields by name: extra result columns are ignored and a missing
/// column is a [`StoreError::Scan`]. This trait should typically be derived using
/// `#[derive(FromRow)]` from the `pgcrud-derive` crate.
///
/// # Example
///
/// ```ignore
/// use pgcrud::FromRow;
///
/// #[derive(FromRow)]
/// struct Task {
///     id: i64,
///     title: String,
///     #[pgcrud(column = "description")]
///     details: Option<String>,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> StoreResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning StoreError::Scan on failure
    fn try_get_column<T>(&self, column: &str) -> StoreResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> StoreResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| StoreError::scan(column, e.to_string()))
    }
}

/// A record built from every column of a row, in result order.
///
/// Useful when the caller has no struct for the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    /// Look up a column by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn into_columns(self) -> Vec<(String, Value)> {
        self.columns
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(c, v)| (c.into(), v)).collect(),
        }
    }
}

impl FromRow for Record {
    fn from_row(row: &Row) -> StoreResult<Self> {
        row.columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                row.try_get::<_, Value>(idx)
                    .map(|v| (column.name().to_string(), v))
                    .map_err(|e| StoreError::scan(column.name(), e.to_string()))
            })
            .collect::<StoreResult<Vec<_>>>()
            .map(|columns| Self { columns })
    }
}

/// The rows produced by a single query.
#[derive(Debug, Default)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// See [`collect_one`].
    pub fn collect_one<T: FromRow>(self) -> StoreResult<T> {
        collect_one(self)
    }

    /// See [`collect_many`].
    pub fn collect_many<T: FromRow>(self) -> StoreResult<Vec<T>> {
        collect_many(self)
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Require exactly one element.
fn exactly_one<T>(items: Vec<T>) -> StoreResult<T> {
    let got = items.len();
    let mut items = items.into_iter();
    match (items.next(), got) {
        (Some(item), 1) => Ok(item),
        (None, _) => Err(StoreError::not_found("expected exactly one row, got none")),
        (Some(_), got) => Err(StoreError::too_many_rows(1, got)),
    }
}

/// Map a result that must contain exactly one row.
///
/// - 0 rows: [`StoreError::NotFound`]
/// - 1 row: the mapped record
/// - more: [`StoreError::TooManyRows`]
pub fn collect_one<T: FromRow>(rows: RowSet) -> StoreResult<T> {
    let row = exactly_one(rows.into_rows())?;
    T::from_row(&row)
}

/// Map every row, stopping at the first row that fails to map.
///
/// No partial result is returned on failure.
pub fn collect_many<T: FromRow>(rows: RowSet) -> StoreResult<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}
