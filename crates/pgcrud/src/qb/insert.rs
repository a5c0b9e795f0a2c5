//! INSERT ... RETURNING * builder.

use crate::error::ValidationError;
use crate::ident::{self, Ident};
use crate::qb::built::BuiltQuery;
use crate::qb::param::ParamList;
use crate::value::Value;

/// Build `INSERT INTO table (c1, c2, ...) VALUES ($1, $2, ...) RETURNING *`.
///
/// Placeholders follow column order. Fails before any I/O when the names are not plain
/// identifiers, when `columns` and `values` differ in length, or when there are no columns.
pub fn build_insert<C, I>(table: &str, columns: &[C], values: I) -> Result<BuiltQuery, ValidationError>
where
    C: AsRef<str>,
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let table = Ident::parse(table)?;
    let columns = ident::parse_all(columns)?;
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();

    if columns.len() != values.len() {
        return Err(ValidationError::ColumnValueMismatch {
            columns: columns.len(),
            values: values.len(),
        });
    }
    if columns.is_empty() {
        return Err(ValidationError::EmptyColumns { statement: "INSERT" });
    }

    let mut params = ParamList::new();
    let placeholders: Vec<String> = values.into_iter().map(|v| params.placeholder(v)).collect();
    let column_list: Vec<&str> = columns.iter().map(Ident::as_str).collect();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        column_list.join(", "),
        placeholders.join(", ")
    );
    Ok(BuiltQuery::new(sql, params.into_values()))
}
