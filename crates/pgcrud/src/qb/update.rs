//! UPDATE builder.

use crate::error::ValidationError;
use crate::ident::{self, Ident};
use crate::qb::built::BuiltQuery;
use crate::qb::param::ParamList;
use crate::qb::where_clause::WhereClause;
use crate::value::Value;

/// Build `UPDATE table SET c1 = $1, c2 = $2 WHERE w1 = $3 AND ...`.
///
/// SET placeholders are numbered 1..N in column order, WHERE placeholders continue from N+1,
/// and the arguments are the SET values followed by the WHERE values. An empty `filter` is
/// rejected right after the length check, ahead of the column and identifier checks, so an
/// update can never touch the whole table.
pub fn build_update<C, I>(
    table: &str,
    columns: &[C],
    values: I,
    filter: impl Into<WhereClause>,
) -> Result<BuiltQuery, ValidationError>
where
    C: AsRef<str>,
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let filter = filter.into();
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();

    if columns.len() != values.len() {
        return Err(ValidationError::ColumnValueMismatch {
            columns: columns.len(),
            values: values.len(),
        });
    }
    if filter.is_empty() {
        return Err(ValidationError::EmptyWhereClause { statement: "UPDATE" });
    }
    if columns.is_empty() {
        return Err(ValidationError::EmptyColumns { statement: "UPDATE" });
    }
    let table = Ident::parse(table)?;
    let columns = ident::parse_all(columns)?;
    filter.columns()?;

    let mut params = ParamList::new();
    let set_parts: Vec<String> = columns
        .iter()
        .zip(values)
        .map(|(column, value)| format!("{} = {}", column, params.placeholder(value)))
        .collect();
    let set_count = params.len();

    // Non-empty was checked above.
    let predicate = filter.render(&mut params).unwrap_or_default();
    debug_assert!(params.len() > set_count);

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        table,
        set_parts.join(", "),
        predicate
    );
    Ok(BuiltQuery::new(sql, params.into_values()))
}
