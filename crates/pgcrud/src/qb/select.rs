//! SELECT builder.

use crate::error::ValidationError;
use crate::ident::{self, Ident};
use crate::qb::built::BuiltQuery;
use crate::qb::param::ParamList;
use crate::qb::where_clause::WhereClause;

/// Build `SELECT c1, c2 FROM table [WHERE a = $1 AND b = $2 ...]`.
///
/// An empty column list selects `*`; an empty clause omits WHERE entirely.
pub fn build_select<C: AsRef<str>>(
    table: &str,
    columns: &[C],
    filter: impl Into<WhereClause>,
) -> Result<BuiltQuery, ValidationError> {
    let filter = filter.into();
    let table = Ident::parse(table)?;
    let columns = ident::parse_all(columns)?;
    filter.columns()?;

    let select_list = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.iter().map(Ident::as_str).collect::<Vec<_>>().join(", ")
    };

    let mut params = ParamList::new();
    let mut sql = format!("SELECT {} FROM {}", select_list, table);
    if let Some(predicate) = filter.render(&mut params) {
        sql.push_str(" WHERE ");
        sql.push_str(&predicate);
    }
    Ok(BuiltQuery::new(sql, params.into_values()))
}
