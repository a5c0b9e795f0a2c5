//! DELETE builder.

use crate::error::ValidationError;
use crate::ident::Ident;
use crate::qb::built::BuiltQuery;
use crate::qb::param::ParamList;
use crate::qb::where_clause::WhereClause;

/// Build `DELETE FROM table WHERE a = $1 AND ...`.
///
/// An empty `filter` is rejected with [`ValidationError::EmptyWhereClause`] before anything else
/// is looked at; there is no way to build an unbounded DELETE.
pub fn build_delete(
    table: &str,
    filter: impl Into<WhereClause>,
) -> Result<BuiltQuery, ValidationError> {
    let filter = filter.into();
    if filter.is_empty() {
        return Err(ValidationError::EmptyWhereClause { statement: "DELETE" });
    }
    let table = Ident::parse(table)?;
    filter.columns()?;

    let mut params = ParamList::new();
    let Some(predicate) = filter.render(&mut params) else {
        return Err(ValidationError::EmptyWhereClause { statement: "DELETE" });
    };

    let sql = format!("DELETE FROM {} WHERE {}", table, predicate);
    Ok(BuiltQuery::new(sql, params.into_values()))
}
