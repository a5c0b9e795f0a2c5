//! Ordered equality predicates for WHERE clauses.

use crate::error::ValidationError;
use crate::ident::Ident;
use crate::qb::param::ParamList;
use crate::value::Value;

/// An ordered list of `column = value` predicates, AND-combined.
///
/// Pairs keep the order they were added in; that order decides both the rendered SQL and the
/// placeholder numbering.
///
/// ```ignore
/// use pgcrud::qb::WhereClause;
///
/// let w = WhereClause::new().eq("status", "new").eq("id", 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    pairs: Vec<(String, Value)>,
}

impl WhereClause {
    /// Create an empty clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `column = value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Add `column = value` in place.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.pairs.push((column.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Validate every column name.
    pub(crate) fn columns(&self) -> Result<Vec<Ident>, ValidationError> {
        self.pairs.iter().map(|(c, _)| Ident::parse(c)).collect()
    }

    /// Render `c1 = $k AND c2 = $k+1 ...`, numbering after whatever `params` already holds.
    ///
    /// Returns `None` for an empty clause. Column names must already be validated.
    pub(crate) fn render(self, params: &mut ParamList) -> Option<String> {
        if self.pairs.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .pairs
            .into_iter()
            .map(|(column, value)| {
                format!("{} = {}", Ident::trusted(&column), params.placeholder(value))
            })
            .collect();
        Some(parts.join(" AND "))
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for WhereClause {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
        }
    }
}

impl<S: Into<String>, V: Into<Value>> From<Vec<(S, V)>> for WhereClause {
    fn from(pairs: Vec<(S, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<S: Into<String>, V: Into<Value>, const N: usize> From<[(S, V); N]> for WhereClause {
    fn from(pairs: [(S, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<&WhereClause> for WhereClause {
    fn from(clause: &WhereClause) -> Self {
        clause.clone()
    }
}
