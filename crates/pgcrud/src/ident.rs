//! Safe SQL identifier handling.
//!
//! Table and column names are spliced into generated SQL, so every name passes through
//! [`Ident::parse`] first. Only plain, unqualified identifiers are accepted:
//! `[A-Za-z_][A-Za-z0-9_]*`, at most 63 bytes (the PostgreSQL `NAMEDATALEN` limit).
//!
//! Rendering follows PostgreSQL's `quote_ident`: names that are reserved words or contain
//! uppercase letters are written double-quoted, everything else is written bare. A column named
//! `createdAt` therefore comes back from the server as `createdAt`, not `createdat`.
//!
//! # Example
//! ```ignore
//! use pgcrud::Ident;
//!
//! let t = Ident::parse("tasks")?;
//! assert!(Ident::parse("tasks; DROP TABLE tasks").is_err());
//! # Ok::<(), pgcrud::ValidationError>(())
//! ```

use crate::error::ValidationError;
use std::fmt;

/// Longest identifier PostgreSQL keeps without truncation.
pub const MAX_IDENT_LEN: usize = 63;

/// Keywords that cannot appear bare as a table or column name (PostgreSQL `RESERVED_KEYWORD` and
/// `TYPE_FUNC_NAME_KEYWORD`). Sorted for binary search.
const RESERVED: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation", "column",
    "concurrently", "constraint", "create", "cross", "current_catalog", "current_date",
    "current_role", "current_schema", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false", "fetch",
    "for", "foreign", "freeze", "from", "full", "grant", "group", "having", "ilike", "in",
    "initially", "inner", "intersect", "into", "is", "isnull", "join", "lateral", "leading",
    "left", "like", "limit", "localtime", "localtimestamp", "natural", "not", "notnull", "null",
    "offset", "on", "only", "or", "order", "outer", "overlaps", "placing", "primary",
    "references", "returning", "right", "select", "session_user", "similar", "some",
    "symmetric", "table", "tablesample", "then", "to", "trailing", "true", "union", "unique",
    "user", "using", "variadic", "verbose", "when", "where", "window", "with",
];

/// A validated table or column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validate an identifier string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidIdentifier(s.to_string());

        if s.is_empty() || s.len() > MAX_IDENT_LEN {
            return Err(invalid());
        }

        let mut chars = s.chars();
        match chars.next() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
            _ => return Err(invalid()),
        }
        if !chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }

    /// Wrap a name already known to be valid, such as a crate constant.
    pub(crate) fn trusted(s: &str) -> Self {
        debug_assert!(Self::parse(s).is_ok());
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name has to be double-quoted to keep its spelling.
    pub fn needs_quotes(&self) -> bool {
        self.0.bytes().any(|b| b.is_ascii_uppercase())
            || RESERVED.binary_search(&self.0.as_str()).is_ok()
    }
}

/// Renders the name as it must appear in SQL.
impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Valid names never contain `"`, so wrapping is enough.
        if self.needs_quotes() {
            write!(f, "\"{}\"", self.0)
        } else {
            f.write_str(&self.0)
        }
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate every name of a column list, preserving order.
pub(crate) fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Ident>, ValidationError> {
    names.iter().map(|n| Ident::parse(n.as_ref())).collect()
}
