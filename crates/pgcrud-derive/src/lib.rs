//! Derive macros for pgcrud
//!
//! Provides `#[derive(FromRow)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_row;

/// Derive `FromRow` trait for a struct.
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
///
/// # Attributes
///
/// - `#[pgcrud(column = "name")]` - Map field to a different column name
/// - `#[pgcrud(default)]` - Fill the field with `Default::default()` instead of reading a column
#[proc_macro_derive(FromRow, attributes(pgcrud))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
