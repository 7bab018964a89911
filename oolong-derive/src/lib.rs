//! Derive macros for oolong record materialization.
//!
//! Provides `#[derive(Materialize)]` and `#[derive(MaterializeInto)]` for
//! building structs and enums directly from lazy or binary views, with the
//! construction strategy and field mapping controlled by `#[oolong(...)]`
//! attributes.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod materialize;

/// Derive `Materialize` for a struct or enum.
///
/// # Example
///
/// ```ignore
/// use oolong::Materialize;
///
/// #[derive(Materialize)]
/// struct User {
///     id: i64,
///     name: String,
///     #[oolong(rename = "emailAddress")]
///     email: Option<String>,
/// }
/// ```
///
/// Container attributes: `#[oolong(strategy = "positional")]` (default),
/// `"keyword"`, `"mutable"` (the latter two require `Default`), and
/// `#[oolong(untagged)]` on enums of scalar variants.
///
/// Field attributes: `rename = "json_key"`, `default`,
/// `default = "expr"`, `skip`.
#[proc_macro_derive(Materialize, attributes(oolong))]
pub fn derive_materialize(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    materialize::derive(&input)
        .unwrap_or_else(|e| e.into_compile_error())
        .into()
}

/// Derive `MaterializeInto` for a struct with named fields.
///
/// The generated impl assigns fields as members arrive and leaves fields
/// whose keys are absent untouched, so a pre-constructed instance keeps its
/// values for anything the input does not mention.
#[proc_macro_derive(MaterializeInto, attributes(oolong))]
pub fn derive_materialize_into(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    materialize::derive_into(&input)
        .unwrap_or_else(|e| e.into_compile_error())
        .into()
}
