#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the configuration engine crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! mapr-derive = { path = "../../infra/derive" }
//! thiserror = "2"
//! ```
//!
//! The generated code refers to `::thiserror`, so every consumer must depend on it directly.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring the error enums of the workspace.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context()`
///   to `Result<T, Name>` and to `Result<T, Source>` for every convertible source type.
/// * **Conversions**: Implements `From<Source>` for variants whose named fields are exactly
///   `source` (or a field marked `#[source]`/`#[from]`) and `context`. Variants carrying
///   additional fields (for example a stage marker) are constructed explicitly.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant is present.
/// * **Kind Accessor**: `kind()` returns the variant name in `snake_case`, handy for
///   logging fields and assertions.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. Variants with a source must include `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use mapr_derive::mapr_error;
/// use std::borrow::Cow;
///
/// #[mapr_error]
/// pub enum LoaderError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &str) -> Result<String, LoaderError> {
///     std::fs::read_to_string(path).context(format!("reading {path}"))
/// }
/// ```
#[proc_macro_attribute]
pub fn mapr_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
