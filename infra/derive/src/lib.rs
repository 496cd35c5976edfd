#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the cryptix crates.
//!
//! Right now this is a single attribute, [`macro@cryptix_error`], which turns a plain enum
//! into the error type every crate in the workspace exposes.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants with a `source` field,
///   so upstream errors work with the `?` operator.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` when an
///   `Internal` variant is present.
///
/// # Requirements
///
/// 1. Only enums are accepted.
/// 2. Variants that carry context declare `context: Option<Cow<'static, str>>`.
/// 3. Variants wrapping an upstream error name the field `source` (or mark it
///    `#[source]`/`#[from]`) and must also carry a context field.
/// 4. Tuple and unit variants are rejected.
///
/// # Example
///
/// ```rust,ignore
/// use cryptix_derive::cryptix_error;
/// use std::borrow::Cow;
///
/// #[cryptix_error]
/// pub enum CrypterError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn hash(r: impl std::io::Read) -> Result<[u8; 32], CrypterError> {
///     let mut buf = Vec::new();
///     r.read_to_end(&mut buf).context("reading key material")?;
///     # unimplemented!()
/// }
/// ```
#[proc_macro_attribute]
pub fn cryptix_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
