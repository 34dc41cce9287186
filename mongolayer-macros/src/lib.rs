//! Procedural macros for the mongolayer project.
//!
//! This crate provides compile-time field enumeration for mongolayer records,
//! so selectors and values can be translated into filter documents without any
//! runtime reflection.
//!
//! ```ignore
//! use mongolayer::prelude::*;
//!
//! #[derive(Default, Record)]
//! pub struct UserSelector {
//!     #[record(rename = "ID")]
//!     pub id: Option<String>,
//!     #[record(keep_empty)]
//!     pub active: Option<bool>,
//!     #[record(skip)]
//!     pub cache_hint: u32,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongolayer_macros;

use proc_macro::TokenStream;

mod record;

/// Derives `Record` and `IntoFieldValue` for a struct with named fields.
///
/// Field attributes:
///
/// - `#[record(rename = "name")]` - use `name` instead of the field identifier
/// - `#[record(skip)]` - leave the field out
/// - `#[record(keep_empty)]` - keep the field even when its value is empty
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input.into()).into()
}
