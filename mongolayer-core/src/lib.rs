//! A thin typed data-access layer over document collections.
//!
//! This crate is the core of the mongolayer project and provides:
//!
//! - **Records** ([`record`]) - Field enumeration for selectors and written values
//! - **Field normalization** ([`normalize`]) - Records flattened into lower-cased field maps
//! - **Filter building** ([`filter`]) - Field maps translated into filter documents
//! - **Index descriptors** ([`index`]) - Secondary index requests
//! - **Store backend abstraction** ([`backend`]) - Traits for store handles and connections
//! - **Data client** ([`client`]) - Select, find, insert, update, delete and index operations
//! - **Settings** ([`settings`]) - Connection settings and connection strings
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use mongolayer::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! #[derive(Default, Record)]
//! pub struct UserSelector {
//!     pub id: Option<String>,
//!     pub name: Option<String>,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongolayer_core;

pub mod backend;
pub mod client;
pub mod error;
pub mod filter;
pub mod index;
pub mod normalize;
pub mod record;
pub mod settings;
