//! Main mongolayer crate providing typed access to document collections.
//!
//! This crate is the entry point for users of mongolayer. It re-exports the
//! core types, the `Record` derive and the store backends.
//!
//! # Features
//!
//! - **Record selectors** - Plain structs whose non-empty fields become equality filters
//! - **Typed results** - Documents are decoded into any `Deserialize` type
//! - **Index management** - Idempotent creation of unique and sparse indexes
//! - **Multiple backends** - MongoDB and an in-memory store sharing one client API
//!
//! # Quick Start
//!
//! ```ignore
//! use mongolayer::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: String,
//!     pub name: String,
//!     pub age: i64,
//! }
//!
//! #[derive(Default, Record)]
//! pub struct UserSelector {
//!     pub id: Option<String>,
//!     pub name: Option<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ClientError> {
//!     let store = InMemoryStore::builder().build().await?;
//!     let client = DataClient::new(&store, "app");
//!
//!     client.ensure_index(&IndexDescriptor::new("users", ["id"]).unique(true)).await?;
//!     client.insert("users", &User { id: "A1".into(), name: "Alice".into(), age: 42 }).await?;
//!
//!     let alice: User = client
//!         .find_one("users", &UserSelector { id: Some("A1".into()), ..Default::default() })
//!         .await?;
//!     println!("found {alice:?}");
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! # Filter coercion
//!
//! By default every selector value except booleans and nulls is matched by its
//! string form, so a numeric field stored as a number is only found with
//! [`Coercion::Native`](filter::Coercion::Native):
//!
//! ```ignore
//! let client = DataClient::new(&store, "app").with_coercion(Coercion::Native);
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - MongoDB backend (requires `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as mongolayer;

pub mod prelude;

pub use mongolayer_core::{backend, client, error, filter, index, normalize, record, settings};
pub use mongolayer_macros::Record;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use mongolayer_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use mongolayer_mongodb::{MongoConnection, MongoConnectionBuilder, MongoDbStore};
}
