//! In-memory store backend for mongolayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` and `ConnectionProvider` traits. It is meant for tests and
//! local development where a MongoDB server is not at hand.
//!
//! # Features
//!
//! - **Shared handle copies** - Every copy of a store sees the same data
//! - **Equality filters** - Type-aware matching of flat filter documents
//! - **Unique indexes** - Enforced on insert and update, including `_id`
//!
//! # Quick Start
//!
//! ```ignore
//! use mongolayer::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryStore::builder().build().await?;
//!     let client = DataClient::new(&store, "app");
//!
//!     client.insert("users", &User { id: "A1".into(), name: "Alice".into() }).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongolayer_memory;

pub mod store;
mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
