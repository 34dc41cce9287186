//! MongoDB backend for mongolayer.
//!
//! This crate provides the MongoDB implementation of the `StoreBackend` and
//! `ConnectionProvider` traits on top of the official async driver.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! mongolayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! Connections are built from [`Settings`](mongolayer_core::settings::Settings).
//! Building verifies the credentials with a `ping` against the configured
//! database, so a returned connection is ready to use.
//!
//! # Example
//!
//! ```ignore
//! use mongolayer::{prelude::*, mongodb::MongoConnection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(Some("mongolayer.toml".as_ref()))?;
//!     let connection = MongoConnection::builder(settings).build().await?;
//!
//!     let client = DataClient::new(&connection, connection.database());
//!     client.ensure_index(&IndexDescriptor::new("users", ["id"]).unique(true)).await?;
//!
//!     connection.close().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongolayer_mongodb;

pub mod connection;
pub mod store;

pub use connection::{MongoConnection, MongoConnectionBuilder};
pub use store::MongoDbStore;
