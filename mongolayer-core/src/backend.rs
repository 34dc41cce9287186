//! Store handle and connection abstractions.
//!
//! This module defines the traits the [`DataClient`](crate::client::DataClient)
//! delegates to, allowing it to work over MongoDB or the in-memory store.
//!
//! # Traits
//!
//! - [`StoreBackend`]: a handle onto the store, consumed through find, insert,
//!   update, remove and index primitives
//! - [`ConnectionProvider`]: an established connection handing out independent
//!   [`StoreBackend`] copies
//! - [`ConnectionBuilder`]: factory that dials and authenticates a connection
//!
//! # Examples
//!
//! ```ignore
//! use mongolayer::backend::{ConnectionBuilder, ConnectionProvider, StoreBackend};
//! use bson::doc;
//!
//! let connection = MyConnectionBuilder::new().build().await?;
//! let handle = connection.copy();
//!
//! handle.insert_documents("app", "users", vec![doc! { "name": "Alice" }]).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{error::ClientResult, index::IndexDescriptor};

/// Match and modification counts reported by an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Abstract handle onto a document store.
///
/// Filters are flat equality documents produced by the
/// [`FilterBuilder`](crate::filter::FilterBuilder); an empty filter matches
/// every document of the collection.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Copies obtained from the same
/// [`ConnectionProvider`] share the underlying connection and may be used from
/// different tasks concurrently.
///
/// # Error Handling
///
/// Uniqueness violations must be reported as
/// [`ClientError::DuplicateKey`](crate::error::ClientError::DuplicateKey); every
/// other store fault as [`ClientError::Backend`](crate::error::ClientError::Backend).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Returns the documents of `collection` matching `filter`, in natural order.
    ///
    /// # Arguments
    ///
    /// * `database` - The database holding the collection
    /// * `collection` - The collection to query
    /// * `filter` - Equality filter; empty matches everything
    /// * `limit` - Maximum number of documents to return, if any
    async fn find_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        limit: Option<i64>,
    ) -> ClientResult<Vec<Document>>;

    /// Inserts documents in order, stopping at the first failure.
    ///
    /// Documents without an `_id` are assigned one by the store.
    async fn insert_documents(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> ClientResult<()>;

    /// Sets the fields of `set` on the first document matching `filter`, or on
    /// all of them when `multi` is true. Fields absent from `set` are left alone.
    async fn update_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        set: Document,
        multi: bool,
    ) -> ClientResult<UpdateOutcome>;

    /// Removes the first document matching `filter`, or all of them when
    /// `multi` is true. Returns the number of removed documents; removing
    /// nothing is not an error.
    async fn delete_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        multi: bool,
    ) -> ClientResult<u64>;

    /// Creates the described index unless an equivalent one already exists.
    ///
    /// # Errors
    ///
    /// Fails if an index on the same keys exists with different options.
    async fn ensure_index(&self, database: &str, index: &IndexDescriptor) -> ClientResult<()>;

    /// Lists the index names of a collection, including the default `_id_` index.
    async fn index_names(&self, database: &str, collection: &str) -> ClientResult<Vec<String>>;
}

/// An established, authenticated connection to a store.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    type Handle: StoreBackend;

    /// Returns an independent handle sharing this connection.
    fn copy(&self) -> Self::Handle;

    /// Closes the connection, releasing its resources.
    async fn close(self) -> ClientResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
pub trait ConnectionBuilder {
    type Connection: ConnectionProvider;

    /// Dials and authenticates.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Initialization`](crate::error::ClientError::Initialization)
    /// if the store cannot be reached or rejects the credentials.
    async fn build(self) -> ClientResult<Self::Connection>;
}
