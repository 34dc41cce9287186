//! The data client: typed CRUD operations over a store handle.
//!
//! Selectors are [`Record`]s translated into filter documents by the
//! [`FieldNormalizer`] and [`FilterBuilder`]. Written values are anything
//! `Serialize`, stored through their BSON representation.
//!
//! # Example
//!
//! ```ignore
//! use mongolayer::{prelude::*, memory::InMemoryStore};
//!
//! let store = InMemoryStore::builder().build().await?;
//! let client = DataClient::new(&store, "app");
//!
//! client.insert("users", &User { id: "A1".into(), name: "Alice".into() }).await?;
//! let alice: User = client.find_one("users", &UserSelector { id: Some("A1".into()), ..Default::default() }).await?;
//! ```

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    backend::{ConnectionProvider, StoreBackend, UpdateOutcome},
    error::{ClientError, ClientResult},
    filter::{Coercion, FilterBuilder},
    index::IndexDescriptor,
    normalize::FieldNormalizer,
    record::Record,
    settings::Settings,
};

/// Typed access to the collections of one database.
///
/// Each client owns its own handle copy, taken from a [`ConnectionProvider`] at
/// construction, so separate clients can be used concurrently without sharing
/// mutable state.
#[derive(Debug)]
pub struct DataClient<B: StoreBackend> {
    backend: B,
    database: String,
    normalizer: FieldNormalizer,
    filters: FilterBuilder,
}

impl<B: StoreBackend> DataClient<B> {
    /// Creates a client over a fresh handle copy of `connection`.
    pub fn new<C>(connection: &C, database: impl Into<String>) -> Self
    where
        C: ConnectionProvider<Handle = B>,
    {
        Self::from_handle(connection.copy(), database)
    }

    /// Creates a client over an already copied handle.
    pub fn from_handle(backend: B, database: impl Into<String>) -> Self {
        Self {
            backend,
            database: database.into(),
            normalizer: FieldNormalizer::default(),
            filters: FilterBuilder::default(),
        }
    }

    /// Creates a client for the database and coercion mode named in `settings`.
    pub fn from_settings<C>(connection: &C, settings: &Settings) -> Self
    where
        C: ConnectionProvider<Handle = B>,
    {
        Self::new(connection, settings.database()).with_coercion(settings.coercion)
    }

    /// Sets how selector values are coerced into filters.
    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.filters = FilterBuilder::new(coercion);
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn coercion(&self) -> Coercion {
        self.filters.coercion()
    }

    /// Returns the filter document `selector` translates to.
    pub fn filter_for<R: Record + ?Sized>(&self, selector: &R) -> ClientResult<Document> {
        self.filters.build_from(&self.normalizer, selector)
    }

    /// Alias of [`find`](Self::find).
    pub async fn select<T, R>(&self, collection: &str, selector: &R) -> ClientResult<Vec<T>>
    where
        T: DeserializeOwned,
        R: Record + ?Sized,
    {
        self.find(collection, selector).await
    }

    /// Alias of [`find_one`](Self::find_one).
    pub async fn select_one<T, R>(&self, collection: &str, selector: &R) -> ClientResult<T>
    where
        T: DeserializeOwned,
        R: Record + ?Sized,
    {
        self.find_one(collection, selector).await
    }

    /// Returns every document of `collection` matching `selector`.
    ///
    /// An empty selector returns the whole collection.
    #[tracing::instrument(level = "debug", skip(self, selector), fields(database = %self.database), err)]
    pub async fn find<T, R>(&self, collection: &str, selector: &R) -> ClientResult<Vec<T>>
    where
        T: DeserializeOwned,
        R: Record + ?Sized,
    {
        let filter = self.filter_for(selector)?;
        debug!(%filter, "find");

        self.backend
            .find_documents(&self.database, collection, filter, None)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Returns the first document of `collection` matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if nothing matches.
    #[tracing::instrument(level = "debug", skip(self, selector), fields(database = %self.database), err)]
    pub async fn find_one<T, R>(&self, collection: &str, selector: &R) -> ClientResult<T>
    where
        T: DeserializeOwned,
        R: Record + ?Sized,
    {
        let filter = self.filter_for(selector)?;
        debug!(%filter, "find one");

        match self
            .backend
            .find_documents(&self.database, collection, filter, Some(1))
            .await?
            .into_iter()
            .next()
        {
            Some(document) => from_document(document),
            None => Err(ClientError::NotFound(collection.to_string())),
        }
    }

    /// Inserts `values` as a single document.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DuplicateKey`] naming the rejected values if a
    /// unique index refuses the document.
    #[tracing::instrument(level = "debug", skip(self, values), fields(database = %self.database), err)]
    pub async fn insert<T>(&self, collection: &str, values: &T) -> ClientResult<()>
    where
        T: Serialize + ?Sized,
    {
        let document = to_document(values)?;
        let rendered = document.to_string();

        self.backend
            .insert_documents(&self.database, collection, vec![document])
            .await
            .map_err(|err| duplicate_of(err, rendered))
    }

    /// Inserts every element of `values`, in order, stopping at the first failure.
    #[tracing::instrument(level = "debug", skip(self, values), fields(database = %self.database, count = values.len()), err)]
    pub async fn insert_many<T>(&self, collection: &str, values: &[T]) -> ClientResult<()>
    where
        T: Serialize,
    {
        let documents = values
            .iter()
            .map(to_document)
            .collect::<ClientResult<Vec<_>>>()?;
        let rendered = Bson::Array(documents.iter().cloned().map(Bson::Document).collect()).to_string();

        self.backend
            .insert_documents(&self.database, collection, documents)
            .await
            .map_err(|err| duplicate_of(err, rendered))
    }

    /// Sets the fields of `values` on every document matching `selector`.
    #[tracing::instrument(level = "debug", skip(self, selector, values), fields(database = %self.database), err)]
    pub async fn update<R, T>(&self, collection: &str, selector: &R, values: &T) -> ClientResult<UpdateOutcome>
    where
        R: Record + ?Sized,
        T: Serialize + ?Sized,
    {
        self.update_matching(collection, selector, values, true).await
    }

    /// Sets the fields of `values` on the first document matching `selector`.
    ///
    /// Matching nothing is not an error; the outcome reports zero matches.
    #[tracing::instrument(level = "debug", skip(self, selector, values), fields(database = %self.database), err)]
    pub async fn update_one<R, T>(&self, collection: &str, selector: &R, values: &T) -> ClientResult<UpdateOutcome>
    where
        R: Record + ?Sized,
        T: Serialize + ?Sized,
    {
        self.update_matching(collection, selector, values, false).await
    }

    /// Removes every document matching `selector`.
    ///
    /// An empty selector empties the collection.
    #[tracing::instrument(level = "debug", skip(self, selector), fields(database = %self.database), err)]
    pub async fn delete<R>(&self, collection: &str, selector: &R) -> ClientResult<u64>
    where
        R: Record + ?Sized,
    {
        let filter = self.filter_for(selector)?;
        debug!(%filter, "delete");

        self.backend
            .delete_documents(&self.database, collection, filter, true)
            .await
    }

    /// Removes the first document matching `selector`; removing nothing succeeds.
    #[tracing::instrument(level = "debug", skip(self, selector), fields(database = %self.database), err)]
    pub async fn delete_one<R>(&self, collection: &str, selector: &R) -> ClientResult<u64>
    where
        R: Record + ?Sized,
    {
        let filter = self.filter_for(selector)?;
        debug!(%filter, "delete one");

        self.backend
            .delete_documents(&self.database, collection, filter, false)
            .await
    }

    /// Creates the described index if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for a descriptor without usable
    /// keys, before reaching the store.
    #[tracing::instrument(level = "debug", skip(self), fields(database = %self.database), err)]
    pub async fn ensure_index(&self, index: &IndexDescriptor) -> ClientResult<()> {
        index.validate()?;

        self.backend.ensure_index(&self.database, index).await
    }

    pub async fn index_names(&self, collection: &str) -> ClientResult<Vec<String>> {
        self.backend.index_names(&self.database, collection).await
    }

    /// Releases this client's handle copy. The connection stays open for other copies.
    pub fn close(self) {
        debug!(database = %self.database, "closing client");
    }

    async fn update_matching<R, T>(
        &self,
        collection: &str,
        selector: &R,
        values: &T,
        multi: bool,
    ) -> ClientResult<UpdateOutcome>
    where
        R: Record + ?Sized,
        T: Serialize + ?Sized,
    {
        let filter = self.filter_for(selector)?;
        let set = to_document(values)?;
        debug!(%filter, %set, multi, "update");

        let rendered = set.to_string();
        self.backend
            .update_documents(&self.database, collection, filter, set, multi)
            .await
            .map_err(|err| duplicate_of(err, rendered))
    }
}

fn to_document<T: Serialize + ?Sized>(values: &T) -> ClientResult<Document> {
    match serialize_to_bson(values)? {
        Bson::Document(document) => Ok(document),
        other => Err(ClientError::InvalidInput(format!(
            "values must serialize to a document, got {:?}",
            other.element_type()
        ))),
    }
}

fn from_document<T: DeserializeOwned>(document: Document) -> ClientResult<T> {
    Ok(deserialize_from_bson(Bson::Document(document))?)
}

/// Re-wraps a store duplicate-key signal so it names the rejected values.
fn duplicate_of(err: ClientError, rendered: String) -> ClientError {
    match err {
        ClientError::DuplicateKey { collection, .. } => ClientError::DuplicateKey {
            collection,
            value: rendered,
        },
        other => other,
    }
}
