//! In-memory storage implementation for store handles.
//!
//! Documents are kept per database and collection in insertion order, behind
//! an async-safe read-write lock. Unique indexes (and the implicit `_id`
//! index) are enforced on insert and update.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Document, doc, oid::ObjectId};
use tracing::trace;

use mongolayer_core::{
    backend::{ConnectionBuilder, ConnectionProvider, StoreBackend, UpdateOutcome},
    error::{ClientError, ClientResult},
    index::IndexDescriptor,
};

use crate::evaluator::{DocumentMatcher, same_key};

type DatabaseMap = HashMap<String, CollectionState>;
type StoreMap = HashMap<String, DatabaseMap>;

const ID_INDEX: &str = "_id_";

#[derive(Debug, Default)]
struct CollectionState {
    documents: Vec<Document>,
    indexes: Vec<StoredIndex>,
}

#[derive(Debug, Clone)]
struct StoredIndex {
    name: String,
    descriptor: IndexDescriptor,
    fields: Vec<String>,
}

impl StoredIndex {
    fn new(descriptor: &IndexDescriptor) -> Self {
        Self {
            name: descriptor.name(),
            fields: descriptor
                .parsed_keys()
                .into_iter()
                .map(|key| key.field)
                .collect(),
            descriptor: descriptor.clone(),
        }
    }

    /// Same keys with the same options; `background` and `drop_duplicates`
    /// only affect the build.
    fn is_equivalent(&self, other: &IndexDescriptor) -> bool {
        self.descriptor.parsed_keys() == other.parsed_keys()
            && self.descriptor.unique == other.unique
            && self.descriptor.sparse == other.sparse
    }

    /// Sparse indexes skip documents lacking every indexed field.
    fn covers(&self, document: &Document) -> bool {
        !self.descriptor.sparse || self.fields.iter().any(|field| document.contains_key(field))
    }
}

impl CollectionState {
    /// Returns the name of the unique index `candidate` would violate, ignoring
    /// the document at position `skip`.
    fn violation(&self, candidate: &Document, skip: Option<usize>) -> Option<String> {
        let others = || {
            self.documents
                .iter()
                .enumerate()
                .filter(move |(position, _)| Some(*position) != skip)
                .map(|(_, document)| document)
        };

        let id = [String::from("_id")];
        if others().any(|document| same_key(document, candidate, &id)) {
            return Some(ID_INDEX.to_string());
        }

        self.indexes
            .iter()
            .filter(|index| index.descriptor.unique && index.covers(candidate))
            .find(|index| {
                others()
                    .filter(|document| index.covers(document))
                    .any(|document| same_key(document, candidate, &index.fields))
            })
            .map(|index| index.name.clone())
    }

    fn matching(&self, filter: &Document) -> impl Iterator<Item = usize> + '_ {
        let filter = filter.clone();

        self.documents
            .iter()
            .enumerate()
            .filter(move |(_, document)| DocumentMatcher::new(document).matches(&filter))
            .map(|(position, _)| position)
    }
}

fn duplicate(collection: &str, index: &str) -> ClientError {
    ClientError::DuplicateKey {
        collection: collection.to_string(),
        value: format!("E11000 duplicate key error index: {index}"),
    }
}

/// Thread-safe in-memory store handle.
///
/// Cloning shares the underlying data, which is how
/// [`ConnectionProvider::copy`] hands out handles: every copy sees the same
/// databases, like session copies of one cluster connection.
///
/// # Example
///
/// ```ignore
/// use mongolayer_memory::InMemoryStore;
/// use mongolayer::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// store.insert_documents("app", "users", vec![doc! { "name": "Alice" }]).await?;
///
/// let docs = store.find_documents("app", "users", doc! {}, None).await?;
/// assert_eq!(docs.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// database name -> (collection name -> state)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn find_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        limit: Option<i64>,
    ) -> ClientResult<Vec<Document>> {
        let store = self.store.read().await;
        let state = match store.get(database).and_then(|db| db.get(collection)) {
            Some(state) => state,
            None => return Ok(vec![]),
        };

        let take = match limit {
            Some(limit) if limit > 0 => limit as usize,
            _ => usize::MAX,
        };

        Ok(
            state
                .matching(&filter)
                .take(take)
                .map(|position| state.documents[position].clone())
                .collect()
        )
    }

    async fn insert_documents(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> ClientResult<()> {
        let mut store = self.store.write().await;
        let state = store
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        for document in documents {
            let document = if document.contains_key("_id") {
                document
            } else {
                let mut with_id = doc! { "_id": ObjectId::new() };
                with_id.extend(document);
                with_id
            };

            if let Some(index) = state.violation(&document, None) {
                return Err(duplicate(collection, &index));
            }

            trace!(database, collection, "inserted document");
            state.documents.push(document);
        }

        Ok(())
    }

    async fn update_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        set: Document,
        multi: bool,
    ) -> ClientResult<UpdateOutcome> {
        let mut store = self.store.write().await;
        let state = match store.get_mut(database).and_then(|db| db.get_mut(collection)) {
            Some(state) => state,
            None => return Ok(UpdateOutcome::default()),
        };

        let positions = state
            .matching(&filter)
            .take(if multi { usize::MAX } else { 1 })
            .collect::<Vec<_>>();
        let mut outcome = UpdateOutcome::default();

        for position in positions {
            let current = &state.documents[position];

            if let Some(id) = set.get("_id") {
                if current.get("_id") != Some(id) {
                    return Err(ClientError::Backend(
                        "Performing an update on the path '_id' would modify the immutable field '_id'".to_string(),
                    ));
                }
            }

            let mut updated = current.clone();
            for (field, value) in set.iter() {
                updated.insert(field.clone(), value.clone());
            }

            if let Some(index) = state.violation(&updated, Some(position)) {
                return Err(duplicate(collection, &index));
            }

            outcome.matched += 1;
            if updated != state.documents[position] {
                outcome.modified += 1;
                state.documents[position] = updated;
            }
        }

        Ok(outcome)
    }

    async fn delete_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        multi: bool,
    ) -> ClientResult<u64> {
        let mut store = self.store.write().await;
        let state = match store.get_mut(database).and_then(|db| db.get_mut(collection)) {
            Some(state) => state,
            None => return Ok(0),
        };

        let positions = state
            .matching(&filter)
            .take(if multi { usize::MAX } else { 1 })
            .collect::<Vec<_>>();

        // positions are ascending; remove from the back so earlier ones stay valid
        for position in positions.iter().rev() {
            state.documents.remove(*position);
        }

        Ok(positions.len() as u64)
    }

    async fn ensure_index(&self, database: &str, index: &IndexDescriptor) -> ClientResult<()> {
        index.validate()?;

        let mut store = self.store.write().await;
        let state = store
            .entry(database.to_string())
            .or_default()
            .entry(index.collection.clone())
            .or_default();

        let name = index.name();
        if let Some(existing) = state.indexes.iter().find(|existing| existing.name == name) {
            return if existing.is_equivalent(index) {
                Ok(())
            } else {
                Err(ClientError::Backend(format!(
                    "Index with name: {name} already exists with different options"
                )))
            };
        }

        let stored = StoredIndex::new(index);

        if index.unique {
            let duplicates = state
                .documents
                .iter()
                .enumerate()
                .filter(|(position, document)| {
                    stored.covers(document)
                        && state.documents[..*position]
                            .iter()
                            .filter(|earlier| stored.covers(earlier))
                            .any(|earlier| same_key(earlier, document, &stored.fields))
                })
                .map(|(position, _)| position)
                .collect::<Vec<_>>();

            if !duplicates.is_empty() && !index.drop_duplicates {
                return Err(ClientError::Backend(format!(
                    "E11000 duplicate key error collection: {database}.{} index: {name}",
                    index.collection
                )));
            }

            for position in duplicates.iter().rev() {
                state.documents.remove(*position);
            }

            if !duplicates.is_empty() {
                trace!(
                    database,
                    collection = %index.collection,
                    dropped = duplicates.len(),
                    "dropped duplicates while building index"
                );
            }
        }

        state.indexes.push(stored);

        Ok(())
    }

    async fn index_names(&self, database: &str, collection: &str) -> ClientResult<Vec<String>> {
        let store = self.store.read().await;

        Ok(
            match store.get(database).and_then(|db| db.get(collection)) {
                Some(state) => std::iter::once(ID_INDEX.to_string())
                    .chain(state.indexes.iter().map(|index| index.name.clone()))
                    .collect(),
                None => vec![],
            }
        )
    }
}

#[async_trait]
impl ConnectionProvider for InMemoryStore {
    type Handle = InMemoryStore;

    fn copy(&self) -> Self::Handle {
        self.clone()
    }
}

/// Builder for [`InMemoryStore`] connections.
///
/// Building always succeeds with a fresh, empty store.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl ConnectionBuilder for InMemoryStoreBuilder {
    type Connection = InMemoryStore;

    async fn build(self) -> ClientResult<Self::Connection> {
        Ok(InMemoryStore::new())
    }
}
