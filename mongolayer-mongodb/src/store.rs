use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, doc};
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{CommandError, Error as MongoError, ErrorKind, InsertManyError, WriteError, WriteFailure},
    options::{FindOptions, IndexOptions},
};
use tracing::{trace, warn};

use mongolayer_core::{
    backend::{StoreBackend, UpdateOutcome},
    error::{ClientError, ClientResult},
    index::IndexDescriptor,
};

/// Server codes reported for unique index violations.
const DUPLICATE_KEY_CODES: [i32; 3] = [11000, 11001, 12582];
/// Server code for a missing collection.
const NAMESPACE_NOT_FOUND: i32 = 26;

/// A MongoDB store handle.
///
/// Cloning is cheap: the driver client is reference counted and pools its
/// connections internally.
#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
}

impl MongoDbStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, database: &str, collection: &str) -> MongoCollection<Document> {
        self.client.database(database).collection(collection)
    }
}

pub(crate) fn is_duplicate_code(code: i32) -> bool {
    DUPLICATE_KEY_CODES.contains(&code)
}

fn command_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(CommandError { code, .. }) => Some(*code),
        _ => None,
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code, .. })) => is_duplicate_code(*code),
        ErrorKind::InsertMany(InsertManyError { write_errors: Some(errors), .. }) => {
            errors.iter().any(|error| is_duplicate_code(error.code))
        }
        _ => command_code(err).is_some_and(is_duplicate_code),
    }
}

/// Maps a driver error, surfacing unique index violations as
/// [`ClientError::DuplicateKey`].
fn classify(err: MongoError, collection: &str) -> ClientError {
    if is_duplicate_key(&err) {
        ClientError::DuplicateKey {
            collection: collection.to_string(),
            value: err.to_string(),
        }
    } else {
        ClientError::Backend(err.to_string())
    }
}

/// Translates an index descriptor into the driver's index model.
pub(crate) fn index_model(index: &IndexDescriptor) -> IndexModel {
    IndexModel::builder()
        .keys(index.key_document())
        .options(
            IndexOptions::builder()
                .name(index.name())
                .unique(index.unique)
                .sparse(index.sparse)
                .background(index.background)
                .build()
        )
        .build()
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn find_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        limit: Option<i64>,
    ) -> ClientResult<Vec<Document>> {
        let mut options = FindOptions::default();
        options.limit = limit.filter(|limit| *limit > 0);

        self.get_collection(database, collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| ClientError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| ClientError::Backend(e.to_string()))
    }

    async fn insert_documents(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> ClientResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let inserted = self.get_collection(database, collection)
            .insert_many(documents)
            .await
            .map_err(|e| classify(e, collection))?;

        trace!(database, collection, count = inserted.inserted_ids.len(), "inserted documents");

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
        let target = self.get_collection(database, collection);
        let update = doc! { "$set": set };

        let result = if multi {
            target.update_many(filter, update).await
        } else {
            target.update_one(filter, update).await
        }
        .map_err(|e| classify(e, collection))?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_documents(
        &self,
        database: &str,
        collection: &str,
        filter: Document,
        multi: bool,
    ) -> ClientResult<u64> {
        let target = self.get_collection(database, collection);

        let result = if multi {
            target.delete_many(filter).await
        } else {
            target.delete_one(filter).await
        }
        .map_err(|e| ClientError::Backend(e.to_string()))?;

        Ok(result.deleted_count)
    }

    async fn ensure_index(&self, database: &str, index: &IndexDescriptor) -> ClientResult<()> {
        index.validate()?;

        if index.drop_duplicates {
            warn!(
                collection = %index.collection,
                index = %index.name(),
                "dropping duplicates is not supported by the server; building without it"
            );
        }

        self.get_collection(database, &index.collection)
            .create_index(index_model(index))
            .await
            .map_err(|e| ClientError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn index_names(&self, database: &str, collection: &str) -> ClientResult<Vec<String>> {
        match self.get_collection(database, collection).list_index_names().await {
            Ok(names) => Ok(names),
            Err(e) if command_code(&e) == Some(NAMESPACE_NOT_FOUND) => Ok(vec![]),
            Err(e) => Err(ClientError::Backend(e.to_string())),
        }
    }
}
