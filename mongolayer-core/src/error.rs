//! Error types and result types for data client operations.
//!
//! Every fallible operation in the workspace returns [`ClientResult<T>`]. Store
//! faults are passed through as [`ClientError::Backend`] carrying the driver's
//! message; only uniqueness violations are re-wrapped into
//! [`ClientError::DuplicateKey`].

use bson::error::Error as BsonError;
use config::ConfigError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a document store
/// through a [`DataClient`](crate::client::DataClient).
#[derive(Error, Debug)]
pub enum ClientError {
    /// The supplied record cannot be decomposed into named fields.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Serialization/deserialization error when converting between records and BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The store rejected a write because it violates a unique index.
    /// `value` names the rejected values.
    #[error("The key for this record already exists in collection {collection}: {value}")]
    DuplicateKey {
        collection: String,
        value: String,
    },
    /// A single-result query matched no document in the collection.
    #[error("No matching document found in collection {0}")]
    NotFound(String),
    /// An error occurred in the underlying store.
    #[error("Backend error: {0}")]
    Backend(String),
    /// Error while dialing or authenticating against the store.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// Connection settings could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Returns `true` if this error reports a uniqueness violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, ClientError::DuplicateKey { .. })
    }

    /// Returns `true` if this error reports an empty single-result query.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

/// A specialized `Result` type for data client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl From<BsonError> for ClientError {
    fn from(err: BsonError) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for ClientError {
    fn from(err: SerdeJsonError) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        ClientError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_message_names_the_value() {
        let err = ClientError::DuplicateKey {
            collection: "users".to_string(),
            value: "{ \"id\": \"A1\" }".to_string(),
        };

        assert!(err.is_duplicate_key());
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "The key for this record already exists in collection users: { \"id\": \"A1\" }"
        );
    }
}
