//! Connections to a MongoDB deployment.

use async_trait::async_trait;
use bson::doc;
use mongodb::{Client, options::ClientOptions};
use tracing::{debug, info};

use mongolayer_core::{
    backend::{ConnectionBuilder, ConnectionProvider},
    error::{ClientError, ClientResult},
    settings::Settings,
};

use crate::store::MongoDbStore;

/// An open, authenticated connection. Hands out [`MongoDbStore`] copies.
#[derive(Debug)]
pub struct MongoConnection {
    client: Client,
    database: String,
}

impl MongoConnection {
    pub fn builder(settings: Settings) -> MongoConnectionBuilder {
        MongoConnectionBuilder::new(settings)
    }

    /// The database named by the settings the connection was built from,
    /// trimmed like the connection string.
    pub fn database(&self) -> &str {
        &self.database
    }
}

#[async_trait]
impl ConnectionProvider for MongoConnection {
    type Handle = MongoDbStore;

    fn copy(&self) -> Self::Handle {
        MongoDbStore::new(self.client.clone())
    }

    async fn close(self) -> ClientResult<()> {
        debug!(database = %self.database, "shutting down connection");
        self.client.shutdown().await;

        Ok(())
    }
}

pub struct MongoConnectionBuilder {
    settings: Settings,
}

impl MongoConnectionBuilder {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ConnectionBuilder for MongoConnectionBuilder {
    type Connection = MongoConnection;

    /// Connects and authenticates against the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Initialization`] if the connection string is
    /// invalid, the server is unreachable or the credentials are refused.
    async fn build(self) -> ClientResult<Self::Connection> {
        let database = self.settings.database().to_string();
        let client = Client::with_options(
            ClientOptions::parse(self.settings.connection_string())
                .await
                .map_err(|e| ClientError::Initialization(e.to_string()))?,
        )
        .map_err(|e| ClientError::Initialization(e.to_string()))?;

        client
            .database(&database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ClientError::Initialization(e.to_string()))?;

        info!(
            host = %self.settings.dbhost,
            database = %database,
            "connected to mongodb"
        );

        Ok(MongoConnection { client, database })
    }
}
