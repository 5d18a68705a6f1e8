//! Application state for the schema service.

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::AppResult;

use crate::connector::{Connector, SqlxConnector};
use crate::store::{open_store, CredentialStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn CredentialStore>,
    pub connector: Arc<dyn Connector>,
}

impl AppState {
    /// Builds the configured credential store and the sqlx connector.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let store = open_store(&config.credential_store_url).await?;
        let connector = Arc::new(SqlxConnector::new(
            config.connect_timeout(),
            config.query_timeout(),
        ));
        Ok(Self::with_parts(config, store, connector))
    }

    /// Assembles state from explicit collaborators.
    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn CredentialStore>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config,
            store,
            connector,
        }
    }
}
