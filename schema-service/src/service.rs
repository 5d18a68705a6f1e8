//! Credential registration and schema introspection services.

use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::credentials::{CreateCredentialsRequest, CredentialItem, CredentialRecord};
use common::models::schema::{ColumnDescriptor, DatabaseSchemaResponse, TableSearchResponse};

use crate::catalog::CatalogConnection;
use crate::connector::Connector;
use crate::formatter::format_schema;
use crate::store::CredentialStore;

/// Registers credential records.
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
}

impl CredentialService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Persists a validated registration request.
    pub async fn register(&self, req: CreateCredentialsRequest) -> AppResult<CredentialItem> {
        let record = self.store.create(req.into_new_credentials()).await?;
        tracing::info!(id = record.id, credentials = %record, "Credentials registered");
        Ok(CredentialItem::from(record))
    }
}

/// Orchestrates store lookup, connection and catalog queries for one request.
pub struct SchemaService {
    store: Arc<dyn CredentialStore>,
    connector: Arc<dyn Connector>,
}

impl SchemaService {
    pub fn new(store: Arc<dyn CredentialStore>, connector: Arc<dyn Connector>) -> Self {
        Self { store, connector }
    }

    /// Lists every table of the target database's default schema with its columns.
    pub async fn fetch_schema(&self, db_name: &str) -> AppResult<DatabaseSchemaResponse> {
        let creds = self.store.find(db_name).await?;
        let mut conn = self.open(&creds).await?;

        let rows = conn.list_all_columns().await;
        release(conn, &creds).await;

        let schema = format_schema(rows?);
        tracing::debug!(db_name = %creds.db_name, tables = schema.len(), "Schema fetched");
        Ok(DatabaseSchemaResponse {
            database_name: creds.db_name,
            schema,
        })
    }

    /// Describes `table_name` if it exists in the target database's default schema.
    pub async fn search_table(
        &self,
        db_name: &str,
        table_name: &str,
    ) -> AppResult<TableSearchResponse> {
        let creds = self.store.find(db_name).await?;
        let mut conn = self.open(&creds).await?;

        let columns = describe_if_exists(conn.as_mut(), table_name).await;
        release(conn, &creds).await;

        Ok(TableSearchResponse {
            table_name: table_name.to_string(),
            columns: columns?,
        })
    }

    async fn open(&self, creds: &CredentialRecord) -> AppResult<Box<dyn CatalogConnection>> {
        match self.connector.open(creds).await {
            Ok(conn) => {
                tracing::debug!(db_name = %creds.db_name, host = %creds.hostname, "Connection opened");
                Ok(conn)
            }
            Err(e) => {
                tracing::warn!(db_name = %creds.db_name, host = %creds.hostname, error = %e, "Connection failed");
                Err(AppError::Connection(e))
            }
        }
    }
}

async fn describe_if_exists(
    conn: &mut dyn CatalogConnection,
    table_name: &str,
) -> AppResult<Vec<ColumnDescriptor>> {
    if !conn.table_exists(table_name).await? {
        return Err(AppError::TableNotFound(table_name.to_string()));
    }
    conn.describe_table(table_name).await
}

// Every path that opened a connection goes through here exactly once.
async fn release(conn: Box<dyn CatalogConnection>, creds: &CredentialRecord) {
    conn.close().await;
    tracing::debug!(db_name = %creds.db_name, "Connection closed");
}
