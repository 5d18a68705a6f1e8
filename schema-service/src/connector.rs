//! Connection provider.
//!
//! Opens exactly one short-lived connection per request to the database a
//! credential record points at. There is no pooling and no retry: a failed
//! attempt is reported to the caller as a classified [`ConnectionError`].

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlDatabaseError};
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, MySqlConnection, PgConnection};

use common::errors::ConnectionError;
use common::models::credentials::{CredentialRecord, DbType};

use crate::catalog::{CatalogConnection, MySqlCatalog, PgCatalog};

/// Opens request-scoped catalog sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Single connection attempt to the database described by `creds`.
    ///
    /// The caller owns the returned session and must `close` it.
    async fn open(
        &self,
        creds: &CredentialRecord,
    ) -> Result<Box<dyn CatalogConnection>, ConnectionError>;
}

/// Connector backed by sqlx single connections.
#[derive(Debug, Clone)]
pub struct SqlxConnector {
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl SqlxConnector {
    pub fn new(connect_timeout: Duration, query_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            query_timeout,
        }
    }

    async fn open_postgres(
        &self,
        creds: &CredentialRecord,
    ) -> Result<Box<dyn CatalogConnection>, ConnectionError> {
        let options = PgConnectOptions::new()
            .host(&creds.hostname)
            .port(creds.port)
            .username(&creds.username)
            .password(&creds.password)
            .database(&creds.db_name)
            .application_name("schema-service")
            // Server-side guard in addition to the client-side timeout.
            .options([("statement_timeout", self.query_timeout.as_millis().to_string())]);

        let conn = match tokio::time::timeout(
            self.connect_timeout,
            PgConnection::connect_with(&options),
        )
        .await
        {
            Ok(result) => result.map_err(classify_connect_error)?,
            Err(_) => return Err(ConnectionError::Timeout),
        };
        Ok(Box::new(PgCatalog::new(conn, self.query_timeout)))
    }

    async fn open_mysql(
        &self,
        creds: &CredentialRecord,
    ) -> Result<Box<dyn CatalogConnection>, ConnectionError> {
        let options = MySqlConnectOptions::new()
            .host(&creds.hostname)
            .port(creds.port)
            .username(&creds.username)
            .password(&creds.password)
            .database(&creds.db_name);

        let conn = match tokio::time::timeout(
            self.connect_timeout,
            MySqlConnection::connect_with(&options),
        )
        .await
        {
            Ok(result) => result.map_err(classify_connect_error)?,
            Err(_) => return Err(ConnectionError::Timeout),
        };
        Ok(Box::new(MySqlCatalog::new(conn, self.query_timeout)))
    }
}

#[async_trait]
impl Connector for SqlxConnector {
    async fn open(
        &self,
        creds: &CredentialRecord,
    ) -> Result<Box<dyn CatalogConnection>, ConnectionError> {
        validate_params(creds)?;
        match creds.db_type {
            DbType::Postgres => self.open_postgres(creds).await,
            DbType::MySQL => self.open_mysql(creds).await,
        }
    }
}

/// Rejects records that cannot describe a reachable database.
pub fn validate_params(creds: &CredentialRecord) -> Result<(), ConnectionError> {
    if creds.hostname.trim().is_empty() {
        return Err(ConnectionError::InvalidParameters("hostname is empty".into()));
    }
    if creds.db_name.trim().is_empty() {
        return Err(ConnectionError::InvalidParameters("db_name is empty".into()));
    }
    if creds.port == 0 {
        return Err(ConnectionError::InvalidParameters("port must be non-zero".into()));
    }
    Ok(())
}

/// Maps a driver error from a connection attempt onto [`ConnectionError`].
pub fn classify_connect_error(err: sqlx::Error) -> ConnectionError {
    match err {
        sqlx::Error::Database(db) => {
            let sqlstate = db.code().map(|c| c.into_owned());
            let mysql_number = db
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(|e| e.number());
            match (sqlstate.as_deref(), mysql_number) {
                // 28P01 invalid_password, 28000 invalid_authorization_specification
                (_, Some(1045)) | (Some("28P01"), _) | (Some("28000"), _) => {
                    ConnectionError::AuthenticationFailed
                }
                // 3D000 invalid_catalog_name
                (_, Some(1049)) | (Some("3D000"), _) => ConnectionError::DatabaseNotFound,
                _ => ConnectionError::Unknown(db.message().to_string()),
            }
        }
        sqlx::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => ConnectionError::Timeout,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => ConnectionError::HostUnreachable,
        sqlx::Error::PoolTimedOut => ConnectionError::Timeout,
        other => ConnectionError::Unknown(other.to_string()),
    }
}
