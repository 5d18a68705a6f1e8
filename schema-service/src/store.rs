//! Credential store.
//!
//! Keyed record store mapping a database name to its connection parameters.
//! Handlers receive the store through [`AppState`](crate::state::AppState),
//! so tests run against [`InMemoryCredentialStore`] and deployments against
//! [`SqlCredentialStore`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection, SqliteConnection, SqlitePool};
use tokio::sync::{Mutex, RwLock};

use common::errors::{AppError, AppResult};
use common::models::credentials::{CredentialRecord, DbType, NewCredentials};

/// Persistence interface for credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up the record registered under `db_name`.
    async fn find(&self, db_name: &str) -> AppResult<CredentialRecord>;

    /// Persists a new record; `db_name` must not already be registered.
    async fn create(&self, creds: NewCredentials) -> AppResult<CredentialRecord>;

    /// Number of registered records.
    async fn count(&self) -> AppResult<usize>;
}

/// Builds the store selected by `url`: `memory` or a `sqlite:` URL.
pub async fn open_store(url: &str) -> AppResult<Arc<dyn CredentialStore>> {
    if url.eq_ignore_ascii_case("memory") {
        tracing::info!("Using in-memory credential store");
        return Ok(Arc::new(InMemoryCredentialStore::new()));
    }
    if url.starts_with("sqlite:") {
        let store = SqlCredentialStore::connect(url).await?;
        tracing::info!("Using SQLite credential store");
        return Ok(Arc::new(store));
    }
    Err(AppError::Internal(format!(
        "unsupported credential store url: {}",
        url
    )))
}

#[derive(Default)]
struct MemoryInner {
    records: HashMap<String, CredentialRecord>,
    next_id: i64,
}

/// Process-local store backed by a map.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<MemoryInner>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find(&self, db_name: &str) -> AppResult<CredentialRecord> {
        self.inner
            .read()
            .await
            .records
            .get(db_name)
            .cloned()
            .ok_or_else(|| AppError::CredentialsNotFound(db_name.to_string()))
    }

    async fn create(&self, creds: NewCredentials) -> AppResult<CredentialRecord> {
        let mut inner = self.inner.write().await;
        if inner.records.contains_key(&creds.db_name) {
            return Err(AppError::DuplicateCredentials(creds.db_name));
        }
        inner.next_id += 1;
        let record = creds.into_record(inner.next_id, Utc::now().to_rfc3339());
        inner.records.insert(record.db_name.clone(), record.clone());
        Ok(record)
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.inner.read().await.records.len())
    }
}

/// Row from the `database_credentials` table.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    hostname: String,
    db_name: String,
    username: String,
    password: String,
    port: i64,
    db_type: String,
    created_at: String,
}

impl CredentialRow {
    fn into_record(self) -> AppResult<CredentialRecord> {
        let db_type = DbType::from_str(&self.db_type).map_err(AppError::Store)?;
        let port = u16::try_from(self.port)
            .map_err(|_| AppError::Store(format!("stored port out of range: {}", self.port)))?;
        Ok(CredentialRecord {
            id: self.id,
            hostname: self.hostname,
            db_name: self.db_name,
            username: self.username,
            password: self.password,
            port,
            db_type,
            created_at: self.created_at,
        })
    }
}

/// Relational store persisted in SQLite.
pub struct SqlCredentialStore {
    pool: SqlitePool,
    // Shared in-memory databases are freed with their last connection.
    _keeper: Option<Mutex<SqliteConnection>>,
}

impl SqlCredentialStore {
    /// Opens (creating if missing) the database at `url` and ensures the table exists.
    ///
    /// For `:memory:` URLs the store holds one connection outside the pool for
    /// its whole lifetime, and pooled connections are never retired.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        if !url.contains(":memory:") {
            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?;
            return Self::with_pool(pool).await;
        }

        let keeper = SqliteConnection::connect_with(&options).await?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self {
            pool,
            _keeper: Some(Mutex::new(keeper)),
        };
        store.ensure_table().await?;
        Ok(store)
    }

    pub async fn with_pool(pool: SqlitePool) -> AppResult<Self> {
        let store = Self {
            pool,
            _keeper: None,
        };
        store.ensure_table().await?;
        Ok(store)
    }

    async fn ensure_table(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS database_credentials (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                hostname    TEXT    NOT NULL,
                db_name     TEXT    NOT NULL UNIQUE,
                username    TEXT    NOT NULL,
                password    TEXT    NOT NULL,
                port        INTEGER NOT NULL DEFAULT 5432,
                db_type     TEXT    NOT NULL,
                created_at  TEXT    NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Store(format!("Failed to create credentials table: {}", e)))?;

        tracing::info!("Credential table `database_credentials` ensured");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SqlCredentialStore {
    async fn find(&self, db_name: &str) -> AppResult<CredentialRecord> {
        sqlx::query_as::<_, CredentialRow>(
            "SELECT id, hostname, db_name, username, password, port, db_type, created_at
             FROM database_credentials WHERE db_name = ?",
        )
        .bind(db_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::CredentialsNotFound(db_name.to_string()))?
        .into_record()
    }

    async fn create(&self, creds: NewCredentials) -> AppResult<CredentialRecord> {
        let created_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO database_credentials
                (hostname, db_name, username, password, port, db_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&creds.hostname)
        .bind(&creds.db_name)
        .bind(&creds.username)
        .bind(&creds.password)
        .bind(i64::from(creds.port))
        .bind(creds.db_type.as_str())
        .bind(&created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(creds.into_record(done.last_insert_rowid(), created_at)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::DuplicateCredentials(creds.db_name))
            }
            Err(e) => Err(AppError::Store(format!("Failed to save credentials: {}", e))),
        }
    }

    async fn count(&self) -> AppResult<usize> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM database_credentials")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as usize)
    }
}
