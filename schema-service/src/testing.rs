//! In-process fakes for the connection provider and catalog.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use common::config::AppConfig;
use common::errors::{AppError, AppResult, ConnectionError};
use common::models::credentials::{CredentialRecord, DbType, NewCredentials};
use common::models::schema::ColumnDescriptor;

use crate::catalog::{CatalogColumnRow, CatalogConnection};
use crate::connector::Connector;
use crate::state::AppState;
use crate::store::{CredentialStore, InMemoryCredentialStore};

/// Counts calls made against fake connections.
#[derive(Debug, Default)]
pub struct CallLog {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub exists_calls: AtomicUsize,
    pub describe_calls: AtomicUsize,
}

/// How a fake catalog query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Error,
    Timeout,
}

impl Fault {
    fn into_error(self) -> AppError {
        match self {
            Fault::Error => {
                AppError::Query("relation \"information_schema.columns\" is unavailable".into())
            }
            Fault::Timeout => AppError::QueryTimeout,
        }
    }
}

/// Per-operation failures injected into fake sessions.
#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    list: Option<Fault>,
    exists: Option<Fault>,
    describe: Option<Fault>,
}

/// Connector that hands out [`FakeCatalog`] sessions over a fixed table set.
#[derive(Clone, Default)]
pub struct FakeConnector {
    tables: Vec<(String, Vec<ColumnDescriptor>)>,
    connect_error: Option<ConnectionError>,
    faults: Faults,
    pub log: Arc<CallLog>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, columns: Vec<ColumnDescriptor>) -> Self {
        self.tables.push((name.to_string(), columns));
        self
    }

    pub fn failing_connect(mut self, err: ConnectionError) -> Self {
        self.connect_error = Some(err);
        self
    }

    /// Every catalog query fails with a driver error.
    pub fn failing_queries(self) -> Self {
        self.faulty(Fault::Error)
    }

    /// Every catalog query exceeds its time bound.
    pub fn timing_out_queries(self) -> Self {
        self.faulty(Fault::Timeout)
    }

    /// Only `describe_table` fails; the existence check succeeds.
    pub fn failing_describe(mut self, fault: Fault) -> Self {
        self.faults.describe = Some(fault);
        self
    }

    fn faulty(mut self, fault: Fault) -> Self {
        self.faults = Faults {
            list: Some(fault),
            exists: Some(fault),
            describe: Some(fault),
        };
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn open(
        &self,
        _creds: &CredentialRecord,
    ) -> Result<Box<dyn CatalogConnection>, ConnectionError> {
        if let Some(err) = &self.connect_error {
            return Err(err.clone());
        }
        self.log.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeCatalog {
            tables: self.tables.clone(),
            faults: self.faults,
            log: self.log.clone(),
        }))
    }
}

pub struct FakeCatalog {
    tables: Vec<(String, Vec<ColumnDescriptor>)>,
    faults: Faults,
    log: Arc<CallLog>,
}

fn check(fault: Option<Fault>) -> AppResult<()> {
    match fault {
        Some(fault) => Err(fault.into_error()),
        None => Ok(()),
    }
}

#[async_trait]
impl CatalogConnection for FakeCatalog {
    async fn list_all_columns(&mut self) -> AppResult<Vec<CatalogColumnRow>> {
        self.log.list_calls.fetch_add(1, Ordering::SeqCst);
        check(self.faults.list)?;
        Ok(self
            .tables
            .iter()
            .flat_map(|(table, columns)| {
                columns.iter().map(move |c| CatalogColumnRow {
                    table_name: table.clone(),
                    column_name: c.column_name.clone(),
                    data_type: c.data_type.clone(),
                })
            })
            .collect())
    }

    async fn table_exists(&mut self, table_name: &str) -> AppResult<bool> {
        self.log.exists_calls.fetch_add(1, Ordering::SeqCst);
        check(self.faults.exists)?;
        Ok(self.tables.iter().any(|(name, _)| name == table_name))
    }

    async fn describe_table(&mut self, table_name: &str) -> AppResult<Vec<ColumnDescriptor>> {
        self.log.describe_calls.fetch_add(1, Ordering::SeqCst);
        check(self.faults.describe)?;
        Ok(self
            .tables
            .iter()
            .find(|(name, _)| name == table_name)
            .map(|(_, columns)| columns.clone())
            .unwrap_or_default())
    }

    async fn close(self: Box<Self>) {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn column(name: &str, data_type: &str, is_nullable: bool) -> ColumnDescriptor {
    ColumnDescriptor {
        column_name: name.into(),
        data_type: data_type.into(),
        is_nullable,
        default: None,
    }
}

pub fn testdb_credentials() -> NewCredentials {
    NewCredentials {
        hostname: "localhost".into(),
        db_name: "testdb".into(),
        username: "testuser".into(),
        password: "testpass".into(),
        port: 5432,
        db_type: DbType::Postgres,
    }
}

/// State over an in-memory store holding `testdb` and the given connector.
pub async fn state_with(connector: FakeConnector) -> AppState {
    let store = Arc::new(InMemoryCredentialStore::new());
    store
        .create(testdb_credentials())
        .await
        .expect("seeding the in-memory store failed");
    AppState::with_parts(AppConfig::default(), store, Arc::new(connector))
}
