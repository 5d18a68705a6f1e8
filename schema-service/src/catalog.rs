//! Catalog query engine.
//!
//! Read-only introspection queries against a target database's
//! `information_schema`, restricted to its default schema (`public` on
//! PostgreSQL, the connected database on MySQL). Table names are always
//! bound as parameters. Every query is bounded by the configured query
//! timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Connection, MySqlConnection, PgConnection};

use common::errors::{AppError, AppResult};
use common::models::schema::ColumnDescriptor;

/// One `(table, column, type)` row of the full column listing.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CatalogColumnRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
}

/// One column row of a single-table description.
#[derive(Debug, sqlx::FromRow)]
struct ColumnDetailRow {
    column_name: String,
    data_type: String,
    is_nullable: String,
    column_default: Option<String>,
}

impl From<ColumnDetailRow> for ColumnDescriptor {
    fn from(row: ColumnDetailRow) -> Self {
        Self {
            column_name: row.column_name,
            data_type: row.data_type,
            is_nullable: row.is_nullable.eq_ignore_ascii_case("YES"),
            default: row.column_default,
        }
    }
}

/// A live, request-scoped session to a target database.
#[async_trait]
pub trait CatalogConnection: Send {
    /// All columns of the default schema, ordered by table name then ordinal position.
    async fn list_all_columns(&mut self) -> AppResult<Vec<CatalogColumnRow>>;

    /// Whether `table_name` exists in the default schema.
    async fn table_exists(&mut self, table_name: &str) -> AppResult<bool>;

    /// Columns of `table_name` in ordinal order.
    async fn describe_table(&mut self, table_name: &str) -> AppResult<Vec<ColumnDescriptor>>;

    /// Gracefully ends the session. Failures are logged, not returned.
    async fn close(self: Box<Self>);
}

mod queries {
    pub mod postgres {
        // Qualified ORDER BY keys sort on the catalog's `name` columns, not
        // on the text-cast output aliases.
        pub const LIST_ALL_COLUMNS: &str = "
            SELECT c.table_name::text AS table_name,
                   c.column_name::text AS column_name,
                   c.data_type::text AS data_type
            FROM information_schema.columns c
            WHERE c.table_schema = 'public'
            ORDER BY c.table_name, c.ordinal_position";

        pub const TABLE_EXISTS: &str = "
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )";

        pub const DESCRIBE_TABLE: &str = "
            SELECT column_name::text AS column_name,
                   data_type::text AS data_type,
                   is_nullable::text AS is_nullable,
                   column_default::text AS column_default
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = $1
            ORDER BY ordinal_position";
    }

    pub mod mysql {
        pub const LIST_ALL_COLUMNS: &str = "
            SELECT CAST(c.TABLE_NAME AS CHAR) AS table_name,
                   CAST(c.COLUMN_NAME AS CHAR) AS column_name,
                   CAST(c.DATA_TYPE AS CHAR) AS data_type
            FROM information_schema.COLUMNS c
            WHERE c.TABLE_SCHEMA = DATABASE()
            ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION";

        pub const TABLE_EXISTS: &str = "
            SELECT EXISTS (
                SELECT 1 FROM information_schema.TABLES
                WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            )";

        pub const DESCRIBE_TABLE: &str = "
            SELECT CAST(COLUMN_NAME AS CHAR) AS column_name,
                   CAST(DATA_TYPE AS CHAR) AS data_type,
                   CAST(IS_NULLABLE AS CHAR) AS is_nullable,
                   CAST(COLUMN_DEFAULT AS CHAR) AS column_default
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION";
    }
}

/// Runs a catalog query under `limit`, mapping driver errors and timeouts.
async fn bounded<T, F>(limit: Duration, query: F) -> AppResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, query).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AppError::Query(e.to_string())),
        Err(_) => Err(AppError::QueryTimeout),
    }
}

/// Closes a session under `limit`. Returns whether the close was clean;
/// failures and timeouts are logged only.
async fn close_within<F>(limit: Duration, backend: &'static str, close: F) -> bool
where
    F: Future<Output = Result<(), sqlx::Error>>,
{
    match tokio::time::timeout(limit, close).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(backend, error = %e, "Failed to close connection cleanly");
            false
        }
        Err(_) => {
            tracing::warn!(
                backend,
                timeout_ms = limit.as_millis() as u64,
                "Timed out closing connection"
            );
            false
        }
    }
}

/// Catalog session over a single PostgreSQL connection.
pub struct PgCatalog {
    conn: PgConnection,
    query_timeout: Duration,
}

impl PgCatalog {
    pub fn new(conn: PgConnection, query_timeout: Duration) -> Self {
        Self {
            conn,
            query_timeout,
        }
    }
}

#[async_trait]
impl CatalogConnection for PgCatalog {
    async fn list_all_columns(&mut self) -> AppResult<Vec<CatalogColumnRow>> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, CatalogColumnRow>(queries::postgres::LIST_ALL_COLUMNS)
                .fetch_all(&mut self.conn),
        )
        .await
    }

    async fn table_exists(&mut self, table_name: &str) -> AppResult<bool> {
        let (exists,): (bool,) = bounded(
            self.query_timeout,
            sqlx::query_as(queries::postgres::TABLE_EXISTS)
                .bind(table_name)
                .fetch_one(&mut self.conn),
        )
        .await?;
        Ok(exists)
    }

    async fn describe_table(&mut self, table_name: &str) -> AppResult<Vec<ColumnDescriptor>> {
        let rows = bounded(
            self.query_timeout,
            sqlx::query_as::<_, ColumnDetailRow>(queries::postgres::DESCRIBE_TABLE)
                .bind(table_name)
                .fetch_all(&mut self.conn),
        )
        .await?;
        Ok(rows.into_iter().map(ColumnDescriptor::from).collect())
    }

    async fn close(self: Box<Self>) {
        close_within(self.query_timeout, "postgres", self.conn.close()).await;
    }
}

/// Catalog session over a single MySQL connection.
pub struct MySqlCatalog {
    conn: MySqlConnection,
    query_timeout: Duration,
}

impl MySqlCatalog {
    pub fn new(conn: MySqlConnection, query_timeout: Duration) -> Self {
        Self {
            conn,
            query_timeout,
        }
    }
}

#[async_trait]
impl CatalogConnection for MySqlCatalog {
    async fn list_all_columns(&mut self) -> AppResult<Vec<CatalogColumnRow>> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, CatalogColumnRow>(queries::mysql::LIST_ALL_COLUMNS)
                .fetch_all(&mut self.conn),
        )
        .await
    }

    async fn table_exists(&mut self, table_name: &str) -> AppResult<bool> {
        // MySQL's EXISTS yields an integer.
        let (exists,): (i64,) = bounded(
            self.query_timeout,
            sqlx::query_as(queries::mysql::TABLE_EXISTS)
                .bind(table_name)
                .fetch_one(&mut self.conn),
        )
        .await?;
        Ok(exists != 0)
    }

    async fn describe_table(&mut self, table_name: &str) -> AppResult<Vec<ColumnDescriptor>> {
        let rows = bounded(
            self.query_timeout,
            sqlx::query_as::<_, ColumnDetailRow>(queries::mysql::DESCRIBE_TABLE)
                .bind(table_name)
                .fetch_all(&mut self.conn),
        )
        .await?;
        Ok(rows.into_iter().map(ColumnDescriptor::from).collect())
    }

    async fn close(self: Box<Self>) {
        close_within(self.query_timeout, "mysql", self.conn.close()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_flag_conversion() {
        let nullable: ColumnDescriptor = ColumnDetailRow {
            column_name: "column1".into(),
            data_type: "varchar".into(),
            is_nullable: "YES".into(),
            column_default: None,
        }
        .into();
        assert!(nullable.is_nullable);
        assert_eq!(nullable.default, None);

        let required: ColumnDescriptor = ColumnDetailRow {
            column_name: "id".into(),
            data_type: "integer".into(),
            is_nullable: "NO".into(),
            column_default: Some("nextval('t_id_seq'::regclass)".into()),
        }
        .into();
        assert!(!required.is_nullable);
        assert_eq!(
            required.default.as_deref(),
            Some("nextval('t_id_seq'::regclass)")
        );
    }

    #[test]
    fn test_table_name_is_bound_not_interpolated() {
        assert!(queries::postgres::TABLE_EXISTS.contains("$1"));
        assert!(queries::postgres::DESCRIBE_TABLE.contains("$1"));
        assert!(queries::mysql::TABLE_EXISTS.contains('?'));
        assert!(queries::mysql::DESCRIBE_TABLE.contains('?'));
    }

    #[test]
    fn test_listing_orders_by_catalog_columns() {
        assert!(queries::postgres::LIST_ALL_COLUMNS
            .contains("ORDER BY c.table_name, c.ordinal_position"));
        assert!(queries::mysql::LIST_ALL_COLUMNS
            .contains("ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION"));
    }

    #[tokio::test]
    async fn test_close_within_gives_up_on_slow_close() {
        let hung = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, sqlx::Error>(())
        };
        let started = std::time::Instant::now();
        assert!(!close_within(Duration::from_millis(10), "postgres", hung).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_close_within_reports_outcome() {
        assert!(close_within(Duration::from_secs(1), "mysql", async { Ok::<(), sqlx::Error>(()) }).await);
        let failing = async { Err::<(), _>(sqlx::Error::PoolClosed) };
        assert!(!close_within(Duration::from_secs(1), "mysql", failing).await);
    }

    #[tokio::test]
    async fn test_bounded_maps_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, sqlx::Error>(())
        };
        let err = bounded(Duration::from_millis(10), slow).await.unwrap_err();
        assert!(matches!(err, AppError::QueryTimeout));
    }

    #[tokio::test]
    async fn test_bounded_maps_driver_error() {
        let failing = async { Err::<(), _>(sqlx::Error::RowNotFound) };
        let err = bounded(Duration::from_secs(1), failing).await.unwrap_err();
        assert!(matches!(err, AppError::Query(_)));
    }
}
