//! Credential models.
//!
//! Connection parameters for external databases, keyed by database name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Catalog flavour of a target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    /// PostgreSQL (default schema `public`).
    Postgres,
    /// MySQL / MariaDB (default schema = connected database).
    MySQL,
}

impl DbType {
    /// Returns the default port for this database type.
    pub fn default_port(&self) -> u16 {
        match self {
            DbType::Postgres => 5432,
            DbType::MySQL => 3306,
        }
    }

    /// Display name used on the wire and in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Postgres => "PostgreSQL",
            DbType::MySQL => "MySQL",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(DbType::Postgres),
            "mysql" | "mariadb" => Ok(DbType::MySQL),
            other => Err(format!("unsupported database type: {}", other)),
        }
    }
}

impl Serialize for DbType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DbType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Stored connection parameters for one target database.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: i64,
    pub hostname: String,
    /// Unique key of the record.
    pub db_name: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub db_type: DbType,
    pub created_at: String,
}

impl fmt::Display for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Database - {} at {} (User: {})",
            self.db_type, self.db_name, self.hostname, self.username
        )
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("hostname", &self.hostname)
            .field("db_name", &self.db_name)
            .field("username", &self.username)
            .field("password", &"***")
            .field("port", &self.port)
            .field("db_type", &self.db_type)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Validated credentials ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredentials {
    pub hostname: String,
    pub db_name: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub db_type: DbType,
}

impl NewCredentials {
    /// Attaches store-assigned identity to build the stored record.
    pub fn into_record(self, id: i64, created_at: String) -> CredentialRecord {
        CredentialRecord {
            id,
            hostname: self.hostname,
            db_name: self.db_name,
            username: self.username,
            password: self.password,
            port: self.port,
            db_type: self.db_type,
            created_at,
        }
    }
}

/// Request body for registering credentials.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCredentialsRequest {
    /// Target database host.
    #[validate(custom(function = "not_blank"), length(max = 255, message = "hostname must be at most 255 characters"))]
    pub hostname: String,
    /// Target database name; unique key of the record.
    #[validate(custom(function = "not_blank"), length(max = 255, message = "db_name must be at most 255 characters"))]
    pub db_name: String,
    /// Login user.
    #[validate(custom(function = "not_blank"), length(max = 255, message = "username must be at most 255 characters"))]
    pub username: String,
    /// Login password (may be empty for trust-authenticated targets).
    #[serde(default)]
    #[validate(length(max = 255, message = "password must be at most 255 characters"))]
    pub password: String,
    /// TCP port (defaults to the database type's standard port).
    #[validate(range(min = 1, max = 65535, message = "port must be between 1 and 65535"))]
    pub port: Option<u32>,
    /// Database type, e.g. "PostgreSQL" or "MySQL".
    #[schema(value_type = String, example = "PostgreSQL")]
    pub db_type: DbType,
}

/// Values are stored verbatim, so surrounding whitespace is rejected rather
/// than trimmed.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("must not be empty".into()));
    }
    if value.trim() != value {
        return Err(ValidationError::new("whitespace")
            .with_message("must not start or end with whitespace".into()));
    }
    Ok(())
}

impl CreateCredentialsRequest {
    /// Converts the validated request into storable credentials.
    ///
    /// Call only after `validate()` has passed; the port is range-checked there.
    pub fn into_new_credentials(self) -> NewCredentials {
        let port = self
            .port
            .and_then(|p| u16::try_from(p).ok())
            .unwrap_or_else(|| self.db_type.default_port());
        NewCredentials {
            hostname: self.hostname,
            db_name: self.db_name,
            username: self.username,
            password: self.password,
            port,
            db_type: self.db_type,
        }
    }
}

/// Credential record as returned by the API (password omitted).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialItem {
    pub id: i64,
    pub hostname: String,
    pub db_name: String,
    pub username: String,
    pub port: u16,
    #[schema(value_type = String, example = "PostgreSQL")]
    pub db_type: DbType,
    pub created_at: String,
}

impl From<CredentialRecord> for CredentialItem {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            hostname: record.hostname,
            db_name: record.db_name,
            username: record.username,
            port: record.port,
            db_type: record.db_type,
            created_at: record.created_at,
        }
    }
}
