//! Shared data models.

pub mod credentials;
pub mod schema;

pub use credentials::{
    CreateCredentialsRequest, CredentialItem, CredentialRecord, DbType, NewCredentials,
};
pub use schema::{
    ColumnDescriptor, ColumnSummary, DatabaseSchemaResponse, SchemaQuery, TableSchemaMap,
    TableSearchQuery, TableSearchResponse,
};
