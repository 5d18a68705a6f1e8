//! Catalog introspection models.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use utoipa::{IntoParams, ToSchema};

/// Full description of one column, as returned by table search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
    /// Column default expression, if any.
    pub default: Option<String>,
}

/// Name and type of one column, as listed in a full-schema response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnSummary {
    pub column_name: String,
    pub data_type: String,
}

/// Table name to columns mapping that keeps insertion order.
///
/// Serializes as a JSON object whose keys appear in the order tables were
/// first inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchemaMap {
    tables: Vec<(String, Vec<ColumnSummary>)>,
}

impl TableSchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column to `table`, creating the table entry on first sight.
    pub fn push_column(&mut self, table: &str, column: ColumnSummary) {
        // Catalog rows arrive grouped by table, so the last entry is the usual hit.
        match self.tables.iter_mut().rev().find(|(name, _)| name == table) {
            Some((_, columns)) => columns.push(column),
            None => self.tables.push((table.to_string(), vec![column])),
        }
    }

    pub fn get(&self, table: &str) -> Option<&[ColumnSummary]> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, columns)| columns.as_slice())
    }

    /// Table names in insertion order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ColumnSummary])> {
        self.tables
            .iter()
            .map(|(name, columns)| (name.as_str(), columns.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Serialize for TableSchemaMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for (name, columns) in &self.tables {
            map.serialize_entry(name, columns)?;
        }
        map.end()
    }
}

/// Response body for a full-schema fetch.
#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseSchemaResponse {
    pub database_name: String,
    /// Table name to ordered column list.
    #[schema(value_type = Object)]
    pub schema: TableSchemaMap,
}

/// Response body for a successful table search.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableSearchResponse {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
}

/// Query parameters of the full-schema endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchemaQuery {
    /// Registered database name.
    pub db_name: Option<String>,
}

/// Query parameters of the table search endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TableSearchQuery {
    /// Registered database name.
    pub db_name: Option<String>,
    /// Table to look up in the default schema.
    pub table_name: Option<String>,
}
