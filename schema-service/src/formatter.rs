//! Schema formatter: flat catalog rows to a nested table map.

use common::models::schema::{ColumnSummary, TableSchemaMap};

use crate::catalog::CatalogColumnRow;

/// Groups catalog rows by table.
///
/// Tables keep the order in which they are first seen and columns keep the
/// catalog's ordinal order; nothing is re-sorted.
pub fn format_schema<I>(rows: I) -> TableSchemaMap
where
    I: IntoIterator<Item = CatalogColumnRow>,
{
    let mut schema = TableSchemaMap::new();
    for row in rows {
        schema.push_column(
            &row.table_name,
            ColumnSummary {
                column_name: row.column_name,
                data_type: row.data_type,
            },
        );
    }
    schema
}
