//! Schema description used to ground SQL generation.

use crate::error::Result;
use crate::store::RelationalStore;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type exactly as the store reports it (may be empty)
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

/// Tables and columns of the store, in the store's own enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableSchema>,
}

impl SchemaDescription {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

/// Read the current schema from the store. Nothing is cached between calls.
pub fn describe_schema(store: &dyn RelationalStore) -> Result<SchemaDescription> {
    let schema = store.describe_schema()?;
    info!(
        "Extracted schema: {} tables, {} columns",
        schema.tables.len(),
        schema.column_count()
    );
    Ok(schema)
}
