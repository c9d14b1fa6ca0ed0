//! Relational Store
//!
//! The pipeline only needs two capabilities from a database: list its tables and columns,
//! and run a read query. `RelationalStore` captures that contract; `SqliteStore` is the
//! embedded file-backed implementation.

use crate::error::{Nl2SqlError, Result};
use crate::result::ResultSet;
use crate::schema::{ColumnSchema, SchemaDescription, TableSchema};
use crate::validator::ValidatedQuery;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Store capability required by the pipeline.
pub trait RelationalStore {
    /// Every user-defined table and its columns, in natural enumeration order.
    fn describe_schema(&self) -> Result<SchemaDescription>;

    /// Run a validated query exactly once.
    fn execute(&self, query: &ValidatedQuery) -> Result<ResultSet>;
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open an existing database file read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Nl2SqlError::StoreUnavailable(format!(
                "Database not found at {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            Nl2SqlError::StoreUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;

        info!("Connected to database at {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an already open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn, path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Release the connection, reporting any error from SQLite.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| {
            Nl2SqlError::StoreUnavailable(format!("Failed to close database: {}", e))
        })?;
        debug!("Database connection closed");
        Ok(())
    }

    fn table_names(&self) -> rusqlite::Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY rowid",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn table_columns(&self, table: &str) -> rusqlite::Result<Vec<ColumnSchema>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| {
                Ok(ColumnSchema {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

impl RelationalStore for SqliteStore {
    fn describe_schema(&self) -> Result<SchemaDescription> {
        let unavailable =
            |e: rusqlite::Error| Nl2SqlError::StoreUnavailable(format!("Failed to read schema: {}", e));

        let mut tables = Vec::new();
        for name in self.table_names().map_err(unavailable)? {
            let columns = self.table_columns(&name).map_err(unavailable)?;
            tables.push(TableSchema { name, columns });
        }
        Ok(SchemaDescription { tables })
    }

    fn execute(&self, query: &ValidatedQuery) -> Result<ResultSet> {
        debug!("Executing SQL: {}", query);
        let mut stmt = self
            .conn
            .prepare(query.as_str())
            .map_err(Nl2SqlError::execution)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).map_err(Nl2SqlError::execution)?;
        while let Some(row) = cursor.next().map_err(Nl2SqlError::execution)? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                let cell = row.get_ref(idx).map_err(Nl2SqlError::execution)?;
                values.push(to_json_value(cell));
            }
            rows.push(values);
        }

        info!("Query returned {} rows", rows.len());
        Ok(ResultSet::new(columns, rows))
    }
}

fn to_json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<{} byte blob>", bytes.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_db;
    use crate::validator::{validate_sql, CandidateQuery};
    use serde_json::json;

    fn sample_store() -> SqliteStore {
        let conn = Connection::open_in_memory().unwrap();
        sample_db::seed(&conn).unwrap();
        SqliteStore::from_connection(conn)
    }

    fn validated(sql: &str) -> ValidatedQuery {
        validate_sql(CandidateQuery::new(sql)).unwrap()
    }

    #[test]
    fn test_describe_schema_lists_tables_in_creation_order() {
        let schema = sample_store().describe_schema().unwrap();
        let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["customers", "products", "orders", "order_items", "payments"]
        );

        let orders = schema.table("orders").unwrap();
        let columns: Vec<(&str, &str)> = orders
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.data_type.as_str()))
            .collect();
        assert_eq!(
            columns,
            vec![
                ("order_id", "INTEGER"),
                ("customer_id", "INTEGER"),
                ("order_date", "TEXT"),
                ("status", "TEXT"),
            ]
        );
    }

    #[test]
    fn test_describe_schema_skips_internal_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE events (id INTEGER PRIMARY KEY AUTOINCREMENT, payload);
             INSERT INTO events (payload) VALUES ('x');",
        )
        .unwrap();
        let store = SqliteStore::from_connection(conn);

        let schema = store.describe_schema().unwrap();
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].name, "events");
        assert_eq!(schema.tables[0].columns[1].data_type, "");
    }

    #[test]
    fn test_describe_schema_reflects_current_state() {
        let store = sample_store();
        assert_eq!(store.describe_schema().unwrap().tables.len(), 5);

        store
            .connection()
            .execute_batch("CREATE TABLE reviews (review_id INTEGER, rating INTEGER);")
            .unwrap();
        assert_eq!(store.describe_schema().unwrap().tables.len(), 6);
    }

    #[test]
    fn test_execute_returns_columns_and_rows() {
        let store = sample_store();
        let result = store
            .execute(&validated("SELECT name, price FROM products WHERE price >= 500 ORDER BY price DESC"))
            .unwrap();

        assert_eq!(result.columns, vec!["name", "price"]);
        assert_eq!(
            result.rows,
            vec![
                vec![json!("Laptop"), json!(800.0)],
                vec![json!("Smartphone"), json!(500.0)],
            ]
        );
    }

    #[test]
    fn test_execute_count() {
        let store = sample_store();
        let result = store.execute(&validated("SELECT COUNT(*) FROM orders;")).unwrap();
        assert_eq!(result.columns, vec!["COUNT(*)"]);
        assert_eq!(result.rows, vec![vec![json!(5)]]);
    }

    #[test]
    fn test_execute_unknown_column_is_execution_error() {
        let store = sample_store();
        let err = store
            .execute(&validated("SELECT discount FROM orders"))
            .unwrap_err();
        assert_eq!(err.kind(), "execution_error");
        assert!(err.to_string().contains("discount"));
    }

    #[test]
    fn test_open_missing_file_is_store_unavailable() {
        let path = std::env::temp_dir().join(format!("nl2sql-missing-{}.db", uuid::Uuid::new_v4()));
        let err = SqliteStore::open(&path).err().unwrap();
        assert_eq!(err.kind(), "store_unavailable");
    }

    #[test]
    fn test_value_conversion() {
        assert_eq!(to_json_value(ValueRef::Null), Value::Null);
        assert_eq!(to_json_value(ValueRef::Integer(7)), json!(7));
        assert_eq!(to_json_value(ValueRef::Real(f64::NAN)), Value::Null);
        assert_eq!(to_json_value(ValueRef::Text(b"UPI")), json!("UPI"));
        assert_eq!(to_json_value(ValueRef::Blob(&[1, 2, 3])), json!("<3 byte blob>"));
    }
}
