//! Query results returned by the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Column names plus rows of scalar values, positionally aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Leading rows, capped at `limit`.
    pub fn preview(&self, limit: usize) -> &[Vec<Value>] {
        &self.rows[..self.rows.len().min(limit)]
    }

    /// Render at most `limit` rows as a pipe-separated text table.
    pub fn render_preview(&self, limit: usize) -> String {
        let mut lines = Vec::with_capacity(limit.min(self.rows.len()) + 1);
        lines.push(self.columns.join(" | "));
        for row in self.preview(limit) {
            let cells: Vec<String> = row.iter().map(render_value).collect();
            lines.push(cells.join(" | "));
        }
        lines.join("\n")
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json_rows(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_preview(self.rows.len()))
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ResultSet {
        ResultSet::new(
            vec!["name".to_string(), "price".to_string()],
            vec![
                vec![json!("Laptop"), json!(800.0)],
                vec![json!("Smartphone"), json!(500.0)],
                vec![json!("Headphones"), Value::Null],
            ],
        )
    }

    #[test]
    fn test_preview_is_capped() {
        let result = sample();
        assert_eq!(result.preview(2).len(), 2);
        assert_eq!(result.preview(10).len(), 3);
        assert!(result.preview(0).is_empty());
    }

    #[test]
    fn test_render_preview() {
        let rendered = sample().render_preview(2);
        assert_eq!(rendered, "name | price\nLaptop | 800.0\nSmartphone | 500.0");
    }

    #[test]
    fn test_null_rendering_and_json_rows() {
        let result = sample();
        assert!(result.to_string().ends_with("Headphones | NULL"));

        let rows = result.to_json_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["name"], json!("Laptop"));
        assert_eq!(rows[2]["price"], Value::Null);
    }
}
