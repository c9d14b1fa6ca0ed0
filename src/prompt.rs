//! Prompt Builder
//!
//! Deterministic templates for the two oracle calls: question to SQL, and result to answer.
//! The question is embedded verbatim; screening the output is the validator's job.

use crate::result::ResultSet;
use crate::schema::{SchemaDescription, TableSchema};
use serde::Serialize;
use std::fmt;

/// Prompt text sent to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line per table: `Table <name>: <col> (<type>), ...`
pub fn schema_text(schema: &SchemaDescription) -> String {
    schema
        .tables
        .iter()
        .map(table_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn table_line(table: &TableSchema) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            if c.data_type.is_empty() {
                c.name.clone()
            } else {
                format!("{} ({})", c.name, c.data_type)
            }
        })
        .collect();
    format!("Table {}: {}", table.name, columns.join(", "))
}

pub fn build_sql_prompt(question: &str, schema: &SchemaDescription) -> Prompt {
    Prompt(format!(
        r#"You are an expert SQLite assistant. Translate the user's question into one SQL query.

Database schema:
{}

Rules:
- Return exactly one SELECT statement.
- Use only the tables and columns listed in the schema.
- Do not include explanations or any other prose.
- Do not wrap the query in markdown code fences.
- Do not include SQL comments.

Question: {}

SQL:"#,
        schema_text(schema),
        question
    ))
}

/// Prompt asking the oracle to phrase `result` as an answer to `question`, showing at most
/// `preview_rows` rows.
pub fn build_answer_prompt(question: &str, result: &ResultSet, preview_rows: usize) -> Prompt {
    let shown = result.preview(preview_rows).len();
    let heading = if shown < result.row_count() {
        format!("Data (first {} of {} rows):", shown, result.row_count())
    } else {
        format!("Data ({} rows):", result.row_count())
    };

    Prompt(format!(
        r#"You answer questions about a business using data that has already been retrieved.

Question: {}

{}
{}

Write a concise answer in plain English using only the data above.
Do not mention SQL, queries, table names or column names."#,
        question,
        heading,
        result.render_preview(preview_rows)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSchema;
    use serde_json::json;

    fn orders_schema() -> SchemaDescription {
        let column = |name: &str, data_type: &str| ColumnSchema {
            name: name.to_string(),
            data_type: data_type.to_string(),
        };
        SchemaDescription {
            tables: vec![
                TableSchema {
                    name: "orders".to_string(),
                    columns: vec![
                        column("order_id", "INTEGER"),
                        column("customer_id", "INTEGER"),
                        column("order_date", "TEXT"),
                        column("status", "TEXT"),
                    ],
                },
                TableSchema {
                    name: "notes".to_string(),
                    columns: vec![column("body", "")],
                },
            ],
        }
    }

    #[test]
    fn test_schema_text_one_line_per_table() {
        assert_eq!(
            schema_text(&orders_schema()),
            "Table orders: order_id (INTEGER), customer_id (INTEGER), order_date (TEXT), status (TEXT)\n\
             Table notes: body"
        );
    }

    #[test]
    fn test_sql_prompt_embeds_question_verbatim() {
        let question = "How many orders are there?'; DROP TABLE orders; --";
        let prompt = build_sql_prompt(question, &orders_schema());

        assert!(prompt.as_str().contains(&format!("Question: {}", question)));
        assert!(prompt.as_str().contains("Table orders: order_id (INTEGER)"));
        assert!(prompt.as_str().contains("exactly one SELECT statement"));
        assert!(prompt.as_str().contains("markdown code fences"));
    }

    #[test]
    fn test_sql_prompt_is_deterministic() {
        let a = build_sql_prompt("How many orders are there?", &orders_schema());
        let b = build_sql_prompt("How many orders are there?", &orders_schema());
        assert_eq!(a, b);
    }

    #[test]
    fn test_answer_prompt_caps_rows() {
        let rows = (1..=5).map(|i| vec![json!(i)]).collect();
        let result = ResultSet::new(vec!["order_id".to_string()], rows);

        let prompt = build_answer_prompt("Which orders exist?", &result, 2);
        assert!(prompt.as_str().contains("Data (first 2 of 5 rows):"));
        assert!(prompt.as_str().contains("order_id\n1\n2\n"));
        assert!(!prompt.as_str().contains("\n3\n"));

        let prompt = build_answer_prompt("Which orders exist?", &result, 10);
        assert!(prompt.as_str().contains("Data (5 rows):"));
    }
}
