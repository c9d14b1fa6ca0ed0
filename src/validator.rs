//! SQL Validator
//!
//! Screens model-generated SQL before it reaches the store. This is a keyword denylist
//! over the raw text, not a parser: a column named `update_count` is rejected just like an
//! `UPDATE` statement.
//!
//! Checks run in a fixed order and the first failure is the only one reported:
//! 1. denylisted keyword anywhere in the text (substring, case-insensitive)
//! 2. text must start with `select` (case-insensitive, after trimming)
//! 3. no `;` other than a single trailing terminator

use crate::error::ValidationError;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Keywords whose presence rejects a query, reported in this order.
pub const DENYLIST: [&str; 10] = [
    "insert", "update", "delete", "drop", "alter", "truncate", "create", "replace", "attach",
    "detach",
];

const STATEMENT_TERMINATOR: char = ';';

/// Untrusted SQL text as produced by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateQuery(String);

impl CandidateQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SQL text that passed [`validate_sql`]. Only the validator can construct one, and the
/// store only executes this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedQuery {
    sql: String,
}

impl ValidatedQuery {
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn into_candidate(self) -> CandidateQuery {
        CandidateQuery(self.sql)
    }
}

impl fmt::Display for ValidatedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Accept or reject a candidate query. Accepted text is passed through unchanged.
pub fn validate_sql(candidate: CandidateQuery) -> Result<ValidatedQuery, ValidationError> {
    check(candidate.as_str())?;
    debug!("SQL validation passed");
    Ok(ValidatedQuery { sql: candidate.0 })
}

/// Run the policy against `sql` without taking ownership of it.
pub fn check(sql: &str) -> Result<(), ValidationError> {
    // Lowercased copy is for inspection only.
    let normalized = sql.trim().to_lowercase();

    if let Some(keyword) = DENYLIST.iter().copied().find(|kw| normalized.contains(kw)) {
        return Err(ValidationError::ForbiddenKeyword(keyword));
    }

    if !normalized.starts_with("select") {
        return Err(ValidationError::NotASelect);
    }

    let body = normalized
        .strip_suffix(STATEMENT_TERMINATOR)
        .unwrap_or(&normalized);
    if body.contains(STATEMENT_TERMINATOR) {
        return Err(ValidationError::MultiStatement);
    }

    Ok(())
}
