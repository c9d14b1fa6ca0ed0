//! SQL Generator
//!
//! Sends the SQL prompt to the oracle and cleans formatting off the reply. The result is
//! still untrusted; it goes to the validator next.

use crate::error::{Nl2SqlError, Result};
use crate::llm::{DecodingOptions, Oracle};
use crate::prompt::Prompt;
use crate::validator::CandidateQuery;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::info;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?i)```(?:sql\b)?").expect("valid fence regex");
}

pub struct SqlGenerator {
    oracle: Arc<dyn Oracle>,
    options: DecodingOptions,
}

impl SqlGenerator {
    pub fn new(oracle: Arc<dyn Oracle>, max_tokens: u32) -> Self {
        Self {
            oracle,
            options: DecodingOptions::deterministic(max_tokens),
        }
    }

    pub fn options(&self) -> &DecodingOptions {
        &self.options
    }

    pub async fn generate(&self, prompt: &Prompt) -> Result<CandidateQuery> {
        let raw = self
            .oracle
            .generate(prompt.as_str(), &self.options)
            .await
            .map_err(into_generation_failed)?;

        if raw.trim().is_empty() {
            return Err(Nl2SqlError::GenerationFailed(format!(
                "{} returned empty text",
                self.oracle.name()
            )));
        }

        let sql = strip_code_fences(&raw);
        info!("Generated SQL: {}", sql);
        Ok(CandidateQuery::new(sql))
    }
}

/// Remove every ```` ```sql ```` / ```` ``` ```` marker and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

pub(crate) fn into_generation_failed(err: Nl2SqlError) -> Nl2SqlError {
    match err {
        Nl2SqlError::GenerationFailed(_) => err,
        other => Nl2SqlError::GenerationFailed(other.to_string()),
    }
}
