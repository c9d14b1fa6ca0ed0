//! Result Rephraser
//!
//! Turns a result set back into a natural-language answer. Empty results get a fixed
//! message without calling the oracle.

use crate::error::{Nl2SqlError, Result};
use crate::generator::into_generation_failed;
use crate::llm::{DecodingOptions, Oracle};
use crate::prompt::build_answer_prompt;
use crate::result::ResultSet;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

pub const NO_RESULTS_MESSAGE: &str = "No results were found for your question.";

/// Final natural-language answer for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer(String);

impl Answer {
    pub fn no_results() -> Self {
        Self(NO_RESULTS_MESSAGE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct ResultRephraser {
    oracle: Arc<dyn Oracle>,
    options: DecodingOptions,
    preview_rows: usize,
}

impl ResultRephraser {
    pub fn new(oracle: Arc<dyn Oracle>, max_tokens: u32, preview_rows: usize) -> Self {
        Self {
            oracle,
            options: DecodingOptions::deterministic(max_tokens),
            preview_rows,
        }
    }

    pub async fn rephrase(&self, question: &str, result: &ResultSet) -> Result<Answer> {
        if result.is_empty() {
            info!("Query returned no rows, skipping answer generation");
            return Ok(Answer::no_results());
        }

        let prompt = build_answer_prompt(question, result, self.preview_rows);
        let text = self
            .oracle
            .generate(prompt.as_str(), &self.options)
            .await
            .map_err(into_generation_failed)?;

        let text = text.trim();
        if text.is_empty() {
            return Err(Nl2SqlError::GenerationFailed(format!(
                "{} returned an empty answer",
                self.oracle.name()
            )));
        }
        Ok(Answer(text.to_string()))
    }
}
