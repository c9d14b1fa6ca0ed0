//! Runtime configuration
//!
//! Everything the pipeline needs from the outside world is collected here once and then
//! passed down explicitly. Values come from the process environment (optionally seeded
//! from a `.env` file by the binary).

use crate::error::{Nl2SqlError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_DB_PATH: &str = "data/sample.db";

/// Connection settings for the HTTP language-model oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl LlmConfig {
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Nl2SqlError::Config(
                    "OPENAI_API_KEY is not set (use --api-key or a .env file)".to_string(),
                )
            })
    }
}

/// Knobs for the generator and rephraser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Output budget for the SQL generation call
    pub sql_max_tokens: u32,

    /// Output budget for the answer rephrasing call
    pub answer_max_tokens: u32,

    /// Number of leading result rows shown to the oracle when phrasing an answer
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sql_max_tokens: 256,
            answer_max_tokens: 256,
            preview_rows: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub db_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PipelineConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm = LlmConfig {
            api_key: non_empty("OPENAI_API_KEY"),
            model: non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        let pipeline = PipelineConfig {
            sql_max_tokens: parse_or(&non_empty, "NL2SQL_SQL_MAX_TOKENS", defaults.sql_max_tokens)?,
            answer_max_tokens: parse_or(&non_empty, "NL2SQL_ANSWER_MAX_TOKENS", defaults.answer_max_tokens)?,
            preview_rows: parse_or(&non_empty, "NL2SQL_PREVIEW_ROWS", defaults.preview_rows)?,
        };
        if pipeline.preview_rows == 0 {
            return Err(Nl2SqlError::Config(
                "NL2SQL_PREVIEW_ROWS must be at least 1".to_string(),
            ));
        }

        let db_path = non_empty("NL2SQL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        Ok(Self { llm, pipeline, db_path })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value.trim().parse::<T>().map_err(|_| {
            Nl2SqlError::Config(format!("{} must be a positive integer, got '{}'", key, value))
        }),
        None => Ok(default),
    }
}
