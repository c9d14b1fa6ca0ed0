//! NL2SQL Pipeline
//!
//! question -> schema -> prompt -> candidate SQL -> validated SQL -> result set -> answer
//!
//! Every step runs once, in order. The first failure ends the run and is returned as is.

use crate::config::PipelineConfig;
use crate::error::{Nl2SqlError, Result};
use crate::generator::SqlGenerator;
use crate::llm::Oracle;
use crate::prompt::{build_sql_prompt, Prompt};
use crate::rephraser::{Answer, ResultRephraser};
use crate::result::ResultSet;
use crate::schema::{describe_schema, SchemaDescription};
use crate::store::{RelationalStore, SqliteStore};
use crate::validator::{validate_sql, CandidateQuery, ValidatedQuery};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Every artifact produced while answering one question.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub question: String,
    pub schema: SchemaDescription,
    pub prompt: Prompt,
    pub candidate: CandidateQuery,
    pub query: ValidatedQuery,
    pub result: ResultSet,
    pub answer: Answer,
}

pub struct Nl2SqlPipeline {
    generator: SqlGenerator,
    rephraser: ResultRephraser,
}

impl Nl2SqlPipeline {
    pub fn new(oracle: Arc<dyn Oracle>, config: PipelineConfig) -> Self {
        Self {
            generator: SqlGenerator::new(oracle.clone(), config.sql_max_tokens),
            rephraser: ResultRephraser::new(oracle, config.answer_max_tokens, config.preview_rows),
        }
    }

    /// Answer `question` against `store`, keeping every intermediate artifact.
    pub async fn run(&self, question: &str, store: &dyn RelationalStore) -> Result<PipelineRun> {
        let run_id = Uuid::new_v4();
        let span = info_span!("nl2sql_run", run_id = %run_id);
        self.run_steps(run_id, question, store).instrument(span).await
    }

    /// Answer `question` against `store`, returning only the final answer.
    pub async fn answer(&self, question: &str, store: &dyn RelationalStore) -> Result<Answer> {
        Ok(self.run(question, store).await?.answer)
    }

    /// Open the database at `db_path`, answer `question`, and release the connection.
    pub async fn run_on_database(&self, question: &str, db_path: &Path) -> Result<PipelineRun> {
        let store = SqliteStore::open(db_path)?;
        // On error the store is dropped here, which closes the connection.
        let run = self.run(question, &store).await?;
        store.close()?;
        Ok(run)
    }

    async fn run_steps(
        &self,
        run_id: Uuid,
        question: &str,
        store: &dyn RelationalStore,
    ) -> Result<PipelineRun> {
        info!("Question: {}", question);

        let schema = describe_schema(store)?;
        let prompt = build_sql_prompt(question, &schema);
        debug!("SQL prompt:\n{}", prompt);

        let candidate = self.generator.generate(&prompt).await?;

        let query = validate_sql(candidate.clone()).map_err(|e| {
            warn!("Rejected generated SQL: {}", e);
            Nl2SqlError::from(e)
        })?;
        info!("SQL validation passed");

        let result = store.execute(&query)?;
        let answer = self.rephraser.rephrase(question, &result).await?;
        info!("Answer: {}", answer);

        Ok(PipelineRun {
            run_id,
            question: question.to_string(),
            schema,
            prompt,
            candidate,
            query,
            result,
            answer,
        })
    }
}
