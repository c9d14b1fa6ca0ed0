pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod rephraser;
pub mod result;
pub mod sample_db;
pub mod schema;
pub mod store;
pub mod validator;

pub use error::{Nl2SqlError, Result, ValidationError};
pub use pipeline::{Nl2SqlPipeline, PipelineRun};
