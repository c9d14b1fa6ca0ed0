use nl2sql::config::Config;
use nl2sql::llm::LlmClient;
use nl2sql::pipeline::{Nl2SqlPipeline, PipelineRun};
use nl2sql::prompt::schema_text;
use nl2sql::schema::describe_schema;
use nl2sql::store::SqliteStore;
use nl2sql::validator::{validate_sql, CandidateQuery};
use nl2sql::sample_db;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nl2sql")]
#[command(about = "Answer natural-language questions over a SQLite database, one visible step at a time")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question using the database
    Ask {
        /// The question in natural language
        question: String,

        /// Path to the SQLite database (or set NL2SQL_DB_PATH)
        #[arg(short, long)]
        db: Option<PathBuf>,

        /// OpenAI API key (or set OPENAI_API_KEY env var)
        #[arg(long)]
        api_key: Option<String>,

        /// Model name (or set OPENAI_MODEL env var)
        #[arg(long)]
        model: Option<String>,

        /// Print every intermediate step
        #[arg(long)]
        steps: bool,

        /// Print the whole run as JSON
        #[arg(long, conflicts_with = "steps")]
        json: bool,
    },
    /// Print the schema text used to ground the model
    Schema {
        /// Path to the SQLite database (or set NL2SQL_DB_PATH)
        #[arg(short, long)]
        db: Option<PathBuf>,
    },
    /// Check a SQL string against the safety policy without running it
    Validate {
        /// SQL text to check
        sql: String,
    },
    /// Create the sample e-commerce database
    InitDb {
        /// Where to write the database (or set NL2SQL_DB_PATH)
        #[arg(short, long)]
        db: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let outcome = match args.command {
        Commands::Ask { question, db, api_key, model, steps, json } => {
            ask(config, question, db, api_key, model, steps, json).await
        }
        Commands::Schema { db } => print_schema(db.unwrap_or(config.db_path)),
        Commands::Validate { sql } => validate(sql),
        Commands::InitDb { db, force } => {
            sample_db::create_sample_database(db.unwrap_or(config.db_path), force).map(|path| {
                println!("SQLite database created at: {}", path.display());
            })
        }
    };

    if let Err(e) = outcome {
        anyhow::bail!("[{}] {}", e.kind(), e);
    }
    Ok(())
}

async fn ask(
    mut config: Config,
    question: String,
    db: Option<PathBuf>,
    api_key: Option<String>,
    model: Option<String>,
    steps: bool,
    json: bool,
) -> nl2sql::Result<()> {
    if let Some(key) = api_key {
        config.llm.api_key = Some(key);
    }
    if let Some(model) = model {
        config.llm.model = model;
    }
    let db_path = db.unwrap_or(config.db_path);

    let llm = LlmClient::from_config(&config.llm)?;
    let pipeline = Nl2SqlPipeline::new(Arc::new(llm), config.pipeline);
    let run = pipeline.run_on_database(&question, &db_path).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&run).map_err(std::io::Error::from)?;
        println!("{}", rendered);
    } else if steps {
        print_steps(&run);
    } else {
        println!("{}", run.answer);
    }
    Ok(())
}

fn print_steps(run: &PipelineRun) {
    println!("=== NL2SQL ===");
    println!("\nUser Question:\n{}", run.question);
    println!("\nExtracted Schema:\n{}", schema_text(&run.schema));
    println!("\nPrompt sent to LLM:\n{}", run.prompt);
    println!("\nGenerated SQL:\n{}", run.candidate);
    println!("\nSQL validation passed.");
    println!("\nRaw SQL Result:\n{}", run.result);
    println!("\nFinal Answer:\n{}", run.answer);
}

fn print_schema(db_path: PathBuf) -> nl2sql::Result<()> {
    let store = SqliteStore::open(&db_path)?;
    let schema = describe_schema(&store)?;
    println!("{}", schema_text(&schema));
    store.close()
}

fn validate(sql: String) -> nl2sql::Result<()> {
    let validated = validate_sql(CandidateQuery::new(sql))?;
    println!("SQL validation passed: {}", validated);
    Ok(())
}
