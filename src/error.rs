use thiserror::Error;

/// Reasons the SQL validator refuses a candidate query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Only SELECT statements are allowed")]
    NotASelect,

    #[error("Forbidden keyword in query: {0}")]
    ForbiddenKeyword(&'static str),

    #[error("Multiple SQL statements are not allowed")]
    MultiStatement,
}

#[derive(Error, Debug)]
pub enum Nl2SqlError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Nl2SqlError {
    /// Stable short name for reporting which step failed.
    pub fn kind(&self) -> &'static str {
        match self {
            Nl2SqlError::StoreUnavailable(_) => "store_unavailable",
            Nl2SqlError::GenerationFailed(_) => "generation_failed",
            Nl2SqlError::Validation(ValidationError::NotASelect) => "not_a_select",
            Nl2SqlError::Validation(ValidationError::ForbiddenKeyword(_)) => "forbidden_keyword",
            Nl2SqlError::Validation(ValidationError::MultiStatement) => "multi_statement",
            Nl2SqlError::Execution(_) => "execution_error",
            Nl2SqlError::Config(_) => "config",
            Nl2SqlError::Io(_) => "io",
        }
    }

    pub(crate) fn execution<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Nl2SqlError::Execution(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Nl2SqlError>;
