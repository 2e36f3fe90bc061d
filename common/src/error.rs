use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("LLM parsing error: {0}")]
    LLMParsing(String),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Processing error: {0}")]
    Processing(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Status code carried in the `{status, message, data}` envelope for this error.
    pub fn envelope_status(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Database(_) | AppError::Join(_) | AppError::InternalError(_) => 500,
            _ => 400,
        }
    }
}
