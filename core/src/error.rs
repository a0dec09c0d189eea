use thiserror::Error;

pub type InsightResult<T> = Result<T, InsightError>;

/// Errors surfaced by the engine.
///
/// The first four variants are the request-level taxonomy a caller maps to
/// a response; `Io` and `Storage` are durable-storage failures.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Result too large: {rows} rows exceeds the limit of {limit}")]
    ResultTooLarge { rows: usize, limit: usize },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl InsightError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        InsightError::InvalidRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        InsightError::NotFound(msg.into())
    }

    /// Get a short error kind name
    pub fn kind(&self) -> &'static str {
        match self {
            InsightError::InvalidRequest(_) => "invalid_request",
            InsightError::NotFound(_) => "not_found",
            InsightError::ResultTooLarge { .. } => "result_too_large",
            InsightError::Conflict(_) => "conflict",
            InsightError::Io(_) => "io_error",
            InsightError::Storage(_) => "storage_error",
            InsightError::Config(_) => "config_error",
        }
    }
}
