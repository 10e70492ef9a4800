use thiserror::Error;

#[derive(Debug, Error)]
pub enum OversightError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("date error: {0}")]
    Date(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type OversightResult<T> = Result<T, OversightError>;
