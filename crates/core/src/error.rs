use thiserror::Error;

pub type CuboResult<T> = Result<T, CuboError>;

#[derive(Error, Debug)]
pub enum CuboError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Row fetch error: {0}")]
    Fetch(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
