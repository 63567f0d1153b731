use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepopulseError>;

#[derive(Error, Debug)]
pub enum RepopulseError {
    #[error("Snapshot error: {0}")]
    Snapshot(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Other: {0}")]
    Other(String),
}
