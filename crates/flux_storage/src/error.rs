use flux_core::SimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("bincode encoding failed: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
