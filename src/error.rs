use std::path::PathBuf;

use flux_core::SimError;
use flux_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    #[error("invalid run settings: {0}")]
    InvalidRun(String),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, AppError>;
