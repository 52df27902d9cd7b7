//! Error types for storage and configuration.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Nothing to back up at {}", .0.display())]
    NothingToBackUp(PathBuf),
}

pub type Result<T> = std::result::Result<T, StoreError>;
