//! Errors raised while reading or writing the artifact filesystem layout.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("io error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize artifact {path}: {source}")]
    Json {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to acquire cache rebuild lock: {0}")]
    Lock(std::io::Error),

    #[error(transparent)]
    InvalidHash(#[from] roomsched_core::CoreError),
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;
