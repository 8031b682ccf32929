//! Errors raised while merging per-calendar artifacts or serving the
//! schedule cache.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error(transparent)]
    Artifact(#[from] roomsched_artifact::ArtifactError),

    #[error(transparent)]
    Store(#[from] roomsched_store::StoreError),
}

pub type MergeResult<T> = Result<T, MergeError>;
