//! Error types for the pipeline's pure domain logic (hashing, parsing, config).

use thiserror::Error;

/// Errors raised by code in `roomsched-core` itself.
///
/// Downstream crates (`roomsched-artifact`, `roomsched-store`,
/// `roomsched-extract`, `roomsched-merge`) define their own error enums for
/// their own I/O and wrap `CoreError` into them where relevant.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("not a valid source hash: {0:?}")]
    InvalidSourceHash(String),
}

/// Result alias for fallible `roomsched-core` operations.
pub type CoreResult<T> = Result<T, CoreError>;
