//! Errors raised by the extraction pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IcsError {
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("non-success status {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("failed to parse ICS body from {url}: {reason}")]
    Parse { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to launch headless browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("render watchdog expired after {secs}s for {url}")]
    Watchdog { url: String, secs: u64 },

    #[error("no recognizable calendar payload intercepted for {url}")]
    NoPayload { url: String },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Artifact(#[from] roomsched_artifact::ArtifactError),

    #[error(transparent)]
    Store(#[from] roomsched_store::StoreError),

    #[error(transparent)]
    Merge(#[from] roomsched_merge::MergeError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("extraction already running")]
    AlreadyRunning,
}

pub type ExtractResult<T> = Result<T, ExtractError>;
