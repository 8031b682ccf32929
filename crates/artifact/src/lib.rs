//! roomsched-artifact: the per-calendar artifact filesystem: atomic JSON
//! writes, stat-only fingerprinting, and the cross-process rebuild lock
//! that C8 (the schedule cache) holds while recomputing the merged
//! schedule.

pub mod atomic;
pub mod error;
pub mod fingerprint;
pub mod lock;
pub mod paths;
pub mod store;

pub use error::{ArtifactError, ArtifactResult};
pub use lock::RebuildLock;
pub use paths::ArtifactPaths;
pub use store::ArtifactStore;
