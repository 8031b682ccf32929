//! C1: stable hashing of source URLs into artifact keys.

use sha1::{Digest, Sha1};

use crate::types::SourceHash;

/// Computes the stable 8-hex-character artifact key for a calendar source's
/// primary URL. Pure function: same input always yields the same output,
/// across runs and processes.
pub fn source_hash(url: &str) -> SourceHash {
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    let full = hex::encode(digest);
    SourceHash::parse(&full[..8]).expect("sha1 hex prefix is always valid hex of length 8")
}
