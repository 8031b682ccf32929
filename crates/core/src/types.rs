//! Type-safe wrappers for domain identifiers.
//!
//! These newtypes prevent mixing a raw source hash with an arbitrary string,
//! and a store row id with any other integer, at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Primary key of a `CalendarSource` row in the event store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub i64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SourceId {
    fn from(id: i64) -> Self {
        SourceId(id)
    }
}

impl From<SourceId> for i64 {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

/// Stable 8-hex-character digest of a calendar source's primary URL.
///
/// This is the key used for per-calendar artifact filenames
/// (`events_<hash>.json`) and for the calendar map. It is always lowercase
/// hex and exactly [`SOURCE_HASH_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceHash(String);

pub const SOURCE_HASH_LEN: usize = 8;

impl SourceHash {
    /// Wraps an already-computed hash string, validating its shape.
    ///
    /// Prefer [`crate::hash::source_hash`] to produce one from a URL; this
    /// constructor exists for round-tripping hashes read back from disk.
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.len() == SOURCE_HASH_LEN && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(SourceHash(s.to_ascii_lowercase()))
        } else {
            Err(CoreError::InvalidSourceHash(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SourceHash {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceHash::parse(s)
    }
}

impl AsRef<str> for SourceHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_hash_accepts_lowercase_hex_of_right_length() {
        assert!(SourceHash::parse("0a1b2c3d").is_ok());
    }

    #[test]
    fn source_hash_normalizes_case() {
        let h = SourceHash::parse("0A1B2C3D").unwrap();
        assert_eq!(h.as_str(), "0a1b2c3d");
    }

    #[test]
    fn source_hash_rejects_wrong_length() {
        assert!(SourceHash::parse("0a1b2c3").is_err());
        assert!(SourceHash::parse("0a1b2c3d4").is_err());
    }

    #[test]
    fn source_hash_rejects_non_hex() {
        assert!(SourceHash::parse("0a1b2c3z").is_err());
    }

    #[test]
    fn source_id_roundtrips_through_i64() {
        let id = SourceId::from(42i64);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }
}
