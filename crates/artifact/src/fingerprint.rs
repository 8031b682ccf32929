//! C1 (directory half): a stat-only pass over the artifact directory that
//! produces a cheap content fingerprint, used by C8 to decide whether the
//! merged schedule needs rebuilding.

use std::path::Path;

use roomsched_core::Fingerprint;
use tracing::trace;

use crate::error::{ArtifactError, ArtifactResult};

/// Empty-sequence artifacts serialize to exactly `[]` via
/// `serde_json::to_writer_pretty`; anything longer carries at least one
/// event.
const EMPTY_ARRAY_LEN: u64 = 2;

/// Computes `(max mtime, count of non-empty per-calendar artifacts)` across
/// every `events_*.json` file in `dir`. Does not read file contents.
pub fn fingerprint(dir: &Path) -> ArtifactResult<Fingerprint> {
    let mut max_mtime_unix_nanos: i128 = 0;
    let mut non_empty_count: u64 = 0;

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Fingerprint {
                max_mtime_unix_nanos: 0,
                non_empty_count: 0,
            })
        }
        Err(source) => {
            return Err(ArtifactError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    for entry in entries {
        let entry = entry.map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with("events_") && name.ends_with(".json")) {
            continue;
        }

        let meta = entry.metadata().map_err(|source| ArtifactError::Io {
            path: entry.path(),
            source,
        })?;

        if let Ok(modified) = meta.modified() {
            if let Ok(dur) = modified.duration_since(std::time::UNIX_EPOCH) {
                max_mtime_unix_nanos = max_mtime_unix_nanos.max(dur.as_nanos() as i128);
            }
        }
        if meta.len() > EMPTY_ARRAY_LEN {
            non_empty_count += 1;
        }
    }

    trace!(?dir, max_mtime_unix_nanos, non_empty_count, "computed artifact fingerprint");
    Ok(Fingerprint {
        max_mtime_unix_nanos,
        non_empty_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn empty_directory_has_zero_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let fp = fingerprint(dir.path()).unwrap();
        assert_eq!(fp.non_empty_count, 0);
    }

    #[test]
    fn missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let fp = fingerprint(&missing).unwrap();
        assert_eq!(fp.non_empty_count, 0);
        assert_eq!(fp.max_mtime_unix_nanos, 0);
    }

    #[test]
    fn counts_only_non_empty_per_calendar_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("events_aaaaaaaa.json"), "[]").unwrap();
        fs::write(
            dir.path().join("events_bbbbbbbb.json"),
            r#"[{"not":"really validated here"}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("schedule_by_room.json"), "not counted").unwrap();
        let fp = fingerprint(dir.path()).unwrap();
        assert_eq!(fp.non_empty_count, 1);
    }

    #[test]
    fn rewriting_a_file_advances_the_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events_aaaaaaaa.json");
        fs::write(&path, "[]").unwrap();
        let first = fingerprint(dir.path()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::write(&path, r#"[{"x":1}]"#).unwrap();
        let second = fingerprint(dir.path()).unwrap();
        assert!(second > first);
    }
}
