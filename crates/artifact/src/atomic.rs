//! Write-to-temp-then-rename: every artifact write in this crate goes
//! through here, so a partial/truncated file is never observable by a
//! concurrent reader.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ArtifactError, ArtifactResult};

/// Serializes `value` as pretty JSON into a temp file in `path`'s parent
/// directory, then renames it over `path`. The rename is atomic on the same
/// filesystem, so readers always see either the old content or the new
/// content, never a mix.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> ArtifactResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|source| ArtifactError::Io {
        path: parent.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(&mut tmp, value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.persist(path).map_err(|e| ArtifactError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    debug!(path = %path.display(), "wrote artifact atomically");
    Ok(())
}

/// Reads and deserializes a JSON artifact. Returns `Ok(None)` when the file
/// does not exist yet (a source never fetched, or the merged schedule
/// before the first merge), distinguishing "absent" from "empty".
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> ArtifactResult<Option<T>> {
    match fs::read(path) {
        Ok(bytes) => {
            let value = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes a plain-text marker file atomically (used for `import_complete.txt`).
pub fn write_marker_atomic(path: &Path, contents: &str) -> ArtifactResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
        path: parent.to_path_buf(),
        source,
    })?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(|source| ArtifactError::Io {
        path: parent.to_path_buf(),
        source,
    })?;
    use std::io::Write;
    tmp.write_all(contents.as_bytes())
        .map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    tmp.persist(path).map_err(|e| ArtifactError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        n: u32,
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        write_json_atomic(&path, &Sample { n: 7 }).unwrap();
        let read: Option<Sample> = read_json(&path).unwrap();
        assert_eq!(read, Some(Sample { n: 7 }));
    }

    #[test]
    fn read_missing_file_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let read: Option<Sample> = read_json(&path).unwrap();
        assert_eq!(read, None);
    }

    #[test]
    fn rewrite_never_leaves_partial_content_visible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        write_json_atomic(&path, &Sample { n: 1 }).unwrap();
        write_json_atomic(&path, &Sample { n: 2 }).unwrap();
        let read: Option<Sample> = read_json(&path).unwrap();
        assert_eq!(read, Some(Sample { n: 2 }));
    }
}
