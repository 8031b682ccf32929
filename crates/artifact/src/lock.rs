//! C8's cross-process rebuild lock: an advisory file lock on a sentinel
//! path in the artifact directory, so many server workers (possibly in
//! different processes) never rebuild the merged schedule concurrently.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs4::sync::FileExt;

use crate::error::{ArtifactError, ArtifactResult};

/// An exclusive hold on the rebuild lock. Dropping it releases the lock.
pub struct RebuildLock {
    file: File,
}

impl RebuildLock {
    /// Blocks until the exclusive lock on `path` is acquired, creating the
    /// sentinel file if needed.
    pub fn acquire(path: &Path) -> ArtifactResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(ArtifactError::Lock)?;
        file.lock_exclusive().map_err(ArtifactError::Lock)?;
        Ok(Self { file })
    }
}

impl Drop for RebuildLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_is_released_on_drop_and_can_be_reacquired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.lock");
        {
            let _lock = RebuildLock::acquire(&path).unwrap();
        }
        let _second = RebuildLock::acquire(&path).unwrap();
    }

    #[test]
    fn creates_sentinel_file_and_parent_dir_if_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("schedule.lock");
        let _lock = RebuildLock::acquire(&path).unwrap();
        assert!(path.exists());
    }
}
