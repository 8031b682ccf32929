//! Filenames within the artifact directory. See `SPEC_FULL.md` §6 for the
//! full layout.

use std::path::{Path, PathBuf};

use roomsched_core::SourceHash;

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    root: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn per_calendar(&self, hash: &SourceHash) -> PathBuf {
        self.root.join(format!("events_{}.json", hash.as_str()))
    }

    pub fn schedule_by_room(&self) -> PathBuf {
        self.root.join("schedule_by_room.json")
    }

    pub fn calendar_map(&self) -> PathBuf {
        self.root.join("calendar_map.json")
    }

    pub fn import_progress(&self) -> PathBuf {
        self.root.join("import_progress.json")
    }

    pub fn import_complete(&self) -> PathBuf {
        self.root.join("import_complete.txt")
    }

    pub fn schedule_fingerprint(&self) -> PathBuf {
        self.root.join("schedule.fp")
    }

    pub fn cache_lock(&self) -> PathBuf {
        self.root.join("schedule.lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_calendar_path_is_named_by_hash() {
        let paths = ArtifactPaths::new("/tmp/artifacts");
        let hash = SourceHash::parse("0a1b2c3d").unwrap();
        assert_eq!(
            paths.per_calendar(&hash),
            PathBuf::from("/tmp/artifacts/events_0a1b2c3d.json")
        );
    }
}
