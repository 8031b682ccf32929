//! High-level artifact filesystem API used by the extractor, merger and
//! query layer. Wraps the atomic-write primitives with the concrete paths
//! and types each artifact kind needs.

use chrono::{DateTime, Utc};

use roomsched_core::{CalendarMap, Fingerprint, ImportProgress, MergedSchedule, PerCalendarArtifact, SourceHash};

use crate::atomic::{read_json, write_json_atomic, write_marker_atomic};
use crate::error::ArtifactResult;
use crate::fingerprint::fingerprint;
use crate::lock::RebuildLock;
use crate::paths::ArtifactPaths;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    paths: ArtifactPaths,
}

impl ArtifactStore {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            paths: ArtifactPaths::new(root),
        }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// C5: atomic write of one source's events. An empty `events` vec is a
    /// legal artifact, not a no-op.
    pub fn write_calendar_artifact(
        &self,
        hash: &SourceHash,
        events: &PerCalendarArtifact,
    ) -> ArtifactResult<()> {
        write_json_atomic(&self.paths.per_calendar(hash), events)
    }

    pub fn read_calendar_artifact(
        &self,
        hash: &SourceHash,
    ) -> ArtifactResult<Option<PerCalendarArtifact>> {
        read_json(&self.paths.per_calendar(hash))
    }

    /// C7: writes the calendar map, then the merged schedule, then the
    /// fingerprint marker last. A reader that sees the fingerprint match
    /// is guaranteed the schedule and map it reads back are this triple,
    /// not a half-written predecessor.
    pub fn write_schedule(
        &self,
        schedule: &MergedSchedule,
        map: &CalendarMap,
        fp: Fingerprint,
    ) -> ArtifactResult<()> {
        write_json_atomic(&self.paths.calendar_map(), map)?;
        write_json_atomic(&self.paths.schedule_by_room(), schedule)?;
        write_json_atomic(&self.paths.schedule_fingerprint(), &fp)
    }

    pub fn read_schedule(&self) -> ArtifactResult<Option<MergedSchedule>> {
        read_json(&self.paths.schedule_by_room())
    }

    pub fn read_calendar_map(&self) -> ArtifactResult<Option<CalendarMap>> {
        read_json(&self.paths.calendar_map())
    }

    pub fn read_schedule_fingerprint(&self) -> ArtifactResult<Option<Fingerprint>> {
        read_json(&self.paths.schedule_fingerprint())
    }

    /// C6: current (or most recent) run's progress document.
    pub fn write_progress(&self, progress: &ImportProgress) -> ArtifactResult<()> {
        write_json_atomic(&self.paths.import_progress(), progress)
    }

    pub fn read_progress(&self) -> ArtifactResult<Option<ImportProgress>> {
        read_json(&self.paths.import_progress())
    }

    pub fn write_import_complete(&self, at: DateTime<Utc>) -> ArtifactResult<()> {
        write_marker_atomic(&self.paths.import_complete(), &at.to_rfc3339())
    }

    /// C1: stat-only fingerprint of the artifact directory's per-calendar
    /// files.
    pub fn fingerprint(&self) -> ArtifactResult<Fingerprint> {
        fingerprint(self.paths.root())
    }

    /// C8: cross-process exclusive lock guarding a schedule rebuild.
    pub fn acquire_rebuild_lock(&self) -> ArtifactResult<RebuildLock> {
        RebuildLock::acquire(&self.paths.cache_lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsched_core::source_hash;

    #[test]
    fn calendar_artifact_absent_then_present_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let hash = source_hash("https://cal.example.edu/room/1");

        assert_eq!(store.read_calendar_artifact(&hash).unwrap(), None);

        store.write_calendar_artifact(&hash, &vec![]).unwrap();
        assert_eq!(store.read_calendar_artifact(&hash).unwrap(), Some(vec![]));
    }

    #[test]
    fn schedule_write_is_readable_with_matching_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let schedule = MergedSchedule::default();
        let map = CalendarMap::default();
        let fp = Fingerprint {
            max_mtime_unix_nanos: 1,
            non_empty_count: 0,
        };
        store.write_schedule(&schedule, &map, fp).unwrap();
        assert_eq!(store.read_schedule_fingerprint().unwrap(), Some(fp));
        assert!(store.read_schedule().unwrap().is_some());
        assert!(store.read_calendar_map().unwrap().is_some());
    }
}
