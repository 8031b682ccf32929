//! C8: fingerprint-checked, cross-process-locked rebuild of the merged
//! schedule. Every HTTP read goes through [`ScheduleCache::ensure_schedule`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use roomsched_artifact::ArtifactStore;
use roomsched_core::{CalendarMap, Fingerprint, MergedSchedule};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::MergeResult;
use crate::merger::merge;

/// How long an in-memory hit is trusted without rechecking the
/// fingerprint, to avoid a stat-walk on every single request.
const FRESHNESS: Duration = Duration::from_secs(60);

struct CachedEntry {
    schedule: Arc<MergedSchedule>,
    map: Arc<CalendarMap>,
    fingerprint: Fingerprint,
    loaded_at: Instant,
}

pub struct ScheduleCache {
    artifacts: ArtifactStore,
    store: SqlitePool,
    entry: RwLock<Option<CachedEntry>>,
}

impl ScheduleCache {
    pub fn new(artifacts: ArtifactStore, store: SqlitePool) -> Self {
        Self {
            artifacts,
            store,
            entry: RwLock::new(None),
        }
    }

    /// Returns the current merged schedule and calendar map, rebuilding
    /// from per-calendar artifacts only when the fingerprint has moved and
    /// no other worker has already rebuilt it.
    pub async fn ensure_schedule(&self) -> MergeResult<(Arc<MergedSchedule>, Arc<CalendarMap>)> {
        let fp = self.artifacts.fingerprint()?;

        if let Some(hit) = self.try_memory_hit(fp).await {
            return Ok(hit);
        }

        let artifacts = self.artifacts.clone();
        let _lock = tokio::task::spawn_blocking(move || artifacts.acquire_rebuild_lock())
            .await
            .expect("rebuild lock task panicked")?;

        // Re-check: another worker may have rebuilt while we waited for
        // the lock.
        let fp = self.artifacts.fingerprint()?;
        if let Some(hit) = self.try_memory_hit(fp).await {
            return Ok(hit);
        }

        let on_disk_fp = self.artifacts.read_schedule_fingerprint()?;
        let (schedule, map) = if on_disk_fp == Some(fp) {
            debug!("schedule cache: on-disk fingerprint matches, loading without rebuild");
            let schedule = self.artifacts.read_schedule()?.unwrap_or_default();
            let map = self.artifacts.read_calendar_map()?.unwrap_or_default();
            (schedule, map)
        } else {
            debug!("schedule cache: fingerprint stale, rebuilding via merger");
            let (schedule, map) = merge(&self.artifacts, &self.store, None).await?;
            self.artifacts.write_schedule(&schedule, &map, fp)?;
            (schedule, map)
        };

        let schedule = Arc::new(schedule);
        let map = Arc::new(map);
        *self.entry.write().await = Some(CachedEntry {
            schedule: schedule.clone(),
            map: map.clone(),
            fingerprint: fp,
            loaded_at: Instant::now(),
        });

        Ok((schedule, map))
    }

    async fn try_memory_hit(&self, fp: Fingerprint) -> Option<(Arc<MergedSchedule>, Arc<CalendarMap>)> {
        let guard = self.entry.read().await;
        let entry = guard.as_ref()?;
        if entry.fingerprint == fp && entry.loaded_at.elapsed() < FRESHNESS {
            Some((entry.schedule.clone(), entry.map.clone()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsched_store::connect;

    async fn test_cache() -> (tempfile::TempDir, ScheduleCache) {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ArtifactStore::new(dir.path().join("artifacts"));
        let store = connect(&dir.path().join("store.sqlite3")).await.unwrap();
        (dir, ScheduleCache::new(artifacts, store))
    }

    #[tokio::test]
    async fn ensure_schedule_on_empty_store_returns_empty_schedule() {
        let (_dir, cache) = test_cache().await;
        let (schedule, map) = cache.ensure_schedule().await.unwrap();
        assert!(schedule.flat.is_empty());
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn second_call_without_changes_hits_memory_not_disk() {
        let (_dir, cache) = test_cache().await;
        let (first, _) = cache.ensure_schedule().await.unwrap();
        let (second, _) = cache.ensure_schedule().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
