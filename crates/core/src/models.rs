//! Core domain models shared by every downstream crate.
//!
//! `roomsched-core` owns only the shapes; persistence (`roomsched-store`)
//! and filesystem materialization (`roomsched-artifact`) live in their own
//! crates so this one stays pure logic, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SourceHash, SourceId};

/// A configured room calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarSource {
    pub id: SourceId,
    /// The HTML calendar URL. Acts as identity: unique, and `hash(primary_url)`
    /// names this source's artifact file.
    pub primary_url: String,
    /// ICS feed URL, when published. `None` is treated identically to a C3
    /// failure: extraction falls straight through to the headless renderer.
    pub ics_url: Option<String>,
    pub display_name: String,
    pub color: String,
    pub enabled: bool,
    pub building: Option<String>,
    pub room: Option<String>,
    pub email_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl CalendarSource {
    pub fn hash(&self) -> SourceHash {
        crate::hash::source_hash(&self.primary_url)
    }
}

/// A manually entered one-off event. Never written to a per-calendar
/// artifact, not subject to the extractor's rolling window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualEvent {
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub location: Option<String>,
    pub raw: Option<String>,
}

/// One event as produced by the extractor, after C2 normalization, before
/// merge. This is the element type of a [`PerCalendarArtifact`] and of the
/// flat list inside a [`MergedSchedule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "source")]
    pub source_hash: SourceHash,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Raw, un-normalized title as it appeared in the source feed.
    pub title: String,
    pub display_title: String,
    pub subject: String,
    pub professor: String,
    pub room: String,
    pub building: String,
    pub group_display: String,
    /// Raw, un-normalized location as it appeared in the source feed.
    pub location: String,
    pub color: String,
    pub calendar_name: String,
}

impl RawEvent {
    /// Identity used for intra-source deduplication in C5 and ordering
    /// tie-breaks in C7: two events from the same source with the same
    /// `(start, end, title)` are the same event.
    pub fn dedup_key(&self) -> (DateTime<Utc>, DateTime<Utc>, &str) {
        (self.start, self.end, self.title.as_str())
    }
}

/// The per-calendar artifact: every event extracted for one source in its
/// most recent successful run. An empty vec is a legal, terminal result:
/// "we checked, no bookings", distinct from the artifact being absent.
pub type PerCalendarArtifact = Vec<RawEvent>;

/// Metadata needed to resolve an event's `source_hash` back to a calendar
/// without touching the event store, written alongside the merged schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarMapEntry {
    pub primary_url: String,
    pub display_name: String,
    pub color: String,
    pub building: Option<String>,
    pub room: Option<String>,
}

/// `source_hash -> metadata`, written atomically by C7 alongside the merged
/// schedule.
pub type CalendarMap = std::collections::HashMap<String, CalendarMapEntry>;

/// Canonical room key used to bucket events that could not be resolved to
/// a specific room.
pub const UNASSIGNED_ROOM: &str = "__unassigned__";

/// The room-indexed schedule produced by C7 and served by every read
/// endpoint via the cache in C8.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergedSchedule {
    /// Canonical room key -> events for that room, sorted by `start` asc.
    pub by_room: std::collections::BTreeMap<String, Vec<RawEvent>>,
    /// All events across all rooms, sorted by `start` asc, tie-broken by
    /// `source_hash` then `title`.
    pub flat: Vec<RawEvent>,
}

/// Content fingerprint of the artifact directory: `(max mtime, count of
/// non-empty artifacts)`. Cheap to compute (stat-only), used by C8 to decide
/// whether the merged schedule needs rebuilding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    pub max_mtime_unix_nanos: i128,
    pub non_empty_count: u64,
}

/// Phase of an in-progress (or just-finished) extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPhase {
    Idle,
    Ics,
    Render,
    Merge,
}

impl Default for ExtractionPhase {
    fn default() -> Self {
        ExtractionPhase::Idle
    }
}

/// Mutable progress document for the currently running (or most recently
/// finished) extraction run. Single-writer: only C6 mutates this.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportProgress {
    pub total: usize,
    pub queued: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub files_written: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub finished: bool,
    pub current_phase: ExtractionPhase,
    /// `source_hash -> error message` for sources that failed this run.
    pub errors: std::collections::BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_progress_default_is_idle_and_unfinished() {
        let p = ImportProgress::default();
        assert_eq!(p.current_phase, ExtractionPhase::Idle);
        assert!(!p.finished);
        assert_eq!(p.total, 0);
    }

    #[test]
    fn raw_event_dedup_key_distinguishes_by_title() {
        let base = RawEvent {
            source_hash: SourceHash::parse("deadbeef").unwrap(),
            start: Utc::now(),
            end: Utc::now(),
            title: "Algebra".into(),
            display_title: "Algebra".into(),
            subject: "Algebra".into(),
            professor: String::new(),
            room: String::new(),
            building: String::new(),
            group_display: String::new(),
            location: String::new(),
            color: "#ffffff".into(),
            calendar_name: "Room 101".into(),
        };
        let mut other = base.clone();
        other.title = "Geometry".into();
        assert_ne!(base.dedup_key(), other.dedup_key());
    }
}
