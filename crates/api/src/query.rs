//! C11: combines the merged schedule with manual events, applies
//! case-insensitive substring filters, and returns one sorted list.

use chrono::{DateTime, Utc};
use roomsched_core::RawEvent;
use roomsched_merge::ScheduleCache;
use sqlx::SqlitePool;

use crate::error::ApiResult;

/// All-substring, case-insensitive filters against a [`RawEvent`]'s parsed
/// fields. An empty/`None` filter always matches.
#[derive(Debug, Default, Clone)]
pub struct QueryFilters {
    pub subject: Option<String>,
    pub professor: Option<String>,
    pub room: Option<String>,
    pub building: Option<String>,
    pub group: Option<String>,
}

impl QueryFilters {
    fn matches(&self, event: &RawEvent) -> bool {
        contains_ci(&self.subject, &event.subject)
            && contains_ci(&self.professor, &event.professor)
            && contains_ci(&self.room, &event.room)
            && contains_ci(&self.building, &event.building)
            && contains_ci(&self.group, &event.group_display)
    }
}

fn contains_ci(needle: &Option<String>, haystack: &str) -> bool {
    match needle {
        None => true,
        Some(n) if n.is_empty() => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

/// Source hash used to tag manual (non-calendar) events in query output;
/// derived from a fixed literal the same way any other calendar source is.
fn manual_source_hash() -> roomsched_core::SourceHash {
    roomsched_core::source_hash("manual-events")
}

fn manual_event_to_raw(event: roomsched_core::ManualEvent) -> RawEvent {
    let title = event.title;
    let location = event.location.unwrap_or_default();
    RawEvent {
        source_hash: manual_source_hash(),
        start: event.start,
        end: event.end,
        title: title.clone(),
        display_title: title.clone(),
        subject: title,
        professor: String::new(),
        room: String::new(),
        building: String::new(),
        group_display: String::new(),
        location,
        color: "#6b7280".to_string(),
        calendar_name: "Manual".to_string(),
    }
}

/// Runs a bounded-window query over the merged schedule plus manual events,
/// applying `filters` and returning results sorted by `start` ascending,
/// tie-broken by `source_hash`.
pub async fn query_events(
    cache: &ScheduleCache,
    store: &SqlitePool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    filters: &QueryFilters,
) -> ApiResult<Vec<RawEvent>> {
    let (schedule, _map) = cache.ensure_schedule().await?;

    let manual = roomsched_store::manual_events::list_manual_events(store, from, to).await?;

    let mut out: Vec<RawEvent> = schedule
        .flat
        .iter()
        .filter(|e| e.end >= from && e.start <= to)
        .cloned()
        .chain(manual.into_iter().map(manual_event_to_raw))
        .filter(|e| filters.matches(e))
        .collect();

    out.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.source_hash.cmp(&b.source_hash)));
    Ok(out)
}
