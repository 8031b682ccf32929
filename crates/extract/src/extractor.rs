//! C5: per-calendar extraction: C3 with C4 fallback, C2 normalization,
//! dedup, window filter, atomic artifact write.

use chrono::{Duration, Utc};
use reqwest::Client;
use roomsched_core::{parse_location, parse_title, CalendarSource, RawEvent};
use roomsched_artifact::ArtifactStore;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::ics::{fetch_ics, IcsOutcome, RawIcsEvent};
use crate::render::RenderPool;

/// ±60 days: events outside this window relative to "now" are dropped
/// before the artifact is written.
const WINDOW_DAYS: i64 = 60;

/// Outcome of extracting a single calendar, used by C6 to tally
/// `ImportProgress`.
pub enum ExtractionOutcome {
    /// An artifact was written (possibly empty); `via_render` distinguishes
    /// an ICS success from a fallback success, purely for logging.
    Written { via_render: bool, event_count: usize },
    /// Both ICS and the render fallback failed; no artifact was written
    /// for this source this run, the previous one (if any) is retained.
    Failed(String),
}

pub async fn extract_one(
    http: &Client,
    render_pool: Option<&RenderPool>,
    artifacts: &ArtifactStore,
    store: &SqlitePool,
    source: &CalendarSource,
) -> ExtractionOutcome {
    let hash = source.hash();

    let ics_result = match &source.ics_url {
        Some(url) => Some(fetch_ics(http, url).await),
        None => None,
    };

    let (raw_events, via_render) = match ics_result {
        Some(Ok(IcsOutcome::Parsed(events))) => (events, false),
        Some(Ok(IcsOutcome::EmptyFeed)) => (Vec::new(), false),
        Some(Err(ics_err)) => match fall_back_to_render(render_pool, &source.primary_url).await {
            Ok(events) => (events, true),
            Err(render_err) => {
                return ExtractionOutcome::Failed(format!(
                    "ics error: {ics_err}; render error: {render_err}"
                ))
            }
        },
        None => match fall_back_to_render(render_pool, &source.primary_url).await {
            Ok(events) => (events, true),
            Err(render_err) => {
                return ExtractionOutcome::Failed(format!(
                    "no ics_url configured; render error: {render_err}"
                ))
            }
        },
    };

    let normalized = normalize_and_filter(&hash, source, raw_events);

    if let Err(e) = artifacts.write_calendar_artifact(&hash, &normalized) {
        return ExtractionOutcome::Failed(format!("artifact write failed: {e}"));
    }

    let now = Utc::now();
    if let Err(e) = roomsched_store::sources::mark_fetched(store, source.id.0, now).await {
        warn!(source = %hash, error = %e, "failed to record last_fetched_at");
    }

    info!(source = %hash, via_render, count = normalized.len(), "extracted calendar");
    ExtractionOutcome::Written {
        via_render,
        event_count: normalized.len(),
    }
}

async fn fall_back_to_render(
    render_pool: Option<&RenderPool>,
    url: &str,
) -> Result<Vec<RawIcsEvent>, String> {
    match render_pool {
        Some(pool) => pool.render(url).await.map_err(|e| e.to_string()),
        None => Err("render pool disabled".to_string()),
    }
}

pub(crate) fn normalize_and_filter(
    hash: &roomsched_core::SourceHash,
    source: &CalendarSource,
    raw_events: Vec<RawIcsEvent>,
) -> Vec<RawEvent> {
    let now = Utc::now();
    let window_start = now - Duration::days(WINDOW_DAYS);
    let window_end = now + Duration::days(WINDOW_DAYS);

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for raw in raw_events {
        if raw.start < window_start || raw.start > window_end {
            continue;
        }

        let title = parse_title(&raw.summary);
        let location = parse_location(&raw.location);

        let event = RawEvent {
            source_hash: hash.clone(),
            start: raw.start,
            end: raw.end,
            title: raw.summary,
            display_title: title.display_title,
            subject: title.subject,
            professor: title.professor,
            room: location.room,
            building: location.building,
            group_display: title.group_display,
            location: raw.location,
            color: source.color.clone(),
            calendar_name: source.display_name.clone(),
        };

        let key = (event.start, event.end, event.title.clone());
        if seen.insert(key) {
            out.push(event);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use roomsched_core::SourceId;

    fn source() -> CalendarSource {
        CalendarSource {
            id: SourceId(1),
            primary_url: "https://cal.example.edu/101".to_string(),
            ics_url: None,
            display_name: "Room 101".to_string(),
            color: "#ff0000".to_string(),
            enabled: true,
            building: None,
            room: None,
            email_address: None,
            created_at: Utc::now(),
            last_fetched_at: None,
        }
    }

    #[test]
    fn drops_events_outside_the_rolling_window() {
        let hash = roomsched_core::source_hash("https://cal.example.edu/101");
        let far_future = Utc.with_ymd_and_hms(2099, 1, 1, 9, 0, 0).unwrap();
        let raw = vec![RawIcsEvent {
            summary: "Far".to_string(),
            location: String::new(),
            start: far_future,
            end: far_future + Duration::hours(1),
        }];
        let out = normalize_and_filter(&hash, &source(), raw);
        assert!(out.is_empty());
    }

    #[test]
    fn dedups_events_with_identical_start_end_title() {
        let hash = roomsched_core::source_hash("https://cal.example.edu/101");
        let now = Utc::now();
        let raw = vec![
            RawIcsEvent {
                summary: "Algebra".to_string(),
                location: String::new(),
                start: now,
                end: now + Duration::hours(1),
            },
            RawIcsEvent {
                summary: "Algebra".to_string(),
                location: String::new(),
                start: now,
                end: now + Duration::hours(1),
            },
        ];
        let out = normalize_and_filter(&hash, &source(), raw);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn normalizes_title_and_location_through_c2() {
        let hash = roomsched_core::source_hash("https://cal.example.edu/101");
        let now = Utc::now();
        let raw = vec![RawIcsEvent {
            summary: "Algebra - Prof. Ion Popescu".to_string(),
            location: "Sala 204, Corp A".to_string(),
            start: now,
            end: now + Duration::hours(1),
        }];
        let out = normalize_and_filter(&hash, &source(), raw);
        assert_eq!(out[0].professor, "Ion Popescu");
        assert_eq!(out[0].room, "204");
        assert_eq!(out[0].building, "A");
    }
}
