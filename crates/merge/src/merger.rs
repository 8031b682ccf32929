//! C7: collapses every per-calendar artifact into one room-indexed
//! schedule, keyed by the source catalog for names/colors and excluding
//! disabled sources.

use std::collections::BTreeMap;

use roomsched_artifact::ArtifactStore;
use roomsched_core::{
    CalendarMap, CalendarMapEntry, CalendarSource, MergedSchedule, RawEvent, UNASSIGNED_ROOM,
};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::MergeResult;

/// Canonical room key for an event: `"<building>/<room>"` when both are
/// known, the bare room/building when only one is, and the unassigned
/// bucket when neither parsed out.
fn room_key(building: &str, room: &str) -> String {
    match (building.trim(), room.trim()) {
        ("", "") => UNASSIGNED_ROOM.to_string(),
        (b, "") => b.to_string(),
        ("", r) => r.to_string(),
        (b, r) => format!("{b}/{r}"),
    }
}

/// Builds the merged schedule and calendar map from every enabled source's
/// artifact. Does not write anything to disk; see
/// [`crate::cache::ScheduleCache`] for the atomic write + fingerprint
/// bookkeeping around a call to this function.
pub async fn merge(
    artifacts: &ArtifactStore,
    store: &SqlitePool,
    enabled_sources: Option<Vec<CalendarSource>>,
) -> MergeResult<(MergedSchedule, CalendarMap)> {
    let sources = match enabled_sources {
        Some(s) => s,
        None => roomsched_store::sources::list_sources(store, true).await?,
    };

    let mut by_room: BTreeMap<String, Vec<RawEvent>> = BTreeMap::new();
    let mut flat: Vec<RawEvent> = Vec::new();
    let mut map: CalendarMap = CalendarMap::new();

    for source in &sources {
        let hash = source.hash();
        map.insert(
            hash.to_string(),
            CalendarMapEntry {
                primary_url: source.primary_url.clone(),
                display_name: source.display_name.clone(),
                color: source.color.clone(),
                building: source.building.clone(),
                room: source.room.clone(),
            },
        );

        let events = match artifacts.read_calendar_artifact(&hash)? {
            Some(events) => events,
            None => {
                warn!(source = %hash, "no artifact yet for enabled source, skipping in this merge");
                continue;
            }
        };

        for event in events {
            let key = room_key(&event.building, &event.room);
            by_room.entry(key).or_default().push(event.clone());
            flat.push(event);
        }
    }

    for events in by_room.values_mut() {
        sort_events(events);
    }
    sort_events(&mut flat);

    info!(
        rooms = by_room.len(),
        events = flat.len(),
        sources = sources.len(),
        "merged schedule"
    );

    Ok((MergedSchedule { by_room, flat }, map))
}

fn sort_events(events: &mut [RawEvent]) {
    events.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.source_hash.cmp(&b.source_hash))
            .then_with(|| a.title.cmp(&b.title))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_key_falls_back_to_unassigned_when_both_empty() {
        assert_eq!(room_key("", ""), UNASSIGNED_ROOM);
    }

    #[test]
    fn room_key_combines_building_and_room() {
        assert_eq!(room_key("A", "101"), "A/101");
    }

    #[test]
    fn room_key_uses_whichever_half_is_known() {
        assert_eq!(room_key("A", ""), "A");
        assert_eq!(room_key("", "101"), "101");
    }

    #[test]
    fn sort_events_orders_by_start_then_source_then_title() {
        let make = |start_offset: i64, hash: &str, title: &str| RawEvent {
            source_hash: roomsched_core::types::SourceHash::parse(hash).unwrap(),
            start: chrono::Utc::now() + chrono::Duration::minutes(start_offset),
            end: chrono::Utc::now() + chrono::Duration::minutes(start_offset + 60),
            title: title.to_string(),
            display_title: title.to_string(),
            subject: title.to_string(),
            professor: String::new(),
            room: String::new(),
            building: String::new(),
            group_display: String::new(),
            location: String::new(),
            color: "#000000".to_string(),
            calendar_name: String::new(),
        };
        let mut events = vec![
            make(10, "bbbbbbbb", "Z"),
            make(0, "aaaaaaaa", "A"),
            make(0, "aaaaaaaa", "B"),
        ];
        sort_events(&mut events);
        assert_eq!(events[0].title, "A");
        assert_eq!(events[1].title, "B");
        assert_eq!(events[2].title, "Z");
    }
}
