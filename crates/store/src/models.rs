//! Row shapes for the embedded store, and their conversion into the
//! dependency-free domain models from `roomsched-core`.

use chrono::{DateTime, Utc};
use roomsched_core::{CalendarSource, ManualEvent, SourceId};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct SourceRow {
    pub id: i64,
    pub primary_url: String,
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

impl From<SourceRow> for CalendarSource {
    fn from(row: SourceRow) -> Self {
        CalendarSource {
            id: SourceId(row.id),
            primary_url: row.primary_url,
            ics_url: row.ics_url,
            display_name: row.display_name,
            color: row.color,
            enabled: row.enabled,
            building: row.building,
            room: row.room,
            email_address: row.email_address,
            created_at: row.created_at,
            last_fetched_at: row.last_fetched_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ManualEventRow {
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub location: Option<String>,
    pub raw: Option<String>,
}

impl From<ManualEventRow> for ManualEvent {
    fn from(row: ManualEventRow) -> Self {
        ManualEvent {
            id: row.id,
            start: row.start,
            end: row.end,
            title: row.title,
            location: row.location,
            raw: row.raw,
        }
    }
}

/// Fields accepted when creating or upserting a calendar source. Separate
/// from [`CalendarSource`] because callers never supply `id`/`created_at`.
#[derive(Debug, Clone)]
pub struct NewSource {
    pub primary_url: String,
    pub ics_url: Option<String>,
    pub display_name: String,
    pub color: String,
    pub enabled: bool,
    pub building: Option<String>,
    pub room: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewManualEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub location: Option<String>,
    pub raw: Option<String>,
}
