//! CRUD over `calendar_sources`, plus the CSV bulk import (C9).

use roomsched_core::CalendarSource;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::models::{NewSource, SourceRow};

pub async fn list_sources(pool: &SqlitePool, enabled_only: bool) -> StoreResult<Vec<CalendarSource>> {
    let rows: Vec<SourceRow> = if enabled_only {
        sqlx::query_as("SELECT * FROM calendar_sources WHERE enabled = 1 ORDER BY id")
            .fetch_all(pool)
            .await?
    } else {
        sqlx::query_as("SELECT * FROM calendar_sources ORDER BY id")
            .fetch_all(pool)
            .await?
    };
    Ok(rows.into_iter().map(CalendarSource::from).collect())
}

pub async fn get_source(pool: &SqlitePool, id: i64) -> StoreResult<CalendarSource> {
    let row: SourceRow = sqlx::query_as("SELECT * FROM calendar_sources WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::SourceNotFound(id))?;
    Ok(row.into())
}

/// Inserts a source, or updates its mutable fields in place when
/// `primary_url` already exists. `color` and `enabled` are preserved on
/// conflict unless explicitly carried in `new` (used by admin edits, not
/// by CSV import; see [`crate::csv_import::import_csv`] for that policy).
pub async fn upsert_source_by_url(pool: &SqlitePool, new: NewSource) -> StoreResult<CalendarSource> {
    let row: SourceRow = sqlx::query_as(
        "INSERT INTO calendar_sources
            (primary_url, ics_url, display_name, color, enabled, building, room, email_address)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(primary_url) DO UPDATE SET
            ics_url = excluded.ics_url,
            display_name = excluded.display_name,
            color = excluded.color,
            enabled = excluded.enabled,
            building = excluded.building,
            room = excluded.room,
            email_address = excluded.email_address
         RETURNING *",
    )
    .bind(&new.primary_url)
    .bind(&new.ics_url)
    .bind(&new.display_name)
    .bind(&new.color)
    .bind(new.enabled)
    .bind(&new.building)
    .bind(&new.room)
    .bind(&new.email_address)
    .fetch_one(pool)
    .await?;
    debug!(primary_url = %row.primary_url, "upserted calendar source");
    Ok(row.into())
}

/// Partial update of a source's fields, leaving unset fields untouched.
/// `None` means "don't change"; there's no way to clear `ics_url` through
/// this path other than passing an explicit empty string upstream.
pub struct SourceFieldUpdate {
    pub display_name: Option<String>,
    pub color: Option<String>,
    pub enabled: Option<bool>,
    pub building: Option<String>,
    pub room: Option<String>,
    pub email_address: Option<String>,
    pub ics_url: Option<String>,
}

pub async fn update_source_fields(
    pool: &SqlitePool,
    id: i64,
    update: SourceFieldUpdate,
) -> StoreResult<CalendarSource> {
    let current = get_source(pool, id).await?;
    let row: SourceRow = sqlx::query_as(
        "UPDATE calendar_sources SET
            display_name = ?, color = ?, enabled = ?, building = ?, room = ?, email_address = ?, ics_url = ?
         WHERE id = ?
         RETURNING *",
    )
    .bind(update.display_name.unwrap_or(current.display_name))
    .bind(update.color.unwrap_or(current.color))
    .bind(update.enabled.unwrap_or(current.enabled))
    .bind(update.building.or(current.building))
    .bind(update.room.or(current.room))
    .bind(update.email_address.or(current.email_address))
    .bind(update.ics_url.or(current.ics_url))
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

pub async fn mark_fetched(pool: &SqlitePool, id: i64, at: chrono::DateTime<chrono::Utc>) -> StoreResult<()> {
    sqlx::query("UPDATE calendar_sources SET last_fetched_at = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_source(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM calendar_sources WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::SourceNotFound(id));
    }
    info!(id, "deleted calendar source");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::connect;

    async fn test_pool() -> SqlitePool {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite3");
        let pool = connect(&path).await.unwrap();
        std::mem::forget(dir);
        pool
    }

    fn sample(url: &str) -> NewSource {
        NewSource {
            primary_url: url.to_string(),
            ics_url: Some(format!("{url}/ics")),
            display_name: "Room 101".to_string(),
            color: "#ff0000".to_string(),
            enabled: true,
            building: Some("A".to_string()),
            room: Some("101".to_string()),
            email_address: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_list_round_trips() {
        let pool = test_pool().await;
        let created = upsert_source_by_url(&pool, sample("https://cal/a")).await.unwrap();
        let listed = list_sources(&pool, false).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn upsert_same_url_twice_updates_not_duplicates() {
        let pool = test_pool().await;
        upsert_source_by_url(&pool, sample("https://cal/a")).await.unwrap();
        let mut second = sample("https://cal/a");
        second.display_name = "Room 101 Renamed".to_string();
        upsert_source_by_url(&pool, second).await.unwrap();

        let listed = list_sources(&pool, false).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].display_name, "Room 101 Renamed");
    }

    #[tokio::test]
    async fn list_enabled_only_excludes_disabled_sources() {
        let pool = test_pool().await;
        upsert_source_by_url(&pool, sample("https://cal/a")).await.unwrap();
        let mut disabled = sample("https://cal/b");
        disabled.enabled = false;
        upsert_source_by_url(&pool, disabled).await.unwrap();

        let listed = list_sources(&pool, true).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].primary_url, "https://cal/a");
    }

    #[tokio::test]
    async fn delete_missing_source_is_an_error() {
        let pool = test_pool().await;
        let err = delete_source(&pool, 999).await.unwrap_err();
        assert!(matches!(err, StoreError::SourceNotFound(999)));
    }
}
