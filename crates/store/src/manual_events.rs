//! CRUD over `manual_events`, and the daily retention cleanup (C10).

use chrono::{DateTime, Duration, Utc};
use roomsched_core::ManualEvent;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::models::{ManualEventRow, NewManualEvent};

pub async fn add_manual_event(pool: &SqlitePool, new: NewManualEvent) -> StoreResult<ManualEvent> {
    let row: ManualEventRow = sqlx::query_as(
        "INSERT INTO manual_events (start, end, title, location, raw)
         VALUES (?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(new.start)
    .bind(new.end)
    .bind(&new.title)
    .bind(&new.location)
    .bind(&new.raw)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

pub async fn delete_manual_event(pool: &SqlitePool, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM manual_events WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::ManualEventNotFound(id));
    }
    Ok(())
}

pub async fn list_manual_events(
    pool: &SqlitePool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> StoreResult<Vec<ManualEvent>> {
    let rows: Vec<ManualEventRow> = sqlx::query_as(
        "SELECT * FROM manual_events WHERE end >= ? AND start <= ? ORDER BY start ASC",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(ManualEvent::from).collect())
}

/// C10's daily cleanup: deletes manual events whose `end` is older than
/// `retention_days`. Per-calendar artifacts are not touched here; they are
/// simply rewritten by the next extraction run.
pub async fn cleanup_expired_manual_events(
    pool: &SqlitePool,
    retention_days: i64,
    now: DateTime<Utc>,
) -> StoreResult<u64> {
    let cutoff = now - Duration::days(retention_days);
    let result = sqlx::query("DELETE FROM manual_events WHERE end < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;
    let deleted = result.rows_affected();
    if deleted > 0 {
        info!(deleted, retention_days, "pruned expired manual events");
    }
    Ok(deleted)
}
