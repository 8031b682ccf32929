//! Bulk source import from the institution's room-directory CSV.
//!
//! Header columns: `Nume_Sala, Email_Sala, Cladire, Optiune_Delegat,
//! PublishedCalendarUrl, PublishedICalUrl`. Standard dialect: `,` separator,
//! `"` quoting: the `csv` crate's defaults, no leniency for alternates.

use std::io::Read;

use roomsched_core::CalendarSource;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::error::StoreResult;
use crate::models::NewSource;
use crate::sources::upsert_source_by_url;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Nume_Sala")]
    room: String,
    #[serde(rename = "Email_Sala")]
    email: Option<String>,
    #[serde(rename = "Cladire")]
    building: Option<String>,
    #[serde(rename = "Optiune_Delegat")]
    delegate_option: Option<String>,
    #[serde(rename = "PublishedCalendarUrl")]
    calendar_url: String,
    #[serde(rename = "PublishedICalUrl")]
    ical_url: Option<String>,
}

/// Imports every row of `reader`, upserting by `PublishedCalendarUrl`.
/// The CSV is authoritative for `display_name`, `building`, `room`,
/// `email_address` and `ics_url`; `color` and `enabled` are preserved on
/// rows that already exist (new rows default to enabled, a generated
/// color). Rows with an empty `PublishedCalendarUrl` are skipped and
/// logged, not treated as a fatal error for the whole import.
pub async fn import_csv<R: Read>(pool: &SqlitePool, reader: R) -> StoreResult<Vec<CalendarSource>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let mut imported = Vec::new();
    for result in rdr.deserialize::<CsvRow>() {
        let row: CsvRow = result?;
        if row.calendar_url.trim().is_empty() {
            warn!(room = %row.room, "skipping CSV row with empty PublishedCalendarUrl");
            continue;
        }

        let existing = sqlx::query_as::<_, crate::models::SourceRow>(
            "SELECT * FROM calendar_sources WHERE primary_url = ?",
        )
        .bind(&row.calendar_url)
        .fetch_optional(pool)
        .await?;

        let (color, enabled) = match existing {
            Some(ref r) => (r.color.clone(), r.enabled),
            None => ("#3b82f6".to_string(), true),
        };

        let new = NewSource {
            primary_url: row.calendar_url,
            ics_url: row.ical_url,
            display_name: row.room.clone(),
            color,
            enabled,
            building: row.building,
            room: Some(row.room),
            email_address: row.email.or(row.delegate_option),
        };

        imported.push(upsert_source_by_url(pool, new).await?);
    }

    Ok(imported)
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

    const CSV: &str = "Nume_Sala,Email_Sala,Cladire,Optiune_Delegat,PublishedCalendarUrl,PublishedICalUrl\n\
101,room101@example.edu,Corp A,,https://cal.example.edu/101,https://cal.example.edu/101/ics\n\
102,,Corp B,delegate,https://cal.example.edu/102,\n";

    #[tokio::test]
    async fn import_creates_sources_from_csv_rows() {
        let pool = test_pool().await;
        let imported = import_csv(&pool, CSV.as_bytes()).await.unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].display_name, "101");
        assert_eq!(imported[0].ics_url.as_deref(), Some("https://cal.example.edu/101/ics"));
        assert_eq!(imported[1].email_address.as_deref(), Some("delegate"));
    }

    #[tokio::test]
    async fn reimporting_same_csv_preserves_color_and_enabled() {
        let pool = test_pool().await;
        import_csv(&pool, CSV.as_bytes()).await.unwrap();

        crate::sources::update_source_fields(
            &pool,
            1,
            crate::sources::SourceFieldUpdate {
                display_name: None,
                color: Some("#00ff00".to_string()),
                enabled: Some(false),
                building: None,
                room: None,
                email_address: None,
                ics_url: None,
            },
        )
        .await
        .unwrap();

        let reimported = import_csv(&pool, CSV.as_bytes()).await.unwrap();
        let room_101 = reimported
            .iter()
            .find(|s| s.primary_url == "https://cal.example.edu/101")
            .unwrap();
        assert_eq!(room_101.color, "#00ff00");
        assert!(!room_101.enabled);
    }

    #[tokio::test]
    async fn rows_with_empty_url_are_skipped_not_fatal() {
        let pool = test_pool().await;
        let csv_with_blank = format!(
            "{CSV}103,,Corp C,,,https://cal.example.edu/103/ics\n"
        );
        let imported = import_csv(&pool, csv_with_blank.as_bytes()).await.unwrap();
        assert_eq!(imported.len(), 2);
    }
}
