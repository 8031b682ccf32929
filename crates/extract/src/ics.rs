//! C3: fast-path ICS fetch and decode.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::IcsError;

/// Outcome of fetching one calendar via ICS. `EmptyFeed` is deliberately
/// distinct from an error: a syntactically valid feed with zero events is
/// a terminal success (§8 Scenario B), and must not trigger the renderer
/// fallback.
#[derive(Debug)]
pub enum IcsOutcome {
    Parsed(Vec<RawIcsEvent>),
    EmptyFeed,
}

const TIMEOUT: Duration = Duration::from_secs(30);
const BACKOFFS_MS: &[u64] = &[1_000, 3_000];

/// Fetches and decodes one ICS feed, retrying transient network errors with
/// the backoff schedule in [`BACKOFFS_MS`]. A syntactically valid feed with
/// zero `VEVENT`s is [`IcsOutcome::EmptyFeed`], not an error; callers must
/// not treat that as a signal to fall through to the renderer.
pub async fn fetch_ics(client: &Client, url: &str) -> Result<IcsOutcome, IcsError> {
    let mut attempt = 0usize;
    loop {
        match try_fetch_once(client, url).await {
            Ok(outcome) => return Ok(outcome),
            Err(err) if is_transient(&err) && attempt < BACKOFFS_MS.len() => {
                warn!(url, attempt, %err, "transient ICS fetch error, retrying");
                tokio::time::sleep(Duration::from_millis(BACKOFFS_MS[attempt])).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn is_transient(err: &IcsError) -> bool {
    match err {
        IcsError::Network { source, .. } => source.is_timeout() || source.is_connect(),
        IcsError::Status { status, .. } => *status >= 500,
        IcsError::Parse { .. } => false,
    }
}

async fn try_fetch_once(client: &Client, url: &str) -> Result<IcsOutcome, IcsError> {
    let response = client
        .get(url)
        .timeout(TIMEOUT)
        .send()
        .await
        .map_err(|source| IcsError::Network {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(IcsError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|source| IcsError::Network {
        url: url.to_string(),
        source,
    })?;

    decode(url, &body)
}

fn decode(url: &str, body: &str) -> Result<IcsOutcome, IcsError> {
    let unfolded = icalendar::parser::unfold(body);
    let parsed = icalendar::parser::read_calendar(&unfolded).map_err(|reason| IcsError::Parse {
        url: url.to_string(),
        reason,
    })?;

    let mut events = Vec::new();
    for component in &parsed.components {
        if component.name.as_ref() != "VEVENT" {
            continue;
        }

        let mut summary = String::new();
        let mut location = String::new();
        let mut dtstart = None;
        let mut dtend = None;

        for property in &component.properties {
            match property.name.as_ref() {
                "SUMMARY" => summary = property.val.to_string(),
                "LOCATION" => location = property.val.to_string(),
                "DTSTART" => dtstart = parse_ics_datetime(property.val.as_ref()),
                "DTEND" => dtend = parse_ics_datetime(property.val.as_ref()),
                _ => {}
            }
        }

        match (dtstart, dtend) {
            (Some(start), Some(end)) if end >= start => {
                events.push(RawIcsEvent {
                    summary,
                    location,
                    start,
                    end,
                });
            }
            _ => {
                debug!(url, %summary, "skipping VEVENT with missing/invalid DTSTART or DTEND");
            }
        }
    }

    if events.is_empty() {
        Ok(IcsOutcome::EmptyFeed)
    } else {
        Ok(IcsOutcome::Parsed(events))
    }
}

/// An event as decoded from ICS, before C2 normalization (which C5 applies).
#[derive(Debug, Clone)]
pub struct RawIcsEvent {
    pub summary: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Parses the handful of DTSTART/DTEND shapes real feeds emit: UTC
/// (`20260115T090000Z`), floating local time (`20260115T090000`, assumed
/// UTC-offset as published since the source institution publishes in one
/// timezone), and bare dates (`20260115`, treated as midnight).
fn parse_ics_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(stripped) = raw.strip_suffix('Z') {
        if let Ok(naive) = NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S") {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y%m%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_datetime_with_z_suffix() {
        let dt = parse_ics_datetime("20260115T090000Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T09:00:00+00:00");
    }

    #[test]
    fn parses_floating_datetime_without_z() {
        let dt = parse_ics_datetime("20260115T090000").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T09:00:00+00:00");
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        let dt = parse_ics_datetime("20260115").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T00:00:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_ics_datetime("not-a-date").is_none());
    }

    #[test]
    fn decode_valid_feed_with_zero_vevents_is_empty_not_error() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n";
        let outcome = decode("https://cal.example.edu/x", ics).unwrap();
        assert!(matches!(outcome, IcsOutcome::EmptyFeed));
    }

    #[test]
    fn decode_feed_with_one_event() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nSUMMARY:Algebra\r\nLOCATION:Sala 101\r\nDTSTART:20260115T090000Z\r\nDTEND:20260115T110000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        match decode("https://cal.example.edu/x", ics).unwrap() {
            IcsOutcome::Parsed(events) => {
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].summary, "Algebra");
            }
            IcsOutcome::EmptyFeed => panic!("expected one event"),
        }
    }

    #[test]
    fn decode_skips_event_missing_dtend() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nSUMMARY:Broken\r\nDTSTART:20260115T090000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        match decode("https://cal.example.edu/x", ics).unwrap() {
            IcsOutcome::EmptyFeed => {}
            IcsOutcome::Parsed(events) => panic!("expected no valid events, got {events:?}"),
        }
    }

    #[test]
    fn decode_rejects_invalid_calendar_body() {
        let err = decode("https://cal.example.edu/x", "not an ics file").unwrap_err();
        assert!(matches!(err, IcsError::Parse { .. }));
    }
}
