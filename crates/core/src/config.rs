//! Pipeline-wide configuration, loaded once from the environment and handed
//! down to the orchestrator, scheduler and API.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("{key} is set but not a valid value: {v:?}")),
        Err(_) => Ok(default),
    }
}

/// Configuration for the extraction/merge pipeline.
///
/// Mirrors the shape of `ImportProgress`'s timing knobs and the artifact
/// filesystem layout; every field has a documented default so the process
/// can boot in a fresh checkout with only `ARTIFACT_DIR`/`STORE_PATH` unset
/// (they still fall back to sane local paths).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory for per-calendar artifacts, the merged schedule, the
    /// calendar map, progress/completion markers and the cache lock file.
    pub artifact_dir: PathBuf,

    /// Path to the SQLite database file backing the event store.
    pub store_path: PathBuf,

    /// Max concurrent ICS fetches in phase P1.
    pub ics_concurrency: usize,

    /// Max concurrent headless-render fallbacks in phase P2.
    pub render_concurrency: usize,

    /// Minutes between scheduled full-extraction runs.
    pub extract_interval_min: u64,

    /// Days after which a manual event is eligible for the daily cleanup.
    pub retention_days: i64,

    /// When set, the scheduler spawns neither the periodic fetcher nor the
    /// daily cleanup task. Used by tests and one-shot CLI invocations.
    pub disable_background_tasks: bool,
}

impl PipelineConfig {
    /// Loads configuration from the environment, loading a `.env` file if
    /// present. Every value has a default, so this never fails on missing
    /// variables; it only fails if a present variable can't be parsed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            artifact_dir: PathBuf::from(env_or("ARTIFACT_DIR", "./data/artifacts")),
            store_path: PathBuf::from(env_or("STORE_PATH", "./data/roomsched.sqlite3")),
            ics_concurrency: env_parse_or("ICS_CONCURRENCY", 8usize)?,
            render_concurrency: env_parse_or("RENDER_CONCURRENCY", 4usize)?,
            extract_interval_min: env_parse_or("EXTRACT_INTERVAL_MIN", 60u64)?,
            retention_days: env_parse_or("RETENTION_DAYS", 60i64)?,
            disable_background_tasks: env::var("DISABLE_BACKGROUND_TASKS").is_ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_to_default() {
        assert_eq!(env_or("ROOMSCHED_TEST_UNSET_KEY", "fallback"), "fallback");
    }

    #[test]
    fn env_parse_or_falls_back_on_missing() {
        let v: usize = env_parse_or("ROOMSCHED_TEST_UNSET_NUM", 7usize).unwrap();
        assert_eq!(v, 7);
    }
}
