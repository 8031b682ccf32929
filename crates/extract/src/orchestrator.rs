//! C6: the bounded-concurrency orchestrator. Runs P1 (ICS) and P2 (render
//! fallback) over every enabled source, then P3 (merge), writing
//! [`ImportProgress`] after each per-source completion and at most one run
//! at a time across the whole process.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use roomsched_artifact::ArtifactStore;
use roomsched_core::{CalendarSource, ExtractionPhase, ImportProgress, PipelineConfig};
use sqlx::SqlitePool;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::ics::{fetch_ics, IcsOutcome};
use crate::render::RenderPool;

pub struct Orchestrator {
    http: Client,
    render_pool: Option<RenderPool>,
    artifacts: ArtifactStore,
    store: SqlitePool,
    config: PipelineConfig,
    /// Held for the duration of a run; `try_lock` gives the "already
    /// running" semantics from `SPEC_FULL.md` §4.6 without blocking a
    /// second caller.
    run_token: Mutex<()>,
}

impl Orchestrator {
    pub fn new(artifacts: ArtifactStore, store: SqlitePool, config: PipelineConfig) -> ExtractResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| ExtractError::HttpClient(e.to_string()))?;
        let render_pool = match RenderPool::launch(config.render_concurrency) {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(error = %e, "headless render pool unavailable at startup; C4 fallback disabled");
                None
            }
        };
        Ok(Self {
            http,
            render_pool,
            artifacts,
            store,
            config,
            run_token: Mutex::new(()),
        })
    }

    /// Runs one full extraction: P1 ICS, P2 render fallback for P1
    /// failures, P3 merge. Returns `Err(ExtractError::AlreadyRunning)`
    /// without doing any work if another run is already in flight.
    pub async fn run_full_extraction(&self, cancel: &CancellationToken) -> ExtractResult<ImportProgress> {
        let _guard = self.run_token.try_lock().map_err(|_| ExtractError::AlreadyRunning)?;

        let sources = roomsched_store::sources::list_sources(&self.store, true).await?;

        let mut progress = ImportProgress {
            total: sources.len(),
            started_at: Some(Utc::now()),
            current_phase: ExtractionPhase::Ics,
            ..Default::default()
        };
        self.artifacts.write_progress(&progress)?;

        let (ics_candidates, needs_render): (Vec<_>, Vec<_>) =
            sources.into_iter().partition(|s| s.ics_url.is_some());

        if cancel.is_cancelled() {
            return self.finish(progress, cancel).await;
        }

        // P1 failures carry a transient reason ("needs render") that must
        // not land in `progress.errors` until we know P2 did not rescue
        // them. Otherwise a source that fails ICS but succeeds via render
        // would still show up as failed in `/debug/pipeline`.
        let mut still_needs_render = needs_render;
        let mut pending_ics_reasons = std::collections::HashMap::new();

        self.run_phase(
            ics_candidates,
            self.config.ics_concurrency,
            cancel,
            false,
            &mut progress,
            |source, outcome, progress| match outcome {
                PhaseOutcome::Success { event_count } => {
                    progress.queued += 1;
                    progress.succeeded += 1;
                    progress.files_written += 1;
                    info!(source = %source.hash(), event_count, "source extracted via ics");
                }
                PhaseOutcome::NeedsRender(reason) => {
                    pending_ics_reasons.insert(source.hash().to_string(), reason);
                    still_needs_render.push(source.clone());
                }
                PhaseOutcome::Failed(reason) => {
                    progress.queued += 1;
                    progress.failed += 1;
                    progress.errors.insert(source.hash().to_string(), reason);
                }
            },
        )
        .await;

        progress.current_phase = ExtractionPhase::Render;
        self.artifacts.write_progress(&progress)?;

        if !cancel.is_cancelled() && self.render_pool.is_some() {
            self.run_phase(
                still_needs_render,
                self.config.render_concurrency,
                cancel,
                true,
                &mut progress,
                |source, outcome, progress| {
                    progress.queued += 1;
                    match outcome {
                        PhaseOutcome::Success { event_count } => {
                            progress.succeeded += 1;
                            progress.files_written += 1;
                            info!(source = %source.hash(), event_count, "source extracted via render fallback");
                        }
                        PhaseOutcome::NeedsRender(_) | PhaseOutcome::Failed(_) => {
                            progress.failed += 1;
                            let render_reason = match outcome {
                                PhaseOutcome::Failed(r) => r,
                                _ => "render fallback declined".to_string(),
                            };
                            let ics_reason = pending_ics_reasons
                                .get(source.hash().as_str())
                                .cloned()
                                .unwrap_or_else(|| "no ics_url configured".to_string());
                            progress.errors.insert(
                                source.hash().to_string(),
                                format!("ics: {ics_reason}; render: {render_reason}"),
                            );
                        }
                    }
                },
            )
            .await;
        } else {
            for source in &still_needs_render {
                progress.queued += 1;
                progress.failed += 1;
                let ics_reason = pending_ics_reasons
                    .get(source.hash().as_str())
                    .cloned()
                    .unwrap_or_else(|| "no ics_url configured".to_string());
                progress.errors.insert(
                    source.hash().to_string(),
                    format!("ics: {ics_reason}; render: fallback unavailable"),
                );
                self.artifacts.write_progress(&progress)?;
            }
        }

        self.finish(progress, cancel).await
    }

    async fn finish(
        &self,
        mut progress: ImportProgress,
        cancel: &CancellationToken,
    ) -> ExtractResult<ImportProgress> {
        progress.current_phase = ExtractionPhase::Merge;
        self.artifacts.write_progress(&progress)?;

        if !cancel.is_cancelled() {
            let (schedule, map) = roomsched_merge::merge(&self.artifacts, &self.store, None).await?;
            let fp = self.artifacts.fingerprint()?;
            self.artifacts.write_schedule(&schedule, &map, fp)?;
        }

        progress.current_phase = ExtractionPhase::Idle;
        progress.finished_at = Some(Utc::now());
        progress.finished = true;
        self.artifacts.write_progress(&progress)?;
        self.artifacts.write_import_complete(Utc::now())?;

        info!(
            total = progress.total,
            succeeded = progress.succeeded,
            failed = progress.failed,
            "extraction run finished"
        );
        Ok(progress)
    }

    /// Runs one phase (ICS-only or render-only) with bounded concurrency,
    /// observing `cancel` between dispatches; submitted work still runs
    /// to completion once dispatched. `on_result` is called as each task
    /// completes (not after the whole phase), and `progress` is written
    /// to disk after every per-source completion, matching the per-source
    /// freshness guarantee on `/debug/pipeline`.
    async fn run_phase<F>(
        &self,
        sources: Vec<CalendarSource>,
        concurrency: usize,
        cancel: &CancellationToken,
        render_only: bool,
        progress: &mut ImportProgress,
        mut on_result: F,
    ) where
        F: FnMut(&CalendarSource, PhaseOutcome, &mut ImportProgress),
    {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut set = tokio::task::JoinSet::new();

        for source in sources {
            if cancel.is_cancelled() {
                break;
            }
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            let http = self.http.clone();
            let artifacts = self.artifacts.clone();
            let store = self.store.clone();
            let render_pool = if render_only { self.render_pool.clone() } else { None };
            let source_for_task = source.clone();

            set.spawn(async move {
                let _permit = permit;
                let outcome = if render_only {
                    run_render_only(&http, render_pool.as_ref(), &artifacts, &store, &source_for_task).await
                } else {
                    run_ics_only(&http, &artifacts, &store, &source_for_task).await
                };
                (source_for_task, outcome)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((source, outcome)) => {
                    on_result(&source, outcome, progress);
                    if let Err(e) = self.artifacts.write_progress(progress) {
                        warn!(error = %e, "failed to write progress after source completion");
                    }
                }
                Err(e) => warn!(error = %e, "extraction task panicked"),
            }
        }
    }
}

enum PhaseOutcome {
    Success { event_count: usize },
    NeedsRender(String),
    Failed(String),
}

async fn run_ics_only(
    http: &Client,
    artifacts: &ArtifactStore,
    store: &SqlitePool,
    source: &CalendarSource,
) -> PhaseOutcome {
    let Some(url) = &source.ics_url else {
        return PhaseOutcome::NeedsRender("no ics_url configured".to_string());
    };
    match fetch_ics(http, url).await {
        Ok(IcsOutcome::Parsed(events)) => finalize(artifacts, store, source, events).await,
        Ok(IcsOutcome::EmptyFeed) => finalize(artifacts, store, source, Vec::new()).await,
        Err(e) => PhaseOutcome::NeedsRender(e.to_string()),
    }
}

async fn run_render_only(
    _http: &Client,
    render_pool: Option<&RenderPool>,
    artifacts: &ArtifactStore,
    store: &SqlitePool,
    source: &CalendarSource,
) -> PhaseOutcome {
    match render_pool {
        Some(pool) => match pool.render(&source.primary_url).await {
            Ok(events) => finalize(artifacts, store, source, events).await,
            Err(e) => PhaseOutcome::Failed(e.to_string()),
        },
        None => PhaseOutcome::Failed("render pool disabled".to_string()),
    }
}

async fn finalize(
    artifacts: &ArtifactStore,
    store: &SqlitePool,
    source: &CalendarSource,
    raw_events: Vec<crate::ics::RawIcsEvent>,
) -> PhaseOutcome {
    let hash = source.hash();
    let normalized = crate::extractor::normalize_and_filter(&hash, source, raw_events);
    match artifacts.write_calendar_artifact(&hash, &normalized) {
        Ok(()) => {
            let _ = roomsched_store::sources::mark_fetched(store, source.id.0, Utc::now()).await;
            PhaseOutcome::Success {
                event_count: normalized.len(),
            }
        }
        Err(e) => PhaseOutcome::Failed(format!("artifact write failed: {e}")),
    }
}
