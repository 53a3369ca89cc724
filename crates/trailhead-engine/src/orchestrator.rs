//! Refresh orchestration.
//!
//! ## Run pipeline (in order):
//! 1. Acquire the single-flight gate (busy ⇒ `Concurrency`, nothing touched)
//! 2. Fetching: bounded by `fetch_timeout` (failure/timeout ⇒ error, canonical untouched)
//! 3. Validating: schema + dataset rules (failure ⇒ `Rejected` outcome, nothing written)
//! 4. Deadline check: an overrun run is abandoned before any write
//! 5. Promoting: save snapshot → promote → prune, no suspension points
//! 6. Rebuilding: Enricher then Renderer, best-effort within the remaining budget
//!
//! Rollback takes the same gate, so a refresh and a rollback can never
//! promote concurrently. The gate is both an in-process mutex and the
//! layout's `PublishLock`, which extends it to other processes publishing
//! into the same data directory.

#![allow(clippy::result_large_err)]

use crate::collaborators::{Enricher, Fetcher, Renderer};
use crate::outcome::{RebuildStep, RefreshOutcome};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::MutexGuard;
use tokio::time::{timeout, Instant};
use tracing::Instrument;
use trailhead_core::errors::{ExError, ExErrorKind, Result, TrailError};
use trailhead_core::{log_op_end, log_op_error, log_op_start, TrailDataset};
use trailhead_core_types::schema::EVENT_TRANSITION;
use trailhead_core_types::RunId;
use trailhead_store::errors::snapshot_not_found;
use trailhead_store::{
    freshness, promote, PruneReport, PublishLock, Snapshot, SnapshotStore, DEFAULT_RETENTION,
};

/// Tunables of a run
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Snapshots kept after each successful promotion
    pub retention: usize,
    /// Upper bound on the Fetcher call
    pub fetch_timeout: Duration,
    /// Maximum duration of a whole run
    pub run_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            fetch_timeout: Duration::from_secs(20),
            run_timeout: Duration::from_secs(300),
        }
    }
}

/// Observable position of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Validating,
    Promoting,
    Rebuilding,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Fetching => "fetching",
            RunState::Validating => "validating",
            RunState::Promoting => "promoting",
            RunState::Rebuilding => "rebuilding",
        }
    }
}

/// What started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Scheduled,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Startup => "startup",
            Trigger::Scheduled => "scheduled",
            Trigger::Manual => "manual",
        })
    }
}

/// Result of the cold-start sequence
#[derive(Debug)]
pub struct BootstrapReport {
    /// Snapshot promoted because no canonical file existed
    pub restored: Result<Option<String>>,
    /// The first live refresh run
    pub refresh: Result<RefreshOutcome>,
}

/// Resets the observable state when a run ends, however it ends
struct IdleOnDrop<'a>(&'a Mutex<RunState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.lock() {
            *state = RunState::Idle;
        }
    }
}

/// Both halves of a held gate, released together
struct GateGuard<'a> {
    _local: MutexGuard<'a, ()>,
    _publish: PublishLock,
}

/// Sequences the pipeline and enforces at most one run in flight
pub struct Orchestrator {
    store: SnapshotStore,
    fetcher: Arc<dyn Fetcher>,
    enricher: Arc<dyn Enricher>,
    renderer: Arc<dyn Renderer>,
    config: OrchestratorConfig,
    gate: tokio::sync::Mutex<()>,
    state: Mutex<RunState>,
}

impl Orchestrator {
    pub fn new(
        store: SnapshotStore,
        fetcher: Arc<dyn Fetcher>,
        enricher: Arc<dyn Enricher>,
        renderer: Arc<dyn Renderer>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            enricher,
            renderer,
            config,
            gate: tokio::sync::Mutex::new(()),
            state: Mutex::new(RunState::Idle),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Current state of the machine
    pub fn state(&self) -> RunState {
        self.state.lock().map(|s| *s).unwrap_or(RunState::Idle)
    }

    fn acquire_gate(&self) -> Result<GateGuard<'_>> {
        let local = self
            .gate
            .try_lock()
            .map_err(|_| ExError::from(TrailError::RefreshInProgress))?;
        let publish = PublishLock::try_acquire(self.store.layout())?;
        Ok(GateGuard {
            _local: local,
            _publish: publish,
        })
    }

    fn transition(&self, run_id: &RunId, next: RunState) {
        let previous = match self.state.lock() {
            Ok(mut state) => std::mem::replace(&mut *state, next),
            Err(_) => return,
        };
        tracing::debug!(
            component = module_path!(),
            op = "refresh",
            event = EVENT_TRANSITION,
            run_id = %run_id,
            from = previous.as_str(),
            to = next.as_str(),
        );
    }

    /// Run the pipeline once
    ///
    /// `Ok(Rejected)` means the candidate failed validation and the canonical
    /// file and history are untouched. `Err` covers acquisition failures,
    /// timeouts, persistence failures and a busy gate.
    pub async fn refresh(&self, trigger: Trigger) -> Result<RefreshOutcome> {
        let _gate = self.acquire_gate().map_err(|e| {
            if e.kind() == ExErrorKind::Concurrency {
                tracing::warn!(
                    component = module_path!(),
                    op = "refresh",
                    trigger = %trigger,
                    "refresh rejected: another run is in progress"
                );
            }
            e
        })?;
        let run_id = RunId::new();
        let span = tracing::info_span!("refresh", run_id = %run_id, trigger = %trigger);
        self.run(run_id, trigger).instrument(span).await
    }

    async fn run(&self, run_id: RunId, trigger: Trigger) -> Result<RefreshOutcome> {
        let start = Instant::now();
        let deadline = start + self.config.run_timeout;
        let _idle = IdleOnDrop(&self.state);
        log_op_start!("refresh", run_id = %run_id, trigger = %trigger);

        let result = self.run_stages(&run_id, deadline).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(RefreshOutcome::Promoted(run)) => {
                log_op_end!(
                    "refresh",
                    duration_ms = duration_ms,
                    run_id = %run_id,
                    snapshot = %run.snapshot,
                    record_count = run.count as u64
                );
            }
            Ok(RefreshOutcome::Rejected(run)) => {
                tracing::warn!(
                    component = module_path!(),
                    op = "refresh",
                    event = trailhead_core_types::schema::EVENT_END,
                    run_id = %run_id,
                    duration_ms = duration_ms,
                    fault_count = run.details.len() as u64,
                    "candidate rejected, keeping last known good dataset"
                );
            }
            Err(e) => {
                log_op_error!("refresh", e.clone(), duration_ms = duration_ms, run_id = %run_id);
            }
        }
        result
    }

    async fn run_stages(&self, run_id: &RunId, deadline: Instant) -> Result<RefreshOutcome> {
        self.store.ensure_history()?;

        self.transition(run_id, RunState::Fetching);
        let candidate = self.fetch_candidate(deadline).await?;

        self.transition(run_id, RunState::Validating);
        let admitted = self.store.validator()?.admit(&candidate);
        let dataset = match admitted {
            Ok(dataset) => dataset,
            Err(report) => {
                for fault in &report.faults {
                    tracing::warn!(
                        component = module_path!(),
                        op = "validate",
                        run_id = %run_id,
                        path = %fault.path,
                        "{}",
                        fault.message
                    );
                }
                return Ok(RefreshOutcome::rejected(run_id.to_string(), report.faults));
            }
        };

        if Instant::now() >= deadline {
            return Err(TrailError::RunTimedOut {
                stage: RunState::Promoting.as_str().to_string(),
                budget_ms: self.config.run_timeout.as_millis() as u64,
            }
            .into());
        }

        // No await between here and the end of pruning: a cancelled run can
        // never stop halfway through a promotion.
        self.transition(run_id, RunState::Promoting);
        let snapshot = self.store.save_as_snapshot(&candidate)?;
        promote(self.store.layout(), &snapshot)?;
        let pruned = self.prune_best_effort(run_id);

        self.transition(run_id, RunState::Rebuilding);
        let rebuild = self.rebuild(&dataset, deadline).await;

        Ok(RefreshOutcome::promoted(
            run_id.to_string(),
            dataset.record_count(),
            snapshot.name,
            pruned,
            rebuild,
        ))
    }

    async fn fetch_candidate(&self, deadline: Instant) -> Result<Value> {
        let budget = self
            .config
            .fetch_timeout
            .min(deadline.saturating_duration_since(Instant::now()));
        let source_name = self.fetcher.source_name().to_string();

        match timeout(budget, self.fetcher.fetch()).await {
            Err(_) => Err(TrailError::FetchTimedOut {
                source_name,
                after_ms: budget.as_millis() as u64,
            }
            .into()),
            Ok(Err(e)) if matches!(e.kind(), ExErrorKind::Acquisition | ExErrorKind::Timeout) => {
                Err(e)
            }
            Ok(Err(e)) => Err(ExError::from(TrailError::FetchFailed {
                source_name,
                reason: e.message().to_string(),
            })
            .with_source(e)),
            Ok(Ok(candidate)) => Ok(candidate),
        }
    }

    fn prune_best_effort(&self, run_id: &RunId) -> PruneReport {
        match self.store.prune_snapshots(self.config.retention) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    component = module_path!(),
                    op = "prune_snapshots",
                    run_id = %run_id,
                    error = %e,
                    "pruning skipped"
                );
                PruneReport::default()
            }
        }
    }

    async fn rebuild(&self, dataset: &TrailDataset, deadline: Instant) -> Vec<RebuildStep> {
        let layout = self.store.layout();
        let enrich = bounded_step("enrich", deadline, self.enricher.enrich(layout, dataset)).await;
        let render = bounded_step("render", deadline, self.renderer.render(layout, dataset)).await;
        vec![enrich, render]
    }

    /// Promote a named snapshot without fetching or validating
    pub async fn rollback(&self, name: &str) -> Result<Snapshot> {
        let _gate = self.acquire_gate()?;
        let snapshot = self
            .store
            .find_snapshot(name)?
            .ok_or_else(|| snapshot_not_found(name))?;
        promote(self.store.layout(), &snapshot)?;
        tracing::info!(
            component = module_path!(),
            op = "rollback",
            snapshot = %snapshot.name,
            "rolled back"
        );
        Ok(snapshot)
    }

    /// Canonical dataset, if present and acceptable to the current schema
    pub fn current_dataset(&self) -> Option<TrailDataset> {
        let raw = std::fs::read(self.store.layout().data_file()).ok()?;
        let doc: Value = serde_json::from_slice(&raw).ok()?;
        self.store.validator().ok()?.admit(&doc).ok()
    }

    /// `generated_at` of the canonical dataset
    pub fn updated_at(&self) -> Option<String> {
        freshness::updated_at(self.store.layout())
    }

    /// Cold start: restore the newest valid snapshot if no canonical file
    /// exists, then run one refresh
    ///
    /// If that refresh is rejected the Renderer still runs once, so
    /// downstream artifacts match the dataset being served.
    pub async fn bootstrap(&self) -> BootstrapReport {
        let restored = self.restore_if_missing();
        if let Err(e) = &restored {
            tracing::error!(
                component = module_path!(),
                op = "bootstrap",
                error = %e,
                "could not restore a snapshot"
            );
        }

        let refresh = self.refresh(Trigger::Startup).await;
        if matches!(refresh, Ok(RefreshOutcome::Rejected(_))) {
            tracing::warn!(
                component = module_path!(),
                op = "bootstrap",
                "initial refresh failed validation; serving last good snapshot"
            );
            if let Some(dataset) = self.current_dataset() {
                if let Err(e) = self.renderer.render(self.store.layout(), &dataset).await {
                    tracing::warn!(
                        component = module_path!(),
                        op = "bootstrap",
                        error = %e,
                        "render of served dataset failed"
                    );
                }
            }
        }

        BootstrapReport { restored, refresh }
    }

    fn restore_if_missing(&self) -> Result<Option<String>> {
        let _gate = self.acquire_gate()?;
        if self.store.layout().canonical_exists() {
            return Ok(None);
        }
        self.store.ensure_history()?;
        let validator = self.store.validator()?;
        match self.store.latest_good_snapshot(&validator)? {
            Some(snapshot) => {
                promote(self.store.layout(), &snapshot)?;
                tracing::info!(
                    component = module_path!(),
                    op = "bootstrap",
                    snapshot = %snapshot.name,
                    "restored canonical dataset from history"
                );
                Ok(Some(snapshot.name))
            }
            None => Ok(None),
        }
    }
}

async fn bounded_step<F>(step: &str, deadline: Instant, work: F) -> RebuildStep
where
    F: std::future::Future<Output = Result<Value>>,
{
    let remaining = deadline.saturating_duration_since(Instant::now());
    let cause = match timeout(remaining, work).await {
        Ok(Ok(detail)) => return RebuildStep::succeeded(step, detail),
        Ok(Err(e)) => e,
        Err(_) => ExError::new(ExErrorKind::Timeout)
            .with_op(step.to_string())
            .with_message("run budget exhausted"),
    };
    let err = ExError::from(TrailError::RebuildFailed {
        step: step.to_string(),
        reason: cause.to_string(),
    });
    tracing::warn!(
        component = module_path!(),
        op = step,
        error = %err,
        "rebuild step failed; promoted dataset stays in place"
    );
    RebuildStep::failed(step, err)
}
