//! Concurrent ingestion of (repository, sha, ref) tasks.
//!
//! Tasks flow through three stages connected by bounded queues:
//!
//! 1. **exist**: one thread drops tasks whose sha already has a scan.
//! 2. **resolve**: `workers` threads clone, check out, parse manifests and write
//!    dependency documents. The temporary checkout is gone when the stage ends.
//! 3. **commit**: `commit_workers` threads append to entry chains under a
//!    per-repository lock, update the history tree, and queue a diff request against
//!    the previous tip.
//! 4. **diff**: one thread diffs each new commit against that tip and stores the result.
//!
//! [`Pipeline::finish`] closes the intake and waits for every queued task to drain.
//! Work that reached stage 2 is never cancelled.

mod commit_stage;
mod diff_stage;
mod exist_stage;
mod output;
mod resolve_stage;
mod task;

pub use diff_stage::{compare_with_previous, DiffRequest};
pub use output::{write_json, write_output, OutputTarget};
pub use resolve_stage::{history_snapshot, scan_checkout, write_dependency_documents, ResolvedScan};
pub use task::{read_tasks, IngestTask};

use crate::config::PipelineConfig;
use crate::diff::DiffEngine;
use crate::git::GitCollaborator;
use crate::ledger::Ledger;
use crate::parsers::ParserRegistry;
use crate::store::DocumentStore;
use crate::utils::short_sha;
use commit_stage::{Committed, RepoLocks};
use crossbeam_channel::{bounded, Receiver, Sender};
use exist_stage::Admission;
use resolve_stage::ResolveStage;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Structured pipeline error types.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The intake queue no longer accepts tasks
    #[error("Pipeline intake is closed")]
    IntakeClosed,

    /// A stage thread could not be started
    #[error("Failed to start {stage} worker: {source}")]
    SpawnFailed {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A stage thread panicked
    #[error("{stage} worker panicked")]
    WorkerPanicked { stage: &'static str },

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success - no changes detected (or no --fail-on-change)
    pub const SUCCESS: i32 = 0;
    /// Changes were detected
    pub const CHANGES_DETECTED: i32 = 1;
    /// The requested repository, ref, tag or sha is not recorded
    pub const NOT_FOUND: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;
}

/// Live task counters, shared by all stage threads
#[derive(Debug, Default)]
pub struct PipelineStats {
    submitted: AtomicUsize,
    skipped: AtomicUsize,
    resolved: AtomicUsize,
    committed: AtomicUsize,
    repaired: AtomicUsize,
    failed: AtomicUsize,
    diffs: AtomicUsize,
    diff_failures: AtomicUsize,
    histories: AtomicUsize,
}

impl PipelineStats {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            repaired: self.repaired.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            diffs: self.diffs.load(Ordering::Relaxed),
            diff_failures: self.diff_failures.load(Ordering::Relaxed),
            histories: self.histories.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub submitted: usize,
    /// Dropped because the sha was already scanned
    pub skipped: usize,
    pub resolved: usize,
    pub committed: usize,
    /// Chain entries whose missing scan document was rewritten
    pub repaired: usize,
    pub failed: usize,
    /// Difference documents written
    pub diffs: usize,
    /// Diff requests that could not be computed or stored; the commit itself stands
    pub diff_failures: usize,
    /// History documents written
    pub histories: usize,
}

impl StatsSnapshot {
    /// Every submitted task reached a terminal state
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.skipped + self.committed + self.repaired + self.failed >= self.submitted
    }
}

/// External collaborators the pipeline runs against
#[derive(Clone)]
pub struct PipelineDeps {
    pub store: Arc<dyn DocumentStore>,
    pub git: Arc<dyn GitCollaborator>,
    pub parsers: Arc<ParserRegistry>,
}

struct Shared {
    ledger: Ledger,
    diff: DiffEngine,
    deps: PipelineDeps,
    settings: PipelineConfig,
    locks: RepoLocks,
    stats: Arc<PipelineStats>,
}

/// A running ingestion pipeline
pub struct Pipeline {
    intake: Option<Sender<IngestTask>>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    /// Spawn all stage threads
    pub fn start(settings: &PipelineConfig, deps: PipelineDeps) -> Result<Self, PipelineError> {
        if settings.workers == 0 || settings.commit_workers == 0 || settings.queue_capacity == 0 {
            return Err(PipelineError::InvalidConfig(
                "workers, commit_workers and queue_capacity must be at least 1".into(),
            ));
        }

        let stats = Arc::new(PipelineStats::default());
        let shared = Arc::new(Shared {
            ledger: Ledger::new(Arc::clone(&deps.store)),
            diff: DiffEngine::new(Arc::clone(&deps.store)),
            deps,
            settings: settings.clone(),
            locks: RepoLocks::default(),
            stats: Arc::clone(&stats),
        });

        let (intake_tx, intake_rx) = bounded::<IngestTask>(settings.queue_capacity);
        let (resolve_tx, resolve_rx) = bounded::<IngestTask>(settings.queue_capacity);
        let (commit_tx, commit_rx) = bounded::<ResolvedScan>(settings.queue_capacity);
        let (diff_tx, diff_rx) = bounded::<DiffRequest>(settings.queue_capacity);

        let mut handles = Vec::with_capacity(2 + settings.workers + settings.commit_workers);

        {
            let shared = Arc::clone(&shared);
            let handle = spawn("exist", "ingest-exist".to_string(), move || {
                run_exist_stage(&shared, &intake_rx, &resolve_tx);
            })?;
            handles.push(("exist", handle));
        }

        for idx in 0..settings.workers {
            let shared = Arc::clone(&shared);
            let rx = resolve_rx.clone();
            let tx = commit_tx.clone();
            let handle = spawn("resolve", format!("ingest-resolve-{idx}"), move || {
                run_resolve_stage(&shared, &rx, &tx);
            })?;
            handles.push(("resolve", handle));
        }
        // Disconnection of the commit queue is driven by resolve worker exits
        drop(commit_tx);
        drop(resolve_rx);

        for idx in 0..settings.commit_workers {
            let shared = Arc::clone(&shared);
            let rx = commit_rx.clone();
            let tx = diff_tx.clone();
            let handle = spawn("commit", format!("ingest-commit-{idx}"), move || {
                run_commit_stage(&shared, &rx, &tx);
            })?;
            handles.push(("commit", handle));
        }
        // The diff queue disconnects once every commit worker has exited
        drop(commit_rx);
        drop(diff_tx);

        {
            let shared = Arc::clone(&shared);
            let handle = spawn("diff", "ingest-diff".to_string(), move || {
                run_diff_stage(&shared, &diff_rx);
            })?;
            handles.push(("diff", handle));
        }

        tracing::info!(
            store = shared.deps.store.store_name(),
            workers = settings.workers,
            commit_workers = settings.commit_workers,
            queue_capacity = settings.queue_capacity,
            "pipeline started"
        );
        Ok(Self {
            intake: Some(intake_tx),
            handles,
            stats,
        })
    }

    /// Queue a task; blocks while the intake queue is full
    pub fn submit(&self, task: IngestTask) -> Result<(), PipelineError> {
        let intake = self.intake.as_ref().ok_or(PipelineError::IntakeClosed)?;
        intake.send(task).map_err(|_| PipelineError::IntakeClosed)?;
        PipelineStats::bump(&self.stats.submitted);
        Ok(())
    }

    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Close the intake, let queued and in-flight tasks finish, and join all workers
    pub fn finish(mut self) -> Result<StatsSnapshot, PipelineError> {
        drop(self.intake.take());
        let mut panicked = None;
        for (stage, handle) in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!(stage, "worker panicked");
                panicked.get_or_insert(stage);
            }
        }
        let stats = self.stats.snapshot();
        tracing::info!(?stats, "pipeline finished");
        match panicked {
            Some(stage) => Err(PipelineError::WorkerPanicked { stage }),
            None => Ok(stats),
        }
    }
}

fn spawn<F>(stage: &'static str, name: String, f: F) -> Result<JoinHandle<()>, PipelineError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name)
        .spawn(f)
        .map_err(|source| PipelineError::SpawnFailed { stage, source })
}

fn run_exist_stage(shared: &Shared, rx: &Receiver<IngestTask>, tx: &Sender<IngestTask>) {
    for task in rx.iter() {
        match exist_stage::admit(&shared.ledger, &task) {
            Ok(Admission::Forward) => {
                if tx.send(task).is_err() {
                    tracing::error!("resolve queue closed; dropping remaining tasks");
                    PipelineStats::bump(&shared.stats.failed);
                    return;
                }
            }
            Ok(Admission::AlreadyScanned) => {
                tracing::debug!(%task, "already scanned");
                PipelineStats::bump(&shared.stats.skipped);
            }
            Err(e) => {
                tracing::warn!(%task, error = %e, "task rejected");
                PipelineStats::bump(&shared.stats.failed);
            }
        }
    }
}

fn run_resolve_stage(shared: &Shared, rx: &Receiver<IngestTask>, tx: &Sender<ResolvedScan>) {
    let stage = ResolveStage {
        git: shared.deps.git.as_ref(),
        parsers: shared.deps.parsers.as_ref(),
        store: shared.deps.store.as_ref(),
        include_test: shared.settings.include_test_deps,
        track_history: shared.settings.track_history,
    };
    for task in rx.iter() {
        let label = task.to_string();
        match stage.run(task) {
            Ok(resolved) => {
                PipelineStats::bump(&shared.stats.resolved);
                if tx.send(resolved).is_err() {
                    tracing::error!(task = %label, "commit queue closed");
                    PipelineStats::bump(&shared.stats.failed);
                    return;
                }
            }
            Err(e) => {
                tracing::error!(task = %label, error = %e, "resolve failed");
                PipelineStats::bump(&shared.stats.failed);
            }
        }
    }
}

fn run_commit_stage(shared: &Shared, rx: &Receiver<ResolvedScan>, diffs: &Sender<DiffRequest>) {
    for resolved in rx.iter() {
        let full_name = resolved.scan.repo_full_name.as_str();
        let sha = resolved.scan.sha.as_str();
        let outcome = match commit_stage::commit(&shared.ledger, &shared.locks, &resolved) {
            Ok(Committed::AlreadyScanned) => {
                tracing::debug!(repo = full_name, sha = short_sha(sha), "committed by another task");
                PipelineStats::bump(&shared.stats.skipped);
                continue;
            }
            Ok(Committed::Recorded {
                outcome,
                history_written,
            }) => {
                if history_written {
                    PipelineStats::bump(&shared.stats.histories);
                }
                outcome
            }
            Err(e) => {
                tracing::error!(repo = full_name, sha = short_sha(sha), error = %e, "commit failed");
                PipelineStats::bump(&shared.stats.failed);
                continue;
            }
        };

        let Some(previous) = outcome.previous_tip() else {
            let counter = if matches!(outcome, crate::ledger::RecordOutcome::Repaired) {
                &shared.stats.repaired
            } else {
                &shared.stats.committed
            };
            PipelineStats::bump(counter);
            continue;
        };
        PipelineStats::bump(&shared.stats.committed);

        if shared.settings.record_diffs {
            let request = DiffRequest::new(full_name, previous, sha);
            if diffs.send(request).is_err() {
                tracing::error!(repo = full_name, sha = short_sha(sha), "diff queue closed");
                PipelineStats::bump(&shared.stats.diff_failures);
            }
        }
    }
}

fn run_diff_stage(shared: &Shared, rx: &Receiver<DiffRequest>) {
    for request in rx.iter() {
        match compare_with_previous(&shared.diff, &request.full_name, &request.previous_tip, &request.sha) {
            Ok((_, true)) => PipelineStats::bump(&shared.stats.diffs),
            Ok((_, false)) => {}
            Err(e) => {
                tracing::warn!(
                    repo = %request.full_name,
                    sha = short_sha(&request.sha),
                    error = %e,
                    "diff failed"
                );
                PipelineStats::bump(&shared.stats.diff_failures);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_values() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::CHANGES_DETECTED, 1);
        assert_eq!(exit_codes::NOT_FOUND, 2);
        assert_eq!(exit_codes::ERROR, 3);
    }

    #[test]
    fn test_snapshot_drained() {
        let stats = PipelineStats::default();
        PipelineStats::bump(&stats.submitted);
        PipelineStats::bump(&stats.submitted);
        PipelineStats::bump(&stats.skipped);
        assert!(!stats.snapshot().is_drained());
        PipelineStats::bump(&stats.failed);
        assert!(stats.snapshot().is_drained());
    }
}
