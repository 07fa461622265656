//! Dispatcher: one concurrent retrieval unit per reader.
//!
//! Units are plain tokio tasks. Each owns its assignment and its file-list
//! artifact; nothing is shared between them except the read-only
//! retriever, so no locking is needed. Start and completion order across
//! readers is unspecified.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tapestage_balancer::Assignment;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::artifact::FileListArtifact;
use crate::error::{DispatchError, DispatchResult};
use crate::report::{DispatchReport, WorkerOutcome, WorkerStatus, WorkerSummary};
use crate::retriever::Retriever;

/// Launches retrievals for a set of assignments.
pub struct Dispatcher<R> {
    retriever: Arc<R>,
    deadline: Option<Duration>,
    shutdown: Option<watch::Receiver<bool>>,
    artifact_dir: Option<PathBuf>,
}

impl<R: Retriever> Dispatcher<R> {
    pub fn new(retriever: R) -> Self {
        Self {
            retriever: Arc::new(retriever),
            deadline: None,
            shutdown: None,
            artifact_dir: None,
        }
    }

    /// Abort outstanding retrievals once `deadline` has elapsed since dispatch.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abort outstanding retrievals when `true` is sent on the channel.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Create file-list artifacts in `dir` instead of the system temp dir.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Start one task per non-empty assignment and return immediately.
    ///
    /// Must be called from within a tokio runtime. Empty assignments are
    /// recorded as skipped and never reach the retriever.
    pub fn dispatch(&self, assignments: Vec<Assignment>) -> DispatchHandle {
        let deadline = self.deadline.map(|d| (Instant::now() + d, d));
        let mut units = Vec::new();
        let mut skipped = Vec::new();

        for assignment in assignments {
            let summary = WorkerSummary::from(&assignment);
            if assignment.is_empty() {
                debug!(worker = summary.worker_id, "no files assigned; skipping reader");
                skipped.push(WorkerOutcome {
                    summary,
                    status: WorkerStatus::Skipped,
                });
                continue;
            }

            let unit = Unit {
                retriever: self.retriever.clone(),
                assignment,
                artifact_dir: self.artifact_dir.clone(),
                deadline,
                shutdown: self.shutdown.clone(),
            };
            let handle = tokio::spawn(unit.run());
            units.push((summary, handle));
        }

        info!(
            launched = units.len(),
            skipped = skipped.len(),
            "dispatched readers"
        );
        DispatchHandle { units, skipped }
    }

    /// Dispatch and wait for every reader to finish.
    pub async fn dispatch_and_wait(&self, assignments: Vec<Assignment>) -> DispatchReport {
        self.dispatch(assignments).wait().await
    }
}

/// Running dispatch; either wait for it or let it run detached.
#[derive(Debug)]
pub struct DispatchHandle {
    units: Vec<(WorkerSummary, JoinHandle<WorkerStatus>)>,
    skipped: Vec<WorkerOutcome>,
}

impl DispatchHandle {
    /// Number of retrieval units started.
    pub fn launched(&self) -> usize {
        self.units.len()
    }

    /// Join every unit and collect all outcomes, including aborted units.
    pub async fn wait(self) -> DispatchReport {
        let mut outcomes = self.skipped;

        for (summary, handle) in self.units {
            let status = match handle.await {
                Ok(status) => status,
                Err(e) => {
                    error!(worker = summary.worker_id, error = %e, "dispatch task aborted");
                    WorkerStatus::Failed(DispatchError::Aborted {
                        worker: summary.worker_id,
                        reason: e.to_string(),
                    })
                }
            };
            outcomes.push(WorkerOutcome { summary, status });
        }

        DispatchReport::new(outcomes)
    }

    /// Let the units run in the background. Each still logs its outcome;
    /// nothing is reported back to the caller.
    pub fn detach(self) -> usize {
        let launched = self.units.len();
        info!(launched, "readers detached");
        launched
    }
}

/// Everything one reader's task owns.
struct Unit<R> {
    retriever: Arc<R>,
    assignment: Assignment,
    artifact_dir: Option<PathBuf>,
    deadline: Option<(Instant, Duration)>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<R: Retriever> Unit<R> {
    async fn run(mut self) -> WorkerStatus {
        let worker = self.assignment.worker_id();
        info!(
            worker,
            size = self.assignment.accumulated_size(),
            tapes = ?self.assignment.tapes(),
            files = self.assignment.file_count(),
            "starting retrieval"
        );

        let shutdown = self.shutdown.take();
        match self.retrieve(shutdown).await {
            Ok(()) => {
                info!(worker, "retrieval succeeded");
                WorkerStatus::Succeeded
            }
            Err(e) => {
                error!(
                    worker,
                    tapes = ?self.assignment.tapes(),
                    files = self.assignment.file_count(),
                    error = %e,
                    "retrieval failed"
                );
                WorkerStatus::Failed(e)
            }
        }
    }

    async fn retrieve(&self, shutdown: Option<watch::Receiver<bool>>) -> DispatchResult<()> {
        let worker = self.assignment.worker_id();
        let files = self.assignment.files().to_vec();
        let dir = self.artifact_dir.clone();

        let artifact = tokio::task::spawn_blocking(move || {
            FileListArtifact::write(worker, &files, dir.as_deref())
        })
        .await
        .map_err(|e| DispatchError::ArtifactIo {
            worker,
            source: std::io::Error::other(e.to_string()),
        })??;
        debug!(
            worker,
            path = %artifact.path().display(),
            lines = artifact.lines(),
            "wrote file list"
        );

        let retrieval = self.retriever.retrieve(worker, artifact.path());
        let bounded = async {
            match self.deadline {
                Some((at, after)) => tokio::time::timeout_at(at, retrieval)
                    .await
                    .unwrap_or(Err(DispatchError::TimedOut { worker, after })),
                None => retrieval.await,
            }
        };

        let result = tokio::select! {
            result = bounded => result,
            () = shutdown_requested(shutdown) => {
                warn!(worker, "shutdown requested; abandoning retrieval");
                Err(DispatchError::Cancelled { worker })
            }
        };

        debug!(worker, path = %artifact.path().display(), "removing file list");
        drop(artifact);
        result
    }
}

/// Resolves once `true` is observed on the channel; never resolves without
/// a channel or after the sender is gone.
async fn shutdown_requested(shutdown: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = shutdown else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}
