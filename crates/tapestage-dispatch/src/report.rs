//! Per-reader dispatch outcomes.

use tapestage_balancer::Assignment;

use crate::error::DispatchError;

/// What a reader was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub tapes: Vec<String>,
    pub file_count: usize,
    pub accumulated_size: u64,
}

impl From<&Assignment> for WorkerSummary {
    fn from(a: &Assignment) -> Self {
        Self {
            worker_id: a.worker_id(),
            tapes: a.tapes().to_vec(),
            file_count: a.file_count(),
            accumulated_size: a.accumulated_size(),
        }
    }
}

#[derive(Debug)]
pub enum WorkerStatus {
    /// The retrieval command exited with status 0.
    Succeeded,
    /// Nothing was assigned; no command was run.
    Skipped,
    Failed(DispatchError),
}

#[derive(Debug)]
pub struct WorkerOutcome {
    pub summary: WorkerSummary,
    pub status: WorkerStatus,
}

impl WorkerOutcome {
    pub fn worker_id(&self) -> usize {
        self.summary.worker_id
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, WorkerStatus::Failed(_))
    }
}

/// Outcomes of one dispatch, ordered by reader index.
#[derive(Debug, Default)]
pub struct DispatchReport {
    outcomes: Vec<WorkerOutcome>,
}

impl DispatchReport {
    pub fn new(mut outcomes: Vec<WorkerOutcome>) -> Self {
        outcomes.sort_by_key(WorkerOutcome::worker_id);
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[WorkerOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, worker_id: usize) -> Option<&WorkerOutcome> {
        self.outcomes.iter().find(|o| o.worker_id() == worker_id)
    }

    /// True when no reader failed. Skipped readers count as fine.
    pub fn all_succeeded(&self) -> bool {
        !self.outcomes.iter().any(WorkerOutcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &WorkerOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &WorkerOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, WorkerStatus::Succeeded))
    }

    /// Number of readers for which a retrieval was attempted.
    pub fn launched(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, WorkerStatus::Skipped))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(worker_id: usize, status: WorkerStatus) -> WorkerOutcome {
        WorkerOutcome {
            summary: WorkerSummary {
                worker_id,
                tapes: vec![format!("T{worker_id}")],
                file_count: 1,
                accumulated_size: 10,
            },
            status,
        }
    }

    #[test]
    fn sorted_by_worker_and_counted() {
        let report = DispatchReport::new(vec![
            outcome(2, WorkerStatus::Skipped),
            outcome(0, WorkerStatus::Succeeded),
            outcome(
                1,
                WorkerStatus::Failed(DispatchError::Cancelled { worker: 1 }),
            ),
        ]);

        let ids: Vec<usize> = report.outcomes().iter().map(WorkerOutcome::worker_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.launched(), 2);
        assert!(report.outcome(1).unwrap().is_failure());
    }

    #[test]
    fn skipped_only_is_success() {
        let report = DispatchReport::new(vec![
            outcome(0, WorkerStatus::Skipped),
            outcome(1, WorkerStatus::Skipped),
        ]);
        assert!(report.all_succeeded());
        assert_eq!(report.launched(), 0);
    }
}
