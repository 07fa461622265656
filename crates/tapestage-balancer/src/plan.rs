//! Balance plan: the balancer's output.

use serde::Serialize;

use crate::assignment::Assignment;

/// One assignment per reader, indexed `0..N`, plus summary figures.
#[derive(Debug, Clone, Serialize)]
pub struct BalancePlan {
    assignments: Vec<Assignment>,
    total_size: u64,
    largest_group: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    budget: Option<u64>,
}

impl BalancePlan {
    pub(crate) fn new(
        assignments: Vec<Assignment>,
        total_size: u64,
        largest_group: u64,
        budget: Option<u64>,
    ) -> Self {
        Self {
            assignments,
            total_size,
            largest_group,
            budget,
        }
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Hand the assignments over to a consumer (the dispatcher).
    pub fn into_assignments(self) -> Vec<Assignment> {
        self.assignments
    }

    pub fn worker_count(&self) -> usize {
        self.assignments.len()
    }

    /// Size of the whole workload.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Size of the biggest single tape group placed.
    pub fn largest_group(&self) -> u64 {
        self.largest_group
    }

    /// Per-reader budget in size-budget mode.
    pub fn budget(&self) -> Option<u64> {
        self.budget
    }

    pub fn file_count(&self) -> usize {
        self.assignments.iter().map(Assignment::file_count).sum()
    }

    /// Readers that ended up with nothing to do.
    pub fn idle_workers(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(|a| a.is_empty())
    }

    /// Readers whose accumulated size exceeds the budget.
    pub fn over_budget(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(|a| a.is_over_budget())
    }

    /// Largest minus smallest accumulated size across readers.
    pub fn imbalance(&self) -> u64 {
        let sizes = self.assignments.iter().map(Assignment::accumulated_size);
        let max = sizes.clone().max().unwrap_or(0);
        let min = sizes.min().unwrap_or(0);
        max - min
    }
}
