//! Per-reader assignment record.

use serde::Serialize;
use tapestage_core::TapeGroup;

/// The share of the workload placed on one reader.
///
/// Only the balancer mutates an assignment. Once a plan is handed out,
/// consumers see it through the read-only accessors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    worker_id: usize,
    /// Sum of `total_size` over the placed tape groups.
    accumulated_size: u64,
    /// Placed tape identifiers, in placement order.
    tapes: Vec<String>,
    /// Concatenation of the placed groups' files, in placement order.
    files: Vec<String>,
    /// Soft per-reader cap in size-budget mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    size_budget: Option<u64>,
}

impl Assignment {
    pub(crate) fn new(worker_id: usize, size_budget: Option<u64>) -> Self {
        Self {
            worker_id,
            accumulated_size: 0,
            tapes: Vec::new(),
            files: Vec::new(),
            size_budget,
        }
    }

    pub(crate) fn place(&mut self, tape: &str, group: &TapeGroup) {
        self.tapes.push(tape.to_string());
        self.files.extend(group.files.iter().cloned());
        self.accumulated_size += group.total_size;
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn accumulated_size(&self) -> u64 {
        self.accumulated_size
    }

    pub fn tapes(&self) -> &[String] {
        &self.tapes
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// True when nothing was placed on this reader.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn size_budget(&self) -> Option<u64> {
        self.size_budget
    }

    /// Whether `size` more bytes still fit strictly under the budget.
    ///
    /// Always true without a budget.
    pub fn has_room_for(&self, size: u64) -> bool {
        match self.size_budget {
            Some(budget) => self.accumulated_size.saturating_add(size) < budget,
            None => true,
        }
    }

    /// Load as an integer percentage of the budget. `None` without a
    /// budget or when the budget is zero.
    pub fn usage_percent(&self) -> Option<u64> {
        match self.size_budget {
            Some(budget) if budget > 0 => {
                Some((u128::from(self.accumulated_size) * 100 / u128::from(budget)) as u64)
            }
            _ => None,
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.size_budget
            .is_some_and(|budget| self.accumulated_size > budget)
    }
}
