//! Workload types shared by the listing adapter, balancer, and dispatcher.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All files that live on one tape, plus their combined size.
///
/// The tape identifier is the key under which the group is stored in a
/// [`Workload`]. A group is never split across workers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeGroup {
    /// Sum of the sizes of `files`, in bytes.
    pub total_size: u64,
    /// Member file paths, in discovery order.
    pub files: Vec<String>,
}

impl TapeGroup {
    pub fn new(total_size: u64, files: Vec<String>) -> Self {
        Self { total_size, files }
    }
}

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("tape group with empty identifier")]
    EmptyTapeId,
    #[error("tape group {0} has no files")]
    EmptyTape(String),
    #[error("malformed workload: {0}")]
    Malformed(String),
}

/// Normalized mapping of tape identifier to [`TapeGroup`].
///
/// Iteration order is unspecified; consumers that need a stable order
/// (the balancer) establish one themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workload {
    tapes: HashMap<String, TapeGroup>,
}

impl Workload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON form: `{ "<tape>": { "total_size": n, "files": [..] } }`.
    pub fn from_json(json: &str) -> Result<Self, WorkloadError> {
        serde_json::from_str(json).map_err(|e| WorkloadError::Malformed(e.to_string()))
    }

    /// Record one discovered file on `tape`, creating the group on first sight.
    ///
    /// Fails without modifying the workload if the tape's size would overflow.
    pub fn add_file(
        &mut self,
        tape: &str,
        file: impl Into<String>,
        size: u64,
    ) -> Result<(), WorkloadError> {
        let group = self.tapes.entry(tape.to_string()).or_default();
        let total_size = group.total_size.checked_add(size).ok_or_else(|| {
            WorkloadError::Malformed(format!("size of tape group {tape} overflows u64"))
        })?;
        group.total_size = total_size;
        group.files.push(file.into());
        Ok(())
    }

    /// Insert a whole group, replacing any existing group with the same id.
    pub fn insert(&mut self, tape: impl Into<String>, group: TapeGroup) {
        self.tapes.insert(tape.into(), group);
    }

    pub fn get(&self, tape: &str) -> Option<&TapeGroup> {
        self.tapes.get(tape)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &TapeGroup)> {
        self.tapes.iter().map(|(id, group)| (id.as_str(), group))
    }

    pub fn tape_count(&self) -> usize {
        self.tapes.len()
    }

    pub fn file_count(&self) -> usize {
        self.tapes.values().map(|g| g.files.len()).sum()
    }

    /// Combined size of every group, saturating at `u64::MAX`.
    ///
    /// [`validate`](Self::validate) rejects workloads where this saturates.
    pub fn total_size(&self) -> u64 {
        self.tapes
            .values()
            .fold(0u64, |acc, g| acc.saturating_add(g.total_size))
    }

    fn checked_total_size(&self) -> Option<u64> {
        self.tapes
            .values()
            .try_fold(0u64, |acc, g| acc.checked_add(g.total_size))
    }

    pub fn is_empty(&self) -> bool {
        self.tapes.is_empty()
    }

    /// Check that every included tape has an identifier and at least one
    /// file, and that the combined size fits in a `u64`.
    pub fn validate(&self) -> Result<(), WorkloadError> {
        for (id, group) in &self.tapes {
            if id.trim().is_empty() {
                return Err(WorkloadError::EmptyTapeId);
            }
            if group.files.is_empty() {
                return Err(WorkloadError::EmptyTape(id.clone()));
            }
        }
        if self.checked_total_size().is_none() {
            return Err(WorkloadError::Malformed(
                "combined tape group size overflows u64".into(),
            ));
        }
        Ok(())
    }
}

impl FromIterator<(String, TapeGroup)> for Workload {
    fn from_iter<I: IntoIterator<Item = (String, TapeGroup)>>(iter: I) -> Self {
        Self {
            tapes: iter.into_iter().collect(),
        }
    }
}
