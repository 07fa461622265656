//! Placement engine: assigns whole tape groups to readers.
//!
//! 1. Order tape groups by descending size (ties by identifier)
//! 2. For each group, pick the reader with the smallest accumulated size
//!    (ties to the lowest index) and place the group there
//! 3. In size-budget mode, check the chosen reader for room first; a group
//!    that fits nowhere is placed anyway and logged

use std::fmt;
use std::num::NonZeroUsize;

use tapestage_core::config::{BalanceConfig, StrategyKind};
use tapestage_core::{TapeGroup, Workload};
use tracing::{debug, info, warn};

use crate::assignment::Assignment;
use crate::error::{BalanceError, BalanceResult};
use crate::plan::BalancePlan;

/// A validated, positive number of readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for WorkerCount {
    type Error = BalanceError;

    fn try_from(n: usize) -> BalanceResult<Self> {
        NonZeroUsize::new(n).map(WorkerCount).ok_or_else(|| {
            BalanceError::InvalidConfiguration("worker count must be positive, got 0".into())
        })
    }
}

impl TryFrom<i64> for WorkerCount {
    type Error = BalanceError;

    fn try_from(n: i64) -> BalanceResult<Self> {
        let n = usize::try_from(n).map_err(|_| {
            BalanceError::InvalidConfiguration(format!(
                "worker count must be positive, got {n}"
            ))
        })?;
        Self::try_from(n)
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How reader capacity is treated during placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BalanceStrategy {
    /// Plain least-loaded placement, no capacity notion.
    #[default]
    LeastLoaded,
    /// Least-loaded placement with a soft per-reader size budget.
    /// `None` derives the budget as total size / reader count.
    SizeBudget { max_worker_size: Option<u64> },
}

impl From<&BalanceConfig> for BalanceStrategy {
    fn from(config: &BalanceConfig) -> Self {
        match config.strategy {
            StrategyKind::LeastLoaded => BalanceStrategy::LeastLoaded,
            StrategyKind::SizeBudget => BalanceStrategy::SizeBudget {
                max_worker_size: (config.max_worker_size > 0).then_some(config.max_worker_size),
            },
        }
    }
}

/// Tape groups in processing order: largest first, ties by identifier.
pub fn ordered_groups(workload: &Workload) -> Vec<(&str, &TapeGroup)> {
    let mut groups: Vec<(&str, &TapeGroup)> = workload.groups().collect();
    groups.sort_by(|a, b| {
        b.1.total_size
            .cmp(&a.1.total_size)
            .then_with(|| a.0.cmp(b.0))
    });
    groups
}

/// Index of the reader with the smallest accumulated size, lowest index on ties.
fn least_loaded(assignments: &[Assignment]) -> usize {
    assignments
        .iter()
        .min_by_key(|a| (a.accumulated_size(), a.worker_id()))
        .map(Assignment::worker_id)
        .unwrap_or(0)
}

/// Compute a balanced plan for `workload` across `workers` readers.
///
/// Never fails for a valid workload: an oversized tape group still lands
/// whole on one reader, skewing the plan rather than rejecting it.
pub fn balance(
    workload: &Workload,
    workers: WorkerCount,
    strategy: &BalanceStrategy,
) -> BalanceResult<BalancePlan> {
    workload.validate()?;

    let total_size = workload.total_size();
    let budget = match *strategy {
        BalanceStrategy::LeastLoaded => None,
        BalanceStrategy::SizeBudget { max_worker_size } => {
            Some(max_worker_size.unwrap_or(total_size / workers.get() as u64))
        }
    };

    let mut assignments: Vec<Assignment> = (0..workers.get())
        .map(|id| Assignment::new(id, budget))
        .collect();
    debug!(workers = %workers, ?budget, "readers initialized");

    let mut largest_group = 0;
    for (tape, group) in ordered_groups(workload) {
        largest_group = largest_group.max(group.total_size);
        let target = least_loaded(&assignments);
        let reader = &mut assignments[target];

        if !reader.has_room_for(group.total_size) {
            // The least-loaded reader has the most room, so nobody fits it.
            warn!(
                tape,
                size = group.total_size,
                worker = target,
                current = reader.accumulated_size(),
                ?budget,
                "tape group exceeds every reader's remaining budget; placing anyway"
            );
        }

        reader.place(tape, group);
        debug!(
            tape,
            size = group.total_size,
            files = group.files.len(),
            worker = target,
            accumulated = reader.accumulated_size(),
            "placed tape group"
        );
    }

    let plan = BalancePlan::new(assignments, total_size, largest_group, budget);
    info!(
        workers = %workers,
        tapes = workload.tape_count(),
        files = workload.file_count(),
        total_size,
        imbalance = plan.imbalance(),
        "balanced workload"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn workload(groups: &[(&str, u64, &[&str])]) -> Workload {
        groups
            .iter()
            .map(|(id, size, files)| {
                (
                    id.to_string(),
                    TapeGroup::new(*size, files.iter().map(|f| f.to_string()).collect()),
                )
            })
            .collect()
    }

    fn workers(n: usize) -> WorkerCount {
        WorkerCount::try_from(n).unwrap()
    }

    /// Deterministic pseudo-random workload: `tapes` groups, 1..=4 files each.
    fn generated(tapes: usize, seed: u64, min: u64, max: u64) -> Workload {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            state >> 33
        };
        let mut w = Workload::new();
        for t in 0..tapes {
            let file_count = 1 + next() % 4;
            let files = (0..file_count).map(|f| format!("/arch/t{t}/f{f}.tar")).collect();
            let size = min + next() % (max - min + 1);
            w.insert(format!("TAPE{t:04}"), TapeGroup::new(size, files));
        }
        w
    }

    #[test]
    fn zero_workers_is_invalid() {
        assert!(matches!(
            WorkerCount::try_from(0usize),
            Err(BalanceError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn negative_workers_is_invalid() {
        let err = WorkerCount::try_from(-3i64).unwrap_err();
        assert!(err.to_string().contains("-3"));
        assert!(WorkerCount::try_from(4i64).is_ok());
    }

    #[test]
    fn overflowing_total_size_is_invalid() {
        let w = Workload::from_json(
            r#"{
                "A": { "total_size": 18446744073709551615, "files": ["a"] },
                "B": { "total_size": 1, "files": ["b"] }
            }"#,
        )
        .unwrap();

        let err = balance(&w, workers(2), &BalanceStrategy::LeastLoaded).unwrap_err();
        assert!(matches!(err, BalanceError::InvalidConfiguration(_)));
    }

    #[test]
    fn largest_representable_total_is_placed() {
        let w = workload(&[("A", u64::MAX - 1, &["a"]), ("B", 1, &["b"])]);
        let plan = balance(&w, workers(1), &BalanceStrategy::LeastLoaded).unwrap();

        assert_eq!(plan.total_size(), u64::MAX);
        assert_eq!(plan.assignments()[0].accumulated_size(), u64::MAX);
    }

    #[test]
    fn empty_workload_yields_empty_assignments() {
        let plan = balance(&Workload::new(), workers(3), &BalanceStrategy::LeastLoaded).unwrap();

        assert_eq!(plan.assignments().len(), 3);
        for (i, a) in plan.assignments().iter().enumerate() {
            assert_eq!(a.worker_id(), i);
            assert_eq!(a.accumulated_size(), 0);
            assert!(a.files().is_empty());
        }
    }

    #[test]
    fn single_tape_lands_whole_on_first_worker() {
        let w = workload(&[("T1", 100, &["a", "b"])]);
        let plan = balance(&w, workers(2), &BalanceStrategy::LeastLoaded).unwrap();

        let a = &plan.assignments()[0];
        assert_eq!(a.files(), ["a", "b"]);
        assert_eq!(a.accumulated_size(), 100);
        assert!(plan.assignments()[1].is_empty());
        assert_eq!(plan.assignments()[1].accumulated_size(), 0);
    }

    #[test]
    fn greedy_places_on_least_loaded() {
        let w = workload(&[
            ("T3", 20, &["t3"]),
            ("T1", 50, &["t1"]),
            ("T2", 30, &["t2"]),
        ]);
        let plan = balance(&w, workers(2), &BalanceStrategy::LeastLoaded).unwrap();

        let [w0, w1] = plan.assignments() else {
            panic!("expected two assignments");
        };
        assert_eq!(w0.tapes(), ["T1"]);
        assert_eq!(w0.accumulated_size(), 50);
        assert_eq!(w1.tapes(), ["T2", "T3"]);
        assert_eq!(w1.accumulated_size(), 50);
        assert_eq!(plan.imbalance(), 0);
    }

    #[test]
    fn equal_sizes_ordered_by_id_and_lowest_index() {
        let w = workload(&[("B", 10, &["b"]), ("A", 10, &["a"]), ("C", 10, &["c"])]);
        let plan = balance(&w, workers(2), &BalanceStrategy::LeastLoaded).unwrap();

        assert_eq!(plan.assignments()[0].tapes(), ["A", "C"]);
        assert_eq!(plan.assignments()[1].tapes(), ["B"]);
    }

    #[test]
    fn ordered_groups_descending_then_by_id() {
        let w = workload(&[("T2", 5, &["x"]), ("T1", 5, &["y"]), ("T0", 9, &["z"])]);
        let ids: Vec<&str> = ordered_groups(&w).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["T0", "T1", "T2"]);
    }

    #[test]
    fn partition_is_complete_and_atomic() {
        let w = generated(40, 7, 1, 1_000);
        let plan = balance(&w, workers(4), &BalanceStrategy::LeastLoaded).unwrap();

        let mut seen = HashSet::new();
        for a in plan.assignments() {
            for f in a.files() {
                assert!(seen.insert(f.clone()), "file {f} placed twice");
            }
        }
        let expected: HashSet<String> =
            w.groups().flat_map(|(_, g)| g.files.iter().cloned()).collect();
        assert_eq!(seen, expected);

        for (tape, group) in w.groups() {
            let holders: Vec<&Assignment> = plan
                .assignments()
                .iter()
                .filter(|a| a.tapes().iter().any(|t| t == tape))
                .collect();
            assert_eq!(holders.len(), 1, "tape {tape} must be on exactly one reader");
            assert!(group.files.iter().all(|f| holders[0].files().contains(f)));
        }
    }

    #[test]
    fn accumulated_size_matches_placed_groups() {
        let w = generated(25, 11, 10, 500);
        let plan = balance(&w, workers(3), &BalanceStrategy::LeastLoaded).unwrap();

        for a in plan.assignments() {
            let sum: u64 = a.tapes().iter().map(|t| w.get(t).unwrap().total_size).sum();
            assert_eq!(a.accumulated_size(), sum);
        }
        assert_eq!(plan.total_size(), w.total_size());
    }

    #[test]
    fn spread_bounded_by_largest_group() {
        for seed in 1..20 {
            let w = generated(30, seed, 100, 300);
            for n in 1..=8 {
                let plan = balance(&w, workers(n), &BalanceStrategy::LeastLoaded).unwrap();
                assert!(
                    plan.imbalance() <= plan.largest_group(),
                    "seed {seed}, n {n}: imbalance {} > largest {}",
                    plan.imbalance(),
                    plan.largest_group()
                );
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let w = generated(50, 3, 1, 10_000);
        let first = balance(&w, workers(4), &BalanceStrategy::LeastLoaded).unwrap();
        // Rebuild the map so hash iteration order can differ.
        let rebuilt: Workload = w
            .groups()
            .map(|(id, g)| (id.to_string(), g.clone()))
            .collect();
        let second = balance(&rebuilt, workers(4), &BalanceStrategy::LeastLoaded).unwrap();

        assert_eq!(first.assignments(), second.assignments());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn oversized_tape_is_placed_whole() {
        let w = workload(&[("BIG", 1_000, &["big"]), ("S1", 10, &["s1"]), ("S2", 10, &["s2"])]);
        let plan = balance(&w, workers(3), &BalanceStrategy::LeastLoaded).unwrap();

        assert_eq!(plan.assignments()[0].tapes(), ["BIG"]);
        assert_eq!(plan.assignments()[1].tapes(), ["S1"]);
        assert_eq!(plan.assignments()[2].tapes(), ["S2"]);
    }

    #[test]
    fn rejects_tape_without_files() {
        let w = workload(&[("T1", 10, &[])]);
        let err = balance(&w, workers(2), &BalanceStrategy::LeastLoaded).unwrap_err();
        assert!(matches!(err, BalanceError::InvalidConfiguration(_)));
    }

    #[test]
    fn size_budget_derives_total_over_n() {
        let w = workload(&[("T1", 60, &["a"]), ("T2", 40, &["b"]), ("T3", 20, &["c"])]);
        let strategy = BalanceStrategy::SizeBudget { max_worker_size: None };
        let plan = balance(&w, workers(2), &strategy).unwrap();

        assert_eq!(plan.budget(), Some(60));
        assert!(plan.assignments().iter().all(|a| a.size_budget() == Some(60)));
        // Same placement as least-loaded: T1→0, T2→1, T3→1.
        assert_eq!(plan.assignments()[0].tapes(), ["T1"]);
        assert_eq!(plan.assignments()[1].tapes(), ["T2", "T3"]);
        assert_eq!(plan.assignments()[0].usage_percent(), Some(100));
    }

    #[test]
    fn size_budget_overflow_is_placed_not_rejected() {
        let w = workload(&[("BIG", 500, &["big"]), ("T1", 10, &["a"])]);
        let strategy = BalanceStrategy::SizeBudget { max_worker_size: Some(100) };
        let plan = balance(&w, workers(2), &strategy).unwrap();

        let big = &plan.assignments()[0];
        assert_eq!(big.tapes(), ["BIG"]);
        assert!(big.is_over_budget());
        assert_eq!(plan.over_budget().count(), 1);
        assert_eq!(plan.assignments()[1].tapes(), ["T1"]);
    }

    #[test]
    fn strategy_from_config() {
        let config = BalanceConfig {
            strategy: StrategyKind::SizeBudget,
            max_worker_size: 0,
        };
        assert_eq!(
            BalanceStrategy::from(&config),
            BalanceStrategy::SizeBudget { max_worker_size: None }
        );

        let config = BalanceConfig {
            strategy: StrategyKind::SizeBudget,
            max_worker_size: 512,
        };
        assert_eq!(
            BalanceStrategy::from(&config),
            BalanceStrategy::SizeBudget { max_worker_size: Some(512) }
        );
        assert_eq!(
            BalanceStrategy::from(&BalanceConfig::default()),
            BalanceStrategy::LeastLoaded
        );
    }
}
