pub mod plan;
pub mod stage;

use std::path::Path;

use anyhow::{Context, bail};
use tapestage_balancer::{BalanceError, BalancePlan, BalanceStrategy, WorkerCount, balance};
use tapestage_core::{StageConfig, Workload};
use tapestage_listing::ListingSource;

use crate::{BalanceArgs, InputArgs, StrategyArg};

/// Collect the workload from whichever input was given.
pub fn load_workload(config: &StageConfig, input: &InputArgs) -> anyhow::Result<Workload> {
    if let Some(path) = &input.workload {
        return read_workload_json(path);
    }

    let source = if let Some(file) = &input.file {
        ListingSource::File(file.clone())
    } else if let Some(folder) = &input.folder {
        ListingSource::Folder(folder.clone())
    } else if let Some(listing) = &input.listing {
        ListingSource::Captured(listing.clone())
    } else {
        ListingSource::CurrentDir
    };

    tapestage_listing::load_workload(&source, &config.listing)
        .with_context(|| format!("failed to collect files to stage from {source:?}"))
}

fn read_workload_json(path: &Path) -> anyhow::Result<Workload> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read workload {}", path.display()))?;
    Workload::from_json(&json).map_err(|e| BalanceError::InvalidConfiguration(e.to_string()).into())
}

/// Reader count from the command line or config, bounded by `[readers].max`.
pub fn worker_count(config: &StageConfig, args: &BalanceArgs) -> anyhow::Result<WorkerCount> {
    let requested = args.readers.unwrap_or(i64::from(config.readers.count));
    let count = WorkerCount::try_from(requested)?;
    if count.get() > config.readers.max as usize {
        bail!(BalanceError::InvalidConfiguration(format!(
            "at most {} readers allowed, got {count}",
            config.readers.max
        )));
    }
    Ok(count)
}

/// Strategy from config, with command-line overrides applied.
pub fn strategy(config: &StageConfig, args: &BalanceArgs) -> BalanceStrategy {
    let configured = BalanceStrategy::from(&config.balance);
    let budget = args
        .max_worker_size
        .or_else(|| match configured {
            BalanceStrategy::SizeBudget { max_worker_size } => max_worker_size,
            BalanceStrategy::LeastLoaded => None,
        });

    match args.strategy {
        Some(StrategyArg::LeastLoaded) => BalanceStrategy::LeastLoaded,
        Some(StrategyArg::SizeBudget) => BalanceStrategy::SizeBudget {
            max_worker_size: budget,
        },
        None => match configured {
            BalanceStrategy::SizeBudget { .. } => BalanceStrategy::SizeBudget {
                max_worker_size: budget,
            },
            BalanceStrategy::LeastLoaded => BalanceStrategy::LeastLoaded,
        },
    }
}

/// Validate settings, collect the workload, and balance it.
///
/// The reader count is checked before any listing is run.
pub fn build_plan(
    config: &StageConfig,
    input: &InputArgs,
    args: &BalanceArgs,
) -> anyhow::Result<BalancePlan> {
    let workers = worker_count(config, args)?;
    let strategy = strategy(config, args);
    let workload = load_workload(config, input)?;
    Ok(balance(&workload, workers, &strategy)?)
}
