use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

mod commands;
mod logging;
mod report;

#[derive(Parser)]
#[command(
    name = "tapestage",
    about = "tapestage: balance tape-grouped files across parallel readers and stage them",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to tapestage.toml (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and print the reader assignments without staging anything
    Plan {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        balance: BalanceArgs,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Balance the workload and run one staging command per reader
    Stage {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        balance: BalanceArgs,
        /// Abort readers still running after this many seconds
        #[arg(long)]
        deadline: Option<u64>,
    },
}

/// Where the workload comes from. At most one; the current directory is
/// listed when none is given.
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct InputArgs {
    /// File containing files to stage (absolute path)
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Directory containing files to stage, listed recursively
    #[arg(long)]
    pub folder: Option<PathBuf>,
    /// Previously captured listing output
    #[arg(long)]
    pub listing: Option<PathBuf>,
    /// JSON workload: {"<tape>": {"total_size": n, "files": [...]}}
    #[arg(long)]
    pub workload: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct BalanceArgs {
    /// Number of parallel readers (bounded by [readers].max)
    #[arg(short = 'n', long = "readers", allow_negative_numbers = true)]
    pub readers: Option<i64>,
    /// Placement strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
    /// Per-reader size budget in bytes (size-budget strategy)
    #[arg(long)]
    pub max_worker_size: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    LeastLoaded,
    SizeBudget,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = tapestage_core::StageConfig::load(cli.config.as_deref())?;
    let _log_guard = logging::init(&config.logging)?;

    info!(
        user = %std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
        "tapestage started"
    );

    match cli.command {
        Commands::Plan {
            input,
            balance,
            format,
        } => commands::plan::plan(&config, &input, &balance, &format),
        Commands::Stage {
            input,
            balance,
            deadline,
        } => commands::stage::stage(&config, &input, &balance, deadline).await,
    }
}
