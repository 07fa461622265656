//! Process-wide logging, set up once by `main`.
//!
//! Console output goes to stderr so stdout stays clean for plan output.
//! A second layer writes to a file under `[logging].dir`, rotated daily.

use anyhow::Context;
use tapestage_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the subscriber. The returned guard flushes the file writer on
/// drop and must be held for the life of the process.
pub fn init(config: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.dir)
        .with_context(|| format!("failed to create log dir {}", config.dir.display()))?;

    let filter = build_filter(&config.level)?;

    let file_appender = tracing_appender::rolling::daily(&config.dir, &config.file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer().with_writer(std::io::stderr);
    let file_layer = fmt::layer().with_ansi(false).with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

/// `RUST_LOG` wins; otherwise the configured level applies to everything.
fn build_filter(level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid [logging].level: {level}")),
    }
}
