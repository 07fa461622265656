//! Dispatcher error types.
//!
//! Every variant is scoped to one reader; none of them stops the others.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("reader {worker}: failed to write file list: {source}")]
    ArtifactIo {
        worker: usize,
        source: std::io::Error,
    },

    #[error("reader {worker}: failed to start {program}: {source}")]
    Spawn {
        worker: usize,
        program: String,
        source: std::io::Error,
    },

    #[error("reader {worker}: {program} failed with {status}")]
    CommandFailed {
        worker: usize,
        program: String,
        status: String,
    },

    #[error("reader {worker}: deadline of {after:?} elapsed")]
    TimedOut { worker: usize, after: Duration },

    #[error("reader {worker}: cancelled by shutdown signal")]
    Cancelled { worker: usize },

    #[error("reader {worker}: dispatch task aborted: {reason}")]
    Aborted { worker: usize, reason: String },
}

pub type DispatchResult<T> = Result<T, DispatchError>;
