//! Balancer error types.

use tapestage_core::WorkloadError;
use thiserror::Error;

/// Errors that abort balancing before any dispatch begins.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<WorkloadError> for BalanceError {
    fn from(e: WorkloadError) -> Self {
        BalanceError::InvalidConfiguration(e.to_string())
    }
}

pub type BalanceResult<T> = Result<T, BalanceError>;
