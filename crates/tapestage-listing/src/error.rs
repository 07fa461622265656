//! Listing error types.

use std::path::PathBuf;

use tapestage_core::WorkloadError;
use thiserror::Error;

pub type ListingResult<T> = Result<T, ListingError>;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("failed to start listing program {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("listing program {program} exited with code {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to read listing {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no files to stage")]
    NoFiles,

    #[error("invalid line pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Workload(#[from] WorkloadError),
}
