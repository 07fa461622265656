//! Listing sources: where the listing text comes from.

use std::path::{Path, PathBuf};
use std::process::Command;

use tapestage_core::config::{ListingConfig, PATH_PLACEHOLDER};
use tapestage_core::Workload;
use tracing::{debug, info, warn};

use crate::error::{ListingError, ListingResult};
use crate::parse::parse_listing;

/// What to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    /// A file containing the paths to stage (`file_args`).
    File(PathBuf),
    /// A folder, listed recursively (`folder_args`).
    Folder(PathBuf),
    /// The current working directory, listed recursively.
    CurrentDir,
    /// Listing text captured earlier and saved to disk; no tool is run.
    Captured(PathBuf),
}

/// Substitute `{path}` into an argument template.
fn expand_args(template: &[String], path: &Path) -> Vec<String> {
    let path = path.to_string_lossy();
    template
        .iter()
        .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
        .collect()
}

fn run_lister(config: &ListingConfig, args: &[String]) -> ListingResult<String> {
    debug!(program = %config.program, ?args, "running listing program");

    let output = Command::new(&config.program)
        .args(args)
        .output()
        .map_err(|source| ListingError::Spawn {
            program: config.program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ListingError::Failed {
            program: config.program.clone(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Produce the raw listing text for `source`.
///
/// Fails with [`ListingError::NoFiles`] when the listing is blank.
pub fn fetch_listing(source: &ListingSource, config: &ListingConfig) -> ListingResult<String> {
    let text = match source {
        ListingSource::File(path) => {
            info!(file = %path.display(), "listing files from file");
            run_lister(config, &expand_args(&config.file_args, path))?
        }
        ListingSource::Folder(path) => {
            info!(folder = %path.display(), "listing files from folder");
            run_lister(config, &expand_args(&config.folder_args, path))?
        }
        ListingSource::CurrentDir => {
            let cwd = std::env::current_dir().map_err(|source| ListingError::Read {
                path: PathBuf::from("."),
                source,
            })?;
            info!(folder = %cwd.display(), "listing files from current folder");
            run_lister(config, &expand_args(&config.folder_args, &cwd))?
        }
        ListingSource::Captured(path) => {
            info!(listing = %path.display(), "reading captured listing");
            std::fs::read_to_string(path).map_err(|source| ListingError::Read {
                path: path.clone(),
                source,
            })?
        }
    };

    if text.trim().is_empty() {
        return Err(ListingError::NoFiles);
    }
    Ok(text)
}

/// Fetch and parse a listing into a workload.
pub fn load_workload(source: &ListingSource, config: &ListingConfig) -> ListingResult<Workload> {
    let text = fetch_listing(source, config)?;
    let workload = parse_listing(&text, config.format)?;
    if workload.is_empty() {
        warn!(?source, "listing contained no recognizable file lines");
    }
    Ok(workload)
}
