//! Retrieval seam: the external command run once per reader.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use tapestage_core::config::{LIST_PLACEHOLDER, StageCommandConfig};
use tokio::process::Command;
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};

/// Runs the retrieval for one reader, given the path of its file list.
///
/// `Ok(())` means the retrieval succeeded; anything else is that reader's
/// failure only.
pub trait Retriever: Send + Sync + 'static {
    fn retrieve(
        &self,
        worker: usize,
        file_list: &Path,
    ) -> impl Future<Output = DispatchResult<()>> + Send;
}

/// Runs a configured program, e.g. `ghi_stage -v -f {list}`.
///
/// The child is killed if the dispatch task is dropped before it exits
/// (deadline, shutdown, abort).
#[derive(Debug, Clone)]
pub struct CommandRetriever {
    program: String,
    args: Vec<String>,
}

impl CommandRetriever {
    /// `args` may contain `{list}`; it is appended when absent.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let config = StageCommandConfig {
            program: program.into(),
            args,
            ..Default::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &StageCommandConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args_with_list(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument list with `{list}` replaced by `file_list`.
    pub fn args_for(&self, file_list: &Path) -> Vec<String> {
        let list = file_list.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace(LIST_PLACEHOLDER, &list))
            .collect()
    }
}

impl Retriever for CommandRetriever {
    async fn retrieve(&self, worker: usize, file_list: &Path) -> DispatchResult<()> {
        let args = self.args_for(file_list);
        debug!(worker, program = %self.program, ?args, "starting retrieval command");

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| DispatchError::Spawn {
                worker,
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(DispatchError::CommandFailed {
                worker,
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
