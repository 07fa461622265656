//! `tapestage stage`: balance, then run one staging command per reader.
//!
//! Always waits for every reader: the retrieval commands are children of
//! this process and would be killed if it exited early.

use std::time::Duration;

use anyhow::bail;
use tapestage_core::StageConfig;
use tapestage_dispatch::{CommandRetriever, Dispatcher};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::report::{format_plan, format_report};
use crate::{BalanceArgs, InputArgs};

pub async fn stage(
    config: &StageConfig,
    input: &InputArgs,
    args: &BalanceArgs,
    deadline: Option<u64>,
) -> anyhow::Result<()> {
    let plan = super::build_plan(config, input, args)?;
    print!("{}", format_plan(&plan, false));

    let idle: Vec<usize> = plan.idle_workers().map(|a| a.worker_id()).collect();
    if !idle.is_empty() {
        info!(readers = ?idle, "readers with no files will not be started");
    }

    let retriever = CommandRetriever::from_config(&config.stage);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut dispatcher = Dispatcher::new(retriever).with_shutdown(shutdown_rx);

    let deadline_secs = deadline.unwrap_or(config.stage.deadline_secs);
    if deadline_secs > 0 {
        dispatcher = dispatcher.with_deadline(Duration::from_secs(deadline_secs));
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling readers");
            let _ = shutdown_tx.send(true);
        }
    });

    info!(
        program = %config.stage.program,
        readers = plan.worker_count(),
        deadline_secs,
        "staging"
    );
    let report = dispatcher.dispatch_and_wait(plan.into_assignments()).await;
    print!("{}", format_report(&report));

    let failed = report.failures().count();
    if failed > 0 {
        bail!("{failed} of {} readers failed", report.launched());
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn workload_input(dir: &std::path::Path) -> InputArgs {
        let path = dir.join("workload.json");
        fs::write(
            &path,
            r#"{
                "T1": { "total_size": 50, "files": ["/arch/a.tar"] },
                "T2": { "total_size": 30, "files": ["/arch/b.tar"] }
            }"#,
        )
        .unwrap();
        InputArgs {
            workload: Some(path),
            ..Default::default()
        }
    }

    fn args(readers: i64) -> BalanceArgs {
        BalanceArgs {
            readers: Some(readers),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn succeeds_when_every_reader_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StageConfig::default();
        config.stage.program = "true".into();

        stage(&config, &workload_input(dir.path()), &args(3), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fails_when_any_reader_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StageConfig::default();
        config.stage.program = "sh".into();
        config.stage.args = vec!["-c".into(), "! grep -q b.tar \"$0\"".into(), "{list}".into()];

        let err = stage(&config, &workload_input(dir.path()), &args(2), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 readers failed");
    }
}
