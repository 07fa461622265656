//! `tapestage plan`: print the reader assignments, stage nothing.

use tapestage_core::StageConfig;

use crate::report::format_plan;
use crate::{BalanceArgs, InputArgs};

pub fn plan(
    config: &StageConfig,
    input: &InputArgs,
    args: &BalanceArgs,
    format: &str,
) -> anyhow::Result<()> {
    let plan = super::build_plan(config, input, args)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        _ => {
            print!("{}", format_plan(&plan, true));
        }
    }

    Ok(())
}
