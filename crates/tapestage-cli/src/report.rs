//! Human-readable plan and dispatch summaries.

use tapestage_balancer::{Assignment, BalancePlan};
use tapestage_dispatch::{DispatchReport, WorkerStatus};

/// Load relative to the reader's budget, or to an even share of the
/// total when no budget is set.
fn load_percent(a: &Assignment, plan: &BalancePlan) -> u64 {
    if let Some(pct) = a.usage_percent() {
        return pct;
    }
    let even_share = plan.total_size() / plan.worker_count().max(1) as u64;
    if even_share == 0 {
        return 0;
    }
    (u128::from(a.accumulated_size()) * 100 / u128::from(even_share)) as u64
}

pub fn format_plan(plan: &BalancePlan, with_files: bool) -> String {
    let mut out = String::new();

    for a in plan.assignments() {
        out.push_str(&format!(
            "Reader n: {}, Loaded: {}%, Size: {}, Tapes: {:?}\n",
            a.worker_id(),
            load_percent(a, plan),
            a.accumulated_size(),
            a.tapes()
        ));
        if with_files {
            out.push_str(&format!("FilesToRead: {:?}\n", a.files()));
        }
        if a.is_over_budget() {
            out.push_str("  ⚠️  over budget (a tape group cannot be split)\n");
        }
    }

    out.push_str(&format!("Total Size: {}\n", plan.total_size()));
    if let Some(budget) = plan.budget() {
        out.push_str(&format!("Budget per reader: {budget}\n"));
    }
    out
}

pub fn format_report(report: &DispatchReport) -> String {
    let mut out = String::new();

    for o in report.outcomes() {
        let s = &o.summary;
        let status = match &o.status {
            WorkerStatus::Succeeded => "✓ staged".to_string(),
            WorkerStatus::Skipped => "- nothing to stage".to_string(),
            WorkerStatus::Failed(e) => format!("✗ {e}"),
        };
        out.push_str(&format!(
            "Reader {}: {} (size {}, {} files, tapes {:?})\n",
            s.worker_id, status, s.accumulated_size, s.file_count, s.tapes
        ));
    }

    let failed = report.failures().count();
    out.push_str(&format!(
        "{} launched, {} succeeded, {} failed\n",
        report.launched(),
        report.succeeded().count(),
        failed
    ));
    out
}
