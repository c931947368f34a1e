use std::time::Duration;

use sitepulse_core::audit::to_gauge_specs;
use sitepulse_core::{run_and_store_audit, AuditClient, AuditResultStore, LighthouseCli};
use tracing::info;

use super::load_config;
use crate::cli::args::AuditArgs;
use crate::exit_codes;

pub async fn run(args: AuditArgs) -> anyhow::Result<i32> {
    let config = load_config(&args.common)?;
    config.validate_audit()?;

    let tool = LighthouseCli::from_command_line(
        &config.lighthouse_bin,
        Duration::from_secs(config.audit_timeout_secs),
    )?;
    let store = AuditResultStore::new(&config.audit_results_path);

    info!(tool = tool.tool_name(), url = %config.audit_url, "running audit");
    let report = run_and_store_audit(&tool, &store, &config.audit_url).await?;
    report.require_categories()?;

    for gauge in to_gauge_specs(&report)? {
        println!("{}: {:.2}", gauge.category_name, gauge.score_percent);
    }
    println!("saved {}", store.path().display());
    Ok(exit_codes::SUCCESS)
}
