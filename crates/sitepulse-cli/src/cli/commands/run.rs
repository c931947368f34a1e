use std::time::Duration;

use sitepulse_core::{
    render_html, AnalyticsDataClient, DashboardModel, DashboardPipeline, DashboardSnapshot,
    LighthouseCli, RunOptions,
};
use tracing::info;

use super::{load_config, token_provider, write_file};
use crate::cli::args::RunArgs;
use crate::exit_codes;
use crate::serve;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let config = load_config(&args.common)?;
    config.validate()?;

    let tokens = token_provider(&args.common, &config)?;
    info!(auth = %tokens.describe(), property = %config.property_id, "starting run");

    let reporting = AnalyticsDataClient::from_config(&config, tokens)?;
    let audit = LighthouseCli::from_command_line(
        &config.lighthouse_bin,
        Duration::from_secs(config.audit_timeout_secs),
    )?;

    let pipeline = DashboardPipeline::new(config.clone(), reporting, audit);
    let snapshot = pipeline
        .run(RunOptions {
            refresh_audit: !args.skip_audit,
        })
        .await?;

    let model = DashboardModel::build(&snapshot, &config)?;
    let html = render_html(&model);
    print_summary(&snapshot);

    if let Some(out) = &args.out {
        write_file(out, &html)?;
        info!(path = %out.display(), "dashboard written");
    }

    if args.no_serve {
        return Ok(exit_codes::SUCCESS);
    }

    let bind = args.bind.unwrap_or(config.bind);
    serve::serve(bind, html, &model).await?;
    Ok(exit_codes::SUCCESS)
}

fn print_summary(snapshot: &DashboardSnapshot) {
    println!(
        "current {}  previous {}",
        snapshot.windows.current, snapshot.windows.previous
    );
    if let Some(change) = &snapshot.primary_change {
        println!("{} change: {:.2}%", change.metric_key, change.value);
    }
    for increase in &snapshot.increases {
        println!(
            "{} month-over-month: {:.2}%",
            increase.metric_key, increase.value
        );
    }
    println!(
        "timings: total {}ms, reporting {}ms",
        snapshot.timings.total_ms, snapshot.timings.reporting_ms
    );
}
