use serde_json::json;

use super::{load_config, token_provider};
use crate::cli::args::{ValidateArgs, ValidateOutputFormat};
use crate::exit_codes;

/// Offline check: config shape plus a readable key file or token.
pub async fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let config = load_config(&args.common)?;
    config.validate()?;
    let tokens = token_provider(&args.common, &config)?;
    let metrics = config.metrics();

    match args.format {
        ValidateOutputFormat::Text => {
            println!("config: {}", args.common.config.display());
            println!("site: {}", config.display_name());
            println!("property: {}", config.property_id);
            println!("credentials: {}", tokens.describe());
            println!("audit: {}", config.audit_url);
            println!("metrics:");
            for (i, metric) in metrics.iter().enumerate() {
                let primary = if metric.key == config.primary_metric {
                    " [primary]"
                } else {
                    ""
                };
                println!("  {}. {} ({}){}", i + 1, metric.key, metric.title, primary);
            }
        }
        ValidateOutputFormat::Json => {
            let out = json!({
                "config": args.common.config,
                "site": config.display_name(),
                "property_id": config.property_id,
                "credentials": tokens.describe(),
                "audit_url": config.audit_url,
                "primary_metric": config.primary_metric,
                "metrics": metrics.iter().map(|m| &m.key).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(exit_codes::SUCCESS)
}
