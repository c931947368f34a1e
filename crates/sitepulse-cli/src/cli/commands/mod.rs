use std::time::Duration;

use anyhow::Context;
use sitepulse_core::{DashboardConfig, PipelineResult, TokenProvider};
use tracing::debug;

use super::args::{Cli, Command, ConfigArgs};
use crate::exit_codes;

pub mod audit;
pub mod run;
pub mod validate;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Audit(args) => audit::run(args).await,
        Command::Validate(args) => validate::run(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// Load the config file and apply command-line overrides.
pub(crate) fn load_config(args: &ConfigArgs) -> PipelineResult<DashboardConfig> {
    let mut config = DashboardConfig::load(&args.config)?;
    if let Some(property_id) = &args.property_id {
        config.property_id = property_id.clone();
    }
    if let Some(credentials) = &args.credentials {
        config.credentials_path = Some(credentials.clone());
    }
    debug!(config = %args.config.display(), property = %config.property_id, "config loaded");
    Ok(config)
}

pub(crate) fn token_provider(
    args: &ConfigArgs,
    config: &DashboardConfig,
) -> PipelineResult<TokenProvider> {
    TokenProvider::resolve(
        args.access_token.as_deref(),
        config.credentials_path.as_deref(),
        Duration::from_secs(config.request_timeout_secs),
    )
}

pub(crate) fn write_file(path: &std::path::Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
