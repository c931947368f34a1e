use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sitepulse_core::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(
    name = "sitepulse",
    version,
    about = "Web-analytics and page-audit dashboard"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch analytics, audit the page and serve the dashboard
    Run(RunArgs),
    /// Run the page audit only and persist its report
    Audit(AuditArgs),
    /// Check configuration and credentials without touching the network
    Validate(ValidateArgs),
    /// Print the version
    Version,
}

/// Config file plus the overrides every command accepts.
#[derive(clap::Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(long, short = 'c', env = "SITEPULSE_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Overrides `property_id` from the config file
    #[arg(long, env = "SITEPULSE_PROPERTY_ID")]
    pub property_id: Option<String>,

    /// Service-account key file; overrides `credentials_path`
    #[arg(long, env = "SITEPULSE_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Pre-issued bearer token; takes precedence over the key file
    #[arg(long, env = "SITEPULSE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: ConfigArgs,

    /// Reuse the persisted audit report instead of running the tool
    #[arg(long)]
    pub skip_audit: bool,

    /// Also write the rendered page to this file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Exit after rendering instead of serving
    #[arg(long)]
    pub no_serve: bool,

    /// Overrides `bind` from the config file
    #[arg(long, env = "SITEPULSE_BIND")]
    pub bind: Option<SocketAddr>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AuditArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub common: ConfigArgs,

    #[arg(long, value_enum, default_value_t = ValidateOutputFormat::Text)]
    pub format: ValidateOutputFormat,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ValidateOutputFormat {
    Text,
    Json,
}
