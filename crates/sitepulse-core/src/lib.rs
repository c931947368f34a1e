//! Web-analytics and page-audit dashboard pipeline.
//!
//! This crate provides:
//!
//! - Reporting windows anchored on the local date
//! - An Analytics Data API client with service-account or static-token auth
//! - Normalization of positional report rows into date-ordered series
//! - Within-series change and period-over-period increase
//! - A Lighthouse runner, flat-file audit persistence and gauge/table views
//! - A read-only dashboard model and a self-contained HTML renderer
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use sitepulse_core::{
//!     AnalyticsDataClient, DashboardConfig, DashboardModel, DashboardPipeline, LighthouseCli,
//!     PipelineResult, RunOptions, TokenProvider,
//! };
//!
//! # async fn example() -> PipelineResult<()> {
//! let config = DashboardConfig::load(Path::new("sitepulse.yaml"))?;
//! config.validate()?;
//!
//! let tokens = TokenProvider::resolve(
//!     None,
//!     config.credentials_path.as_deref(),
//!     Duration::from_secs(config.request_timeout_secs),
//! )?;
//! let reporting = AnalyticsDataClient::from_config(&config, tokens)?;
//! let audit = LighthouseCli::from_command_line(
//!     &config.lighthouse_bin,
//!     Duration::from_secs(config.audit_timeout_secs),
//! )?;
//!
//! let pipeline = DashboardPipeline::new(config.clone(), reporting, audit);
//! let snapshot = pipeline.run(RunOptions::default()).await?;
//! let html = sitepulse_core::render_html(&DashboardModel::build(&snapshot, &config)?);
//! # let _ = html;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Key | Description |
//! |-----|-------------|
//! | `property_id` | Analytics property identifier (required) |
//! | `audit_url` | Page to audit (required, http or https) |
//! | `credentials_path` | Service-account key file |
//! | `audit_results_path` | Persisted audit report (default: `lighthouse_results.json`) |
//! | `metrics` | Ordered metric list (default: seven-metric catalog) |
//! | `dimensions` | Ordered dimension list, must contain `date` (default: `[date]`) |
//! | `window_days` | Reporting window length (default: 30) |
//! | `max_retries` | Retries for rate limits and network failures (default: 2) |
//! | `increase_precision` | `truncate` or `exact` (default: `truncate`) |

pub mod audit;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod derived;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod reporting;
pub mod types;

// Re-export main types
pub use audit::{
    AuditCategory, AuditClient, AuditRecord, AuditReport, AuditResultStore, GaugeSpec,
    LighthouseCli, TableRow, TableRowKind,
};
pub use config::{DashboardConfig, DATE_DIMENSION, DEFAULT_CONFIG_FILE};
pub use dashboard::{render_html, ChartSpec, DashboardModel};
pub use dates::{DateRange, DateRangeCalculator, ReportingWindows};
pub use derived::{within_series_change, DerivedMetricsCalculator, IncreasePrecision};
pub use error::{PipelineError, PipelineResult, UndefinedChange};
pub use normalize::{MetricSeries, NormalizedReport, ReportNormalizer, SeriesPoint};
pub use pipeline::{
    run_and_store_audit, DashboardPipeline, DashboardSnapshot, PipelineTimings, RunOptions,
};
pub use reporting::{AnalyticsDataClient, ReportingClient, ServiceAccountKey, TokenProvider};
pub use types::{
    default_metrics, Basis, DerivedKind, DerivedMetric, MetricSpec, ReportRequest, ReportResult,
    ReportRow,
};

/// User agent sent with reporting requests.
pub const SITEPULSE_USER_AGENT: &str = concat!("sitepulse/", env!("CARGO_PKG_VERSION"));
