//! Error types for the dashboard pipeline.

use std::time::Duration;

use chrono::NaiveDate;

/// Pipeline errors.
///
/// Every variant is fatal for the run. The one recoverable condition,
/// [`UndefinedChange`], is a separate type.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid or incomplete configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Credential file missing, unreadable or incomplete.
    #[error("credentials error: {path}: {message}")]
    Credentials { path: String, message: String },

    /// Reporting service rejected our credentials.
    #[error("reporting service unauthorized (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Reporting service quota exceeded.
    #[error("reporting service rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Reporting service answered with a non-success status.
    #[error("reporting service error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    /// Transport failure talking to the reporting service.
    #[error("network error: {message}")]
    Network { message: String },

    /// Reporting service answered with a body we cannot decode.
    #[error("invalid response from reporting service: {message}")]
    InvalidResponse { message: String },

    /// Audit tool exited unsuccessfully (or could not be run at all).
    #[error("audit tool failed (exit code {exit_code:?}): {stderr}")]
    AuditTool {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Audit tool succeeded but its output is not a JSON document.
    #[error("audit tool produced invalid output: {message}")]
    InvalidAuditOutput { message: String },

    /// A reported metric value is not numeric.
    #[error("cannot parse {metric} value {value:?} for {date} as a number")]
    Normalization {
        metric: String,
        date: NaiveDate,
        value: String,
    },

    /// Audit report has no `categories` object.
    #[error("audit report has no categories")]
    MissingCategories,

    /// A category references an audit id absent from `audits`.
    #[error("category {category} references unknown audit {audit_id}")]
    MissingAuditRef { category: String, audit_id: String },

    /// Audit report is structurally wrong in some other way.
    #[error("malformed audit report: {message}")]
    MalformedAuditReport { message: String },

    /// Persisted audit file could not be written or read back.
    #[error("audit store error: {path}: {message}")]
    AuditStore { path: String, message: String },
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Startup / configuration
            Self::Config { .. } => 2,
            Self::Credentials { .. } => 2,

            // Reporting service
            Self::Unauthorized { .. } => 3,
            Self::RateLimited { .. } => 3,
            Self::Upstream { .. } => 3,
            Self::Network { .. } => 3,
            Self::InvalidResponse { .. } => 3,

            // Audit tool
            Self::AuditTool { .. } => 4,
            Self::InvalidAuditOutput { .. } => 4,

            // Data shape
            Self::Normalization { .. } => 5,
            Self::MissingCategories => 5,
            Self::MissingAuditRef { .. } => 5,
            Self::MalformedAuditReport { .. } => 5,

            Self::AuditStore { .. } => 6,
        }
    }

    /// Short stable name of the error kind, printed by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } | Self::Credentials { .. } => "ConfigurationError",
            Self::Unauthorized { .. }
            | Self::RateLimited { .. }
            | Self::Upstream { .. }
            | Self::Network { .. }
            | Self::InvalidResponse { .. } => "UpstreamServiceError",
            Self::AuditTool { .. } | Self::InvalidAuditOutput { .. } => "AuditToolError",
            Self::Normalization { .. } => "NormalizationError",
            Self::MissingCategories => "MissingCategoriesError",
            Self::MissingAuditRef { .. } => "MissingAuditRefError",
            Self::MalformedAuditReport { .. } => "MalformedAuditReportError",
            Self::AuditStore { .. } => "AuditStoreError",
        }
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// A within-series percentage change that cannot be computed.
///
/// Callers drop the change annotation instead of failing the run.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum UndefinedChange {
    /// First value of the series is zero.
    #[error("change undefined: first value is zero")]
    ZeroBaseline,

    /// Not enough points to pick a last complete period.
    #[error("change undefined: series has {len} point(s), need at least 2")]
    TooFewPoints { len: usize },
}
