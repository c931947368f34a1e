//! Dashboard configuration.
//!
//! Loaded from YAML. Every optional field has a serde default, so a
//! minimal file only names the property and the audited URL:
//!
//! ```yaml
//! property_id: "123456789"
//! audit_url: https://example.com/
//! credentials_path: service-account.json
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::derived::IncreasePrecision;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{default_metrics, MetricSpec};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "sitepulse.yaml";

/// Dimension every time-series request must carry.
pub const DATE_DIMENSION: &str = "date";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Name shown in the dashboard header.
    #[serde(default)]
    pub site_name: String,

    /// Analytics property identifier.
    #[serde(default)]
    pub property_id: String,

    /// Service-account key file.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,

    /// Page to audit.
    #[serde(default)]
    pub audit_url: String,

    /// Where the last audit report is persisted.
    #[serde(default = "default_audit_results_path")]
    pub audit_results_path: PathBuf,

    /// Ordered metric list. `None` selects the built-in catalog.
    #[serde(default)]
    pub metrics: Option<Vec<MetricSpec>>,

    /// Ordered dimension list; must contain "date".
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<String>,

    /// Metric whose chart title carries the change annotation.
    #[serde(default = "default_primary_metric")]
    pub primary_metric: String,

    /// Length of each reporting window in days.
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Base URL of the analytics data API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum retries for transient reporting failures. 0 disables retry.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Audit tool command line, e.g. "lighthouse" or "npx lighthouse".
    #[serde(default = "default_lighthouse_bin")]
    pub lighthouse_bin: String,

    /// Audit subprocess timeout in seconds.
    #[serde(default = "default_audit_timeout")]
    pub audit_timeout_secs: u64,

    /// How period-over-period values are compared.
    #[serde(default)]
    pub increase_precision: IncreasePrecision,

    /// Address the dashboard is served on.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

fn default_audit_results_path() -> PathBuf {
    PathBuf::from("lighthouse_results.json")
}

fn default_dimensions() -> Vec<String> {
    vec![DATE_DIMENSION.to_string()]
}

fn default_primary_metric() -> String {
    "totalUsers".to_string()
}

fn default_window_days() -> u32 {
    30
}

fn default_api_base_url() -> String {
    "https://analyticsdata.googleapis.com/v1beta".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_lighthouse_bin() -> String {
    "lighthouse".to_string()
}

fn default_audit_timeout() -> u64 {
    180
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8050))
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            site_name: String::new(),
            property_id: String::new(),
            credentials_path: None,
            audit_url: String::new(),
            audit_results_path: default_audit_results_path(),
            metrics: None,
            dimensions: default_dimensions(),
            primary_metric: default_primary_metric(),
            window_days: default_window_days(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            lighthouse_bin: default_lighthouse_bin(),
            audit_timeout_secs: default_audit_timeout(),
            increase_precision: IncreasePrecision::default(),
            bind: default_bind(),
        }
    }
}

impl DashboardConfig {
    /// Read and parse a YAML file. Does not validate.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
            .map_err(|e| PipelineError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// Metrics to request, in order.
    pub fn metrics(&self) -> Cow<'_, [MetricSpec]> {
        match &self.metrics {
            Some(metrics) => Cow::Borrowed(metrics.as_slice()),
            None => Cow::Owned(default_metrics()),
        }
    }

    /// Header title: the site name, or the property id when unnamed.
    pub fn display_name(&self) -> &str {
        if self.site_name.trim().is_empty() {
            &self.property_id
        } else {
            &self.site_name
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.property_id.trim().is_empty() {
            return Err(PipelineError::config("property_id is empty"));
        }

        let metrics = self.metrics();
        if metrics.is_empty() {
            return Err(PipelineError::config("metric list is empty"));
        }
        let mut seen = HashSet::new();
        for metric in metrics.iter() {
            if metric.key.trim().is_empty() {
                return Err(PipelineError::config("metric with empty key"));
            }
            if !seen.insert(metric.key.as_str()) {
                return Err(PipelineError::config(format!(
                    "duplicate metric key {}",
                    metric.key
                )));
            }
        }
        if !seen.contains(self.primary_metric.as_str()) {
            return Err(PipelineError::config(format!(
                "primary_metric {} is not in the metric list",
                self.primary_metric
            )));
        }

        if !self.dimensions.iter().any(|d| d == DATE_DIMENSION) {
            return Err(PipelineError::config(
                "dimensions must include \"date\" for time-series reports",
            ));
        }

        if self.window_days == 0 {
            return Err(PipelineError::config("window_days must be at least 1"));
        }

        self.validate_audit()
    }

    /// The subset of [`validate`](Self::validate) an audit-only run needs.
    pub fn validate_audit(&self) -> PipelineResult<()> {
        let audit_url = url::Url::parse(&self.audit_url).map_err(|e| {
            PipelineError::config(format!("audit_url {:?} is not a URL: {}", self.audit_url, e))
        })?;
        if !matches!(audit_url.scheme(), "http" | "https") {
            return Err(PipelineError::config(format!(
                "audit_url must be http(s), got {}",
                audit_url.scheme()
            )));
        }
        if self.audit_results_path.as_os_str().is_empty() {
            return Err(PipelineError::config("audit_results_path is empty"));
        }
        if self.lighthouse_bin.trim().is_empty() {
            return Err(PipelineError::config("lighthouse_bin is empty"));
        }
        Ok(())
    }
}
