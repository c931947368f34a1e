//! Analytics reporting service access.

pub mod auth;
pub mod client;
mod http;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::types::{ReportRequest, ReportResult};

pub use auth::{ServiceAccountAuth, ServiceAccountKey, TokenProvider, ANALYTICS_READONLY_SCOPE};
pub use client::AnalyticsDataClient;

/// Runs one report over a date range.
///
/// Row order in the result is whatever the service returned.
#[async_trait]
pub trait ReportingClient: Send + Sync {
    async fn run_report(&self, request: &ReportRequest) -> PipelineResult<ReportResult>;
}
