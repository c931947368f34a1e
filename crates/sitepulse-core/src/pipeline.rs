//! One dashboard run, start to finish.
//!
//! The pipeline owns its inputs for the duration of [`DashboardPipeline::run`]
//! and hands back a [`DashboardSnapshot`]. Every step runs in sequence; the
//! first error ends the run.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::{AuditClient, AuditReport, AuditResultStore};
use crate::config::DashboardConfig;
use crate::dates::{DateRange, DateRangeCalculator, ReportingWindows};
use crate::derived::{within_series_change, DerivedMetricsCalculator};
use crate::error::PipelineResult;
use crate::normalize::{NormalizedReport, ReportNormalizer};
use crate::reporting::ReportingClient;
use crate::types::{DerivedMetric, MetricSpec, ReportRequest, ReportResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Run the audit tool and persist its report before loading it. When
    /// false the last persisted report is used.
    pub refresh_audit: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            refresh_audit: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineTimings {
    pub total_ms: u64,
    pub reporting_ms: u64,
    pub derive_ms: u64,
    /// `None` when the audit was not refreshed.
    pub audit_ms: Option<u64>,
    pub audit_load_ms: u64,
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Everything a run produced. Read-only from here on.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub windows: ReportingWindows,
    pub metrics: Vec<MetricSpec>,
    /// Current window, sorted by date.
    pub current: ReportResult,
    /// Previous window, sorted by date.
    pub previous: ReportResult,
    pub normalized: NormalizedReport,
    /// Within-series change of the primary metric, when defined.
    pub primary_change: Option<DerivedMetric>,
    /// Period-over-period increase per metric, in metric order.
    pub increases: Vec<DerivedMetric>,
    pub audit: AuditReport,
    pub timings: PipelineTimings,
}

/// Run the audit tool and persist the report.
pub async fn run_and_store_audit(
    audit: &dyn AuditClient,
    store: &AuditResultStore,
    url: &str,
) -> PipelineResult<AuditReport> {
    let report = audit.run_audit(url).await?;
    store.save(&report)?;
    Ok(report)
}

pub struct DashboardPipeline<R, A> {
    config: DashboardConfig,
    reporting: R,
    audit: A,
    store: AuditResultStore,
    dates: DateRangeCalculator,
}

impl<R: ReportingClient, A: AuditClient> DashboardPipeline<R, A> {
    /// Pipeline anchored on today's local date, persisting audits at the
    /// configured path.
    pub fn new(config: DashboardConfig, reporting: R, audit: A) -> Self {
        let store = AuditResultStore::new(config.audit_results_path.clone());
        Self {
            config,
            reporting,
            audit,
            store,
            dates: DateRangeCalculator::from_local_clock(),
        }
    }

    pub fn with_dates(mut self, dates: DateRangeCalculator) -> Self {
        self.dates = dates;
        self
    }

    pub async fn run(&self, options: RunOptions) -> PipelineResult<DashboardSnapshot> {
        let run_start = Instant::now();
        let mut timings = PipelineTimings::default();

        self.config.validate()?;
        let metrics = self.config.metrics().into_owned();
        let windows = self.dates.trailing_windows(self.config.window_days);
        info!(
            property = %self.config.property_id,
            current = %windows.current,
            previous = %windows.previous,
            metrics = metrics.len(),
            "starting dashboard run"
        );

        let reporting_start = Instant::now();
        let mut current = self.fetch(&windows.current, &metrics).await?;
        let mut previous = self.fetch(&windows.previous, &metrics).await?;
        current.sort_by_date();
        previous.sort_by_date();
        timings.reporting_ms = elapsed_ms(reporting_start);

        let derive_start = Instant::now();
        let normalized = ReportNormalizer::new(&metrics).normalize(&current)?;
        let primary_change = self.primary_change(&normalized);
        let increases = DerivedMetricsCalculator::new(self.config.increase_precision)
            .month_over_month(&current, &previous, &metrics)?;
        timings.derive_ms = elapsed_ms(derive_start);

        if options.refresh_audit {
            let audit_start = Instant::now();
            run_and_store_audit(&self.audit, &self.store, &self.config.audit_url).await?;
            timings.audit_ms = Some(elapsed_ms(audit_start));
        } else {
            debug!(path = %self.store.path().display(), "reusing persisted audit report");
        }

        let load_start = Instant::now();
        let audit = self.store.load()?;
        audit.require_categories()?;
        timings.audit_load_ms = elapsed_ms(load_start);

        timings.total_ms = elapsed_ms(run_start);
        info!(
            rows = current.rows.len(),
            previous_rows = previous.rows.len(),
            total_ms = timings.total_ms,
            "dashboard run finished"
        );

        Ok(DashboardSnapshot {
            windows,
            metrics,
            current,
            previous,
            normalized,
            primary_change,
            increases,
            audit,
            timings,
        })
    }

    async fn fetch(
        &self,
        range: &DateRange,
        metrics: &[MetricSpec],
    ) -> PipelineResult<ReportResult> {
        let request = ReportRequest::new(
            self.config.property_id.clone(),
            *range,
            &self.config.dimensions,
            metrics,
        );
        self.reporting.run_report(&request).await
    }

    fn primary_change(&self, normalized: &NormalizedReport) -> Option<DerivedMetric> {
        let series = normalized.get(&self.config.primary_metric)?;
        match within_series_change(series) {
            Ok(change) => Some(change),
            Err(reason) => {
                warn!(
                    metric = %series.key,
                    reason = %reason,
                    "omitting change annotation"
                );
                None
            }
        }
    }
}
