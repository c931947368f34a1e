//! Read-only view of a run, shaped for rendering.

use serde::Serialize;

use crate::audit::{to_gauge_specs, to_table_rows, GaugeSpec, TableRow};
use crate::config::DashboardConfig;
use crate::dates::DateRange;
use crate::error::PipelineResult;
use crate::normalize::SeriesPoint;
use crate::pipeline::DashboardSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardHeader {
    pub site_name: String,
    pub property_id: String,
    pub current: DateRange,
    pub previous: DateRange,
}

/// One line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub metric_key: String,
    /// Display title; carries the change annotation for the primary metric.
    pub title: String,
    pub description: String,
    /// Date-ordered points of the current window.
    pub points: Vec<SeriesPoint>,
    /// Within-series change, primary metric only.
    pub change: Option<f64>,
    /// Increase over the previous window.
    pub increase: Option<f64>,
}

/// Audit summary as recorded by the tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditSummary {
    pub requested_url: Option<String>,
    pub fetch_time: Option<String>,
    pub gauges: Vec<GaugeSpec>,
    pub table: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardModel {
    pub header: DashboardHeader,
    pub charts: Vec<ChartSpec>,
    pub audit: AuditSummary,
}

/// `"<title> (change: 12.34%)"`.
pub fn annotate_title(title: &str, change: f64) -> String {
    format!("{} (change: {:.2}%)", title, change)
}

impl DashboardModel {
    /// Project a snapshot. Fails on malformed audit data before anything is
    /// rendered.
    pub fn build(snapshot: &DashboardSnapshot, config: &DashboardConfig) -> PipelineResult<Self> {
        let gauges = to_gauge_specs(&snapshot.audit)?;
        let table = to_table_rows(&snapshot.audit)?;

        let charts = snapshot
            .metrics
            .iter()
            .map(|spec| {
                let change = snapshot
                    .primary_change
                    .as_ref()
                    .filter(|c| c.metric_key == spec.key)
                    .map(|c| c.value);
                let title = match change {
                    Some(value) => annotate_title(&spec.title, value),
                    None => spec.title.clone(),
                };
                ChartSpec {
                    metric_key: spec.key.clone(),
                    title,
                    description: spec.description.clone(),
                    points: snapshot
                        .normalized
                        .get(&spec.key)
                        .map(|s| s.points.clone())
                        .unwrap_or_default(),
                    change,
                    increase: snapshot
                        .increases
                        .iter()
                        .find(|d| d.metric_key == spec.key)
                        .map(|d| d.value),
                }
            })
            .collect();

        Ok(Self {
            header: DashboardHeader {
                site_name: config.display_name().to_string(),
                property_id: config.property_id.clone(),
                current: snapshot.windows.current,
                previous: snapshot.windows.previous,
            },
            charts,
            audit: AuditSummary {
                requested_url: snapshot.audit.requested_url().map(String::from),
                fetch_time: snapshot.audit.fetch_time().map(String::from),
                gauges,
                table,
            },
        })
    }
}
