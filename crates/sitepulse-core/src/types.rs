//! Report shapes exchanged between the reporting service and the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;

/// One requested metric.
///
/// Rows carry metric values positionally, so the index of a metric in the
/// requested list is the index of its value in every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Reporting API metric name (e.g., "totalUsers").
    pub key: String,

    /// Chart title.
    pub title: String,

    /// Text rendered under the chart.
    #[serde(default)]
    pub description: String,
}

impl MetricSpec {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Metric catalog used when the configuration does not list any.
pub fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new(
            "totalUsers",
            "Total Users",
            "Unique users who triggered at least one event on the site or app \
             during the period, whether or not they were actively engaged.",
        ),
        MetricSpec::new(
            "newUsers",
            "New Users",
            "Users who interacted with the site or app for the first time, \
             counted from first_open or first_visit events.",
        ),
        MetricSpec::new(
            "sessions",
            "Sessions",
            "Number of sessions started, counted from session_start events.",
        ),
        MetricSpec::new(
            "engagementRate",
            "Engagement Rate",
            "Engaged sessions divided by all sessions. A rate of 0.7239 means \
             72.39% of sessions were engaged.",
        ),
        MetricSpec::new(
            "averageSessionDuration",
            "Average Session Duration",
            "Average length of a session, in seconds.",
        ),
        MetricSpec::new(
            "userConversionRate",
            "User Conversion Rate",
            "Share of users who completed a conversion event such as a \
             purchase or a newsletter sign-up.",
        ),
        MetricSpec::new(
            "wauPerMau",
            "WAU/MAU Ratio",
            "Share of the last 30 days' active users who were also active in \
             the last 7 days. A ratio of 0.234 means 23.4%.",
        ),
    ]
}

/// Request sent to the reporting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    pub property_id: String,
    pub date_range: DateRange,
    /// Ordered dimension names; must contain "date".
    pub dimensions: Vec<String>,
    /// Ordered metric keys.
    pub metrics: Vec<String>,
}

impl ReportRequest {
    pub fn new(
        property_id: impl Into<String>,
        date_range: DateRange,
        dimensions: &[String],
        metrics: &[MetricSpec],
    ) -> Self {
        Self {
            property_id: property_id.into(),
            date_range,
            dimensions: dimensions.to_vec(),
            metrics: metrics.iter().map(|m| m.key.clone()).collect(),
        }
    }
}

/// One row of a report: a date and one numeric string per metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub date: NaiveDate,

    /// Metric values as reported, in request order.
    pub values: Vec<String>,

    /// Values of the non-date dimensions, in request order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<String>,
}

impl ReportRow {
    pub fn new(date: NaiveDate, values: Vec<String>) -> Self {
        Self {
            date,
            values,
            dimensions: Vec::new(),
        }
    }
}

/// Rows returned for one request, in whatever order the service chose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub rows: Vec<ReportRow>,
}

impl ReportResult {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable in-place sort by calendar date.
    ///
    /// Must happen before the result is handed to any renderer.
    pub fn sort_by_date(&mut self) {
        self.rows.sort_by_key(|row| row.date);
    }
}

/// Which comparison a derived metric describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedKind {
    WithinSeriesChange,
    PeriodOverPeriodIncrease,
}

/// The two scalars a derived percentage was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Basis {
    pub from: f64,
    pub to: f64,
}

/// A percentage computed from report data. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub metric_key: String,
    pub kind: DerivedKind,
    /// Percentage (10.0 means +10%).
    pub value: f64,
    /// Absent when a documented fallback produced the value.
    pub basis: Option<Basis>,
}
