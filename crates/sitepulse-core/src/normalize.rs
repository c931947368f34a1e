//! Reshape report rows into one date-ordered series per metric.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{MetricSpec, ReportResult};

/// A single (date, value) pair used for line chart data points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Date-ordered points for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub key: String,
    pub points: Vec<SeriesPoint>,
}

impl MetricSeries {
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }
}

/// One series per requested metric, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedReport {
    series: Vec<MetricSeries>,
}

impl NormalizedReport {
    pub fn get(&self, key: &str) -> Option<&MetricSeries> {
        self.series.iter().find(|s| s.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Turns positional row values into per-metric series.
#[derive(Debug, Clone, Copy)]
pub struct ReportNormalizer<'a> {
    metrics: &'a [MetricSpec],
}

impl<'a> ReportNormalizer<'a> {
    pub fn new(metrics: &'a [MetricSpec]) -> Self {
        Self { metrics }
    }

    /// Build every metric's series.
    ///
    /// Each series has exactly one point per input row. Duplicate dates
    /// are kept side by side in their input order.
    pub fn normalize(&self, result: &ReportResult) -> PipelineResult<NormalizedReport> {
        let series = self
            .metrics
            .iter()
            .enumerate()
            .map(|(index, spec)| self.series_for(result, index, spec))
            .collect::<PipelineResult<Vec<_>>>()?;

        debug!(
            metrics = series.len(),
            rows = result.rows.len(),
            "normalized report"
        );
        Ok(NormalizedReport { series })
    }

    fn series_for(
        &self,
        result: &ReportResult,
        index: usize,
        spec: &MetricSpec,
    ) -> PipelineResult<MetricSeries> {
        let mut points = result
            .rows
            .iter()
            .map(|row| {
                let raw = row.values.get(index).map(String::as_str);
                let value = raw.and_then(parse_metric_value).ok_or_else(|| {
                    PipelineError::Normalization {
                        metric: spec.key.clone(),
                        date: row.date,
                        value: raw.unwrap_or("<missing>").to_string(),
                    }
                })?;
                Ok(SeriesPoint {
                    date: row.date,
                    value,
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        // sort_by_key is stable
        points.sort_by_key(|p| p.date);

        Ok(MetricSeries {
            key: spec.key.clone(),
            points,
        })
    }
}

/// Parse a reported value; `None` for anything that is not a finite number.
pub(crate) fn parse_metric_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReportRow;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn metrics() -> Vec<MetricSpec> {
        vec![
            MetricSpec::new("totalUsers", "Total Users", ""),
            MetricSpec::new("engagementRate", "Engagement Rate", ""),
        ]
    }

    fn row(d: &str, a: &str, b: &str) -> ReportRow {
        ReportRow::new(date(d), vec![a.to_string(), b.to_string()])
    }

    #[test]
    fn test_series_follow_metric_positions() {
        let result = ReportResult::new(vec![
            row("2026-03-02", "12", "0.5"),
            row("2026-03-01", "10", "0.25"),
        ]);
        let specs = metrics();
        let out = ReportNormalizer::new(&specs).normalize(&result).unwrap();

        let users = out.get("totalUsers").unwrap();
        assert_eq!(users.values().collect::<Vec<_>>(), vec![10.0, 12.0]);
        let rate = out.get("engagementRate").unwrap();
        assert_eq!(rate.values().collect::<Vec<_>>(), vec![0.25, 0.5]);
        assert_eq!(rate.points[0].date, date("2026-03-01"));
    }

    #[test]
    fn test_no_rows_dropped_even_with_duplicate_dates() {
        let result = ReportResult::new(vec![
            row("2026-03-01", "1", "0"),
            row("2026-03-01", "2", "0"),
            row("2026-02-28", "3", "0"),
        ]);
        let specs = metrics();
        let out = ReportNormalizer::new(&specs).normalize(&result).unwrap();
        for series in out.iter() {
            assert_eq!(series.points.len(), result.rows.len());
        }
        let users: Vec<_> = out.get("totalUsers").unwrap().values().collect();
        assert_eq!(users, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_normalizing_sorted_input_is_idempotent() {
        let mut result = ReportResult::new(vec![
            row("2026-01-02", "5", "0.1"),
            row("2025-12-30", "7", "0.2"),
            row("2026-01-01", "6", "0.3"),
        ]);
        let specs = metrics();
        let normalizer = ReportNormalizer::new(&specs);
        let first = normalizer.normalize(&result).unwrap();
        result.sort_by_date();
        let second = normalizer.normalize(&result).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unparseable_value_is_fatal_with_context() {
        let result = ReportResult::new(vec![
            row("2026-03-01", "10", "0.5"),
            row("2026-03-02", "ten", "0.5"),
        ]);
        let specs = metrics();
        let err = ReportNormalizer::new(&specs)
            .normalize(&result)
            .unwrap_err();
        match err {
            PipelineError::Normalization {
                metric,
                date: d,
                value,
            } => {
                assert_eq!(metric, "totalUsers");
                assert_eq!(d, date("2026-03-02"));
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_short_row_is_fatal() {
        let result = ReportResult::new(vec![ReportRow::new(
            date("2026-03-01"),
            vec!["1".into()],
        )]);
        let specs = metrics();
        let err = ReportNormalizer::new(&specs)
            .normalize(&result)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Normalization { ref metric, ref value, .. }
                if metric == "engagementRate" && value == "<missing>"
        ));
    }

    #[test]
    fn test_parse_metric_value_rejects_non_finite() {
        assert_eq!(parse_metric_value(" 42 "), Some(42.0));
        assert_eq!(parse_metric_value("0.7239"), Some(0.7239));
        assert_eq!(parse_metric_value("NaN"), None);
        assert_eq!(parse_metric_value(""), None);
    }
}
