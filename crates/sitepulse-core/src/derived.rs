//! Percentage change within a series and between two periods.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult, UndefinedChange};
use crate::normalize::{parse_metric_value, MetricSeries};
use crate::types::{Basis, DerivedKind, DerivedMetric, MetricSpec, ReportResult};

/// How period values are read before comparing them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncreasePrecision {
    /// Truncate both values toward zero first. Ratio metrics below 1
    /// become 0 and hit the zero-previous fallback; this matches the
    /// numbers earlier dashboards published.
    #[default]
    Truncate,
    /// Compare the reported floating-point values.
    Exact,
}

/// `(to - from) / from * 100`. Caller guarantees `from != 0`.
fn percent(from: f64, to: f64) -> f64 {
    (to - from) / from * 100.0
}

/// Change from the first point to the last complete period.
///
/// The last complete period is the second-to-last point: the newest
/// point covers the current, still partial, day and is ignored.
pub fn within_series_change(series: &MetricSeries) -> Result<DerivedMetric, UndefinedChange> {
    let len = series.points.len();
    if len < 2 {
        return Err(UndefinedChange::TooFewPoints { len });
    }
    let from = series.points[0].value;
    let to = series.points[len - 2].value;
    if from == 0.0 {
        return Err(UndefinedChange::ZeroBaseline);
    }
    Ok(DerivedMetric {
        metric_key: series.key.clone(),
        kind: DerivedKind::WithinSeriesChange,
        value: percent(from, to),
        basis: Some(Basis { from, to }),
    })
}

/// Period-over-period comparisons.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedMetricsCalculator {
    precision: IncreasePrecision,
}

impl DerivedMetricsCalculator {
    pub fn new(precision: IncreasePrecision) -> Self {
        Self { precision }
    }

    /// Increase of the first current row over the first previous row.
    ///
    /// Returns exactly `0.0` when either result has no rows or when the
    /// previous value is zero. Non-numeric values are an error.
    pub fn month_over_month_increase(
        &self,
        current: &ReportResult,
        previous: &ReportResult,
        metric_index: usize,
        metric_key: &str,
    ) -> PipelineResult<f64> {
        Ok(self
            .increase(current, previous, metric_index, metric_key)?
            .value)
    }

    /// One period-over-period metric per [`MetricSpec`], in list order.
    pub fn month_over_month(
        &self,
        current: &ReportResult,
        previous: &ReportResult,
        metrics: &[MetricSpec],
    ) -> PipelineResult<Vec<DerivedMetric>> {
        metrics
            .iter()
            .enumerate()
            .map(|(index, spec)| self.increase(current, previous, index, &spec.key))
            .collect()
    }

    fn increase(
        &self,
        current: &ReportResult,
        previous: &ReportResult,
        metric_index: usize,
        metric_key: &str,
    ) -> PipelineResult<DerivedMetric> {
        let derived = |value, basis| DerivedMetric {
            metric_key: metric_key.to_string(),
            kind: DerivedKind::PeriodOverPeriodIncrease,
            value,
            basis,
        };

        let (Some(current_row), Some(previous_row)) = (current.rows.first(), previous.rows.first())
        else {
            return Ok(derived(0.0, None));
        };

        let read = |row: &crate::types::ReportRow| -> PipelineResult<f64> {
            let raw = row.values.get(metric_index).map(String::as_str);
            let value = raw.and_then(parse_metric_value).ok_or_else(|| {
                PipelineError::Normalization {
                    metric: metric_key.to_string(),
                    date: row.date,
                    value: raw.unwrap_or("<missing>").to_string(),
                }
            })?;
            Ok(match self.precision {
                IncreasePrecision::Truncate => value.trunc(),
                IncreasePrecision::Exact => value,
            })
        };

        let to = read(current_row)?;
        let from = read(previous_row)?;
        let basis = Some(Basis { from, to });

        if from == 0.0 {
            return Ok(derived(0.0, basis));
        }
        Ok(derived(percent(from, to), basis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::SeriesPoint;
    use crate::types::ReportRow;
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, n).unwrap()
    }

    fn series(values: &[f64]) -> MetricSeries {
        MetricSeries {
            key: "totalUsers".into(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| SeriesPoint {
                    date: day(i as u32 + 1),
                    value: *v,
                })
                .collect(),
        }
    }

    fn single(value: &str) -> ReportResult {
        ReportResult::new(vec![ReportRow::new(day(1), vec![value.to_string()])])
    }

    fn mom(current: &ReportResult, previous: &ReportResult) -> PipelineResult<f64> {
        DerivedMetricsCalculator::default().month_over_month_increase(
            current,
            previous,
            0,
            "totalUsers",
        )
    }

    #[test]
    fn test_within_series_uses_second_to_last_point() {
        let d = within_series_change(&series(&[100.0, 150.0, 120.0, 3.0])).unwrap();
        assert_eq!(d.kind, DerivedKind::WithinSeriesChange);
        assert_eq!(d.value, 20.0);
        assert_eq!(
            d.basis,
            Some(Basis {
                from: 100.0,
                to: 120.0
            })
        );
    }

    #[test]
    fn test_within_series_zero_baseline_is_undefined() {
        let err = within_series_change(&series(&[0.0, 5.0, 7.0])).unwrap_err();
        assert_eq!(err, UndefinedChange::ZeroBaseline);
    }

    #[test]
    fn test_within_series_needs_two_points() {
        assert_eq!(
            within_series_change(&series(&[4.0])).unwrap_err(),
            UndefinedChange::TooFewPoints { len: 1 }
        );
        assert_eq!(
            within_series_change(&series(&[])).unwrap_err(),
            UndefinedChange::TooFewPoints { len: 0 }
        );
    }

    #[test]
    fn test_increase_positive_and_negative() {
        assert_eq!(mom(&single("110"), &single("100")).unwrap(), 10.0);
        assert_eq!(mom(&single("90"), &single("100")).unwrap(), -10.0);
    }

    #[test]
    fn test_increase_empty_results_fall_back_to_zero() {
        let empty = ReportResult::default();
        assert_eq!(mom(&empty, &single("100")).unwrap(), 0.0);
        assert_eq!(mom(&single("100"), &empty).unwrap(), 0.0);
        assert_eq!(mom(&empty, &empty).unwrap(), 0.0);
    }

    #[test]
    fn test_increase_zero_previous_falls_back_to_zero() {
        assert_eq!(mom(&single("50"), &single("0")).unwrap(), 0.0);
    }

    #[test]
    fn test_increase_truncates_by_default() {
        // 0.9 and 0.4 truncate to 0: previous is zero, so fallback.
        assert_eq!(mom(&single("0.9"), &single("0.4")).unwrap(), 0.0);
        // 110.9 vs 100.2 compares as 110 vs 100
        assert_eq!(mom(&single("110.9"), &single("100.2")).unwrap(), 10.0);
    }

    #[test]
    fn test_increase_exact_precision_keeps_fractions() {
        let calc = DerivedMetricsCalculator::new(IncreasePrecision::Exact);
        let v = calc
            .month_over_month_increase(&single("0.5"), &single("0.4"), 0, "engagementRate")
            .unwrap();
        assert!((v - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_increase_malformed_value_is_error() {
        let err = mom(&single("lots"), &single("100")).unwrap_err();
        assert!(matches!(err, PipelineError::Normalization { .. }));
    }

    #[test]
    fn test_month_over_month_covers_every_metric() {
        let metrics = vec![
            MetricSpec::new("a", "A", ""),
            MetricSpec::new("b", "B", ""),
        ];
        let current =
            ReportResult::new(vec![ReportRow::new(day(2), vec!["30".into(), "5".into()])]);
        let previous =
            ReportResult::new(vec![ReportRow::new(day(1), vec!["20".into(), "0".into()])]);
        let out = DerivedMetricsCalculator::default()
            .month_over_month(&current, &previous, &metrics)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].metric_key, "a");
        assert_eq!(out[0].value, 50.0);
        assert_eq!(out[1].value, 0.0);
        assert_eq!(out[1].kind, DerivedKind::PeriodOverPeriodIncrease);
    }
}
