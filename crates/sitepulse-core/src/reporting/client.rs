//! Analytics Data API client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::auth::TokenProvider;
use super::http::HttpBackend;
use super::ReportingClient;
use crate::config::{DashboardConfig, DATE_DIMENSION};
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ReportRequest, ReportResult, ReportRow};
use crate::SITEPULSE_USER_AGENT;

/// Date format of the `date` dimension in responses.
const RESPONSE_DATE_FORMAT: &str = "%Y%m%d";

/// Date format of request date ranges.
const REQUEST_DATE_FORMAT: &str = "%Y-%m-%d";

/// Client for `properties/{id}:runReport`.
#[derive(Debug, Clone)]
pub struct AnalyticsDataClient {
    http: HttpBackend,
    base_url: String,
}

impl AnalyticsDataClient {
    pub fn new(
        base_url: impl Into<String>,
        token_provider: TokenProvider,
        timeout: Duration,
        max_retries: u32,
    ) -> PipelineResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(SITEPULSE_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| PipelineError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                token_provider,
                max_retries,
            },
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(
        config: &DashboardConfig,
        token_provider: TokenProvider,
    ) -> PipelineResult<Self> {
        Self::new(
            config.api_base_url.clone(),
            token_provider,
            Duration::from_secs(config.request_timeout_secs),
            config.max_retries,
        )
    }

    fn report_url(&self, property_id: &str) -> String {
        let id = property_id.trim().trim_start_matches("properties/");
        format!("{}/properties/{}:runReport", self.base_url, id)
    }
}

#[async_trait]
impl ReportingClient for AnalyticsDataClient {
    async fn run_report(&self, request: &ReportRequest) -> PipelineResult<ReportResult> {
        let date_index = request
            .dimensions
            .iter()
            .position(|d| d == DATE_DIMENSION)
            .ok_or_else(|| PipelineError::config("report request has no date dimension"))?;

        let url = self.report_url(&request.property_id);
        debug!(url = %url, range = %request.date_range, "running report");
        let started = Instant::now();

        let body = RunReportBody::from_request(request);
        let response = self.http.post_json(&url, &body).await?;
        let parsed: RunReportResponse =
            response
                .json()
                .await
                .map_err(|e| PipelineError::InvalidResponse {
                    message: format!("failed to parse report response: {}", e),
                })?;

        let result = parsed.into_result(date_index)?;
        info!(
            property = %request.property_id,
            range = %request.date_range,
            rows = result.rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report fetched"
        );
        Ok(result)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReportBody {
    date_ranges: Vec<WireDateRange>,
    dimensions: Vec<WireName>,
    metrics: Vec<WireName>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDateRange {
    start_date: String,
    end_date: String,
}

#[derive(Debug, Serialize)]
struct WireName {
    name: String,
}

impl RunReportBody {
    fn from_request(request: &ReportRequest) -> Self {
        let names = |list: &[String]| -> Vec<WireName> {
            list.iter()
                .map(|name| WireName { name: name.clone() })
                .collect()
        };
        Self {
            date_ranges: vec![WireDateRange {
                start_date: request
                    .date_range
                    .start()
                    .format(REQUEST_DATE_FORMAT)
                    .to_string(),
                end_date: request
                    .date_range
                    .end()
                    .format(REQUEST_DATE_FORMAT)
                    .to_string(),
            }],
            dimensions: names(&request.dimensions),
            metrics: names(&request.metrics),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunReportResponse {
    /// Absent when the report has no rows.
    #[serde(default)]
    rows: Vec<WireRow>,
    /// Total rows matching the query, which can exceed the rows returned.
    #[serde(default)]
    row_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRow {
    #[serde(default)]
    dimension_values: Vec<WireValue>,
    #[serde(default)]
    metric_values: Vec<WireValue>,
}

#[derive(Debug, Deserialize)]
struct WireValue {
    #[serde(default)]
    value: String,
}

impl RunReportResponse {
    fn into_result(self, date_index: usize) -> PipelineResult<ReportResult> {
        if let Some(total) = self.row_count {
            if total != self.rows.len() as u64 {
                return Err(PipelineError::InvalidResponse {
                    message: format!(
                        "report truncated: service matched {} rows but returned {}",
                        total,
                        self.rows.len()
                    ),
                });
            }
        }

        let rows = self
            .rows
            .into_iter()
            .map(|row| row.into_row(date_index))
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(ReportResult::new(rows))
    }
}

impl WireRow {
    fn into_row(self, date_index: usize) -> PipelineResult<ReportRow> {
        let mut dimensions: Vec<String> =
            self.dimension_values.into_iter().map(|v| v.value).collect();
        if date_index >= dimensions.len() {
            return Err(PipelineError::InvalidResponse {
                message: format!(
                    "row has {} dimension values, expected a date at position {}",
                    dimensions.len(),
                    date_index
                ),
            });
        }
        let raw_date = dimensions.remove(date_index);
        let date = NaiveDate::parse_from_str(&raw_date, RESPONSE_DATE_FORMAT).map_err(|e| {
            PipelineError::InvalidResponse {
                message: format!("invalid date {:?} in report row: {}", raw_date, e),
            }
        })?;

        Ok(ReportRow {
            date,
            values: self.metric_values.into_iter().map(|v| v.value).collect(),
            dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateRange;
    use crate::types::MetricSpec;
    use serde_json::json;

    #[test]
    fn test_body_shape() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 9, 17).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        )
        .unwrap();
        let request = ReportRequest::new(
            "123",
            range,
            &["date".to_string()],
            &[MetricSpec::new("totalUsers", "Total Users", "")],
        );
        let body = serde_json::to_value(RunReportBody::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "dateRanges": [{"startDate": "2026-09-17", "endDate": "2026-10-17"}],
                "dimensions": [{"name": "date"}],
                "metrics": [{"name": "totalUsers"}]
            })
        );
    }

    #[test]
    fn test_date_located_by_position() {
        let response: RunReportResponse = serde_json::from_value(json!({
            "rows": [{
                "dimensionValues": [{"value": "DE"}, {"value": "20261001"}],
                "metricValues": [{"value": "12"}]
            }]
        }))
        .unwrap();
        let result = response.into_result(1).unwrap();
        assert_eq!(result.rows[0].date, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(result.rows[0].dimensions, vec!["DE"]);
        assert_eq!(result.rows[0].values, vec!["12"]);
    }

    #[test]
    fn test_missing_rows_means_empty() {
        let response: RunReportResponse =
            serde_json::from_value(json!({"rowCount": 0, "kind": "analyticsData#runReport"}))
                .unwrap();
        assert!(response.into_result(0).unwrap().is_empty());
    }

    #[test]
    fn test_row_count_above_returned_rows_is_truncation() {
        let response: RunReportResponse = serde_json::from_value(json!({
            "rows": [{"dimensionValues": [{"value": "20261001"}], "metricValues": [{"value": "1"}]}],
            "rowCount": 10001
        }))
        .unwrap();
        let err = response.into_result(0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidResponse { .. }));
        assert!(err.to_string().contains("matched 10001 rows but returned 1"));
    }

    #[test]
    fn test_report_url_accepts_prefixed_property() {
        let client = AnalyticsDataClient::new(
            "https://api.example.com/v1beta/",
            TokenProvider::static_token("t"),
            Duration::from_secs(5),
            0,
        )
        .unwrap();
        assert_eq!(
            client.report_url("properties/42"),
            "https://api.example.com/v1beta/properties/42:runReport"
        );
        assert_eq!(
            client.report_url("42"),
            "https://api.example.com/v1beta/properties/42:runReport"
        );
    }
}
