//! Gauge and table views of an audit report.
//!
//! Gauges show category scores scaled to `0..=100`; the table keeps the
//! raw `0..=1` scale. The two views disagree on scale and consumers of the
//! table expect the raw values.

use serde::Serialize;

use super::report::AuditReport;
use crate::error::{PipelineError, PipelineResult};

/// One gauge per audit category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeSpec {
    pub category_name: String,
    /// Human-readable title, when the tool recorded one.
    pub title: Option<String>,
    /// Score in `[0, 100]`.
    pub score_percent: f64,
}

impl GaugeSpec {
    /// Title when present, otherwise the category key.
    pub fn display_label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.category_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRowKind {
    Category,
    Audit,
}

/// One line of the audit table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub kind: TableRowKind,
    /// Category name or audit id.
    pub label: String,
    pub title: Option<String>,
    /// Raw score in `[0, 1]`, `None` when the audit has no score.
    pub score: Option<f64>,
}

impl TableRow {
    /// Title when present, otherwise the category name or audit id.
    pub fn display_label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.label)
    }
}

pub fn to_gauge_specs(report: &AuditReport) -> PipelineResult<Vec<GaugeSpec>> {
    Ok(report
        .categories()?
        .into_iter()
        .map(|c| GaugeSpec {
            score_percent: c.score * 100.0,
            category_name: c.name,
            title: c.title,
        })
        .collect())
}

/// Category rows first, then every referenced audit, category by category.
///
/// A reference to an audit id missing from the report fails the whole
/// projection; no rows are returned in that case.
pub fn to_table_rows(report: &AuditReport) -> PipelineResult<Vec<TableRow>> {
    let categories = report.categories()?;

    let mut rows: Vec<TableRow> = categories
        .iter()
        .map(|c| TableRow {
            kind: TableRowKind::Category,
            label: c.name.clone(),
            title: c.title.clone(),
            score: Some(c.score),
        })
        .collect();

    for category in &categories {
        for audit_id in &category.audit_refs {
            let audit = report
                .audit(audit_id)
                .ok_or_else(|| PipelineError::MissingAuditRef {
                    category: category.name.clone(),
                    audit_id: audit_id.clone(),
                })?;
            rows.push(TableRow {
                kind: TableRowKind::Audit,
                label: audit.id,
                title: audit.title,
                score: audit.score,
            });
        }
    }

    Ok(rows)
}
