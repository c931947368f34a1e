//! Page-audit report snapshot and its typed views.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{PipelineError, PipelineResult};

/// The audit tool's JSON document, kept verbatim.
///
/// The bytes the tool printed are retained and are what gets persisted, so
/// the stored file is byte-identical to the tool output. Typed views are
/// derived on demand from the parsed document and never written back.
#[derive(Debug, Clone)]
pub struct AuditReport {
    document: Value,
    raw: Arc<[u8]>,
}

impl PartialEq for AuditReport {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl Serialize for AuditReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

/// A grouped score such as "performance".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditCategory {
    /// Key of the category in the report.
    pub name: String,
    pub title: Option<String>,
    /// Score in `[0, 1]`.
    pub score: f64,
    /// Ids of the audits contributing to this category.
    pub audit_refs: Vec<String>,
}

/// A single checked condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    pub id: String,
    pub title: Option<String>,
    /// Score in `[0, 1]`; `None` for informative or not-applicable audits.
    pub score: Option<f64>,
}

impl AuditReport {
    /// Report built in memory; its raw form is the compact serialization.
    pub fn from_value(document: Value) -> Self {
        let raw = serde_json::to_vec(&document).unwrap_or_default();
        Self {
            document,
            raw: raw.into(),
        }
    }

    /// Parse tool output, keeping the exact bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let document = serde_json::from_slice(bytes)?;
        Ok(Self {
            document,
            raw: bytes.into(),
        })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The document exactly as produced.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// URL the audit was run against, when the tool recorded it.
    pub fn requested_url(&self) -> Option<&str> {
        self.document.get("requestedUrl").and_then(Value::as_str)
    }

    /// Timestamp string recorded by the tool.
    pub fn fetch_time(&self) -> Option<&str> {
        self.document.get("fetchTime").and_then(Value::as_str)
    }

    /// Fail with [`PipelineError::MissingCategories`] unless the report
    /// carries a `categories` key.
    pub fn require_categories(&self) -> PipelineResult<()> {
        match self.document.get("categories") {
            Some(_) => Ok(()),
            None => Err(PipelineError::MissingCategories),
        }
    }

    /// Categories in document order.
    pub fn categories(&self) -> PipelineResult<Vec<AuditCategory>> {
        self.require_categories()?;
        let map = self
            .document
            .get("categories")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("categories is not an object"))?;

        map.iter()
            .map(|(name, category)| parse_category(name, category))
            .collect()
    }

    /// Look up an audit by id.
    pub fn audit(&self, id: &str) -> Option<AuditRecord> {
        let audit = self.document.get("audits")?.get(id)?;
        Some(AuditRecord {
            id: id.to_string(),
            title: audit.get("title").and_then(Value::as_str).map(String::from),
            score: audit.get("score").and_then(Value::as_f64),
        })
    }
}

fn parse_category(name: &str, category: &Value) -> PipelineResult<AuditCategory> {
    let score = category
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| malformed(format!("category {} has no numeric score", name)))?;

    let audit_refs = match category.get("auditRefs") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(refs)) => refs
            .iter()
            .map(|r| match r {
                Value::String(id) => Ok(id.clone()),
                other => other
                    .get("id")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .ok_or_else(|| malformed(format!("category {} has an auditRef without id", name))),
            })
            .collect::<PipelineResult<Vec<_>>>()?,
        Some(_) => return Err(malformed(format!("category {} auditRefs is not a list", name))),
    };

    Ok(AuditCategory {
        name: name.to_string(),
        title: category
            .get("title")
            .and_then(Value::as_str)
            .map(String::from),
        score,
        audit_refs,
    })
}

fn malformed(message: impl Into<String>) -> PipelineError {
    PipelineError::MalformedAuditReport {
        message: message.into(),
    }
}
