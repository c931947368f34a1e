//! Page audit: running the tool, persisting its report, projecting it.

pub mod lighthouse;
pub mod projection;
pub mod report;
pub mod store;

use async_trait::async_trait;

use crate::error::PipelineResult;

pub use lighthouse::LighthouseCli;
pub use projection::{to_gauge_specs, to_table_rows, GaugeSpec, TableRow, TableRowKind};
pub use report::{AuditCategory, AuditRecord, AuditReport};
pub use store::AuditResultStore;

/// Produces an audit report for one URL.
#[async_trait]
pub trait AuditClient: Send + Sync {
    async fn run_audit(&self, url: &str) -> PipelineResult<AuditReport>;

    fn tool_name(&self) -> &'static str;
}
