//! Dashboard handoff model and HTML rendering.

pub mod model;
pub mod render;

pub use model::{annotate_title, AuditSummary, ChartSpec, DashboardHeader, DashboardModel};
pub use render::render_html;
