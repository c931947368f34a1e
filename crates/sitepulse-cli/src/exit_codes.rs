//! Process exit codes. These are part of the CLI contract.

use sitepulse_core::PipelineError;

pub const SUCCESS: i32 = 0;
/// Anything outside the pipeline: writing `--out`, binding the server.
pub const GENERAL_ERROR: i32 = 1;
pub const CONFIG_ERROR: i32 = 2;
pub const UPSTREAM_ERROR: i32 = 3;
pub const AUDIT_TOOL_ERROR: i32 = 4;
pub const DATA_ERROR: i32 = 5;
pub const AUDIT_STORE_ERROR: i32 = 6;

/// Print the fatal line to stderr and pick the exit code.
pub fn report_fatal(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<PipelineError>() {
        Some(pipeline) => {
            eprintln!("fatal: {}: {}", pipeline.kind(), pipeline);
            pipeline.exit_code()
        }
        None => {
            eprintln!("fatal: {err:#}");
            GENERAL_ERROR
        }
    }
}
