//! Lighthouse command-line runner.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::report::AuditReport;
use super::AuditClient;
use crate::error::{PipelineError, PipelineResult};

/// Arguments appended after the audited URL.
const OUTPUT_ARGS: &[&str] = &["--output=json", "--quiet", "--chrome-flags=--headless"];

/// Runs `<program> [leading args] <url> --output=json ...` and parses stdout.
#[derive(Debug, Clone)]
pub struct LighthouseCli {
    program: String,
    leading_args: Vec<String>,
    timeout: Duration,
}

impl LighthouseCli {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout,
        }
    }

    /// Build from a command line such as `"npx lighthouse"`.
    pub fn from_command_line(command: &str, timeout: Duration) -> PipelineResult<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| PipelineError::config("lighthouse command is empty"))?;
        Ok(Self {
            program,
            leading_args: parts.collect(),
            timeout,
        })
    }

    /// Arguments placed between the program and the URL.
    pub fn with_leading_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl AuditClient for LighthouseCli {
    async fn run_audit(&self, url: &str) -> PipelineResult<AuditReport> {
        let started = Instant::now();
        debug!(program = %self.program, url, "starting audit");

        let child = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(url)
            .args(OUTPUT_ARGS)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PipelineError::AuditTool {
                exit_code: None,
                stderr: format!("failed to start {}: {}", self.program, e),
            })?;

        // On timeout the child is dropped, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| PipelineError::AuditTool {
                exit_code: None,
                stderr: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| PipelineError::AuditTool {
                exit_code: None,
                stderr: format!("failed to collect output: {}", e),
            })?;

        if !output.status.success() {
            return Err(PipelineError::AuditTool {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let report =
            AuditReport::from_slice(&output.stdout).map_err(|e| PipelineError::InvalidAuditOutput {
                message: e.to_string(),
            })?;

        info!(
            url,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "audit finished"
        );
        Ok(report)
    }

    fn tool_name(&self) -> &'static str {
        "lighthouse"
    }
}
