//! Flat-file persistence of the last audit report.
//!
//! Writes go to a temp file in the target directory and are renamed
//! into place, so a reader sees either the old or the new report. Runs
//! are assumed to be driven by a single operator: concurrent writers are
//! not locked against each other and the last rename wins.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::report::AuditReport;
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone)]
pub struct AuditResultStore {
    path: PathBuf,
}

impl AuditResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the stored report.
    pub fn save(&self, report: &AuditReport) -> PipelineResult<()> {
        let bytes = report.raw_bytes();

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| self.error(format!("failed to create directory: {}", e)))?;

        let mut temp = NamedTempFile::new_in(&dir)
            .map_err(|e| self.error(format!("failed to create temp file: {}", e)))?;
        temp.write_all(bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| self.error(format!("failed to write temp file: {}", e)))?;
        temp.persist(&self.path)
            .map_err(|e| self.error(format!("failed to rename temp file: {}", e.error)))?;

        info!(path = %self.path.display(), bytes = bytes.len(), "saved audit report");
        Ok(())
    }

    /// Read the stored report back. Any failure is fatal for the run.
    pub fn load(&self) -> PipelineResult<AuditReport> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                self.error("audit results file not found")
            } else {
                self.error(format!("failed to read audit results: {}", e))
            }
        })?;

        let report = AuditReport::from_slice(&bytes)
            .map_err(|e| self.error(format!("audit results are not valid JSON: {}", e)))?;

        debug!(path = %self.path.display(), "loaded audit report");
        Ok(report)
    }

    fn error(&self, message: impl Into<String>) -> PipelineError {
        PipelineError::AuditStore {
            path: self.path.display().to_string(),
            message: message.into(),
        }
    }
}
