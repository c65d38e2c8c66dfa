use crate::findings::{has_errors, Finding};
use crate::references::ModuleReference;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Everything the per-file checks produced for one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub findings: Vec<Finding>,
    /// Input for the batch-wide conflict detector
    #[serde(skip)]
    pub module_references: Vec<ModuleReference>,
    pub block_count: usize,
    pub degraded: bool,
    #[serde(skip)]
    pub duration: Duration,
}

impl FileReport {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.findings)
    }

    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_warning()).count()
    }

    pub fn log_success(&self) {
        crate::log_success!(
            crate::logging::codes::success::VALIDATION_PASSED,
            "File checks complete",
            "file" => self.path.display(),
            "blocks" => self.block_count,
            "errors" => self.error_count(),
            "warnings" => self.warning_count(),
            "duration_ms" => format!("{:.2}", self.duration.as_secs_f64() * 1000.0)
        );
    }
}
