//! Batch processing over files and directories
//!
//! Files are checked fork-join: each worker owns a slice of the file list and
//! returns its own results, which are merged after the join. Module
//! references are then folded through the conflict detector on the calling
//! thread.

use crate::config::compile_time::batch::{MAX_FILES_PER_BATCH, MAX_WORKER_THREADS};
use crate::config::compile_time::file_processing::SKIPPED_DIRECTORIES;
use crate::config::BatchPreferences;
use crate::file_processor::{is_hcl_file, FileProcessor};
use crate::findings::{sort_findings, Finding};
use crate::logging::{codes, Code};
use crate::pipeline::{self, CheckContext, FileReport, PipelineError};
use crate::references::ModuleReference;
use crate::validation::conflicts::{self, ConflictGroup};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Files whose presence marks a directory as a reusable module
const MODULE_INTERFACE_FILES: &[&str] = &["variables.tf", "outputs.tf"];

// ============================================================================
// BATCH PROCESSING TYPES
// ============================================================================

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_threads: usize,
    pub recursive: bool,
    pub max_files: Option<usize>,
    pub progress_reporting: bool,
    pub fail_fast: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from_preferences(&BatchPreferences::default())
    }
}

impl BatchConfig {
    pub fn from_preferences(prefs: &BatchPreferences) -> Self {
        let max_threads = if prefs.max_threads == 0 {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            prefs.max_threads
        };
        Self {
            max_threads: max_threads.clamp(1, MAX_WORKER_THREADS),
            recursive: true,
            max_files: None,
            progress_reporting: prefs.progress_reporting,
            fail_fast: prefs.fail_fast,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub code: String,
    pub message: String,
}

impl FailedFile {
    fn new(path: PathBuf, error: &PipelineError) -> Self {
        Self {
            path,
            code: error.error_code().as_str().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BatchResults {
    pub reports: Vec<FileReport>,
    pub failed_files: Vec<FailedFile>,
    pub conflicts: Vec<ConflictGroup>,
    /// One `version-conflict` finding per conflict group
    pub conflict_findings: Vec<Finding>,
    /// Every module reference seen, for conflict reporting
    #[serde(skip)]
    pub module_references: Vec<ModuleReference>,
    pub files_discovered: usize,
    #[serde(skip)]
    pub processing_duration: Duration,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files_processed(&self) -> usize {
        self.reports.len() + self.failed_files.len()
    }

    pub fn add_report(&mut self, report: FileReport) {
        self.reports.push(report);
    }

    pub fn add_failure(&mut self, path: PathBuf, error: PipelineError) {
        self.failed_files.push(FailedFile::new(path, &error));
    }

    pub fn merge(&mut self, other: BatchResults) {
        self.reports.extend(other.reports);
        self.failed_files.extend(other.failed_files);
    }

    /// Per-file and conflict findings, sorted by path then line
    pub fn findings(&self) -> Vec<Finding> {
        let mut findings: Vec<Finding> = self
            .reports
            .iter()
            .flat_map(|report| report.findings.iter().cloned())
            .chain(self.conflict_findings.iter().cloned())
            .collect();
        sort_findings(&mut findings);
        findings
    }

    pub fn error_count(&self) -> usize {
        self.findings().iter().filter(|f| f.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings().iter().filter(|f| f.is_warning()).count()
    }

    /// Any error-severity finding or any file that could not be checked
    pub fn has_errors(&self) -> bool {
        !self.failed_files.is_empty() || self.error_count() > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} files checked, {} failed, {} errors, {} warnings, {} module conflicts in {:.2}s",
            self.reports.len(),
            self.failed_files.len(),
            self.error_count(),
            self.warning_count(),
            self.conflicts.len(),
            self.processing_duration.as_secs_f64()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Path not found: {path}")]
    PathNotFound { path: String },

    #[error("Error while walking {path}: {message}")]
    Discovery { path: String, message: String },

    #[error("Too many files found: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("Thread pool error: {message}")]
    ThreadError { message: String },
}

impl BatchError {
    pub fn error_code(&self) -> Code {
        match self {
            BatchError::PathNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            BatchError::Discovery { .. } => codes::batch::DISCOVERY_FAILED,
            BatchError::TooManyFiles { .. } => codes::batch::FILE_LIMIT_EXCEEDED,
            BatchError::ThreadError { .. } => codes::batch::WORKER_FAILED,
        }
    }
}

// ============================================================================
// FILE DISCOVERY
// ============================================================================

fn is_skipped_directory(name: &str) -> bool {
    SKIPPED_DIRECTORIES.contains(&name)
}

/// Expand files and directories into a sorted, de-duplicated file list.
/// Explicitly named files that are not HCL are skipped, so a hook can pass
/// every staged file.
pub fn discover_files(paths: &[PathBuf], config: &BatchConfig) -> Result<Vec<PathBuf>, BatchError> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_hcl_file(path) {
                files.push(path.clone());
            } else {
                crate::log_debug!("Skipping non-HCL file", "file" => path.display());
            }
            continue;
        }
        if !path.is_dir() {
            return Err(BatchError::PathNotFound {
                path: path.display().to_string(),
            });
        }

        crate::log_info!("Starting file discovery",
            "directory" => path.display(),
            "recursive" => config.recursive
        );

        let walker = WalkDir::new(path)
            .max_depth(if config.recursive { usize::MAX } else { 1 })
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry
                        .file_name()
                        .to_str()
                        .map(is_skipped_directory)
                        .unwrap_or(false)
            });

        for entry in walker {
            let entry = entry.map_err(|e| BatchError::Discovery {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() && is_hcl_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();

    if files.len() > MAX_FILES_PER_BATCH {
        return Err(BatchError::TooManyFiles {
            count: files.len(),
            max: MAX_FILES_PER_BATCH,
        });
    }
    if let Some(max_files) = config.max_files {
        if files.len() > max_files {
            crate::log_warning!(
                codes::batch::FILE_LIMIT_EXCEEDED,
                "Reached maximum file limit",
                "files_found" => files.len(),
                "limit" => max_files
            );
            files.truncate(max_files);
        }
    }

    Ok(files)
}

/// Directories that hold module interface files
pub fn module_directories(files: &[PathBuf]) -> HashSet<PathBuf> {
    files
        .iter()
        .filter(|file| {
            file.file_name()
                .and_then(|name| name.to_str())
                .map(|name| MODULE_INTERFACE_FILES.contains(&name))
                .unwrap_or(false)
        })
        .filter_map(|file| file.parent().map(Path::to_path_buf))
        .collect()
}

// ============================================================================
// BATCH PROCESSING
// ============================================================================

/// Discover files under `paths` and check them all
pub fn process_paths(
    paths: &[PathBuf],
    context: &CheckContext,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let files = discover_files(paths, config)?;
    process_files(&files, context, config)
}

pub fn process_files(
    files: &[PathBuf],
    context: &CheckContext,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let threads = config.max_threads.clamp(1, MAX_WORKER_THREADS);

    crate::log_info!("Starting batch processing",
        "files" => files.len(),
        "max_threads" => threads
    );

    let mut module_dirs = module_directories(files);
    module_dirs.extend(context.module_dirs.iter().cloned());
    let context = context.clone().with_module_dirs(module_dirs);
    let processor = FileProcessor::default();

    let mut results = BatchResults::new();
    results.files_discovered = files.len();

    // Each chunk is one fork-join round; fail-fast stops between rounds
    let chunk_size = calculate_chunk_size(files.len(), threads);
    for (round, chunk) in files.chunks(chunk_size.max(1) * threads).enumerate() {
        let chunk_results = process_chunk_parallel(chunk, &context, &processor, threads)?;
        results.merge(chunk_results);

        if config.progress_reporting {
            crate::log_info!("Batch progress",
                "round" => round + 1,
                "files_done" => results.files_processed(),
                "files_total" => files.len()
            );
        }

        if config.fail_fast && !results.failed_files.is_empty() {
            crate::log_warning!(
                codes::batch::WORKER_FAILED,
                "Fail-fast mode enabled, stopping batch processing",
                "failed" => results.failed_files.len()
            );
            break;
        }
    }

    results.module_references = results
        .reports
        .iter()
        .flat_map(|report| report.module_references.iter().cloned())
        .collect();
    results.conflicts = conflicts::detect(&results.module_references);
    results.conflict_findings = conflicts::conflict_findings(&results.conflicts);
    results.processing_duration = start_time.elapsed();

    crate::log_success!(
        codes::success::BATCH_COMPLETE,
        "Batch processing completed",
        "files_processed" => results.files_processed(),
        "failed" => results.failed_files.len(),
        "conflicts" => results.conflicts.len(),
        "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
    );

    Ok(results)
}

/// Split `files` across up to `threads` scoped workers, each returning its
/// own results
fn process_chunk_parallel(
    files: &[PathBuf],
    context: &CheckContext,
    processor: &FileProcessor,
    threads: usize,
) -> Result<BatchResults, BatchError> {
    let files_per_thread = files.len().div_ceil(threads).max(1);

    thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(files_per_thread)
            .map(|slice| {
                scope.spawn(move || {
                    let mut local = BatchResults::new();
                    for file_path in slice {
                        match pipeline::process_file(processor, file_path, context) {
                            Ok(report) => local.add_report(report),
                            Err(error) => local.add_failure(file_path.clone(), error),
                        }
                    }
                    local
                })
            })
            .collect();

        let mut merged = BatchResults::new();
        for handle in handles {
            let local = handle.join().map_err(|_| BatchError::ThreadError {
                message: "Worker panicked during processing".to_string(),
            })?;
            merged.merge(local);
        }
        Ok(merged)
    })
}

fn calculate_chunk_size(file_count: usize, threads: usize) -> usize {
    const MIN_CHUNK_SIZE: usize = 1;
    const MAX_CHUNK_SIZE: usize = 50;

    file_count
        .div_ceil(threads.max(1))
        .clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::FindingCode;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, text: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    fn config(threads: usize) -> BatchConfig {
        BatchConfig {
            max_threads: threads,
            recursive: true,
            max_files: None,
            progress_reporting: false,
            fail_fast: false,
        }
    }

    #[test]
    fn test_discovery_skips_tool_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.tf", "");
        write(dir.path(), "nested/net.tf", "");
        write(dir.path(), "tests/unit.tftest.hcl", "");
        write(dir.path(), "main.tf.json", "{}");
        write(dir.path(), ".terraform/modules/vpc/main.tf", "");
        write(dir.path(), "README.md", "");

        let files = discover_files(&[dir.path().to_path_buf()], &config(2)).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["main.tf", "nested/net.tf", "tests/unit.tftest.hcl"]);

        let shallow = BatchConfig {
            recursive: false,
            ..config(2)
        };
        assert_eq!(discover_files(&[dir.path().to_path_buf()], &shallow).unwrap().len(), 1);
    }

    #[test]
    fn test_discovery_limits_and_missing_paths() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            write(dir.path(), &format!("f{}.tf", i), "");
        }
        let limited = BatchConfig {
            max_files: Some(3),
            ..config(1)
        };
        assert_eq!(discover_files(&[dir.path().to_path_buf()], &limited).unwrap().len(), 3);

        let error = discover_files(&[dir.path().join("nope")], &config(1)).unwrap_err();
        assert!(matches!(error, BatchError::PathNotFound { .. }));
    }

    #[test]
    fn test_conflicts_across_files() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a/main.tf",
            "module \"vpc\" {\n  source  = \"terraform-aws-modules/vpc/aws\"\n  version = \"3.0.0\"\n}\n",
        );
        write(
            dir.path(),
            "b/main.tf",
            "module \"vpc\" {\n  source  = \"terraform-aws-modules/vpc/aws\"\n  version = \"3.1.0\"\n}\n",
        );

        let paths = [dir.path().to_path_buf()];
        let results = process_paths(&paths, &CheckContext::default(), &config(2)).unwrap();
        assert_eq!(results.reports.len(), 2);
        assert_eq!(results.conflicts.len(), 1);
        assert_eq!(results.conflicts[0].members.len(), 2);

        let findings = results.findings();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, FindingCode::VersionConflict);
        assert!(findings[0].file_path.ends_with("b/main.tf"));
        assert!(results.has_errors());
    }

    #[test]
    fn test_results_independent_of_thread_count() {
        let dir = TempDir::new().unwrap();
        for i in 0..12 {
            write(
                dir.path(),
                &format!("m{:02}/main.tf", i),
                &format!(
                    "variable \"b\" {{}}\nvariable \"a\" {{}}\nmodule \"x\" {{\n  source = \"org/x/aws\"\n  version = \"{}\"\n}}\n",
                    i % 2
                ),
            );
        }
        let paths = [dir.path().to_path_buf()];
        let single = process_paths(&paths, &CheckContext::default(), &config(1)).unwrap();
        let many = process_paths(&paths, &CheckContext::default(), &config(4)).unwrap();

        assert_eq!(single.findings(), many.findings());
        assert_eq!(single.conflicts, many.conflicts);
        assert_eq!(single.findings().len(), 13);
    }

    #[test]
    fn test_malformed_file_does_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.tf", "resource \"x\" \"y\" {\n  name = \"unterminated\n");
        write(dir.path(), "b.tf", "provider \"aws\" {}\n");
        let bad = dir.path().join("c.tf");
        fs::write(&bad, [0xffu8, 0xfe]).unwrap();

        let paths = [dir.path().to_path_buf()];
        let results = process_paths(&paths, &CheckContext::default(), &config(2)).unwrap();
        assert_eq!(results.reports.len(), 2);
        assert_eq!(results.failed_files.len(), 1);
        assert_eq!(results.failed_files[0].code, "E009");
        assert!(results.reports[0].degraded);
        assert_eq!(results.reports[1].findings[0].code, FindingCode::LegacyProviderBlock);
    }

    #[test]
    fn test_explicit_non_hcl_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let readme = write(dir.path(), "README.md", "# infra\n");
        let lock = write(dir.path(), ".terraform.lock.hcl.bak", "");
        let main = write(dir.path(), "main.tf", "variable \"a\" {}\n");

        let paths = [readme, lock, main.clone()];
        assert_eq!(discover_files(&paths, &config(1)).unwrap(), vec![main]);

        let results = process_paths(&paths, &CheckContext::default(), &config(1)).unwrap();
        assert!(results.failed_files.is_empty());
        assert_eq!(results.reports.len(), 1);
        assert!(!results.has_errors());
    }

    #[test]
    fn test_module_directories_switch_provider_hint() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "net/variables.tf", "");
        write(dir.path(), "net/providers.tf", "provider \"aws\" {}\n");

        let paths = [dir.path().to_path_buf()];
        let results = process_paths(&paths, &CheckContext::default(), &config(1)).unwrap();
        let findings = results.findings();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("configuration_aliases"));
    }

    #[test]
    fn test_fail_fast_stops_between_rounds() {
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for i in 0..120 {
            let path = dir.path().join(format!("f{:03}.tf", i));
            if i == 0 {
                fs::write(&path, [0xffu8]).unwrap();
            } else {
                fs::write(&path, "").unwrap();
            }
            files.push(path);
        }
        let fail_fast = BatchConfig {
            fail_fast: true,
            ..config(1)
        };
        let results = process_files(&files, &CheckContext::default(), &fail_fast).unwrap();
        assert_eq!(results.failed_files.len(), 1);
        assert!(results.files_processed() < files.len());
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert_eq!(calculate_chunk_size(0, 4), 1);
        assert_eq!(calculate_chunk_size(10, 4), 3);
        assert_eq!(calculate_chunk_size(10_000, 2), 50);
    }
}
