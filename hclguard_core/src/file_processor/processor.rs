//! File intake: path checks, size limit, UTF-8 decoding

use crate::config::constants::compile_time::file_processing::{HCL_EXTENSIONS, MAX_FILE_SIZE};
use crate::config::runtime::ScanPreferences;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

#[derive(Debug, Clone, thiserror::Error)]
pub enum FileProcessorError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Not an HCL configuration file: {path}")]
    InvalidExtension { path: String },

    #[error("File too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid UTF-8 encoding in file: {path}")]
    InvalidEncoding { path: String },

    #[error("I/O error reading file: {message}")]
    IoError { message: String },
}

impl FileProcessorError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            FileProcessorError::FileNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            FileProcessorError::InvalidExtension { .. } => {
                codes::file_processing::INVALID_EXTENSION
            }
            FileProcessorError::FileTooLarge { .. } => codes::file_processing::FILE_TOO_LARGE,
            FileProcessorError::PermissionDenied { .. } => {
                codes::file_processing::PERMISSION_DENIED
            }
            FileProcessorError::InvalidEncoding { .. } => codes::file_processing::INVALID_ENCODING,
            FileProcessorError::IoError { .. } => codes::file_processing::IO_ERROR,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    fn from_io(error: io::Error, path: &Path) -> Self {
        let path = path.display().to_string();
        match error.kind() {
            io::ErrorKind::NotFound => FileProcessorError::FileNotFound { path },
            io::ErrorKind::PermissionDenied => FileProcessorError::PermissionDenied { path },
            _ => FileProcessorError::IoError {
                message: format!("{}: {}", path, error),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub size: u64,
    pub line_count: usize,
    pub modified: Option<SystemTime>,
}

impl FileMetadata {
    pub fn human_readable_size(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", self.size, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

/// File text plus metadata, as handed to the checks
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    pub metadata: FileMetadata,
    pub read_duration: Duration,
}

/// `.tf`, `.tftest.hcl`, `.hcl`; `.tf.json` is not HCL syntax
pub fn is_hcl_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| HCL_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
        .unwrap_or(false)
}

pub struct FileProcessor {
    /// Effective size limit, never above the compile-time maximum
    pub max_file_size: u64,
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::from_preferences(&ScanPreferences::default())
    }
}

impl FileProcessor {
    pub fn from_preferences(prefs: &ScanPreferences) -> Self {
        Self {
            max_file_size: prefs.max_file_size.min(MAX_FILE_SIZE),
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size.min(MAX_FILE_SIZE);
        self
    }

    pub fn process_file(&self, path: &Path) -> Result<SourceFile, FileProcessorError> {
        let start_time = Instant::now();
        log_debug!("Reading file", "file" => path.display());

        let result = self.read_source(path, start_time);
        if let Err(error) = &result {
            log_error!(error.error_code(), "File intake failed",
                "file" => path.display(),
                "error" => error
            );
        }
        result
    }

    fn read_source(
        &self,
        path: &Path,
        start_time: Instant,
    ) -> Result<SourceFile, FileProcessorError> {
        if !is_hcl_file(path) {
            return Err(FileProcessorError::InvalidExtension {
                path: path.display().to_string(),
            });
        }

        let metadata = fs::metadata(path).map_err(|e| FileProcessorError::from_io(e, path))?;
        if !metadata.is_file() {
            return Err(FileProcessorError::IoError {
                message: format!("{}: not a regular file", path.display()),
            });
        }
        if metadata.len() > self.max_file_size {
            return Err(FileProcessorError::FileTooLarge {
                size: metadata.len(),
                max_size: self.max_file_size,
            });
        }

        let bytes = fs::read(path).map_err(|e| FileProcessorError::from_io(e, path))?;
        let text = String::from_utf8(bytes).map_err(|_| FileProcessorError::InvalidEncoding {
            path: path.display().to_string(),
        })?;

        let file_metadata = FileMetadata {
            path: path.to_path_buf(),
            size: metadata.len(),
            line_count: text.lines().count(),
            modified: metadata.modified().ok(),
        };

        let source = SourceFile {
            path: path.to_path_buf(),
            text,
            metadata: file_metadata,
            read_duration: start_time.elapsed(),
        };

        log_success!(
            codes::success::FILE_PROCESSING_SUCCESS,
            "File read",
            "file" => path.display(),
            "size" => source.metadata.human_readable_size(),
            "lines" => source.metadata.line_count,
            "duration_ms" => format!("{:.2}", source.read_duration.as_secs_f64() * 1000.0)
        );
        Ok(source)
    }
}
