//! File processor with compile-time limits and global logging integration

mod processor;

pub use processor::{is_hcl_file, FileMetadata, FileProcessor, FileProcessorError, SourceFile};

use std::path::Path;

/// Read one file with default preferences
pub fn process_file(path: &Path) -> Result<SourceFile, FileProcessorError> {
    FileProcessor::default().process_file(path)
}

pub fn get_error_code(error: &FileProcessorError) -> crate::logging::Code {
    error.error_code()
}
