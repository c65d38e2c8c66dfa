use hclguard_core::logging::{codes, Code};
use hclguard_core::{BatchError, ConfigError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Invalid JSON for {flag}: {source}")]
    InvalidTagList {
        flag: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot determine working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to render JSON report: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn error_code(&self) -> Code {
        match self {
            CliError::Config(e) => e.error_code(),
            CliError::Batch(e) => e.error_code(),
            CliError::InvalidTagList { .. } => codes::config::INVALID_TAG_RULE,
            CliError::ConfigNotFound(_) => codes::config::CONFIG_READ_FAILED,
            CliError::WorkingDirectory(_) | CliError::Render(_) | CliError::Io(_) => {
                codes::system::INTERNAL_ERROR
            }
        }
    }

    /// 2 for anything wrong with how the run was configured
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Batch(BatchError::ThreadError { .. }) => 1,
            CliError::Render(_) | CliError::Io(_) => 1,
            _ => 2,
        }
    }
}
