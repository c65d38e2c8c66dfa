use crate::logging::codes::{self, Code};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration failures. These are the only errors validators propagate;
/// everything about the scanned text itself becomes a `Finding`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON in '{path}': {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} tag rule #{index} is missing its 'name' field")]
    MissingRuleName { kind: &'static str, index: usize },

    #[error("{kind} tag rule #{index} has an empty 'name'")]
    EmptyRuleName { kind: &'static str, index: usize },

    #[error("Tag rule '{rule}' has an invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown check '{0}' (expected one of: providers, module-versions, ordering, tags)")]
    UnknownCheck(String),
}

impl ConfigError {
    pub fn error_code(&self) -> Code {
        match self {
            ConfigError::Read { .. } => codes::config::CONFIG_READ_FAILED,
            ConfigError::TomlParse { .. } | ConfigError::JsonParse { .. } => {
                codes::config::CONFIG_PARSE_FAILED
            }
            ConfigError::MissingRuleName { .. } | ConfigError::EmptyRuleName { .. } => {
                codes::config::INVALID_TAG_RULE
            }
            ConfigError::InvalidPattern { .. } => codes::config::INVALID_TAG_PATTERN,
            ConfigError::UnknownCheck(_) => codes::config::CONFIG_PARSE_FAILED,
        }
    }
}
