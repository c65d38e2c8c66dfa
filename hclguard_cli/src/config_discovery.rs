//! Locate the configuration file for a run

use crate::error::CliError;
use hclguard_core::logging::codes;
use hclguard_core::{log_success, LintConfig};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: &[&str] = &[".hclguard.toml", ".hclguard.json"];

/// Nearest config file in `start` or any of its ancestors
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Load the explicit file, else the discovered one, else defaults
pub fn load_config(explicit: Option<&Path>) -> Result<LintConfig, CliError> {
    let path = match explicit {
        Some(path) if !path.is_file() => return Err(CliError::ConfigNotFound(path.to_path_buf())),
        Some(path) => Some(path.to_path_buf()),
        None => {
            let cwd = std::env::current_dir().map_err(CliError::WorkingDirectory)?;
            find_config(&cwd)
        }
    };

    match path {
        Some(path) => {
            let config = LintConfig::from_file(&path)?;
            log_success!(codes::success::CONFIG_LOADED, "Configuration loaded",
                "path" => path.display()
            );
            Ok(config)
        }
        None => Ok(LintConfig::default()),
    }
}
