// RUNTIME PREFERENCES (environment driven)

use super::constants::compile_time;
use serde::{Deserialize, Serialize};
use std::env;

fn env_or<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPreferences {
    /// Largest file accepted, capped by the compile-time limit
    pub max_file_size: u64,

    /// Emit scanner degradation warnings (`unterminated-block`, `unbalanced-brace`)
    pub report_degraded_input: bool,
}

impl Default for ScanPreferences {
    fn default() -> Self {
        Self {
            max_file_size: env_or(
                "HCLGUARD_MAX_FILE_SIZE",
                compile_time::file_processing::MAX_FILE_SIZE,
            )
            .min(compile_time::file_processing::MAX_FILE_SIZE),
            report_degraded_input: env_or("HCLGUARD_REPORT_DEGRADED", true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPreferences {
    /// Worker threads; 0 means one per available core
    pub max_threads: usize,

    /// Stop scheduling new work after the first file-level failure
    pub fail_fast: bool,

    /// Emit progress events while processing
    pub progress_reporting: bool,
}

impl Default for BatchPreferences {
    fn default() -> Self {
        Self {
            max_threads: env_or("HCLGUARD_MAX_THREADS", 0usize)
                .min(compile_time::batch::MAX_WORKER_THREADS),
            fail_fast: env_or("HCLGUARD_FAIL_FAST", false),
            progress_reporting: env_or("HCLGUARD_PROGRESS", false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatterPreferences {
    pub timeout_secs: u64,
}

impl Default for FormatterPreferences {
    fn default() -> Self {
        Self {
            timeout_secs: env_or(
                "HCLGUARD_FORMATTER_TIMEOUT_SECS",
                compile_time::formatter::DEFAULT_TIMEOUT_SECS,
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// `error`, `warn`, `info` or `debug`
    pub min_log_level: String,

    /// JSON lines instead of plain text
    pub structured: bool,

    pub event_buffer_size: usize,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            min_log_level: env::var("HCLGUARD_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
            structured: env::var("HCLGUARD_LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            event_buffer_size: env_or("HCLGUARD_EVENT_BUFFER_SIZE", 1000usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_respect_compile_time_caps() {
        let scan = ScanPreferences::default();
        assert!(scan.max_file_size <= compile_time::file_processing::MAX_FILE_SIZE);

        let batch = BatchPreferences::default();
        assert!(batch.max_threads <= compile_time::batch::MAX_WORKER_THREADS);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or("HCLGUARD_TEST_UNSET_VARIABLE", 7usize), 7);
    }
}
