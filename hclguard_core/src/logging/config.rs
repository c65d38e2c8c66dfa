//! Logging settings resolved from runtime preferences

use crate::config::compile_time::logging::MAX_BUFFERED_EVENTS;
use crate::config::runtime::LoggingPreferences;
use crate::logging::events::LogLevel;
use std::sync::OnceLock;

static RUNTIME_PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

/// Environment is read once per process
fn get_runtime_preferences() -> LoggingPreferences {
    RUNTIME_PREFERENCES
        .get_or_init(LoggingPreferences::default)
        .clone()
}

pub fn get_min_log_level() -> LogLevel {
    LogLevel::parse(&get_runtime_preferences().min_log_level).unwrap_or(LogLevel::Warning)
}

pub fn use_structured_logging() -> bool {
    get_runtime_preferences().structured
}

pub fn get_event_buffer_size() -> usize {
    get_runtime_preferences()
        .event_buffer_size
        .clamp(1, MAX_BUFFERED_EVENTS)
}
