//! Global logging
//!
//! A process-wide `LoggingService` behind a `OnceLock`, a per-thread file
//! context so events raised inside a validator carry the file being checked,
//! and the support functions behind the `log_*!` macros.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
#[cfg(feature = "log-bridge")]
pub use service::FacadeLogger;
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static FILE_CONTEXT: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Install the environment-configured service as the global logger
pub fn init_global_logging() -> Result<(), String> {
    let service = Arc::new(LoggingService::with_config());
    init_global_logging_with_service(service)
}

/// Install a caller-built service (CLI bridge, tests)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service.clone())
        .map_err(|_| "Global logger already initialized".to_string())?;

    service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));
    Ok(())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

/// Cheap check used by `log_debug!` to skip formatting
pub fn debug_enabled() -> bool {
    try_get_global_logger()
        .map(|logger| logger.should_log(LogLevel::Debug))
        .unwrap_or(false)
}

// ============================================================================
// FILE CONTEXT MANAGEMENT
// ============================================================================

pub fn set_file_context(file_path: &Path) {
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(file_path.to_path_buf());
    });
}

pub fn clear_file_context() {
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
}

/// Run `f` with `file_path` as this thread's file context
pub fn with_file_context<F, R>(file_path: &Path, f: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = get_current_file_context();
    set_file_context(file_path);
    let result = f();
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = previous;
    });
    result
}

pub fn get_current_file_context() -> Option<PathBuf> {
    FILE_CONTEXT.with(|ctx| ctx.borrow().clone())
}

// ============================================================================
// MACRO SUPPORT
// ============================================================================

/// Backing function for every `log_*!` macro
pub fn log_with_context(
    level: LogLevel,
    code: Option<Code>,
    message: &str,
    context: Vec<(&str, String)>,
) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };
    if !logger.should_log(level) {
        return;
    }

    let mut event = match (level, code) {
        (LogLevel::Error, Some(code)) => LogEvent::error(code, message),
        (LogLevel::Error, None) => LogEvent::error(codes::system::INTERNAL_ERROR, message),
        (LogLevel::Warning, Some(code)) => LogEvent::warning_with_code(code, message),
        (LogLevel::Warning, None) => LogEvent::warning(message),
        (LogLevel::Info, Some(code)) => LogEvent::success(code, message),
        (LogLevel::Info, None) => LogEvent::info(message),
        (LogLevel::Debug, _) => LogEvent::debug(message),
    };

    for (key, value) in &context {
        event = event.with_context(key, value);
    }

    if let Some(file) = get_current_file_context() {
        let line = context
            .iter()
            .find(|(key, _)| *key == "line")
            .and_then(|(_, value)| value.parse().ok());
        event = event.with_location(&file, line);
    }

    logger.log_event(event);
}

/// Error logging that falls back to stderr when no logger is installed
pub fn safe_log_error(code: Code, message: &str) {
    match try_get_global_logger() {
        Some(logger) => logger.log_error(code, message),
        None => eprintln!("[ERROR] {} - {}", code.as_str(), message),
    }
}
