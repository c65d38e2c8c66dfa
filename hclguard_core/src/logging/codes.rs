//! Log codes and their classification
//!
//! Single source of truth for the codes attached to log events and error
//! types, with the metadata used when rendering detailed or JSON logs.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Code wrapper shared by error, warning and success events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CLASSIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILED: Code = Code::new("ERR002");
}

pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const IO_ERROR: Code = Code::new("E008");
    pub const INVALID_ENCODING: Code = Code::new("E009");
    pub const PERMISSION_DENIED: Code = Code::new("E010");
}

pub mod scanner {
    use super::Code;

    pub const UNTERMINATED_CONSTRUCT: Code = Code::new("E020");
    pub const UNCLOSED_BLOCK: Code = Code::new("E021");
    pub const UNBALANCED_BRACE: Code = Code::new("E022");
    pub const NESTING_LIMIT_EXCEEDED: Code = Code::new("E023");
}

pub mod config {
    use super::Code;

    pub const CONFIG_READ_FAILED: Code = Code::new("E030");
    pub const CONFIG_PARSE_FAILED: Code = Code::new("E031");
    pub const INVALID_TAG_RULE: Code = Code::new("E032");
    pub const INVALID_TAG_PATTERN: Code = Code::new("E033");
}

pub mod validation {
    use super::Code;

    pub const LEGACY_PROVIDER_BLOCK: Code = Code::new("E040");
    pub const VERSION_CONFLICT: Code = Code::new("E041");
    pub const ORDER_VIOLATION: Code = Code::new("E042");
    pub const TAG_VIOLATION: Code = Code::new("E043");
    pub const FORMATTER_DIFF: Code = Code::new("E044");
}

pub mod batch {
    use super::Code;

    pub const DISCOVERY_FAILED: Code = Code::new("E050");
    pub const WORKER_FAILED: Code = Code::new("E051");
    pub const FILE_LIMIT_EXCEEDED: Code = Code::new("E052");
}

pub mod command {
    use super::Code;

    pub const COMMAND_NOT_ALLOWED: Code = Code::new("E060");
    pub const COMMAND_TIMEOUT: Code = Code::new("E061");
    pub const COMMAND_FAILED: Code = Code::new("E062");
}

pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const CONFIG_LOADED: Code = Code::new("I007");
    pub const SCAN_COMPLETE: Code = Code::new("I020");
    pub const VALIDATION_PASSED: Code = Code::new("I040");
    pub const BATCH_COMPLETE: Code = Code::new("I050");
    pub const CONFLICT_ANALYSIS_COMPLETE: Code = Code::new("I051");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

const METADATA: &[ErrorMetadata] = &[
    ErrorMetadata::new(
        "ERR001",
        "System",
        Severity::Critical,
        false,
        "Internal error",
        "File a bug report with the failing input",
    ),
    ErrorMetadata::new(
        "ERR002",
        "System",
        Severity::Critical,
        false,
        "Subsystem initialization failed",
        "Check environment variables and logging setup",
    ),
    ErrorMetadata::new(
        "E005",
        "FileProcessing",
        Severity::High,
        true,
        "Input file not found",
        "Verify the path exists",
    ),
    ErrorMetadata::new(
        "E006",
        "FileProcessing",
        Severity::Low,
        true,
        "File extension is not a recognized HCL extension",
        "Pass .tf, .hcl or .tftest.hcl files",
    ),
    ErrorMetadata::new(
        "E007",
        "FileProcessing",
        Severity::High,
        true,
        "File exceeds the maximum size",
        "Split the file or raise HCLGUARD_MAX_FILE_SIZE",
    ),
    ErrorMetadata::new(
        "E008",
        "FileProcessing",
        Severity::High,
        true,
        "I/O error while reading file",
        "Check file system health and permissions",
    ),
    ErrorMetadata::new(
        "E009",
        "FileProcessing",
        Severity::High,
        true,
        "File is not valid UTF-8",
        "Re-encode the file as UTF-8",
    ),
    ErrorMetadata::new(
        "E010",
        "FileProcessing",
        Severity::High,
        true,
        "Permission denied reading file",
        "Check file permissions",
    ),
    ErrorMetadata::new(
        "E020",
        "Scanner",
        Severity::Low,
        true,
        "String, comment or heredoc left open at end of file",
        "Close the construct; later blocks may be misreported",
    ),
    ErrorMetadata::new(
        "E021",
        "Scanner",
        Severity::Low,
        true,
        "Block header without a matching closing brace",
        "Add the missing closing brace",
    ),
    ErrorMetadata::new(
        "E022",
        "Scanner",
        Severity::Low,
        true,
        "Closing brace without an opening brace",
        "Remove the stray brace",
    ),
    ErrorMetadata::new(
        "E023",
        "Scanner",
        Severity::Medium,
        true,
        "Block nesting deeper than the supported limit",
        "Flatten the configuration",
    ),
    ErrorMetadata::new(
        "E030",
        "Config",
        Severity::High,
        false,
        "Configuration file could not be read",
        "Verify the --config path",
    ),
    ErrorMetadata::new(
        "E031",
        "Config",
        Severity::High,
        false,
        "Configuration file could not be parsed",
        "Fix the TOML or JSON syntax",
    ),
    ErrorMetadata::new(
        "E032",
        "Config",
        Severity::High,
        false,
        "Tag rule is missing a name",
        "Give every tag rule a non-empty name",
    ),
    ErrorMetadata::new(
        "E033",
        "Config",
        Severity::High,
        false,
        "Tag rule pattern is not a valid regular expression",
        "Fix the pattern syntax",
    ),
    ErrorMetadata::new(
        "E040",
        "Validation",
        Severity::Medium,
        true,
        "Legacy provider block",
        "Declare providers in required_providers",
    ),
    ErrorMetadata::new(
        "E041",
        "Validation",
        Severity::Medium,
        true,
        "Module version conflict",
        "Pin every reference to the same version",
    ),
    ErrorMetadata::new(
        "E042",
        "Validation",
        Severity::Medium,
        true,
        "Block ordering violation",
        "Sort the blocks alphabetically",
    ),
    ErrorMetadata::new(
        "E043",
        "Validation",
        Severity::Medium,
        true,
        "Tag rule violation",
        "Fix the resource tags",
    ),
    ErrorMetadata::new(
        "E044",
        "Validation",
        Severity::Medium,
        true,
        "File differs from formatter output",
        "Run the formatter",
    ),
    ErrorMetadata::new(
        "E050",
        "Batch",
        Severity::High,
        true,
        "File discovery failed",
        "Check directory permissions",
    ),
    ErrorMetadata::new(
        "E051",
        "Batch",
        Severity::Critical,
        false,
        "Worker thread failed",
        "File a bug report with the failing input",
    ),
    ErrorMetadata::new(
        "E052",
        "Batch",
        Severity::Medium,
        true,
        "Batch file limit exceeded",
        "Narrow the input paths or raise the limit",
    ),
    ErrorMetadata::new(
        "E060",
        "Command",
        Severity::Medium,
        true,
        "Formatter command is not allowlisted",
        "Use an allowlisted formatter binary",
    ),
    ErrorMetadata::new(
        "E061",
        "Command",
        Severity::Medium,
        true,
        "Formatter command timed out",
        "Raise HCLGUARD_FORMATTER_TIMEOUT_SECS",
    ),
    ErrorMetadata::new(
        "E062",
        "Command",
        Severity::Medium,
        true,
        "Formatter command failed",
        "Run the formatter manually to inspect its output",
    ),
    ErrorMetadata::new(
        "I001",
        "Success",
        Severity::Low,
        true,
        "Operation completed",
        "None",
    ),
    ErrorMetadata::new(
        "I004",
        "Success",
        Severity::Low,
        true,
        "Logging initialized",
        "None",
    ),
    ErrorMetadata::new(
        "I006",
        "Success",
        Severity::Low,
        true,
        "File processed",
        "None",
    ),
    ErrorMetadata::new(
        "I007",
        "Success",
        Severity::Low,
        true,
        "Configuration loaded",
        "None",
    ),
    ErrorMetadata::new("I020", "Success", Severity::Low, true, "Scan complete", "None"),
    ErrorMetadata::new(
        "I040",
        "Success",
        Severity::Low,
        true,
        "Validation passed",
        "None",
    ),
    ErrorMetadata::new("I050", "Success", Severity::Low, true, "Batch complete", "None"),
    ErrorMetadata::new(
        "I051",
        "Success",
        Severity::Low,
        true,
        "Module conflict analysis complete",
        "None",
    ),
];

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        METADATA
            .iter()
            .map(|metadata| (metadata.code, metadata.clone()))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
