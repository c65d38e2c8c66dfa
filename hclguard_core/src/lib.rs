//! Static analysis for HCL infrastructure code
//!
//! The [`scanner`] recovers block structure from raw text; [`attributes`]
//! reads block bodies; the [`validation`] checks turn that structure into
//! [`findings::Finding`]s. [`pipeline`] runs the per-file checks and
//! [`batch`] drives them over many files.

pub mod attributes;
pub mod batch;
pub mod config;
pub mod file_processor;
pub mod findings;
pub mod formatter;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod references;
pub mod scanner;
pub mod sources;
pub mod utils;
pub mod validation;

// Re-export key types for library consumers
pub use batch::{BatchConfig, BatchError, BatchResults};
pub use config::{ConfigError, LintConfig, Ruleset};
pub use findings::{Finding, FindingCode, Severity};
pub use pipeline::{check_source, CheckContext, FileReport, PipelineError};
pub use scanner::{scan, Block, ScanResult};
