//! Module reference collection
//!
//! Every top-level `module` block with a literal `source` becomes one
//! [`ModuleReference`]. References accumulate across a batch and are handed
//! to the conflict detector once all files are scanned.

use crate::attributes::{extract_attributes, find};
use crate::log_debug;
use crate::scanner::ScanResult;
use crate::sources::{describe_version, normalize, IdentityKey, VcsRef};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReference {
    pub file_path: PathBuf,
    pub line: u32,
    pub name: String,
    pub raw_source: String,
    pub version: Option<String>,
    pub vcs_ref: Option<VcsRef>,
    pub identity: IdentityKey,
}

impl ModuleReference {
    pub fn new(
        file_path: impl AsRef<Path>,
        line: u32,
        name: impl Into<String>,
        raw_source: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        let raw_source = raw_source.into();
        let normalized = normalize(&raw_source);
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            line,
            name: name.into(),
            raw_source,
            version,
            vcs_ref: normalized.vcs_ref,
            identity: normalized.identity,
        }
    }

    /// The `(version, vcs_ref)` pair that must agree within an identity
    pub fn pin(&self) -> (Option<&str>, Option<&VcsRef>) {
        (self.version.as_deref(), self.vcs_ref.as_ref())
    }

    pub fn describe_version(&self) -> String {
        describe_version(self.version.as_deref(), self.vcs_ref.as_ref())
    }

    pub fn location(&self) -> String {
        format!("{}:{}", self.file_path.display(), self.line)
    }
}

/// True when any exclusion substring occurs in the path
pub fn is_excluded(file_path: &Path, exclude_dirs: &[String]) -> bool {
    let path = file_path.to_string_lossy();
    exclude_dirs
        .iter()
        .any(|dir| !dir.is_empty() && path.contains(dir.as_str()))
}

pub fn collect_module_references(
    file_path: &Path,
    text: &str,
    scan: &ScanResult,
    exclude_dirs: &[String],
) -> Vec<ModuleReference> {
    if is_excluded(file_path, exclude_dirs) {
        log_debug!("Skipping module references in excluded path",
            "file" => file_path.display()
        );
        return Vec::new();
    }

    let mut references = Vec::new();
    for block in scan.top_level_of_kind("module") {
        let attributes = extract_attributes(text, block);
        let Some(source) = find(&attributes, "source").and_then(|a| a.string_value()) else {
            log_debug!("Module block without a literal source",
                "module" => block.first_label().unwrap_or(""),
                "line" => block.header_line
            );
            continue;
        };
        let version = find(&attributes, "version").and_then(|a| a.string_value());

        references.push(ModuleReference::new(
            file_path,
            block.header_line,
            block.first_label().unwrap_or_default(),
            source,
            version,
        ));
    }
    references
}
