//! Finding model
//!
//! A `Finding` is the only product of every validator. Each finding is
//! classified as exactly one of `error` or `warning`; downstream pass/fail
//! decisions look only for the presence of an `error`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FINDING CODES
// ============================================================================

/// Stable identifiers for every kind of finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCode {
    UnterminatedBlock,
    UnbalancedBrace,
    LegacyProviderBlock,
    VersionConflict,
    OrderViolation,
    TagViolation,
    FormatterDiff,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCode::UnterminatedBlock => "unterminated-block",
            FindingCode::UnbalancedBrace => "unbalanced-brace",
            FindingCode::LegacyProviderBlock => "legacy-provider-block",
            FindingCode::VersionConflict => "version-conflict",
            FindingCode::OrderViolation => "order-violation",
            FindingCode::TagViolation => "tag-violation",
            FindingCode::FormatterDiff => "formatter-diff",
        }
    }

    /// Severity every finding of this code carries
    pub fn severity(&self) -> Severity {
        match self {
            FindingCode::UnterminatedBlock | FindingCode::UnbalancedBrace => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FindingCode::UnterminatedBlock => {
                "String, comment, heredoc or block left open at end of file"
            }
            FindingCode::UnbalancedBrace => "Closing brace without a matching opening brace",
            FindingCode::LegacyProviderBlock => {
                "Provider configured outside a required_providers declaration"
            }
            FindingCode::VersionConflict => {
                "Same module source pinned to different versions or refs"
            }
            FindingCode::OrderViolation => "Named blocks are not in alphabetical order",
            FindingCode::TagViolation => "Resource tags do not satisfy the configured tag rules",
            FindingCode::FormatterDiff => "File differs from the external formatter output",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FINDING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub file_path: PathBuf,
    pub line: u32,
    pub severity: Severity,
    pub code: FindingCode,
    pub message: String,
}

impl Finding {
    /// Severity is derived from the code.
    pub fn new(
        file_path: impl AsRef<Path>,
        line: u32,
        code: FindingCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            line,
            severity: code.severity(),
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}[{}] {}",
            self.file_path.display(),
            self.line,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// True when any finding should fail the run.
pub fn has_errors<'a, I>(findings: I) -> bool
where
    I: IntoIterator<Item = &'a Finding>,
{
    findings.into_iter().any(Finding::is_error)
}

/// Deterministic ordering for reports: path, line, code, message.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then(a.line.cmp(&b.line))
            .then(a.code.as_str().cmp(b.code.as_str()))
            .then(a.message.cmp(&b.message))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_code() {
        let degraded = Finding::new("main.tf", 3, FindingCode::UnterminatedBlock, "open");
        assert!(degraded.is_warning());

        for code in [
            FindingCode::LegacyProviderBlock,
            FindingCode::VersionConflict,
            FindingCode::OrderViolation,
            FindingCode::TagViolation,
            FindingCode::FormatterDiff,
        ] {
            assert_eq!(Finding::new("x.tf", 1, code, "m").severity, Severity::Error);
        }
    }

    #[test]
    fn test_display_and_serialization() {
        let finding = Finding::new("mod/main.tf", 7, FindingCode::TagViolation, "missing");
        assert_eq!(
            finding.to_string(),
            "mod/main.tf:7: error[tag-violation] missing"
        );

        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["code"], "tag-violation");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["line"], 7);
    }

    #[test]
    fn test_has_errors_and_sorting() {
        let mut findings = vec![
            Finding::new("b.tf", 1, FindingCode::OrderViolation, "x"),
            Finding::new("a.tf", 9, FindingCode::UnterminatedBlock, "y"),
            Finding::new("a.tf", 2, FindingCode::TagViolation, "z"),
        ];
        assert!(has_errors(&findings));
        sort_findings(&mut findings);
        assert_eq!(findings[0].line, 2);
        assert_eq!(findings[1].line, 9);
        assert_eq!(findings[2].file_path, PathBuf::from("b.tf"));

        let warnings_only = vec![Finding::new("a.tf", 1, FindingCode::UnbalancedBrace, "w")];
        assert!(!has_errors(&warnings_only));
    }
}
