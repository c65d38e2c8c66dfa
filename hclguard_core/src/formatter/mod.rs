//! Comparison against an external formatter's output
//!
//! The formatter itself runs outside the library; this module only decides
//! whether its output differs from the file and where.

use crate::config::compile_time::formatter::MAX_PREVIEW_LINES;
use crate::findings::{Finding, FindingCode};
use similar::{DiffTag, TextDiff};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterComparison {
    pub differs: bool,
    /// 1-based line in the current text where the first change begins
    pub first_line: u32,
    /// Unified diff, truncated
    pub preview: String,
}

impl FormatterComparison {
    pub fn to_finding(&self, file_path: &Path) -> Option<Finding> {
        if !self.differs {
            return None;
        }
        Some(Finding::new(
            file_path,
            self.first_line,
            FindingCode::FormatterDiff,
            format!(
                "Blocks are not sorted; the formatter would change this file starting at line {}.",
                self.first_line
            ),
        ))
    }
}

pub fn compare(current: &str, formatted: &str) -> FormatterComparison {
    if current == formatted {
        return FormatterComparison {
            differs: false,
            first_line: 0,
            preview: String::new(),
        };
    }

    let diff = TextDiff::from_lines(current, formatted);
    let line_count = current.lines().count().max(1);
    let first_line = diff
        .ops()
        .iter()
        .find(|op| op.tag() != DiffTag::Equal)
        .map(|op| (op.old_range().start + 1).min(line_count))
        .unwrap_or(1);

    let unified = diff
        .unified_diff()
        .context_radius(2)
        .header("current", "formatted")
        .to_string();
    let mut preview: Vec<&str> = unified.lines().take(MAX_PREVIEW_LINES + 1).collect();
    if preview.len() > MAX_PREVIEW_LINES {
        preview.truncate(MAX_PREVIEW_LINES);
        preview.push("...");
    }

    FormatterComparison {
        differs: true,
        first_line: u32::try_from(first_line).unwrap_or(u32::MAX),
        preview: preview.join("\n"),
    }
}
