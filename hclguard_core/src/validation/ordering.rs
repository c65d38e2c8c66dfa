//! Alphabetical ordering of named top-level blocks

use crate::findings::{Finding, FindingCode};
use crate::scanner::{Block, ScanResult};
use crate::{log_debug, log_warning, logging::codes};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderViolation {
    pub kind: String,
    /// 1-based position of the first mismatch
    pub position: usize,
    pub expected: String,
    pub found: String,
    pub current_order: Vec<String>,
    pub expected_order: Vec<String>,
    /// Header line of the block found at `position`
    pub line: u32,
}

impl OrderViolation {
    pub fn message(&self) -> String {
        format!(
            "{} blocks are not sorted alphabetically: expected \"{}\" found \"{}\" at position {}. \
             Current order: {}. Expected order: {}.",
            capitalize(&self.kind),
            self.expected,
            self.found,
            self.position,
            self.current_order.join(", "),
            self.expected_order.join(", ")
        )
    }

    pub fn to_finding(&self, file_path: &Path) -> Finding {
        Finding::new(file_path, self.line, FindingCode::OrderViolation, self.message())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compare file order against a stable case-insensitive sort. Blocks without
/// a label do not participate.
pub fn check_order(kind: &str, blocks: &[&Block]) -> Option<OrderViolation> {
    let named: Vec<(&str, u32)> = blocks
        .iter()
        .filter_map(|block| block.first_label().map(|label| (label, block.header_line)))
        .collect();

    let mut sorted = named.clone();
    sorted.sort_by_key(|(label, _)| label.to_lowercase());

    let index = named
        .iter()
        .zip(&sorted)
        .position(|((current, _), (expected, _))| current != expected)?;

    Some(OrderViolation {
        kind: kind.to_string(),
        position: index + 1,
        expected: sorted[index].0.to_string(),
        found: named[index].0.to_string(),
        current_order: named.iter().map(|(label, _)| label.to_string()).collect(),
        expected_order: sorted.iter().map(|(label, _)| label.to_string()).collect(),
        line: named[index].1,
    })
}

pub fn check_ordering(file_path: &Path, scan: &ScanResult, kinds: &[String]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for kind in kinds {
        let blocks: Vec<&Block> = scan.top_level_of_kind(kind).collect();
        log_debug!("Checking block order", "kind" => kind, "blocks" => blocks.len());

        if let Some(violation) = check_order(kind, &blocks) {
            log_warning!(
                codes::validation::ORDER_VIOLATION,
                "Blocks out of order",
                "kind" => kind,
                "position" => violation.position
            );
            findings.push(violation.to_finding(file_path));
        }
    }

    findings
}
