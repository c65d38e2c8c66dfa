use crate::findings::{Finding, FindingCode};
use crate::logging::{codes, Code};
use crate::utils::Span;
use std::fmt;
use std::path::Path;

/// Index of a block inside its `ScanResult`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// One `kind "label"... { ... }` unit recovered from the text.
///
/// `body_start` is the offset just past the opening `{`; `body_end` is the
/// offset of the matching `}` (or end of text for a block never closed).
/// The two are equal for an empty body `{}`, so `body_start < body_end` holds
/// only when the body has content; `body_start <= body_end` always holds.
/// `parent` points at the enclosing block by index; blocks never own each
/// other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub kind: String,
    pub labels: Vec<String>,
    pub header_start: usize,
    pub body_start: usize,
    pub body_end: usize,
    /// One past the closing `}`
    pub span_end: usize,
    pub header_line: u32,
    pub end_line: u32,
    pub parent: Option<BlockId>,
    pub depth: usize,
    pub closed: bool,
}

impl Block {
    pub fn first_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// Header start through the closing brace
    pub fn span(&self) -> Span {
        Span::new(self.header_start, self.span_end)
    }

    pub fn body_span(&self) -> Span {
        Span::new(self.body_start, self.body_end)
    }

    pub fn body<'a>(&self, text: &'a str) -> &'a str {
        self.body_span().slice(text)
    }

    /// `resource "aws_s3_bucket" "logs"` style rendering of the header
    pub fn header(&self) -> String {
        let mut header = self.kind.clone();
        for label in &self.labels {
            header.push_str(&format!(" \"{}\"", label));
        }
        header
    }

    /// `aws_s3_bucket.logs` for two-label blocks, labels joined by `.` otherwise
    pub fn address(&self) -> String {
        if self.labels.is_empty() {
            self.kind.clone()
        } else {
            self.labels.join(".")
        }
    }
}

// ============================================================================
// DEGRADED INPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedKind {
    UnterminatedString,
    UnterminatedInterpolation,
    UnterminatedComment,
    UnterminatedHeredoc { marker: String },
    UnclosedBlock { header: String },
    UnbalancedBrace,
    NestingLimit,
}

/// A recoverable problem with the input. Scanning always continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    pub kind: DegradedKind,
    pub line: u32,
}

impl Degradation {
    pub fn finding_code(&self) -> FindingCode {
        match self.kind {
            DegradedKind::UnbalancedBrace => FindingCode::UnbalancedBrace,
            _ => FindingCode::UnterminatedBlock,
        }
    }

    /// Log code for the event raised when the scanner records this
    pub fn log_code(&self) -> Code {
        match self.kind {
            DegradedKind::UnclosedBlock { .. } => codes::scanner::UNCLOSED_BLOCK,
            DegradedKind::UnbalancedBrace => codes::scanner::UNBALANCED_BRACE,
            DegradedKind::NestingLimit => codes::scanner::NESTING_LIMIT_EXCEEDED,
            _ => codes::scanner::UNTERMINATED_CONSTRUCT,
        }
    }

    pub fn to_finding(&self, file_path: &Path) -> Finding {
        Finding::new(file_path, self.line, self.finding_code(), self.to_string())
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DegradedKind::UnterminatedString => {
                write!(f, "Unterminated string literal starting on line {}", self.line)
            }
            DegradedKind::UnterminatedInterpolation => write!(
                f,
                "Unterminated template interpolation in string starting on line {}",
                self.line
            ),
            DegradedKind::UnterminatedComment => {
                write!(f, "Unterminated block comment starting on line {}", self.line)
            }
            DegradedKind::UnterminatedHeredoc { marker } => write!(
                f,
                "Heredoc <<{} starting on line {} has no closing marker",
                marker, self.line
            ),
            DegradedKind::UnclosedBlock { header } => write!(
                f,
                "Block '{}' opened on line {} is never closed",
                header, self.line
            ),
            DegradedKind::UnbalancedBrace => write!(
                f,
                "Closing brace on line {} has no matching opening brace",
                self.line
            ),
            DegradedKind::NestingLimit => write!(
                f,
                "Nesting on line {} exceeds the supported depth; deeper blocks are not tracked",
                self.line
            ),
        }
    }
}

// ============================================================================
// SCAN RESULT
// ============================================================================

/// Blocks in header order plus any degradations. Valid only for the text
/// that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub blocks: Vec<Block>,
    pub degraded: Vec<Degradation>,
}

impl ScanResult {
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn parent(&self, id: BlockId) -> Option<&Block> {
        self.get(id)?.parent.and_then(|parent| self.get(parent))
    }

    /// Enclosing blocks, innermost first
    pub fn ancestors(&self, id: BlockId) -> Ancestors<'_> {
        Ancestors {
            scan: self,
            next: self.get(id).and_then(|block| block.parent),
        }
    }

    pub fn children(&self, id: BlockId) -> impl Iterator<Item = &Block> + '_ {
        self.blocks
            .iter()
            .filter(move |block| block.parent == Some(id))
    }

    pub fn top_level(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.iter().filter(|block| block.parent.is_none())
    }

    pub fn of_kind<'s>(&'s self, kind: &'s str) -> impl Iterator<Item = &'s Block> + 's {
        self.blocks.iter().filter(move |block| block.kind == kind)
    }

    pub fn top_level_of_kind<'s>(&'s self, kind: &'s str) -> impl Iterator<Item = &'s Block> + 's {
        self.top_level().filter(move |block| block.kind == kind)
    }

    /// Raw header text from the block kind up to, not including, the `{`
    pub fn header_text<'t>(&self, text: &'t str, id: BlockId) -> Option<&'t str> {
        let block = self.get(id)?;
        let brace = block.body_start.checked_sub(1)?;
        text.get(block.header_start..brace).map(str::trim_end)
    }

    pub fn body_text<'t>(&self, text: &'t str, id: BlockId) -> Option<&'t str> {
        let block = self.get(id)?;
        text.get(block.body_start..block.body_end)
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn degraded_findings(&self, file_path: &Path) -> Vec<Finding> {
        self.degraded
            .iter()
            .map(|degradation| degradation.to_finding(file_path))
            .collect()
    }
}

pub struct Ancestors<'a> {
    scan: &'a ScanResult,
    next: Option<BlockId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<&'a Block> {
        let block = self.scan.get(self.next?)?;
        self.next = block.parent;
        Some(block)
    }
}
