//! Block scanner state machine

use super::block::{Block, BlockId, Degradation, DegradedKind, ScanResult};
use super::cursor::{unquote, Cursor, Lexeme, LexemeKind};
use crate::config::compile_time::scanner::{MAX_HEADER_LABELS, MAX_NESTING_DEPTH};
use crate::{log_debug, log_warning};

/// Open delimiter on the nesting stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Block(BlockId),
    /// Object or map literal brace
    Brace,
    Paren,
    Bracket,
}

struct Header {
    kind: Lexeme,
    labels: Vec<String>,
    open_brace: Lexeme,
}

pub struct BlockScanner<'a> {
    text: &'a str,
    cursor: Cursor<'a>,
    blocks: Vec<Block>,
    stack: Vec<Frame>,
    degraded: Vec<Degradation>,
    at_statement_start: bool,
    nesting_reported: bool,
}

impl<'a> BlockScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            cursor: Cursor::new(text),
            blocks: Vec::new(),
            stack: Vec::new(),
            degraded: Vec::new(),
            at_statement_start: true,
            nesting_reported: false,
        }
    }

    pub fn scan(mut self) -> ScanResult {
        while let Some(lexeme) = self.cursor.next_lexeme() {
            self.step(lexeme);
        }
        self.finish()
    }

    fn step(&mut self, lexeme: Lexeme) {
        match lexeme.kind {
            LexemeKind::Newline => self.at_statement_start = true,
            LexemeKind::Comment => {}
            LexemeKind::Word if self.at_statement_start && self.headers_allowed() => {
                match self.try_header(lexeme) {
                    Some(header) => {
                        self.open_block(header);
                        self.at_statement_start = true;
                    }
                    None => self.at_statement_start = false,
                }
            }
            LexemeKind::Punct(b'{') => {
                self.push(Frame::Brace, lexeme.line);
                self.at_statement_start = true;
            }
            LexemeKind::Punct(b'}') => {
                self.close_brace(lexeme);
                self.at_statement_start = false;
            }
            LexemeKind::Punct(b'(') => {
                self.push(Frame::Paren, lexeme.line);
                self.at_statement_start = false;
            }
            LexemeKind::Punct(b'[') => {
                self.push(Frame::Bracket, lexeme.line);
                self.at_statement_start = false;
            }
            LexemeKind::Punct(b')') => {
                self.pop_if(Frame::Paren);
                self.at_statement_start = false;
            }
            LexemeKind::Punct(b']') => {
                self.pop_if(Frame::Bracket);
                self.at_statement_start = false;
            }
            _ => self.at_statement_start = false,
        }
    }

    /// Headers only open directly inside a block, an object brace, or at top level
    fn headers_allowed(&self) -> bool {
        matches!(
            self.stack.last(),
            None | Some(Frame::Block(_)) | Some(Frame::Brace)
        )
    }

    /// Match `identifier (string | identifier)* {` on the current line
    /// without consuming input unless it succeeds.
    fn try_header(&mut self, kind: Lexeme) -> Option<Header> {
        let mut look = self.cursor.clone();
        let mut labels = Vec::new();

        loop {
            let lexeme = look.next_lexeme()?;
            match lexeme.kind {
                LexemeKind::Str => {
                    let raw = lexeme.text(self.text);
                    if raw.contains('\n') {
                        return None;
                    }
                    labels.push(unquote(raw)?);
                }
                LexemeKind::Word => labels.push(lexeme.text(self.text).to_string()),
                LexemeKind::Punct(b'{') => {
                    self.cursor = look;
                    return Some(Header {
                        kind,
                        labels,
                        open_brace: lexeme,
                    });
                }
                _ => return None,
            }
            if labels.len() > MAX_HEADER_LABELS {
                return None;
            }
        }
    }

    fn innermost_block(&self) -> Option<BlockId> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Block(id) => Some(*id),
            _ => None,
        })
    }

    fn open_block(&mut self, header: Header) {
        if self.stack.len() >= MAX_NESTING_DEPTH {
            self.push(Frame::Brace, header.open_brace.line);
            return;
        }

        let id = BlockId(self.blocks.len());
        let parent = self.innermost_block();
        let depth = parent
            .and_then(|p| self.blocks.get(p.0))
            .map(|p| p.depth + 1)
            .unwrap_or(0);

        self.blocks.push(Block {
            id,
            kind: header.kind.text(self.text).to_string(),
            labels: header.labels,
            header_start: header.kind.start,
            body_start: header.open_brace.end,
            body_end: self.text.len(),
            span_end: self.text.len(),
            header_line: header.kind.line,
            end_line: header.kind.line,
            parent,
            depth,
            closed: false,
        });
        self.stack.push(Frame::Block(id));
    }

    fn push(&mut self, frame: Frame, line: u32) {
        if self.stack.len() >= MAX_NESTING_DEPTH && !self.nesting_reported {
            self.nesting_reported = true;
            self.degraded.push(Degradation {
                kind: DegradedKind::NestingLimit,
                line,
            });
        }
        self.stack.push(frame);
    }

    fn pop_if(&mut self, expected: Frame) {
        if self.stack.last() == Some(&expected) {
            self.stack.pop();
        }
    }

    /// Close the innermost brace. Unclosed parens or brackets in between
    /// are dropped so one typo does not shift every later block.
    fn close_brace(&mut self, lexeme: Lexeme) {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Paren | Frame::Bracket => continue,
                Frame::Brace => return,
                Frame::Block(id) => {
                    if let Some(block) = self.blocks.get_mut(id.0) {
                        block.body_end = lexeme.start;
                        block.span_end = lexeme.end;
                        block.end_line = lexeme.line;
                        block.closed = true;
                    }
                    return;
                }
            }
        }

        self.degraded.push(Degradation {
            kind: DegradedKind::UnbalancedBrace,
            line: lexeme.line,
        });
    }

    fn finish(mut self) -> ScanResult {
        let last_line = self.cursor.line();
        let mut degraded = self.cursor.take_degradations();
        degraded.append(&mut self.degraded);

        for frame in self.stack.drain(..) {
            if let Frame::Block(id) = frame {
                if let Some(block) = self.blocks.get_mut(id.0) {
                    block.end_line = last_line;
                    degraded.push(Degradation {
                        kind: DegradedKind::UnclosedBlock {
                            header: block.header(),
                        },
                        line: block.header_line,
                    });
                }
            }
        }
        degraded.sort_by_key(|d| d.line);

        for degradation in &degraded {
            log_warning!(degradation.log_code(), "Input degraded, scanning continued",
                "line" => degradation.line,
                "detail" => degradation
            );
        }

        log_debug!("Scan complete",
            "blocks" => self.blocks.len(),
            "degraded" => degraded.len()
        );

        ScanResult {
            blocks: self.blocks,
            degraded,
        }
    }
}

/// Recover the block tree from `text`. Never fails; problems with the input
/// come back as `ScanResult::degraded`.
pub fn scan(text: &str) -> ScanResult {
    BlockScanner::new(text).scan()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(scan: &ScanResult) -> Vec<&str> {
        scan.blocks.iter().map(|b| b.kind.as_str()).collect()
    }

    #[test]
    fn test_nested_blocks_and_labels() {
        let text = r#"
resource "aws_instance" "web" {
  ami = "ami-123"

  lifecycle {
    create_before_destroy = true
  }
}

variable "region" {}
"#;
        let scan = scan(text);
        assert_eq!(kinds(&scan), vec!["resource", "lifecycle", "variable"]);
        assert!(scan.degraded.is_empty());

        let resource = &scan.blocks[0];
        assert_eq!(resource.labels, vec!["aws_instance", "web"]);
        assert_eq!(resource.header_line, 2);
        assert_eq!(resource.end_line, 8);
        assert!(resource.closed);
        assert_eq!(&text[resource.body_end..resource.span_end], "}");

        let lifecycle = &scan.blocks[1];
        assert_eq!(lifecycle.parent, Some(resource.id));
        assert_eq!(lifecycle.depth, 1);
        assert!(resource.span().strictly_contains(&lifecycle.span()));
        assert!(resource.body_span().contains_span(&lifecycle.span()));

        let variable = &scan.blocks[2];
        assert_eq!(variable.parent, None);
        assert_eq!(variable.body_start, variable.body_end);
    }

    #[test]
    fn test_headers_in_strings_and_comments_never_open_blocks() {
        let text = r#"
# provider "aws" {
// module "x" {
/* resource "a" "b" { */
locals {
  doc = "provider \"aws\" { region = 1 }"
}
"#;
        let scan = scan(text);
        assert_eq!(kinds(&scan), vec!["locals"]);
        assert!(scan.degraded.is_empty());
    }

    #[test]
    fn test_commented_header_without_closing_brace() {
        let scan = scan("# provider \"aws\" {\n");
        assert!(scan.blocks.is_empty());
        assert!(!scan.is_degraded());
    }

    #[test]
    fn test_map_literals_are_not_blocks() {
        let text = r#"
resource "aws_s3_bucket" "b" {
  tags = {
    Name = "x"
  }
  policy = jsonencode({ Statement = [{ Effect = "Allow" }] })
}
"#;
        let scan = scan(text);
        assert_eq!(kinds(&scan), vec!["resource"]);
        assert!(scan.blocks[0].closed);
    }

    #[test]
    fn test_block_inside_map_literal_parents_to_enclosing_block() {
        let text = r#"
terraform {
  required_providers {
    aws = {
      source = "hashicorp/aws"
      provider "aws" {
        region = "x"
      }
    }
  }
}
"#;
        let scan = scan(text);
        assert_eq!(kinds(&scan), vec!["terraform", "required_providers", "provider"]);
        let provider = &scan.blocks[2];
        let chain: Vec<_> = scan
            .ancestors(provider.id)
            .map(|b| b.kind.as_str())
            .collect();
        assert_eq!(chain, vec!["required_providers", "terraform"]);
    }

    #[test]
    fn test_interpolated_braces_do_not_desync() {
        let text = r#"
output "a" {
  value = "${jsonencode({ x = "}" })}"
}
output "b" {
  value = <<EOT
  }}} {{{
EOT
}
"#;
        let scan = scan(text);
        assert_eq!(kinds(&scan), vec!["output", "output"]);
        assert!(scan.blocks.iter().all(|b| b.closed && b.parent.is_none()));
    }

    #[test]
    fn test_identifier_labels_and_single_line_blocks() {
        let scan = scan("resource aws_vpc main { cidr_block = \"10.0.0.0/16\" }\n");
        assert_eq!(scan.blocks.len(), 1);
        assert_eq!(scan.blocks[0].labels, vec!["aws_vpc", "main"]);
    }

    #[test]
    fn test_header_label_round_trip() {
        let scan1 = scan("resource \"aws_instance\" \"web\" {\n}\n");
        let header = scan1.blocks[0].header();
        let scan2 = scan(&format!("{} {{\n}}\n", header));
        assert_eq!(scan1.blocks[0].labels, scan2.blocks[0].labels);
    }

    #[test]
    fn test_unclosed_block_degrades() {
        let text = "variable \"a\" {\n  default = 1\n\nvariable \"b\" {\n}\n";
        let scan = scan(text);
        assert_eq!(scan.blocks.len(), 2);
        assert!(!scan.blocks[0].closed);
        assert_eq!(scan.blocks[0].body_end, text.len());
        assert_eq!(scan.degraded.len(), 1);
        assert_eq!(scan.degraded[0].line, 1);
        assert_eq!(
            scan.degraded[0].kind,
            DegradedKind::UnclosedBlock {
                header: "variable \"a\"".to_string()
            }
        );
    }

    #[test]
    fn test_unterminated_string_closes_at_newline() {
        let text = "locals {\n  a = \"oops\n}\nvariable \"v\" {}\n";
        let scan = scan(text);
        assert_eq!(kinds(&scan), vec!["locals", "variable"]);
        assert!(scan.blocks[0].closed);
        assert_eq!(scan.degraded.len(), 1);
        assert_eq!(scan.degraded[0].kind, DegradedKind::UnterminatedString);
        assert_eq!(scan.degraded[0].line, 2);
    }

    #[test]
    fn test_stray_closing_brace() {
        let scan = scan("}\nvariable \"x\" {}\n");
        assert_eq!(scan.blocks.len(), 1);
        assert_eq!(scan.degraded[0].kind, DegradedKind::UnbalancedBrace);
    }

    #[test]
    fn test_attribute_named_like_block_kind() {
        let scan = scan("module \"m\" {\n  provider = aws.west\n  source = \"./m\"\n}\n");
        assert_eq!(kinds(&scan), vec!["module"]);
    }

    #[test]
    fn test_properly_nested_intervals() {
        let text = r#"
a {
  b "x" {
    c {}
  }
  d {}
}
e {}
"#;
        let scan = scan(text);
        for block in &scan.blocks {
            assert!(block.body_start <= block.body_end);
            assert_eq!(&text[block.body_end..block.span_end], "}");
            for ancestor in scan.ancestors(block.id) {
                assert!(ancestor.span().strictly_contains(&block.span()));
            }
        }
        for pair in scan.blocks.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            let disjoint = first.span_end <= second.header_start;
            let nested = first.span().contains_span(&second.span());
            assert!(disjoint || nested);
        }
    }

    #[test]
    fn test_header_and_body_text() {
        let text = "module \"vpc\"   {\n  source = \"x\"\n}\n";
        let scan = scan(text);
        let id = scan.blocks[0].id;
        assert_eq!(scan.header_text(text, id), Some("module \"vpc\""));
        assert_eq!(scan.body_text(text, id), Some("\n  source = \"x\"\n"));
        assert_eq!(scan.header_text(text, BlockId(7)), None);
    }

    #[test]
    fn test_degradations_carry_scanner_log_codes() {
        use crate::logging::codes::scanner;

        let unclosed = scan("resource \"x\" \"y\" {\n  a = 1\n");
        assert_eq!(
            unclosed.degraded.iter().map(Degradation::log_code).collect::<Vec<_>>(),
            vec![scanner::UNCLOSED_BLOCK]
        );

        let stray = scan("a = 1\n}\n");
        assert_eq!(stray.degraded[0].log_code(), scanner::UNBALANCED_BRACE);

        let comment = scan("/* never closed\n");
        assert_eq!(comment.degraded[0].log_code(), scanner::UNTERMINATED_CONSTRUCT);

        let levels = MAX_NESTING_DEPTH + 1;
        let deep = format!("{}{}", "a {\n".repeat(levels), "}\n".repeat(levels));
        let nesting = scan(&deep);
        assert!(nesting
            .degraded
            .iter()
            .any(|d| d.log_code() == scanner::NESTING_LIMIT_EXCEEDED));
    }

    #[test]
    fn test_scan_is_deterministic() {
        let text = "terraform {\n  backend \"s3\" {}\n}\n";
        assert_eq!(scan(text), scan(text));
    }
}
