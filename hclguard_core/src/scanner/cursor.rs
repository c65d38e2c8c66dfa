//! Quote- and comment-aware cursor
//!
//! Splits HCL text into coarse lexemes. Strings (including any `${ }` / `%{ }`
//! template sequences and the braces inside them), heredocs and comments come
//! out as single opaque lexemes, so callers only ever see structural
//! punctuation that is really code. Both the block scanner and the attribute
//! extractor walk text through this cursor.

use super::block::{Degradation, DegradedKind};
use crate::config::compile_time::scanner::MAX_NESTING_DEPTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeKind {
    /// Identifier or number: `[A-Za-z0-9_-]+`
    Word,
    /// Double-quoted string including its quotes
    Str,
    /// `<<EOF` / `<<-EOF` through the closing marker line
    Heredoc,
    /// `#`, `//` or `/* */` comment (line comments exclude the newline)
    Comment,
    Newline,
    /// Any other single character; non-ASCII characters are reported whole
    Punct(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub start: usize,
    pub end: usize,
    /// Line on which the lexeme starts
    pub line: u32,
}

impl Lexeme {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }

    pub fn is_punct(&self, byte: u8) -> bool {
        self.kind == LexemeKind::Punct(byte)
    }
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    end: usize,
    line: u32,
    degraded: Vec<Degradation>,
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

fn is_word_start(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_range(text, 0, text.len(), 1)
    }

    /// Cursor over `text[start..end]`; `line` is the line `start` falls on.
    pub fn with_range(text: &'a str, start: usize, end: usize, line: u32) -> Self {
        let end = end.min(text.len());
        Self {
            text,
            bytes: text.as_bytes(),
            pos: start.min(end),
            end,
            line,
            degraded: Vec::new(),
        }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Unterminated strings, comments and heredocs seen so far
    pub fn take_degradations(&mut self) -> Vec<Degradation> {
        std::mem::take(&mut self.degraded)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        let idx = self.pos + ahead;
        if idx < self.end {
            Some(self.bytes[idx])
        } else {
            None
        }
    }

    fn degrade(&mut self, kind: DegradedKind, line: u32) {
        self.degraded.push(Degradation { kind, line });
    }

    pub fn next_lexeme(&mut self) -> Option<Lexeme> {
        loop {
            if self.pos >= self.end {
                return None;
            }

            let start = self.pos;
            let line = self.line;
            let byte = self.bytes[start];

            let kind = match byte {
                b' ' | b'\t' | b'\r' => {
                    self.pos += 1;
                    continue;
                }
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                    LexemeKind::Newline
                }
                b'#' => {
                    self.skip_to_line_end();
                    LexemeKind::Comment
                }
                b'/' if self.peek(1) == Some(b'/') => {
                    self.skip_to_line_end();
                    LexemeKind::Comment
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    self.consume_block_comment();
                    LexemeKind::Comment
                }
                b'"' => {
                    self.consume_quoted(0);
                    LexemeKind::Str
                }
                b'<' if self.peek(1) == Some(b'<') => match self.heredoc_marker() {
                    Some((marker, header_len)) => {
                        self.consume_heredoc(marker, header_len);
                        LexemeKind::Heredoc
                    }
                    None => {
                        self.pos += 1;
                        LexemeKind::Punct(b'<')
                    }
                },
                b if is_word_start(b) => {
                    while self.pos < self.end && is_word_byte(self.bytes[self.pos]) {
                        self.pos += 1;
                    }
                    LexemeKind::Word
                }
                b => {
                    self.pos += 1;
                    // keep offsets on char boundaries
                    while self.pos < self.end && (self.bytes[self.pos] & 0xC0) == 0x80 {
                        self.pos += 1;
                    }
                    LexemeKind::Punct(b)
                }
            };

            return Some(Lexeme {
                kind,
                start,
                end: self.pos,
                line,
            });
        }
    }

    fn skip_to_line_end(&mut self) {
        while self.pos < self.end && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn consume_block_comment(&mut self) {
        let start_line = self.line;
        self.pos += 2;
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b'*' if self.peek(1) == Some(b'/') => {
                    self.pos += 2;
                    return;
                }
                b'\n' => self.line += 1,
                _ => {}
            }
            self.pos += 1;
        }
        self.degrade(DegradedKind::UnterminatedComment, start_line);
    }

    /// Consume a quoted string starting at the opening quote. A raw newline
    /// outside an interpolation closes the string early.
    fn consume_quoted(&mut self, nesting: usize) {
        let start_line = self.line;
        self.pos += 1;

        while self.pos < self.end {
            let byte = self.bytes[self.pos];
            match byte {
                b'\\' => {
                    self.pos += 1;
                    if self.pos < self.end && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                b'"' => {
                    self.pos += 1;
                    return;
                }
                b'\n' => {
                    self.degrade(DegradedKind::UnterminatedString, start_line);
                    return;
                }
                b'$' | b'%' if self.peek(1) == Some(byte) && self.peek(2) == Some(b'{') => {
                    self.pos += 3;
                }
                b'$' | b'%' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    if !self.consume_template(nesting + 1) {
                        self.degrade(DegradedKind::UnterminatedInterpolation, start_line);
                        return;
                    }
                }
                _ => self.pos += 1,
            }
        }

        self.degrade(DegradedKind::UnterminatedString, start_line);
    }

    /// Consume a template sequence body through its closing `}`. Braces
    /// inside count toward its depth. Returns false at end of input.
    fn consume_template(&mut self, nesting: usize) -> bool {
        let mut depth = 0usize;
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    self.pos += 1;
                    if depth == 0 {
                        return true;
                    }
                    depth -= 1;
                }
                b'"' if nesting < MAX_NESTING_DEPTH => self.consume_quoted(nesting),
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        false
    }

    /// Recognize `<<IDENT` or `<<-IDENT` followed by end of line. Returns the
    /// marker and the header length through the identifier.
    fn heredoc_marker(&self) -> Option<(&'a str, usize)> {
        let mut idx = self.pos + 2;
        if idx < self.end && self.bytes[idx] == b'-' {
            idx += 1;
        }
        let ident_start = idx;
        if idx >= self.end || !(self.bytes[idx].is_ascii_alphabetic() || self.bytes[idx] == b'_') {
            return None;
        }
        while idx < self.end && is_word_byte(self.bytes[idx]) {
            idx += 1;
        }
        let ident_end = idx;

        while idx < self.end && matches!(self.bytes[idx], b' ' | b'\t' | b'\r') {
            idx += 1;
        }
        if idx < self.end && self.bytes[idx] != b'\n' {
            return None;
        }

        Some((&self.text[ident_start..ident_end], ident_end - self.pos))
    }

    /// Consume through the line holding only `marker`. The newline after the
    /// marker is left for the caller.
    fn consume_heredoc(&mut self, marker: &str, header_len: usize) {
        let start_line = self.line;
        self.pos += header_len;
        self.skip_to_line_end();

        while self.pos < self.end {
            // at a newline: step onto the next line
            self.pos += 1;
            self.line += 1;
            let line_start = self.pos;
            self.skip_to_line_end();
            let content = self.text.get(line_start..self.pos).unwrap_or("");
            if content.trim() == marker {
                return;
            }
        }

        self.degrade(
            DegradedKind::UnterminatedHeredoc {
                marker: marker.to_string(),
            },
            start_line,
        );
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        self.next_lexeme()
    }
}

/// True when a string literal contains an unescaped `${` or `%{` sequence.
pub fn has_template_sequence(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut idx = 0;
    while idx + 1 < bytes.len() {
        let byte = bytes[idx];
        if byte == b'$' || byte == b'%' {
            if bytes[idx + 1] == byte && bytes.get(idx + 2) == Some(&b'{') {
                idx += 3;
                continue;
            }
            if bytes[idx + 1] == b'{' {
                return true;
            }
        }
        idx += 1;
    }
    false
}

/// Strip the quotes from a string lexeme and resolve escapes. Returns `None`
/// for text that is not a single complete quoted string.
pub fn unquote(raw: &str) -> Option<String> {
    if raw.len() < 2 || !raw.starts_with('"') || !raw.ends_with('"') {
        return None;
    }
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => return None,
            },
            '"' => return None,
            '$' | '%' if chars.peek() == Some(&ch) => {
                chars.next();
                if chars.peek() == Some(&'{') {
                    out.push(ch);
                } else {
                    out.push(ch);
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }
    Some(out)
}
