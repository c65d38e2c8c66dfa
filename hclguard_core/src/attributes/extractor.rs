//! Attribute extraction over a block body or map literal

use super::types::{Attribute, MapEntry, MapLiteral, ValueKind};
use crate::scanner::{has_template_sequence, unquote, Block, Cursor, Lexeme, LexemeKind};
use crate::utils::Span;

/// Key lexeme plus the extent of its value
struct RawPair {
    key: Lexeme,
    value: ValueExtent,
}

#[derive(Default)]
struct ValueExtent {
    first: Option<Lexeme>,
    last: Option<Lexeme>,
    /// Lexeme that closes the group opened by `first`, if any
    group_close: Option<Lexeme>,
    count: usize,
}

struct Split {
    pairs: Vec<RawPair>,
    /// A statement that is not `key = value` (nested block, `for`, computed key)
    unrecognized: bool,
}

fn is_opener(kind: LexemeKind) -> bool {
    matches!(kind, LexemeKind::Punct(b'{' | b'[' | b'('))
}

fn is_closer(kind: LexemeKind) -> bool {
    matches!(kind, LexemeKind::Punct(b'}' | b']' | b')'))
}

/// Split `text[start..end]` into top-level `key = value` statements.
/// Statements are separated by newlines or commas; anything nested deeper
/// is skipped.
fn split_pairs(text: &str, start: usize, end: usize, line: u32) -> Split {
    let mut cursor = Cursor::with_range(text, start, end, line);
    let mut pairs = Vec::new();
    let mut unrecognized = false;
    let mut depth = 0usize;
    let mut at_statement_start = true;

    while let Some(lexeme) = cursor.next_lexeme() {
        if depth == 0 && at_statement_start {
            match lexeme.kind {
                LexemeKind::Newline | LexemeKind::Comment | LexemeKind::Punct(b',') => continue,
                LexemeKind::Word | LexemeKind::Str => {
                    let mut look = cursor.clone();
                    if let Some(operator) = look.next_lexeme() {
                        if is_assignment(&operator, &look) {
                            cursor = look;
                            let value = read_value(&mut cursor);
                            pairs.push(RawPair {
                                key: lexeme,
                                value,
                            });
                            continue;
                        }
                    }
                    unrecognized = true;
                }
                _ => unrecognized = true,
            }
        }

        match lexeme.kind {
            LexemeKind::Newline if depth == 0 => at_statement_start = true,
            LexemeKind::Punct(b',') if depth == 0 => at_statement_start = true,
            LexemeKind::Newline | LexemeKind::Comment => {}
            kind if is_opener(kind) => {
                depth += 1;
                at_statement_start = false;
            }
            kind if is_closer(kind) => {
                depth = depth.saturating_sub(1);
                at_statement_start = false;
            }
            _ => at_statement_start = false,
        }
    }

    Split {
        pairs,
        unrecognized,
    }
}

/// `=` (but not `==`) or the object-constructor `:`
fn is_assignment(operator: &Lexeme, after: &Cursor<'_>) -> bool {
    if operator.is_punct(b':') {
        return true;
    }
    if !operator.is_punct(b'=') {
        return false;
    }
    let mut peek = after.clone();
    !matches!(peek.next_lexeme(), Some(next) if next.is_punct(b'=') && next.start == operator.end)
}

/// Consume one value through its terminating newline or comma at depth 0.
fn read_value(cursor: &mut Cursor<'_>) -> ValueExtent {
    let mut extent = ValueExtent::default();
    let mut depth = 0usize;

    while let Some(lexeme) = cursor.next_lexeme() {
        match lexeme.kind {
            LexemeKind::Newline | LexemeKind::Punct(b',') if depth == 0 => break,
            LexemeKind::Newline | LexemeKind::Comment => continue,
            _ => {}
        }

        if extent.first.is_none() {
            extent.first = Some(lexeme);
        }
        extent.count += 1;

        if is_opener(lexeme.kind) {
            depth += 1;
        } else if is_closer(lexeme.kind) {
            depth = depth.saturating_sub(1);
            let opened_group = extent.first.map(|f| is_opener(f.kind)).unwrap_or(false);
            if depth == 0 && opened_group && extent.group_close.is_none() {
                extent.group_close = Some(lexeme);
            }
        }
        extent.last = Some(lexeme);
    }

    extent
}

fn is_literal(raw: &str) -> bool {
    if matches!(raw, "true" | "false" | "null") {
        return true;
    }
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    digits.starts_with(|c: char| c.is_ascii_digit()) && digits.parse::<f64>().is_ok()
}

fn is_reference(raw: &str) -> bool {
    raw.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && raw.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '[' | ']' | '*' | '"')
        })
}

/// Kind and static-ness of a value; map literals are judged by their entries.
fn classify(text: &str, extent: &ValueExtent) -> (ValueKind, bool) {
    let (Some(first), Some(last)) = (extent.first, extent.last) else {
        return (ValueKind::Expression, false);
    };
    let raw = text.get(first.start..last.end).unwrap_or("");
    let whole_group = extent.group_close == Some(last);

    match first.kind {
        LexemeKind::Str | LexemeKind::Heredoc if extent.count == 1 => {
            (ValueKind::String, !has_template_sequence(raw))
        }
        LexemeKind::Punct(b'{') if whole_group => (ValueKind::MapLiteral, false),
        LexemeKind::Punct(b'[') if whole_group => (ValueKind::ListLiteral, false),
        _ if is_literal(raw) => (ValueKind::Literal, true),
        _ if is_reference(raw) => (ValueKind::Reference, false),
        _ => (ValueKind::Expression, false),
    }
}

fn key_text(text: &str, key: &Lexeme) -> (String, bool) {
    let raw = key.text(text);
    match key.kind {
        LexemeKind::Str => match unquote(raw) {
            Some(unquoted) if !has_template_sequence(raw) => (unquoted, true),
            _ => (raw.to_string(), false),
        },
        _ => (raw.to_string(), true),
    }
}

fn value_text(text: &str, extent: &ValueExtent) -> (String, Span) {
    match (extent.first, extent.last) {
        (Some(first), Some(last)) => {
            let span = Span::new(first.start, last.end);
            (span.slice(text).to_string(), span)
        }
        _ => (String::new(), Span::default()),
    }
}

/// Decompose the map literal between `open` and `close` braces, one level deep.
pub fn decompose_map(text: &str, open: &Lexeme, close: &Lexeme) -> MapLiteral {
    let split = split_pairs(text, open.end, close.start, open.line);
    let mut dynamic = split.unrecognized;

    let entries = split
        .pairs
        .iter()
        .map(|pair| {
            let (key, key_static) = key_text(text, &pair.key);
            dynamic |= !key_static;
            let (value_kind, is_static) = classify(text, &pair.value);
            let (raw_value, _) = value_text(text, &pair.value);
            MapEntry {
                key,
                raw_value,
                value_kind,
                is_static,
                line: pair.key.line,
            }
        })
        .collect();

    MapLiteral {
        entries,
        dynamic,
        line: open.line,
    }
}

/// Attributes in `text[start..end]`; `line` is the line `start` falls on.
pub fn extract_from_range(text: &str, start: usize, end: usize, line: u32) -> Vec<Attribute> {
    split_pairs(text, start, end, line)
        .pairs
        .iter()
        .map(|pair| {
            let (key, _) = key_text(text, &pair.key);
            let (value_kind, is_static) = classify(text, &pair.value);
            let (raw_value, value_span) = value_text(text, &pair.value);

            let map = match (value_kind, pair.value.first, pair.value.group_close) {
                (ValueKind::MapLiteral, Some(open), Some(close)) => {
                    Some(decompose_map(text, &open, &close))
                }
                _ => None,
            };

            Attribute {
                key,
                raw_value,
                value_kind,
                is_static,
                line: pair.key.line,
                value_span,
                map,
            }
        })
        .collect()
}

/// Top-level attributes of one block body. Nested blocks are skipped; the
/// scanner enumerates them separately.
pub fn extract_attributes(text: &str, block: &Block) -> Vec<Attribute> {
    extract_from_range(text, block.body_start, block.body_end, block.header_line)
}
