use crate::scanner::unquote;
use crate::utils::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Quoted string or heredoc
    String,
    MapLiteral,
    ListLiteral,
    /// Traversal such as `var.tags` or `aws_vpc.main.id`
    Reference,
    /// Function calls, operators, conditionals, `for` expressions
    Expression,
    /// Number, `true`, `false`, `null`
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapEntry {
    pub key: String,
    pub raw_value: String,
    pub value_kind: ValueKind,
    /// Pure literal value; false makes the value opaque to validation
    pub is_static: bool,
    pub line: u32,
}

impl MapEntry {
    pub fn string_value(&self) -> Option<String> {
        literal_text(&self.raw_value, self.value_kind, self.is_static)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapLiteral {
    pub entries: Vec<MapEntry>,
    /// Set for `for` expressions and computed keys
    pub dynamic: bool,
    pub line: u32,
}

impl MapLiteral {
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// First entry whose key matches exactly
    pub fn get(&self, key: &str) -> Option<&MapEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    /// First entry whose key matches ignoring case
    pub fn get_ignore_case(&self, key: &str) -> Option<&MapEntry> {
        let wanted = key.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.key.to_lowercase() == wanted)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub key: String,
    pub raw_value: String,
    pub value_kind: ValueKind,
    pub is_static: bool,
    pub line: u32,
    #[serde(skip)]
    pub value_span: Span,
    /// Entries of a map-literal value, one level deep
    pub map: Option<MapLiteral>,
}

impl Attribute {
    /// Decoded value for static strings and literals
    pub fn string_value(&self) -> Option<String> {
        literal_text(&self.raw_value, self.value_kind, self.is_static)
    }
}

pub fn find<'a>(attributes: &'a [Attribute], key: &str) -> Option<&'a Attribute> {
    attributes.iter().find(|attribute| attribute.key == key)
}

fn literal_text(raw: &str, kind: ValueKind, is_static: bool) -> Option<String> {
    if !is_static {
        return None;
    }
    match kind {
        ValueKind::Literal => Some(raw.to_string()),
        ValueKind::String if raw.starts_with("<<") => Some(heredoc_body(raw)),
        ValueKind::String => unquote(raw),
        _ => None,
    }
}

/// Content between the heredoc header and closing marker. `<<-` strips the
/// smallest common indentation.
fn heredoc_body(raw: &str) -> String {
    let indented = raw.starts_with("<<-");
    let mut lines: Vec<&str> = raw.lines().skip(1).collect();
    lines.pop();

    if !indented {
        return lines.join("\n");
    }

    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heredoc_body() {
        assert_eq!(heredoc_body("<<EOF\na\n  b\nEOF"), "a\n  b");
        assert_eq!(heredoc_body("<<-EOT\n    a\n      b\n    EOT"), "a\n  b");
    }

    #[test]
    fn test_map_lookup() {
        let entry = |key: &str| MapEntry {
            key: key.to_string(),
            raw_value: "\"v\"".to_string(),
            value_kind: ValueKind::String,
            is_static: true,
            line: 1,
        };
        let map = MapLiteral {
            entries: vec![entry("environment"), entry("Environment")],
            dynamic: false,
            line: 1,
        };
        assert_eq!(map.get("Environment").map(|e| e.key.as_str()), Some("Environment"));
        assert_eq!(
            map.get_ignore_case("ENVIRONMENT").map(|e| e.key.as_str()),
            Some("environment")
        );
        assert_eq!(map.keys().count(), 2);
        assert_eq!(map.entries[0].string_value().as_deref(), Some("v"));
    }
}
