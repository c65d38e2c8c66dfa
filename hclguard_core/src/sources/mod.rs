//! Module source normalization
//!
//! Maps a raw `source` string to the identity under which references are
//! grouped. Local paths get no identity; registry coordinates are their own
//! identity; VCS URLs lose their query string, which is where the ref lives.

use serde::Serialize;
use std::fmt;

/// Forced-getter prefixes that do not change which repository is fetched
const GETTER_PREFIXES: &[&str] = &["git::", "https::", "http::"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsRefKind {
    Ref,
    Tag,
    Commit,
}

impl VcsRefKind {
    /// Query parameter names, in precedence order
    pub const PRECEDENCE: [VcsRefKind; 3] = [VcsRefKind::Ref, VcsRefKind::Tag, VcsRefKind::Commit];

    pub fn param(&self) -> &'static str {
        match self {
            VcsRefKind::Ref => "ref",
            VcsRefKind::Tag => "tag",
            VcsRefKind::Commit => "commit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VcsRef {
    pub kind: VcsRefKind,
    pub value: String,
}

impl fmt::Display for VcsRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            VcsRefKind::Commit => write!(f, "commit={}", self.value),
            VcsRefKind::Ref | VcsRefKind::Tag => write!(f, "{}", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "key", rename_all = "lowercase")]
pub enum IdentityKey {
    /// Relative or absolute filesystem path; never part of a conflict
    Local,
    Remote(String),
}

impl IdentityKey {
    pub fn is_local(&self) -> bool {
        matches!(self, IdentityKey::Local)
    }

    pub fn as_remote(&self) -> Option<&str> {
        match self {
            IdentityKey::Remote(key) => Some(key),
            IdentityKey::Local => None,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Local => write!(f, "<local>"),
            IdentityKey::Remote(key) => write!(f, "{}", key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedSource {
    pub identity: IdentityKey,
    pub vcs_ref: Option<VcsRef>,
}

pub fn is_local_path(raw: &str) -> bool {
    raw == "."
        || raw == ".."
        || raw.starts_with("./")
        || raw.starts_with("../")
        || raw.starts_with('/')
}

fn strip_getter(raw: &str) -> &str {
    GETTER_PREFIXES
        .iter()
        .find_map(|prefix| raw.strip_prefix(prefix))
        .unwrap_or(raw)
}

/// First of `ref`, `tag`, `commit` present in the query string
fn vcs_ref_from_query(query: &str) -> Option<VcsRef> {
    let params: Vec<(&str, &str)> = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();

    VcsRefKind::PRECEDENCE.iter().find_map(|kind| {
        params
            .iter()
            .find(|(name, value)| *name == kind.param() && !value.is_empty())
            .map(|(_, value)| VcsRef {
                kind: *kind,
                value: value.to_string(),
            })
    })
}

pub fn normalize(raw: &str) -> NormalizedSource {
    let raw = raw.trim();
    if is_local_path(raw) {
        return NormalizedSource {
            identity: IdentityKey::Local,
            vcs_ref: None,
        };
    }

    let source = strip_getter(raw);
    let (base, vcs_ref) = match source.split_once('?') {
        Some((base, query)) => (base, vcs_ref_from_query(query)),
        None => (source, None),
    };

    NormalizedSource {
        identity: IdentityKey::Remote(base.trim_end_matches('/').to_string()),
        vcs_ref,
    }
}

/// `version = X`, `git ref = Y`, or `no version specified`
pub fn describe_version(version: Option<&str>, vcs_ref: Option<&VcsRef>) -> String {
    match (version, vcs_ref) {
        (Some(version), _) => format!("version = {}", version),
        (None, Some(vcs_ref)) => format!("git ref = {}", vcs_ref),
        (None, None) => "no version specified".to_string(),
    }
}
