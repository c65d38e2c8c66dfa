//! Check configuration
//!
//! `LintConfig` is the deserialized form of `.hclguard.toml` / `.hclguard.json`.
//! `LintConfig::build_ruleset` validates it and produces the `Ruleset` the
//! validators consume as plain data.

use super::error::ConfigError;
use super::taggable::default_taggable_resources;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// CHECK SELECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    Providers,
    ModuleVersions,
    Ordering,
    Tags,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::Providers,
        CheckKind::ModuleVersions,
        CheckKind::Ordering,
        CheckKind::Tags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Providers => "providers",
            CheckKind::ModuleVersions => "module-versions",
            CheckKind::Ordering => "ordering",
            CheckKind::Tags => "tags",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "providers" | "provider-config" => Ok(CheckKind::Providers),
            "module-versions" | "modules" => Ok(CheckKind::ModuleVersions),
            "ordering" | "order" | "tfsort" => Ok(CheckKind::Ordering),
            "tags" => Ok(CheckKind::Tags),
            _ => Err(ConfigError::UnknownCheck(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckToggles {
    pub providers: bool,
    pub module_versions: bool,
    pub ordering: bool,
    pub tags: bool,
}

impl Default for CheckToggles {
    fn default() -> Self {
        Self {
            providers: true,
            module_versions: true,
            ordering: true,
            tags: true,
        }
    }
}

impl CheckToggles {
    /// Enable exactly the listed checks
    pub fn only(kinds: &[CheckKind]) -> Self {
        Self {
            providers: kinds.contains(&CheckKind::Providers),
            module_versions: kinds.contains(&CheckKind::ModuleVersions),
            ordering: kinds.contains(&CheckKind::Ordering),
            tags: kinds.contains(&CheckKind::Tags),
        }
    }

    pub fn is_enabled(&self, kind: CheckKind) -> bool {
        match kind {
            CheckKind::Providers => self.providers,
            CheckKind::ModuleVersions => self.module_versions,
            CheckKind::Ordering => self.ordering,
            CheckKind::Tags => self.tags,
        }
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderRules {
    /// Attribute keys whose presence in a provider body exempts it
    pub exempt_markers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleRules {
    /// Path substrings excluded from module-reference collection
    pub exclude_dirs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingRules {
    pub kinds: Vec<String>,
}

impl Default for OrderingRules {
    fn default() -> Self {
        Self {
            kinds: vec!["variable".to_string(), "output".to_string()],
        }
    }
}

/// One tag rule as written in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagRuleConfig {
    pub name: Option<String>,
    pub allowed_values: Option<Vec<String>>,
    pub pattern: Option<String>,
}

impl TagRuleConfig {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagRules {
    pub required: Vec<TagRuleConfig>,
    pub optional: Vec<TagRuleConfig>,
    /// Provider name to resource types; `None` selects the built-in allowlist
    pub taggable_resources: Option<BTreeMap<String, Vec<String>>>,
    /// Resource-type prefixes whose tag map is named `labels`
    pub label_prefixes: Vec<String>,
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            required: Vec::new(),
            optional: Vec::new(),
            taggable_resources: None,
            label_prefixes: vec!["google_".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    pub checks: CheckToggles,
    pub providers: ProviderRules,
    pub modules: ModuleRules,
    pub ordering: OrderingRules,
    pub tags: TagRules,
}

impl LintConfig {
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::TomlParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::JsonParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load from disk, choosing the format by extension (`.json` or TOML)
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&text, path)
        } else {
            Self::from_toml_str(&text, path)
        }
    }

    /// Validate and compile into the form the validators consume
    pub fn build_ruleset(&self) -> Result<Ruleset, ConfigError> {
        let required = compile_rules("required", &self.tags.required)?;
        let optional = compile_rules("optional", &self.tags.optional)?;

        let taggable = self
            .tags
            .taggable_resources
            .clone()
            .unwrap_or_else(default_taggable_resources)
            .into_values()
            .flatten()
            .collect();

        Ok(Ruleset {
            checks: self.checks.clone(),
            provider_markers: self.providers.exempt_markers.clone(),
            module_exclude_dirs: self.modules.exclude_dirs.clone(),
            ordered_kinds: self.ordering.kinds.clone(),
            tags: TagPolicy {
                required,
                optional,
                taggable,
                label_prefixes: self.tags.label_prefixes.clone(),
            },
        })
    }
}

// ============================================================================
// COMPILED FORM
// ============================================================================

#[derive(Debug, Clone)]
pub struct TagRule {
    pub name: String,
    pub allowed_values: Option<Vec<String>>,
    /// Source text and anchored regex
    pub pattern: Option<(String, Regex)>,
}

impl TagRule {
    /// Full match against the configured pattern; true when no pattern is set
    pub fn matches_pattern(&self, value: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|(_, regex)| regex.is_match(value))
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagPolicy {
    pub required: Vec<TagRule>,
    pub optional: Vec<TagRule>,
    pub taggable: HashSet<String>,
    pub label_prefixes: Vec<String>,
}

impl TagPolicy {
    pub fn is_taggable(&self, resource_type: &str) -> bool {
        self.taggable.contains(resource_type)
    }

    /// `labels` for prefixed providers (GCP), `tags` otherwise
    pub fn tag_attribute_for(&self, resource_type: &str) -> &'static str {
        if self
            .label_prefixes
            .iter()
            .any(|prefix| resource_type.starts_with(prefix.as_str()))
        {
            "labels"
        } else {
            "tags"
        }
    }

    pub fn has_rules(&self) -> bool {
        !self.required.is_empty() || !self.optional.is_empty()
    }
}

/// Validated configuration shared read-only by every worker
#[derive(Debug, Clone)]
pub struct Ruleset {
    pub checks: CheckToggles,
    pub provider_markers: Vec<String>,
    pub module_exclude_dirs: Vec<String>,
    pub ordered_kinds: Vec<String>,
    pub tags: TagPolicy,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            checks: CheckToggles::default(),
            provider_markers: Vec::new(),
            module_exclude_dirs: Vec::new(),
            ordered_kinds: OrderingRules::default().kinds,
            tags: TagPolicy {
                label_prefixes: TagRules::default().label_prefixes,
                taggable: default_taggable_resources().into_values().flatten().collect(),
                ..TagPolicy::default()
            },
        }
    }
}

fn compile_rules(kind: &'static str, rules: &[TagRuleConfig]) -> Result<Vec<TagRule>, ConfigError> {
    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let name = rule
                .name
                .as_ref()
                .ok_or(ConfigError::MissingRuleName { kind, index })?;
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyRuleName { kind, index });
            }

            let pattern = match &rule.pattern {
                Some(pattern) => {
                    let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
                        ConfigError::InvalidPattern {
                            rule: name.clone(),
                            pattern: pattern.clone(),
                            source,
                        }
                    })?;
                    Some((pattern.clone(), regex))
                }
                None => None,
            };

            Ok(TagRule {
                name: name.clone(),
                allowed_values: rule.allowed_values.clone(),
                pattern,
            })
        })
        .collect()
}
