//! Tag compliance for taggable resources
//!
//! Required tags must be present with exact key case, non-empty, and satisfy
//! any allowed-value list and pattern. Optional tags are only checked for key
//! case. Tag maps that cannot be read without evaluation are skipped.

use crate::attributes::{extract_attributes, find, MapEntry, MapLiteral, ValueKind};
use crate::config::{TagPolicy, TagRule};
use crate::findings::{Finding, FindingCode};
use crate::scanner::{Block, ScanResult};
use crate::{log_debug, log_warning, logging::codes};
use std::path::Path;

/// Tag map of one resource, as far as it can be read statically
enum TagMap {
    Static(MapLiteral, u32),
    /// No tag attribute at all; every required tag is missing
    Absent(u32),
    Dynamic,
}

fn read_tag_map(text: &str, block: &Block, attribute_name: &str) -> TagMap {
    let attributes = extract_attributes(text, block);
    let Some(attribute) = find(&attributes, attribute_name) else {
        return TagMap::Absent(block.header_line);
    };

    match (&attribute.value_kind, &attribute.map) {
        (ValueKind::MapLiteral, Some(map)) if !map.is_dynamic() => {
            TagMap::Static(map.clone(), attribute.line)
        }
        _ => TagMap::Dynamic,
    }
}

/// Exact key first, then the first key equal ignoring case
fn lookup<'m>(map: &'m MapLiteral, name: &str) -> Option<&'m MapEntry> {
    map.get(name).or_else(|| map.get_ignore_case(name))
}

struct ResourceCheck<'a> {
    file_path: &'a Path,
    address: String,
    findings: Vec<Finding>,
}

impl ResourceCheck<'_> {
    fn report(&mut self, line: u32, message: String) {
        log_warning!(
            codes::validation::TAG_VIOLATION,
            "Tag violation",
            "resource" => self.address,
            "line" => line
        );
        self.findings.push(Finding::new(
            self.file_path,
            line,
            FindingCode::TagViolation,
            format!("{}: {}", self.address, message),
        ));
    }

    fn check_required(&mut self, rule: &TagRule, map: &MapLiteral, map_line: u32) {
        let Some(entry) = lookup(map, &rule.name) else {
            self.report(map_line, format!("Required tag '{}' is missing.", rule.name));
            return;
        };

        if entry.key != rule.name {
            self.report(
                entry.line,
                format!(
                    "Required tag '{}' has incorrect case. Found '{}' but expected '{}'.",
                    rule.name, entry.key, rule.name
                ),
            );
            return;
        }

        // Computed values cannot be judged
        let Some(value) = entry.string_value() else {
            return;
        };

        if value.trim().is_empty() {
            self.report(
                entry.line,
                format!("Required tag '{}' has an empty value.", rule.name),
            );
            return;
        }

        if let Some(allowed) = &rule.allowed_values {
            if !allowed.iter().any(|candidate| candidate == &value) {
                let lowered = value.to_lowercase();
                let message = match allowed.iter().find(|c| c.to_lowercase() == lowered) {
                    Some(expected) => format!(
                        "Tag '{}' value '{}' has incorrect case. Expected '{}' (allowed: {}).",
                        rule.name,
                        value,
                        expected,
                        allowed.join(", ")
                    ),
                    None => format!(
                        "Tag '{}' has invalid value '{}'. Allowed values: {}.",
                        rule.name,
                        value,
                        allowed.join(", ")
                    ),
                };
                self.report(entry.line, message);
            }
        }

        if let Some((pattern, _)) = &rule.pattern {
            if !rule.matches_pattern(&value) {
                self.report(
                    entry.line,
                    format!(
                        "Tag '{}' value '{}' does not match required pattern '{}'.",
                        rule.name, value, pattern
                    ),
                );
            }
        }
    }

    fn check_optional(&mut self, rule: &TagRule, map: &MapLiteral) {
        if map.get(&rule.name).is_some() {
            return;
        }
        if let Some(entry) = map.get_ignore_case(&rule.name) {
            self.report(
                entry.line,
                format!(
                    "Optional tag '{}' has incorrect case. Found '{}' but expected '{}'.",
                    rule.name, entry.key, rule.name
                ),
            );
        }
    }
}

/// Findings for one `resource` block; empty for non-taggable types
pub fn check_resource_tags(
    file_path: &Path,
    text: &str,
    block: &Block,
    policy: &TagPolicy,
) -> Vec<Finding> {
    let (Some(resource_type), Some(resource_name)) = (block.labels.first(), block.labels.get(1))
    else {
        return Vec::new();
    };
    if !policy.is_taggable(resource_type) {
        return Vec::new();
    }

    let attribute_name = policy.tag_attribute_for(resource_type);
    let (map, map_line) = match read_tag_map(text, block, attribute_name) {
        TagMap::Static(map, line) => (map, line),
        TagMap::Absent(line) => (MapLiteral::default(), line),
        TagMap::Dynamic => {
            log_debug!("Skipping dynamic tag map",
                "resource" => format!("{}.{}", resource_type, resource_name),
                "attribute" => attribute_name
            );
            return Vec::new();
        }
    };

    let mut check = ResourceCheck {
        file_path,
        address: format!("{}.{}", resource_type, resource_name),
        findings: Vec::new(),
    };
    for rule in &policy.required {
        check.check_required(rule, &map, map_line);
    }
    for rule in &policy.optional {
        check.check_optional(rule, &map);
    }
    check.findings
}

pub fn check_tags(
    file_path: &Path,
    text: &str,
    scan: &ScanResult,
    policy: &TagPolicy,
) -> Vec<Finding> {
    if !policy.has_rules() {
        return Vec::new();
    }
    scan.top_level_of_kind("resource")
        .flat_map(|block| check_resource_tags(file_path, text, block, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LintConfig, TagRuleConfig};
    use crate::scanner::scan;

    fn policy(required: Vec<TagRuleConfig>, optional: Vec<TagRuleConfig>) -> TagPolicy {
        let mut config = LintConfig::default();
        config.tags.required = required;
        config.tags.optional = optional;
        config.build_ruleset().unwrap().tags
    }

    fn environment_rule() -> TagRuleConfig {
        TagRuleConfig {
            allowed_values: Some(vec![
                "Development".to_string(),
                "Staging".to_string(),
                "Production".to_string(),
            ]),
            ..TagRuleConfig::named("Environment")
        }
    }

    fn messages(text: &str, policy: &TagPolicy) -> Vec<String> {
        check_tags(Path::new("main.tf"), text, &scan(text), policy)
            .into_iter()
            .map(|finding| finding.message)
            .collect()
    }

    #[test]
    fn test_value_outside_allowed_set() {
        let text = r#"
resource "aws_s3_bucket" "logs" {
  tags = {
    Environment = "Testing"
  }
}
"#;
        let findings = check_tags(
            Path::new("main.tf"),
            text,
            &scan(text),
            &policy(vec![environment_rule()], vec![]),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, FindingCode::TagViolation);
        assert_eq!(findings[0].line, 4);
        assert_eq!(
            findings[0].message,
            "aws_s3_bucket.logs: Tag 'Environment' has invalid value 'Testing'. \
             Allowed values: Development, Staging, Production."
        );
    }

    #[test]
    fn test_dynamic_tag_maps_are_skipped() {
        let text = r#"
resource "aws_s3_bucket" "merged" {
  tags = merge(var.tags, {
    Environment = "Testing"
  })
}

resource "aws_s3_bucket" "reference" {
  tags = local.tags
}

resource "aws_s3_bucket" "computed" {
  tags = { for k, v in var.tags : k => v }
}
"#;
        assert!(messages(text, &policy(vec![environment_rule()], vec![])).is_empty());
    }

    #[test]
    fn test_missing_and_case_mismatch() {
        let text = r#"
resource "aws_instance" "web" {
  tags = {
    environment = "Production"
  }
}

resource "aws_vpc" "main" {
  cidr_block = "10.0.0.0/16"
}
"#;
        let found = messages(
            text,
            &policy(vec![environment_rule(), TagRuleConfig::named("Owner")], vec![]),
        );
        assert_eq!(
            found,
            vec![
                "aws_instance.web: Required tag 'Environment' has incorrect case. \
                 Found 'environment' but expected 'Environment'.",
                "aws_instance.web: Required tag 'Owner' is missing.",
                "aws_vpc.main: Required tag 'Environment' is missing.",
                "aws_vpc.main: Required tag 'Owner' is missing.",
            ]
        );
    }

    #[test]
    fn test_empty_value_and_value_case() {
        let text = r#"
resource "aws_instance" "web" {
  tags = {
    Environment = "production"
    Owner       = "  "
  }
}
"#;
        let found = messages(
            text,
            &policy(vec![environment_rule(), TagRuleConfig::named("Owner")], vec![]),
        );
        assert_eq!(found.len(), 2);
        assert!(found[0].contains("value 'production' has incorrect case. Expected 'Production'"));
        assert!(found[1].ends_with("Required tag 'Owner' has an empty value."));
    }

    #[test]
    fn test_pattern_and_allowed_values_both_apply() {
        let rule = TagRuleConfig {
            allowed_values: Some(vec!["CC-1".to_string(), "cc-2".to_string()]),
            pattern: Some("CC-[0-9]+".to_string()),
            ..TagRuleConfig::named("CostCenter")
        };
        let text = r#"
resource "aws_instance" "a" {
  tags = { CostCenter = "cc-2" }
}
resource "aws_instance" "b" {
  tags = { CostCenter = "XX-9" }
}
resource "aws_instance" "c" {
  tags = { CostCenter = "CC-1" }
}
"#;
        let found = messages(text, &policy(vec![rule], vec![]));
        assert_eq!(found.len(), 3);
        assert!(found[0].starts_with("aws_instance.a: Tag 'CostCenter' value 'cc-2' does not match"));
        assert!(found[1].starts_with("aws_instance.b: Tag 'CostCenter' has invalid value"));
        assert!(found[2].contains("required pattern 'CC-[0-9]+'"));
    }

    #[test]
    fn test_pattern_is_full_match() {
        let rule = TagRuleConfig {
            pattern: Some("[a-z]+".to_string()),
            ..TagRuleConfig::named("Team")
        };
        let text = "resource \"aws_instance\" \"a\" {\n  tags = { Team = \"core1\" }\n}\n";
        assert_eq!(messages(text, &policy(vec![rule], vec![])).len(), 1);
    }

    #[test]
    fn test_dynamic_value_is_opaque() {
        let text = r#"
resource "aws_instance" "web" {
  tags = {
    Environment = var.environment
    Owner       = "${var.team}-owners"
  }
}
"#;
        let found = messages(
            text,
            &policy(vec![environment_rule(), TagRuleConfig::named("Owner")], vec![]),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_optional_tags_case_only() {
        let text = r#"
resource "aws_instance" "web" {
  tags = {
    project = "x"
  }
}
"#;
        let found = messages(
            text,
            &policy(
                vec![],
                vec![TagRuleConfig::named("Project"), TagRuleConfig::named("Team")],
            ),
        );
        assert_eq!(
            found,
            vec!["aws_instance.web: Optional tag 'Project' has incorrect case. Found 'project' but expected 'Project'."]
        );
    }

    #[test]
    fn test_duplicate_keys_prefer_exact_match() {
        let text = r#"
resource "aws_instance" "web" {
  tags = {
    environment = "whatever"
    Environment = "Production"
  }
}
"#;
        assert!(messages(text, &policy(vec![environment_rule()], vec![])).is_empty());
    }

    #[test]
    fn test_google_labels_and_untaggable_types() {
        let text = r#"
resource "google_storage_bucket" "b" {
  labels = {
    environment = "Production"
  }
  tags = { Environment = "Production" }
}

resource "aws_iam_policy_document" "p" {
}
"#;
        let found = messages(text, &policy(vec![environment_rule()], vec![]));
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("google_storage_bucket.b: Required tag 'Environment' has incorrect case"));
    }

    #[test]
    fn test_no_rules_no_findings() {
        let text = "resource \"aws_instance\" \"web\" {}\n";
        assert!(messages(text, &policy(vec![], vec![])).is_empty());
    }
}
