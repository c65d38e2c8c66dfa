//! Legacy provider block detection
//!
//! A `provider` block is a declaration only when its ancestry runs through
//! `terraform { required_providers { ... } }`. Anything else configures the
//! provider inline, which blocks `for_each` and `depends_on` on the module
//! that contains it.

use crate::attributes::{extract_attributes, find};
use crate::findings::{Finding, FindingCode};
use crate::scanner::{Block, ScanResult};
use crate::{log_debug, log_warning, logging::codes};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const PROVIDERS_DOC_URL: &str =
    "https://developer.hashicorp.com/terraform/language/modules/develop/providers";

/// Position relative to a provider declaration while walking ancestors
/// outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderContext {
    Outside,
    InsideTerraformBlock,
    InsideRequiredProviders,
    InsideConfigurationAliases,
}

impl ProviderContext {
    pub fn enter(self, kind: &str) -> Self {
        match (self, kind) {
            (ProviderContext::Outside, "terraform") => ProviderContext::InsideTerraformBlock,
            (ProviderContext::InsideTerraformBlock, "required_providers") => {
                ProviderContext::InsideRequiredProviders
            }
            (ProviderContext::InsideRequiredProviders, "configuration_aliases") => {
                ProviderContext::InsideConfigurationAliases
            }
            (
                ProviderContext::InsideRequiredProviders
                | ProviderContext::InsideConfigurationAliases,
                _,
            ) => self,
            _ => ProviderContext::Outside,
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            ProviderContext::InsideRequiredProviders | ProviderContext::InsideConfigurationAliases
        )
    }
}

/// Which remediation applies to the file's module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleHint {
    Root,
    Child,
}

impl ModuleHint {
    /// Child when the file sits under a `modules` directory or its directory
    /// is known to hold module interface files
    pub fn for_path(file_path: &Path, module_dirs: &HashSet<PathBuf>) -> Self {
        let parent = file_path.parent().unwrap_or_else(|| Path::new(""));
        let under_modules = parent
            .components()
            .any(|component| component.as_os_str() == "modules");
        if under_modules || module_dirs.contains(parent) {
            ModuleHint::Child
        } else {
            ModuleHint::Root
        }
    }

    pub fn advice(&self) -> String {
        match self {
            ModuleHint::Child => format!(
                "Modules should use required_providers with configuration_aliases instead (see {}).",
                PROVIDERS_DOC_URL
            ),
            ModuleHint::Root => "Root modules should declare providers in a required_providers block \
                and pass them to modules explicitly."
                .to_string(),
        }
    }
}

/// Context of a block from its ancestor chain
pub fn provider_context(scan: &ScanResult, block: &Block) -> ProviderContext {
    let mut chain: Vec<&Block> = scan.ancestors(block.id).collect();
    chain.reverse();
    chain
        .iter()
        .fold(ProviderContext::Outside, |context, ancestor| {
            context.enter(&ancestor.kind)
        })
}

fn is_exempt(text: &str, block: &Block, markers: &[String]) -> bool {
    if markers.is_empty() {
        return false;
    }
    let attributes = extract_attributes(text, block);
    markers
        .iter()
        .any(|marker| find(&attributes, marker).is_some())
}

/// Provider, tag and external sorter checks apply to `.tf` configuration
/// files only, not test files or other HCL
pub fn applies_to(file_path: &Path) -> bool {
    file_path.extension().map(|ext| ext == "tf").unwrap_or(false)
}

pub fn check_providers(
    file_path: &Path,
    text: &str,
    scan: &ScanResult,
    exempt_markers: &[String],
    hint: ModuleHint,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for block in scan.of_kind("provider") {
        let Some(name) = block.first_label() else {
            continue;
        };

        if provider_context(scan, block).is_declaration() {
            continue;
        }
        if is_exempt(text, block, exempt_markers) {
            log_debug!("Provider block exempted by marker",
                "provider" => name,
                "line" => block.header_line
            );
            continue;
        }

        log_warning!(
            codes::validation::LEGACY_PROVIDER_BLOCK,
            "Legacy provider block",
            "provider" => name,
            "line" => block.header_line
        );
        findings.push(Finding::new(
            file_path,
            block.header_line,
            FindingCode::LegacyProviderBlock,
            format!(
                "Old-style provider configuration detected for '{}'. \
                 This prevents module-level for_each and depends_on. {}",
                name,
                hint.advice()
            ),
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Severity;
    use crate::scanner::scan;

    fn check(text: &str, markers: &[&str]) -> Vec<Finding> {
        let markers: Vec<String> = markers.iter().map(|m| m.to_string()).collect();
        check_providers(
            Path::new("main.tf"),
            text,
            &scan(text),
            &markers,
            ModuleHint::Root,
        )
    }

    #[test]
    fn test_bare_provider_block_is_flagged() {
        let findings = check("provider \"aws\" { region = \"x\" }\n", &[]);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.code, FindingCode::LegacyProviderBlock);
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.line, 1);
        assert!(finding.message.contains("'aws'"));
        assert!(finding.message.contains("for_each and depends_on"));
    }

    #[test]
    fn test_declaration_under_required_providers() {
        let text = r#"
terraform {
  required_providers {
    aws = {
      source                = "hashicorp/aws"
      configuration_aliases = [aws.main]
    }
    provider "google" {
    }
  }
}
"#;
        assert!(check(text, &[]).is_empty());
    }

    #[test]
    fn test_required_providers_outside_terraform_does_not_count() {
        let text = r#"
required_providers {
  provider "aws" {}
}
"#;
        assert_eq!(check(text, &[]).len(), 1);
    }

    #[test]
    fn test_commented_and_quoted_providers_are_ignored() {
        let text = r#"
# provider "aws" {
locals {
  example = "provider \"aws\" { region = \"x\" }"
}
/*
provider "google" {}
*/
"#;
        assert!(check(text, &[]).is_empty());
    }

    #[test]
    fn test_long_terraform_block_does_not_hide_provider() {
        let mut text = String::from("terraform {\n  required_providers {\n");
        for i in 0..100 {
            text.push_str(&format!("    p{} = {{ source = \"x/p{}\" }}\n", i, i));
        }
        text.push_str("  }\n}\n\nprovider \"aws\" {}\n");
        let findings = check(&text, &[]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 106);
    }

    #[test]
    fn test_exempt_marker() {
        let text = "provider \"aws\" {\n  mock = true\n}\nprovider \"google\" {}\n";
        let findings = check(text, &["mock"]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'google'"));
    }

    #[test]
    fn test_provider_context_transitions() {
        let context = ProviderContext::Outside
            .enter("terraform")
            .enter("required_providers");
        assert!(context.is_declaration());
        assert!(context.enter("configuration_aliases").is_declaration());
        assert!(!ProviderContext::Outside.enter("required_providers").is_declaration());
        assert_eq!(
            ProviderContext::InsideTerraformBlock.enter("backend"),
            ProviderContext::Outside
        );
    }

    #[test]
    fn test_module_hint() {
        let none = HashSet::new();
        assert_eq!(
            ModuleHint::for_path(Path::new("modules/vpc/main.tf"), &none),
            ModuleHint::Child
        );
        assert_eq!(ModuleHint::for_path(Path::new("main.tf"), &none), ModuleHint::Root);

        let dirs: HashSet<PathBuf> = [PathBuf::from("stacks/net")].into_iter().collect();
        assert_eq!(
            ModuleHint::for_path(Path::new("stacks/net/providers.tf"), &dirs),
            ModuleHint::Child
        );
        assert!(ModuleHint::Child.advice().contains("configuration_aliases"));
        assert!(ModuleHint::Root.advice().contains("required_providers"));
    }

    #[test]
    fn test_applies_to_tf_only() {
        assert!(applies_to(Path::new("main.tf")));
        assert!(!applies_to(Path::new("unit.tftest.hcl")));
        assert!(!applies_to(Path::new("terragrunt.hcl")));
    }
}
