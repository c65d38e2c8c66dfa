//! End-to-end checks over a small Terraform project on disk

use hclguard_core::batch::{process_paths, BatchConfig};
use hclguard_core::{CheckContext, FindingCode, LintConfig, Severity};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "main.tf",
        r#"terraform {
  required_providers {
    aws = {
      source = "hashicorp/aws"
    }
  }
}

module "network" {
  source = "git::https://github.com/acme/network.git?ref=v1.0.0"
}
"#,
    );
    write(
        root,
        "envs/prod/main.tf",
        r#"provider "aws" {
  region = "us-east-1"
}

module "network" {
  source = "git::https://github.com/acme/network.git?ref=v1.2.0"
}
"#,
    );
    write(
        root,
        "modules/bucket/main.tf",
        r#"resource "aws_s3_bucket" "logs" {
  bucket = "logs"
  tags = {
    Name        = "logs"
    Environment = "staging"
  }
}
"#,
    );
    write(
        root,
        "modules/bucket/variables.tf",
        "variable \"name\" {}\n\nvariable \"environment\" {}\n",
    );
    write(
        root,
        "vendor/main.tf",
        "module \"network\" {\n  source = \"git::https://github.com/acme/network.git?ref=v9.9.9\"\n}\n",
    );
    write(root, ".terraform/modules/network/main.tf", "provider \"aws\" {}\n");

    dir
}

const CONFIG: &str = r#"
[modules]
exclude_dirs = ["vendor"]

[[tags.required]]
name = "Owner"

[[tags.required]]
name = "Environment"
allowed_values = ["dev", "prod"]
"#;

fn batch_config() -> BatchConfig {
    BatchConfig {
        max_threads: 2,
        recursive: true,
        max_files: None,
        progress_reporting: false,
        fail_fast: false,
    }
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap().to_path_buf()
}

#[test]
fn test_project_findings() {
    let dir = project();
    let root = dir.path();
    let config = LintConfig::from_toml_str(CONFIG, Path::new(".hclguard.toml")).unwrap();
    let context = CheckContext::new(config.build_ruleset().unwrap());

    let results = process_paths(&[root.to_path_buf()], &context, &batch_config()).unwrap();

    assert_eq!(results.files_discovered, 5);
    assert!(results.failed_files.is_empty());
    assert!(results.has_errors());

    let findings = results.findings();
    let summary: Vec<(PathBuf, FindingCode)> = findings
        .iter()
        .map(|f| (relative(root, &f.file_path), f.code))
        .collect();
    assert_eq!(
        summary,
        vec![
            (PathBuf::from("envs/prod/main.tf"), FindingCode::LegacyProviderBlock),
            (PathBuf::from("main.tf"), FindingCode::VersionConflict),
            (PathBuf::from("modules/bucket/main.tf"), FindingCode::TagViolation),
            (PathBuf::from("modules/bucket/main.tf"), FindingCode::TagViolation),
            (PathBuf::from("modules/bucket/variables.tf"), FindingCode::OrderViolation),
        ]
    );
    assert!(findings.iter().all(|f| f.severity == Severity::Error));

    // the conflict is reported at the first reference that disagrees
    let conflict = &findings[1];
    assert_eq!(conflict.line, 9);
    assert!(conflict.message.contains("v1.0.0"));
    assert!(conflict.message.contains("v1.2.0"));
    assert!(!conflict.message.contains("v9.9.9"));
    assert_eq!(results.conflicts.len(), 1);
    assert_eq!(results.module_references.len(), 2);

    let tag_messages: Vec<&str> = findings
        .iter()
        .filter(|f| f.code == FindingCode::TagViolation)
        .map(|f| f.message.as_str())
        .collect();
    assert!(tag_messages.iter().all(|m| m.starts_with("aws_s3_bucket.logs: ")));
    assert!(tag_messages.iter().any(|m| m.contains("'Owner'")));
    assert!(tag_messages.iter().any(|m| m.contains("'staging'")));
}

#[test]
fn test_single_check_selection() {
    let dir = project();
    let mut config = LintConfig::from_toml_str(CONFIG, Path::new(".hclguard.toml")).unwrap();
    config.checks = hclguard_core::config::CheckToggles::only(&[
        hclguard_core::config::CheckKind::Ordering,
    ]);
    let context = CheckContext::new(config.build_ruleset().unwrap());

    let results = process_paths(&[dir.path().to_path_buf()], &context, &batch_config()).unwrap();
    let codes: Vec<FindingCode> = results.findings().iter().map(|f| f.code).collect();
    assert_eq!(codes, vec![FindingCode::OrderViolation]);
    assert!(results.conflicts.is_empty());
}

#[test]
fn test_clean_project_passes() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "variables.tf",
        "variable \"alpha\" {}\nvariable \"beta\" {}\n",
    );
    write(
        dir.path(),
        "main.tf",
        "module \"network\" {\n  source  = \"acme/network/aws\"\n  version = \"1.0.0\"\n}\n",
    );
    write(
        dir.path(),
        "envs/dev/main.tf",
        "module \"network\" {\n  source  = \"acme/network/aws\"\n  version = \"1.0.0\"\n}\n",
    );

    let results = process_paths(
        &[dir.path().to_path_buf()],
        &CheckContext::default(),
        &batch_config(),
    )
    .unwrap();
    assert!(!results.has_errors());
    assert!(results.findings().is_empty());
    assert_eq!(results.reports.len(), 3);
}
