//! Per-file check pipeline
//!
//! One scan per file, shared by every enabled check. The conflict detector is
//! not run here; module references are returned for the batch to fold.

mod error;
mod result;

pub use error::PipelineError;
pub use result::FileReport;

use crate::config::{CheckKind, Ruleset, ScanPreferences};
use crate::file_processor::FileProcessor;
use crate::findings::{sort_findings, Finding};
use crate::logging;
use crate::references::collect_module_references;
use crate::scanner::scan;
use crate::validation::{ordering, providers, tags};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Ordering check delegated to an outside tool, such as a block sorter.
///
/// `None` means the tool could not produce an answer for this file and the
/// built-in ordering check runs instead.
pub trait ExternalOrdering: Send + Sync {
    fn check(&self, file_path: &Path, text: &str) -> Option<Vec<Finding>>;
}

/// Read-only state shared by every worker in a batch
#[derive(Clone)]
pub struct CheckContext {
    pub ruleset: Arc<Ruleset>,
    /// Directories holding module interface files (`variables.tf`, `outputs.tf`)
    pub module_dirs: Arc<HashSet<PathBuf>>,
    pub external_ordering: Option<Arc<dyn ExternalOrdering>>,
    pub report_degraded: bool,
}

impl CheckContext {
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            ruleset: Arc::new(ruleset),
            module_dirs: Arc::new(HashSet::new()),
            external_ordering: None,
            report_degraded: ScanPreferences::default().report_degraded_input,
        }
    }

    pub fn with_module_dirs(mut self, module_dirs: HashSet<PathBuf>) -> Self {
        self.module_dirs = Arc::new(module_dirs);
        self
    }

    pub fn with_external_ordering(mut self, external: Arc<dyn ExternalOrdering>) -> Self {
        self.external_ordering = Some(external);
        self
    }

    fn is_enabled(&self, kind: CheckKind) -> bool {
        self.ruleset.checks.is_enabled(kind)
    }
}

impl Default for CheckContext {
    fn default() -> Self {
        Self::new(Ruleset::default())
    }
}

impl fmt::Debug for CheckContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckContext")
            .field("ruleset", &self.ruleset)
            .field("module_dirs", &self.module_dirs)
            .field("external_ordering", &self.external_ordering.is_some())
            .field("report_degraded", &self.report_degraded)
            .finish()
    }
}

/// Run every enabled per-file check over `text`
pub fn check_source(file_path: &Path, text: &str, context: &CheckContext) -> FileReport {
    logging::with_file_context(file_path, || {
        let start_time = Instant::now();
        let ruleset = &context.ruleset;
        let scan = scan(text);

        let mut findings = Vec::new();
        if context.report_degraded {
            findings.extend(scan.degraded_findings(file_path));
        }

        if context.is_enabled(CheckKind::Providers) && providers::applies_to(file_path) {
            let hint = providers::ModuleHint::for_path(file_path, &context.module_dirs);
            findings.extend(providers::check_providers(
                file_path,
                text,
                &scan,
                &ruleset.provider_markers,
                hint,
            ));
        }

        if context.is_enabled(CheckKind::Ordering) {
            let external = context
                .external_ordering
                .as_ref()
                .filter(|_| providers::applies_to(file_path))
                .and_then(|external| external.check(file_path, text));
            match external {
                Some(external_findings) => findings.extend(external_findings),
                None => findings.extend(ordering::check_ordering(
                    file_path,
                    &scan,
                    &ruleset.ordered_kinds,
                )),
            }
        }

        if context.is_enabled(CheckKind::Tags) && providers::applies_to(file_path) {
            findings.extend(tags::check_tags(file_path, text, &scan, &ruleset.tags));
        }

        let module_references = if context.is_enabled(CheckKind::ModuleVersions) {
            collect_module_references(file_path, text, &scan, &ruleset.module_exclude_dirs)
        } else {
            Vec::new()
        };

        sort_findings(&mut findings);
        let report = FileReport {
            path: file_path.to_path_buf(),
            findings,
            module_references,
            block_count: scan.blocks.len(),
            degraded: scan.is_degraded(),
            duration: start_time.elapsed(),
        };
        report.log_success();
        report
    })
}

/// Read a file and run the checks over it
pub fn process_file(
    processor: &FileProcessor,
    file_path: &Path,
    context: &CheckContext,
) -> Result<FileReport, PipelineError> {
    let source = processor.process_file(file_path)?;
    Ok(check_source(&source.path, &source.text, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CheckToggles, LintConfig, TagRuleConfig};
    use crate::findings::FindingCode;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const TEXT: &str = r#"
variable "zebra" {}
variable "apple" {}

provider "aws" {
  region = "us-east-1"
}

module "vpc" {
  source  = "terraform-aws-modules/vpc/aws"
  version = "3.0.0"
}

resource "aws_s3_bucket" "logs" {
  tags = {
    Name = "logs"
  }
}
"#;

    fn context_with_owner_rule() -> CheckContext {
        let mut config = LintConfig::default();
        config.tags.required.push(TagRuleConfig::named("Owner"));
        CheckContext::new(config.build_ruleset().unwrap())
    }

    fn codes(report: &FileReport) -> Vec<FindingCode> {
        report.findings.iter().map(|f| f.code).collect()
    }

    #[test]
    fn test_all_checks_share_one_scan() {
        let report = check_source(Path::new("main.tf"), TEXT, &context_with_owner_rule());
        assert_eq!(
            codes(&report),
            vec![
                FindingCode::OrderViolation,
                FindingCode::LegacyProviderBlock,
                FindingCode::TagViolation,
            ]
        );
        assert_eq!(report.module_references.len(), 1);
        assert_eq!(report.block_count, 5);
        assert!(report.has_errors());
        assert!(!report.degraded);
    }

    #[test]
    fn test_disabled_checks_are_skipped() {
        let mut ruleset = LintConfig::default().build_ruleset().unwrap();
        ruleset.checks = CheckToggles::only(&[CheckKind::Tags]);
        let report = check_source(Path::new("main.tf"), TEXT, &CheckContext::new(ruleset));
        assert!(report.findings.is_empty());
        assert!(report.module_references.is_empty());
    }

    #[test]
    fn test_provider_check_skips_test_files() {
        let text = "provider \"aws\" {}\n";
        let path = Path::new("tests/unit.tftest.hcl");
        let report = check_source(path, text, &CheckContext::default());
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_tag_check_skips_non_tf_files() {
        let text = "resource \"aws_s3_bucket\" \"logs\" {\n  tags = {}\n}\n";
        let context = context_with_owner_rule();

        let report = check_source(Path::new("main.tf"), text, &context);
        assert_eq!(codes(&report), vec![FindingCode::TagViolation]);

        for path in ["terragrunt.hcl", "tests/unit.tftest.hcl"] {
            let report = check_source(Path::new(path), text, &context);
            assert!(report.findings.is_empty(), "{} should not be tag-checked", path);
        }
    }

    #[test]
    fn test_degraded_input_is_a_warning() {
        let text = "resource \"aws_s3_bucket\" \"b\" {\n  bucket = \"x\"\n";
        let report = check_source(Path::new("main.tf"), text, &CheckContext::default());
        assert!(report.degraded);
        assert_eq!(codes(&report), vec![FindingCode::UnterminatedBlock]);
        assert!(!report.has_errors());
    }

    struct CountingSorter {
        calls: AtomicUsize,
        answer: Option<Vec<Finding>>,
    }

    impl ExternalOrdering for CountingSorter {
        fn check(&self, _file_path: &Path, _text: &str) -> Option<Vec<Finding>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    #[test]
    fn test_external_ordering_replaces_builtin() {
        let sorter = Arc::new(CountingSorter {
            calls: AtomicUsize::new(0),
            answer: Some(Vec::new()),
        });
        let context = CheckContext::default().with_external_ordering(sorter.clone());
        let text = "variable \"b\" {}\nvariable \"a\" {}\n";

        let report = check_source(Path::new("vars.tf"), text, &context);
        assert!(report.findings.is_empty());
        assert_eq!(sorter.calls.load(Ordering::SeqCst), 1);

        // not a .tf file: the external tool is not consulted
        let report = check_source(Path::new("vars.hcl"), text, &context);
        assert_eq!(codes(&report), vec![FindingCode::OrderViolation]);
        assert_eq!(sorter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_external_ordering_falls_back() {
        let sorter = Arc::new(CountingSorter {
            calls: AtomicUsize::new(0),
            answer: None,
        });
        let context = CheckContext::default().with_external_ordering(sorter);
        let text = "variable \"b\" {}\nvariable \"a\" {}\n";
        let report = check_source(Path::new("vars.tf"), text, &context);
        assert_eq!(codes(&report), vec![FindingCode::OrderViolation]);
    }

    #[test]
    fn test_process_file_reads_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.tf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"provider \"aws\" {}\n")
            .unwrap();

        let report =
            process_file(&FileProcessor::default(), &path, &CheckContext::default()).unwrap();
        assert_eq!(codes(&report), vec![FindingCode::LegacyProviderBlock]);

        let missing = process_file(
            &FileProcessor::default(),
            &dir.path().join("absent.tf"),
            &CheckContext::default(),
        );
        assert!(matches!(missing, Err(PipelineError::FileProcessing(_))));
    }
}
