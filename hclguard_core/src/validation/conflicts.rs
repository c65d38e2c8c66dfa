//! Cross-file module version conflicts
//!
//! References are grouped by identity key in first-seen order. A group is a
//! conflict when its members disagree on the `(version, vcs_ref)` pin.

use crate::findings::{Finding, FindingCode};
use crate::references::ModuleReference;
use crate::sources::VcsRef;
use crate::{log_info, log_success, log_warning, logging::codes};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictGroup {
    pub identity: String,
    /// Insertion order
    pub members: Vec<ModuleReference>,
}

impl ConflictGroup {
    pub fn distinct_pins(&self) -> usize {
        self.members
            .iter()
            .map(ModuleReference::pin)
            .collect::<HashSet<(Option<&str>, Option<&VcsRef>)>>()
            .len()
    }

    /// Members ordered by path then line
    pub fn sorted_members(&self) -> Vec<&ModuleReference> {
        let mut members: Vec<&ModuleReference> = self.members.iter().collect();
        members.sort_by(|a, b| (&a.file_path, a.line).cmp(&(&b.file_path, b.line)));
        members
    }

    /// First member, by path then line, whose pin differs from the earliest member
    pub fn first_divergent(&self) -> Option<&ModuleReference> {
        let members = self.sorted_members();
        let baseline = members.first()?.pin();
        members.into_iter().find(|member| member.pin() != baseline)
    }

    pub fn to_finding(&self) -> Option<Finding> {
        let at = self.first_divergent()?;
        let listing = self
            .sorted_members()
            .iter()
            .map(|member| format!("{} ({})", member.location(), member.describe_version()))
            .collect::<Vec<_>>()
            .join(", ");

        Some(Finding::new(
            &at.file_path,
            at.line,
            FindingCode::VersionConflict,
            format!(
                "Module '{}' is referenced with conflicting versions: {}",
                self.identity, listing
            ),
        ))
    }
}

/// Group non-local references by identity and keep the inconsistent groups
pub fn detect(references: &[ModuleReference]) -> Vec<ConflictGroup> {
    let groups = group_by_identity(references);
    let module_count = groups.len();

    let conflicts: Vec<ConflictGroup> = groups
        .into_iter()
        .map(|(identity, members)| ConflictGroup {
            identity,
            members: members.into_iter().cloned().collect(),
        })
        .filter(|group| group.distinct_pins() >= 2)
        .collect();

    if conflicts.is_empty() {
        log_success!(
            codes::success::CONFLICT_ANALYSIS_COMPLETE,
            "No module version conflicts",
            "references" => references.len(),
            "modules" => module_count
        );
    } else {
        for group in &conflicts {
            log_warning!(codes::validation::VERSION_CONFLICT, "Conflicting module versions",
                "module" => group.identity,
                "references" => group.members.len(),
                "pins" => group.distinct_pins()
            );
        }
        log_info!("Module version conflicts found",
            "groups" => conflicts.len(),
            "modules" => module_count
        );
    }

    conflicts
}

fn group_by_identity(references: &[ModuleReference]) -> IndexMap<String, Vec<&ModuleReference>> {
    let mut groups: IndexMap<String, Vec<&ModuleReference>> = IndexMap::new();
    for reference in references {
        if let Some(identity) = reference.identity.as_remote() {
            groups.entry(identity.to_string()).or_default().push(reference);
        }
    }
    groups
}

pub fn conflict_findings(groups: &[ConflictGroup]) -> Vec<Finding> {
    groups.iter().filter_map(ConflictGroup::to_finding).collect()
}

/// Human-readable summary of every conflict group
pub struct ConflictReport<'a> {
    pub groups: &'a [ConflictGroup],
    /// Distinct remote modules seen across the batch
    pub module_count: usize,
}

impl<'a> ConflictReport<'a> {
    pub fn new(groups: &'a [ConflictGroup], references: &[ModuleReference]) -> Self {
        Self {
            groups,
            module_count: group_by_identity(references).len(),
        }
    }
}

impl fmt::Display for ConflictReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            return writeln!(
                f,
                "No module version conflicts across {} modules",
                self.module_count
            );
        }

        writeln!(
            f,
            "Module version conflicts in {} of {} modules",
            self.groups.len(),
            self.module_count
        )?;
        writeln!(
            f,
            "The same module is referenced with different versions or git refs."
        )?;

        for group in self.groups {
            writeln!(f)?;
            writeln!(f, "Module: {}", group.identity)?;
            for member in group.sorted_members() {
                writeln!(
                    f,
                    "  {} ({}) source: {}",
                    member.location(),
                    member.describe_version(),
                    member.raw_source
                )?;
            }
            writeln!(
                f,
                "  Resolution: pick one version and update every reference to match."
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(path: &str, line: u32, source: &str, version: Option<&str>) -> ModuleReference {
        ModuleReference::new(path, line, "m", source, version.map(str::to_string))
    }

    const VPC: &str = "terraform-aws-modules/vpc/aws";

    #[test]
    fn test_version_mismatch_forms_one_group() {
        let references = vec![
            reference("a/main.tf", 3, VPC, Some("3.0.0")),
            reference("b/main.tf", 7, VPC, Some("3.1.0")),
        ];
        let groups = detect(&references);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].identity, VPC);
        assert_eq!(groups[0].members.len(), 2);

        let finding = groups[0].to_finding().unwrap();
        assert_eq!(finding.code, FindingCode::VersionConflict);
        assert_eq!(finding.file_path.to_str(), Some("b/main.tf"));
        assert_eq!(finding.line, 7);
        assert!(finding.message.contains("a/main.tf:3 (version = 3.0.0)"));
        assert!(finding.message.contains("b/main.tf:7 (version = 3.1.0)"));
    }

    #[test]
    fn test_same_version_is_not_a_conflict() {
        let references = vec![
            reference("a/main.tf", 3, VPC, Some("3.0.0")),
            reference("b/main.tf", 7, VPC, Some("3.0.0")),
        ];
        assert!(detect(&references).is_empty());
    }

    #[test]
    fn test_single_reference_never_conflicts() {
        assert!(detect(&[reference("a.tf", 1, VPC, Some("1.0.0"))]).is_empty());
    }

    #[test]
    fn test_git_refs_and_local_paths() {
        let references = vec![
            reference("a.tf", 1, "git::https://github.com/org/net.git?ref=v1", None),
            reference("b.tf", 1, "https://github.com/org/net.git?ref=v2", None),
            reference("c.tf", 1, "./modules/net", None),
            reference("d.tf", 1, "../modules/net", Some("9.9.9")),
        ];
        let groups = detect(&references);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].identity, "https://github.com/org/net.git");
        assert!(groups[0].to_finding().unwrap().message.contains("git ref = v2"));
    }

    #[test]
    fn test_missing_version_counts_as_distinct_pin() {
        let references = vec![
            reference("a.tf", 1, VPC, Some("3.0.0")),
            reference("b.tf", 1, VPC, None),
        ];
        let groups = detect(&references);
        assert_eq!(groups.len(), 1);
        assert!(groups[0]
            .to_finding()
            .unwrap()
            .message
            .contains("no version specified"));
    }

    #[test]
    fn test_first_divergent_uses_path_then_line() {
        let references = vec![
            reference("z.tf", 1, VPC, Some("2.0.0")),
            reference("a.tf", 9, VPC, Some("1.0.0")),
            reference("a.tf", 2, VPC, Some("1.0.0")),
        ];
        let groups = detect(&references);
        let divergent = groups[0].first_divergent().unwrap();
        assert_eq!(divergent.file_path.to_str(), Some("z.tf"));
        // members keep insertion order
        assert_eq!(groups[0].members[0].file_path.to_str(), Some("z.tf"));
    }

    #[test]
    fn test_group_order_is_insertion_order() {
        let references = vec![
            reference("a.tf", 1, "org/zeta/aws", Some("1")),
            reference("a.tf", 2, "org/alpha/aws", Some("1")),
            reference("b.tf", 1, "org/zeta/aws", Some("2")),
            reference("b.tf", 2, "org/alpha/aws", Some("2")),
        ];
        let first = detect(&references);
        let identities: Vec<_> = first.iter().map(|g| g.identity.as_str()).collect();
        assert_eq!(identities, vec!["org/zeta/aws", "org/alpha/aws"]);
        assert_eq!(first, detect(&references));
    }

    #[test]
    fn test_report_rendering() {
        let references = vec![
            reference("a.tf", 1, VPC, Some("3.0.0")),
            reference("b.tf", 4, VPC, Some("3.1.0")),
            reference("c.tf", 1, "org/other/aws", Some("1.0.0")),
        ];
        let groups = detect(&references);
        let report = ConflictReport::new(&groups, &references).to_string();
        assert!(report.starts_with("Module version conflicts in 1 of 2 modules"));
        assert!(report.contains("Module: terraform-aws-modules/vpc/aws"));
        assert!(report.contains("b.tf:4 (version = 3.1.0)"));

        let clean = ConflictReport::new(&[], &references).to_string();
        assert!(clean.contains("No module version conflicts across 2 modules"));
    }
}
