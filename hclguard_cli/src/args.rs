//! Command-line arguments

use clap::{Parser, ValueEnum};
use hclguard_core::config::{CheckKind, CheckToggles, TagRuleConfig};
use hclguard_core::LintConfig;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::CliError;
use crate::formatter_command::DEFAULT_FORMATTER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "hclguard",
    version,
    about = "Static checks for Terraform and HCL sources"
)]
pub struct Cli {
    /// Files or directories to check
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Configuration file (.toml or .json); searched upward from the working directory when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run only these checks (repeatable)
    #[arg(long = "check", value_name = "CHECK")]
    pub checks: Vec<CheckKind>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Worker threads (defaults to the number of cores)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Do not descend into subdirectories
    #[arg(long)]
    pub no_recursive: bool,

    /// Path substring excluded from module version checks (repeatable)
    #[arg(long = "exclude-dir", value_name = "DIR")]
    pub exclude_dirs: Vec<String>,

    /// Required tag rules as JSON, e.g. '[{"name":"Owner"}]'
    #[arg(long, value_name = "JSON")]
    pub required_tags: Option<String>,

    /// Optional tag rules as JSON
    #[arg(long, value_name = "JSON")]
    pub optional_tags: Option<String>,

    /// External block sorter used for the ordering check
    #[arg(long, value_name = "PATH", default_value = DEFAULT_FORMATTER)]
    pub formatter_bin: String,

    /// Always use the built-in ordering check
    #[arg(long)]
    pub no_formatter: bool,

    /// Stop after the first file that cannot be read
    #[arg(long)]
    pub fail_fast: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

/// A tag rule on the command line: a bare name or a full rule object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagArg {
    Name(String),
    Rule(TagRuleConfig),
}

impl From<TagArg> for TagRuleConfig {
    fn from(arg: TagArg) -> Self {
        match arg {
            TagArg::Name(name) => TagRuleConfig::named(&name),
            TagArg::Rule(rule) => rule,
        }
    }
}

pub fn parse_tag_rules(flag: &'static str, json: &str) -> Result<Vec<TagRuleConfig>, CliError> {
    let args: Vec<TagArg> =
        serde_json::from_str(json).map_err(|source| CliError::InvalidTagList { flag, source })?;
    Ok(args.into_iter().map(TagRuleConfig::from).collect())
}

impl Cli {
    /// Flags take precedence over the configuration file
    pub fn apply_overrides(&self, config: &mut LintConfig) -> Result<(), CliError> {
        if !self.checks.is_empty() {
            config.checks = CheckToggles::only(&self.checks);
        }
        config.modules.exclude_dirs.extend(self.exclude_dirs.iter().cloned());

        if let Some(json) = &self.required_tags {
            config.tags.required = parse_tag_rules("--required-tags", json)?;
        }
        if let Some(json) = &self.optional_tags {
            config.tags.optional = parse_tag_rules("--optional-tags", json)?;
        }
        Ok(())
    }
}
