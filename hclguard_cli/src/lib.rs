//! # hclguard CLI
//!
//! Argument handling, configuration discovery, the external block sorter and
//! report rendering around `hclguard_core`.

pub mod args;
pub mod config_discovery;
pub mod error;
pub mod formatter_command;
pub mod output;

use args::Cli;
use error::CliError;
use formatter_command::FormatterOrdering;
use hclguard_core::config::{BatchPreferences, FormatterPreferences};
use hclguard_core::logging::codes;
use hclguard_core::{batch, log_info, log_success, BatchConfig, CheckContext};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_FINDINGS: i32 = 1;

/// Run one check over the command line's paths, writing the report to `out`.
/// Returns the process exit code.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<i32, CliError> {
    let mut config = config_discovery::load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config)?;
    let ruleset = config.build_ruleset()?;

    let mut context = CheckContext::new(ruleset);
    if !cli.no_formatter {
        let timeout = Duration::from_secs(FormatterPreferences::default().timeout_secs);
        context = context.with_external_ordering(Arc::new(FormatterOrdering::new(
            cli.formatter_bin.clone(),
            timeout,
        )));
    }

    let mut batch_config = BatchConfig::from_preferences(&BatchPreferences::default());
    batch_config.max_threads = cli.threads.unwrap_or_else(num_cpus::get).max(1);
    batch_config.recursive = !cli.no_recursive;
    batch_config.fail_fast |= cli.fail_fast;

    log_info!("Checking paths",
        "paths" => cli.paths.len(),
        "threads" => batch_config.max_threads,
        "formatter" => if cli.no_formatter { "built-in" } else { cli.formatter_bin.as_str() }
    );

    let results = batch::process_paths(&cli.paths, &context, &batch_config)?;
    output::render(out, &results, cli.format)?;

    log_success!(codes::success::OPERATION_COMPLETED_SUCCESSFULLY, "Check finished",
        "errors" => results.error_count(),
        "failed_files" => results.failed_files.len()
    );

    Ok(if results.has_errors() {
        EXIT_FINDINGS
    } else {
        EXIT_CLEAN
    })
}
