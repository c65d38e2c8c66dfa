//! Report rendering

use crate::args::OutputFormat;
use crate::error::CliError;
use hclguard_core::findings::Finding;
use hclguard_core::validation::conflicts::ConflictReport;
use hclguard_core::BatchResults;
use std::io::{self, Write};

pub fn render<W: Write>(
    out: &mut W,
    results: &BatchResults,
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, results)?;
            writeln!(out)?;
        }
        OutputFormat::Text => render_text(out, results)?,
    }
    Ok(())
}

fn write_finding<W: Write>(out: &mut W, finding: &Finding) -> io::Result<()> {
    writeln!(out, "{}[{}]: {}", finding.severity, finding.code, finding.message)?;
    writeln!(out, "  --> {}:{}", finding.file_path.display(), finding.line)?;
    writeln!(out)
}

pub fn render_text<W: Write>(out: &mut W, results: &BatchResults) -> io::Result<()> {
    for finding in results.findings() {
        write_finding(out, &finding)?;
    }

    for failed in &results.failed_files {
        writeln!(out, "error[{}]: {}", failed.code, failed.message)?;
        writeln!(out, "  --> {}", failed.path.display())?;
        writeln!(out)?;
    }

    if !results.module_references.is_empty() {
        write!(
            out,
            "{}",
            ConflictReport::new(&results.conflicts, &results.module_references)
        )?;
        writeln!(out)?;
    }

    let status = if results.has_errors() { "FAILED" } else { "ok" };
    writeln!(out, "check result: {}. {}", status, results.summary())
}
