use anyhow::{bail, Result};
use std::io::Write;

use crate::config::OutputFormat;
use crate::insights::RepoResult;

/// Writes scan results in a machine-readable format.
///
/// - JSON: the result list, compact or pretty
/// - CSV: one row per repository with the summary table's columns
pub fn export_results(
    results: &[RepoResult],
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => bail!("Summary output is rendered, not exported"),
        OutputFormat::Json => export_json(results, pretty, output),
        OutputFormat::Csv => export_csv(results, output),
    }
}

fn export_json(results: &[RepoResult], pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(results)?
    } else {
        serde_json::to_string(results)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn export_csv(results: &[RepoResult], output: &mut dyn Write) -> Result<()> {
    writeln!(
        output,
        "Repo Name,Platform,Merged,FT Pass,FT Fail,FTPR %"
    )?;

    for result in results {
        writeln!(
            output,
            "\"{}\",{},{},{},{},{:.2}",
            result.repo_name.replace('"', "\"\""),
            result.platform,
            result.total_merged,
            result.first_time_passes,
            result.first_time_failures,
            result.ftpr
        )?;
    }

    Ok(())
}
