use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use pbw_api_core::report::ApiReport;
use pbw_api_core::services::analysis::{PackageAnalysis, PackageAnalyzer};

use crate::commands::{resolve_tool_config, write_output, ConfigOverrides};
use crate::sha256_file;

/// Scan every binary of a package and write the JSON report.
///
/// The report is written even when platforms failed; the command then returns
/// an error so the process exits non-zero.
pub fn scan_command(
    input: &Path,
    output: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<()> {
    let config = resolve_tool_config(overrides)?;
    let analysis = PackageAnalyzer::new(&config)
        .analyze_path(input)
        .with_context(|| format!("Failed to analyze {}", input.display()))?;
    let succeeded = analysis.succeeded(config.single_failures);

    let report = build_report(input, analysis)?;
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    write_output(output, &json)?;
    if let Some(path) = output {
        let count = report.platforms.len();
        println!("Wrote report for {count} platform(s) to {}", path.display());
    }

    if !succeeded {
        let failed: Vec<&str> = report.failures.iter().map(|f| f.platform.as_str()).collect();
        return Err(anyhow!("Analysis failed for platform(s): {}", failed.join(", ")));
    }
    Ok(())
}

/// Wrap an analysis into a report stamped with the package hash and time.
pub fn build_report(input: &Path, analysis: PackageAnalysis) -> Result<ApiReport> {
    let mut report =
        ApiReport::new(input.display().to_string(), analysis.platforms, analysis.failures);
    report.sha256 = Some(sha256_file(input)?);
    report.generated_at = Some(Utc::now().to_rfc3339());
    Ok(report)
}
