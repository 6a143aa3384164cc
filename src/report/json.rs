use super::types::Report;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

/// Generate JSON report
pub async fn generate(report: &Report, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        write_report(report, path)?;
    } else {
        println!("{}", serde_json::to_string_pretty(report)?);
    }

    Ok(())
}

/// Persist the full run, including request/response captures, so other
/// formats can be regenerated later with `report`
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write results: {}", path.display()))?;
    println!(
        "{} Results saved to: {}",
        "💾".to_string().blue(),
        path.display().to_string().cyan()
    );
    Ok(())
}

/// Load a results file written by [`write_report`]
pub fn load_report(path: &Path) -> Result<Report> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results: {}", path.display()))?;
    let report = serde_json::from_str(&content)
        .with_context(|| format!("Invalid results file: {}", path.display()))?;
    Ok(report)
}
