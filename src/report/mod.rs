pub mod console;
pub mod html;
pub mod json;
pub mod junit;
pub mod types;

use anyhow::Result;
use std::path::Path;

/// Regenerate a report in another format from a saved results file
pub async fn generate_report(
    results_path: &Path,
    format: &str,
    output: Option<&Path>,
    preview_len: usize,
) -> Result<()> {
    let report = json::load_report(results_path)?;

    match format {
        "json" => json::generate(&report, output).await,
        "html" => html::generate(&report, output).await,
        "junit" => match output {
            Some(path) => junit::write_report(&report, path),
            None => {
                println!("{}", junit::generate_junit_xml(&report)?);
                Ok(())
            }
        },
        "console" => {
            console::print_report(&report, preview_len);
            Ok(())
        }
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}
