use super::types::Report;
use crate::runner::state::StepStatus;
use colored::Colorize;
use std::io::{self, Write};

/// Appended to response previews that were cut short
pub const TRUNCATION_MARKER: &str = "...";

const RULE_WIDTH: usize = 60;

/// Print the console report to stdout
pub fn print_report(report: &Report, preview_len: usize) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = render(report, preview_len, &mut out) {
        log::warn!("Failed to write console report: {}", e);
    }
}

/// Banner, summary block, then one entry per step. Non-passing steps get a
/// preview of their response body.
pub fn render<W: Write>(report: &Report, preview_len: usize, out: &mut W) -> io::Result<()> {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let summary = &report.summary;

    writeln!(out)?;
    writeln!(out, "{}", heavy)?;
    writeln!(out, "  {}", format!("{} - Test Report", report.suite_name).bold())?;
    writeln!(out, "{}", heavy)?;
    writeln!(out, "  Target:       {}", report.base_url)?;
    writeln!(out, "  Session:      {}", report.session_id)?;
    writeln!(out, "  Total:        {}", summary.total)?;
    writeln!(out, "  Passed:       {}", summary.passed.to_string().green())?;
    writeln!(out, "  Failed:       {}", summary.failed.to_string().red())?;
    writeln!(out, "  Errors:       {}", summary.errors.to_string().yellow())?;
    writeln!(out, "  Success rate: {}%", summary.success_rate)?;
    if let Some(aborted) = &report.aborted {
        writeln!(
            out,
            "  Aborted at:   {} ({})",
            aborted.step.red(),
            aborted.reason
        )?;
    }
    writeln!(out, "{}", light)?;

    for (index, record) in report.results.iter().enumerate() {
        let result = &record.result;
        let glyph = match result.status {
            StepStatus::Pass => "✓".green(),
            StepStatus::Fail => "✗".red(),
            StepStatus::Error => "⚠".yellow(),
        };
        let duration = result
            .duration_ms
            .map(|d| format!(" {}ms", d))
            .unwrap_or_default();
        writeln!(
            out,
            "  {} [{}] {} - {} ({}){}",
            glyph,
            index + 1,
            result.name,
            result.status.as_str(),
            result.status_code,
            duration.dimmed()
        )?;
        writeln!(out, "      {}", result.validation)?;
        if !result.status.is_pass() {
            writeln!(
                out,
                "      Response: {}",
                truncate_preview(&result.response.display(), preview_len)
            )?;
        }
    }

    writeln!(out, "{}", heavy)?;
    Ok(())
}

/// Keep the first `max_chars` characters, marking anything cut off
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
