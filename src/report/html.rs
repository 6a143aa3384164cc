use super::types::{AbortInfo, Report, ReportSummary};
use crate::runner::state::{StepRecord, StepStatus};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tera::Tera;

const TEMPLATE: &str = include_str!("templates/report.html");
const NOT_AVAILABLE: &str = "N/A";

/// Generate HTML report
pub async fn generate(report: &Report, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        write_report(report, path)?;
    } else {
        println!("{}", render_html(report)?);
    }

    Ok(())
}

/// Write the HTML report to `path`, replacing any previous one
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let html = render_html(report)?;
    std::fs::write(path, html)
        .with_context(|| format!("Failed to write HTML report: {}", path.display()))?;

    println!(
        "{} HTML report saved to: {} (total {}, passed {}, failed {})",
        "📊".to_string().blue(),
        path.display().to_string().cyan(),
        report.summary.total,
        report.summary.passed,
        report.summary.failed
    );
    Ok(())
}

/// Render the report document. Every value goes through the template
/// engine's HTML escaping, so response text is never interpreted as markup.
pub fn render_html(report: &Report) -> Result<String> {
    let view = ReportView {
        suite_name: &report.suite_name,
        session_id: &report.session_id,
        base_url: &report.base_url,
        generated_at: report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        summary: &report.summary,
        aborted: report.aborted.as_ref(),
        steps: report
            .results
            .iter()
            .enumerate()
            .map(|(index, record)| StepView::new(index, record))
            .collect(),
    };

    let context = tera::Context::from_serialize(&view)?;
    let html = Tera::one_off(TEMPLATE, &context, true).context("Failed to render HTML report")?;
    Ok(html)
}

#[derive(Serialize)]
struct ReportView<'a> {
    suite_name: &'a str,
    session_id: &'a str,
    base_url: &'a str,
    generated_at: String,
    summary: &'a ReportSummary,
    aborted: Option<&'a AbortInfo>,
    steps: Vec<StepView>,
}

#[derive(Serialize)]
struct StepView {
    index: usize,
    name: String,
    status: &'static str,
    status_class: &'static str,
    status_code: u16,
    duration: String,
    timestamp: String,
    validation: String,
    request_method: String,
    request_url: String,
    request_headers: String,
    request_body: String,
    response_status: String,
    response_headers: String,
    response_body: String,
    response_parsed: bool,
}

impl StepView {
    fn new(index: usize, record: &StepRecord) -> Self {
        let result = &record.result;
        let status_class = match result.status {
            StepStatus::Pass => "pass",
            StepStatus::Fail => "fail",
            StepStatus::Error => "error",
        };

        let (request_method, request_url, request_headers, request_body) = match &record.request {
            Some(req) => (
                req.method.clone(),
                req.url.clone(),
                pretty_headers(&req.headers),
                req.body
                    .as_ref()
                    .map(pretty_json)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            None => (
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
            ),
        };

        let (response_status, response_headers) = match &record.response_meta {
            Some(res) => (res.status.to_string(), pretty_headers(&res.headers)),
            None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        };

        Self {
            index,
            name: result.name.clone(),
            status: result.status.as_str(),
            status_class,
            status_code: result.status_code,
            duration: result
                .duration_ms
                .map(|d| format!("{}ms", d))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            timestamp: result.timestamp.to_rfc3339(),
            validation: result.validation.clone(),
            request_method,
            request_url,
            request_headers,
            request_body,
            response_status,
            response_headers,
            response_body: result.response.pretty(),
            response_parsed: result.response.is_parsed(),
        }
    }
}

fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn pretty_headers(headers: &BTreeMap<String, String>) -> String {
    if headers.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    serde_json::to_string_pretty(headers).unwrap_or_else(|_| NOT_AVAILABLE.to_string())
}
