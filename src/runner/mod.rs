pub mod client;
pub mod context;
pub mod events;
pub mod executor;
pub mod fixtures;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

use anyhow::Result;
use colored::Colorize;

use crate::parser::load_workflow;
use crate::report::types::{Report, ReportSummary};
use crate::report::{console, html, json, junit};
use crate::utils::config::Config;
use client::{ReqwestTransport, Transport};
use context::RunContext;
use executor::WorkflowExecutor;

pub use events::*;
pub use state::*;

/// Run-level pass/fail decision
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunVerdict {
    pub failures: Vec<String>,
}

impl RunVerdict {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Check the success-rate threshold and that every required identifier was captured
pub fn assess_run(
    summary: &ReportSummary,
    context: &RunContext,
    min_success_rate: u32,
    required_identifiers: &[String],
) -> RunVerdict {
    let mut failures = Vec::new();

    if summary.success_rate < min_success_rate {
        failures.push(format!(
            "success rate {}% is below the required {}%",
            summary.success_rate, min_success_rate
        ));
    }

    for name in required_identifiers {
        if !context.has_var(name) {
            failures.push(format!("identifier '{}' was never captured", name));
        }
    }

    RunVerdict { failures }
}

/// Run the configured workflow against the live API and write every report.
pub async fn run_workflow(config: &Config) -> Result<Report> {
    let transport = ReqwestTransport::new()?;
    execute_and_report(
        config,
        Box::new(transport),
        Box::new(ConsoleEventListener::new()),
    )
    .await
}

/// Run the workflow over `transport`, then write every configured report.
///
/// Reports are written even when the run aborted, and a report that fails
/// to write does not stop the others. The returned error reflects write
/// failures and the run-level verdict.
pub async fn execute_and_report(
    config: &Config,
    transport: Box<dyn Transport>,
    sink: Box<dyn EventSink>,
) -> Result<Report> {
    let workflow = load_workflow(config.workflow.as_deref())?;

    let executor = WorkflowExecutor::new(transport, sink, config);
    let outcome = executor.run(&workflow).await;
    let report = outcome.report;

    console::print_report(&report, config.preview_len);

    let mut write_errors = Vec::new();
    let mut keep_error = |written: Result<()>| {
        if let Err(e) = written {
            log::error!("{:#}", e);
            write_errors.push(format!("{:#}", e));
        }
    };
    keep_error(json::write_report(&report, &config.results_path));
    keep_error(html::write_report(&report, &config.report_path));
    if let Some(path) = &config.junit_path {
        keep_error(junit::write_report(&report, path));
    }

    let verdict = assess_run(
        &report.summary,
        &outcome.context,
        config.min_success_rate,
        &config.required_identifiers,
    );
    for failure in &verdict.failures {
        println!("  {} {}", "✗".red(), failure);
    }

    if !write_errors.is_empty() {
        anyhow::bail!("Failed to write reports: {}", write_errors.join("; "));
    }
    if !verdict.passed() {
        anyhow::bail!("Run failed: {}", verdict.failures.join("; "));
    }

    println!(
        "\n{} Run passed ({}% success)",
        "✅".green(),
        report.summary.success_rate
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::json::load_report;
    use crate::report::types::success_rate;
    use serde_json::json;
    use crate::runner::test_support::{healthy_api, reply};

    fn summary(passed: u32, total: u32) -> ReportSummary {
        ReportSummary {
            total,
            passed,
            failed: total - passed,
            errors: 0,
            success_rate: success_rate(passed, total),
        }
    }

    fn required() -> Vec<String> {
        vec!["accessToken".to_string(), "providerId".to_string()]
    }

    #[test]
    fn test_verdict_passes_at_threshold() {
        let mut ctx = RunContext::new();
        ctx.set_var("accessToken", "tok");
        ctx.set_var("providerId", "prv-1");

        // 8 / 10 = 80%
        let verdict = assess_run(&summary(8, 10), &ctx, 80, &required());
        assert!(verdict.passed());
    }

    #[test]
    fn test_verdict_collects_every_failure() {
        let mut ctx = RunContext::new();
        ctx.set_var("accessToken", "tok");

        let verdict = assess_run(&summary(1, 2), &ctx, 80, &required());
        assert!(!verdict.passed());
        assert_eq!(
            verdict.failures,
            vec![
                "success rate 50% is below the required 80%".to_string(),
                "identifier 'providerId' was never captured".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_run_fails_nonzero_threshold() {
        let verdict = assess_run(&ReportSummary::default(), &RunContext::new(), 1, &[]);
        assert!(!verdict.passed());
    }

    fn report_config(dir: &std::path::Path) -> Config {
        Config {
            base_url: "http://api.test".to_string(),
            report_path: dir.join("test-report.html"),
            results_path: dir.join("test-results.json"),
            junit_path: Some(dir.join("junit.xml")),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_aborted_run_still_writes_every_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = report_config(dir.path());
        let transport = healthy_api().replace(
            "POST",
            "/api/v1/providers",
            reply(409, json!({"message": "<b>Email already exists</b>"})),
        );

        let err = execute_and_report(&config, Box::new(transport), Box::new(EventLog::default()))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Run failed: success rate 50%"));
        assert!(err.to_string().contains("identifier 'providerId' was never captured"));

        let html = std::fs::read_to_string(&config.report_path).unwrap();
        assert_eq!(html.matches(r#"class="step-details""#).count(), 2);
        assert!(html.contains("Login"));
        assert!(html.contains("Add Provider"));
        assert!(html.contains("Run aborted at <strong>Add Provider</strong>"));
        assert!(html.contains("&lt;b&gt;Email already exists&lt;&#x2F;b&gt;"));

        let saved = load_report(&config.results_path).unwrap();
        assert_eq!(saved.summary.total, 2);
        assert_eq!(saved.summary.failed, 1);

        let xml = std::fs::read_to_string(config.junit_path.as_ref().unwrap()).unwrap();
        assert!(xml.contains(r#"<testcase name="Add Provider""#));
    }

    #[tokio::test]
    async fn test_unwritable_report_does_not_block_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            results_path: dir.path().join("missing-dir").join("test-results.json"),
            ..report_config(dir.path())
        };

        let err = execute_and_report(&config, Box::new(healthy_api()), Box::new(EventLog::default()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to write reports"));
        assert!(config.report_path.exists());
        assert!(config.junit_path.as_ref().unwrap().exists());
    }
}
