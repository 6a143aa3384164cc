use super::types::Report;
use crate::runner::state::{StepRecord, StepStatus};
use anyhow::{Context, Result};
use colored::Colorize;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

/// Generate JUnit XML report string from a run
pub fn generate_junit_xml(report: &Report) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let summary = &report.summary;
    let total_duration: u64 = report.step_results().filter_map(|r| r.duration_ms).sum();
    let time = seconds(total_duration);

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", report.suite_name.as_str()));
    suites_start.push_attribute(("tests", summary.total.to_string().as_str()));
    suites_start.push_attribute(("failures", summary.failed.to_string().as_str()));
    suites_start.push_attribute(("errors", summary.errors.to_string().as_str()));
    suites_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(suites_start))?;

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", report.suite_name.as_str()));
    suite_start.push_attribute(("tests", summary.total.to_string().as_str()));
    suite_start.push_attribute(("failures", summary.failed.to_string().as_str()));
    suite_start.push_attribute(("errors", summary.errors.to_string().as_str()));
    suite_start.push_attribute(("skipped", "0"));
    suite_start.push_attribute(("id", report.session_id.as_str()));
    suite_start.push_attribute(("hostname", report.base_url.as_str()));
    suite_start.push_attribute(("time", time.as_str()));
    suite_start.push_attribute((
        "timestamp",
        report.generated_at.format("%Y-%m-%dT%H:%M:%S").to_string().as_str(),
    ));
    writer.write_event(Event::Start(suite_start))?;

    let classname = classname(&report.suite_name);
    for record in &report.results {
        write_test_case(&mut writer, &classname, record)?;
    }

    if let Some(aborted) = &report.aborted {
        let note = format!("Run aborted at '{}': {}", aborted.step, aborted.reason);
        writer.write_event(Event::Start(BytesStart::new("system-out")))?;
        writer.write_event(Event::Text(BytesText::new(&note)))?;
        writer.write_event(Event::End(BytesEnd::new("system-out")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    classname: &str,
    record: &StepRecord,
) -> Result<()> {
    let result = &record.result;

    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", result.name.as_str()));
    case_start.push_attribute(("classname", classname));
    case_start.push_attribute(("time", seconds(result.duration_ms.unwrap_or(0)).as_str()));
    writer.write_event(Event::Start(case_start))?;

    let (element, kind) = match result.status {
        StepStatus::Pass => {
            writer.write_event(Event::End(BytesEnd::new("testcase")))?;
            return Ok(());
        }
        StepStatus::Fail => ("failure", "AssertionError"),
        StepStatus::Error => ("error", "StepError"),
    };

    let mut start = BytesStart::new(element);
    start.push_attribute(("message", result.validation.as_str()));
    start.push_attribute(("type", kind));
    writer.write_event(Event::Start(start))?;
    let detail = format!("HTTP {}\n{}", result.status_code, result.response.pretty());
    writer.write_event(Event::Text(BytesText::new(&detail)))?;
    writer.write_event(Event::End(BytesEnd::new(element)))?;

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

fn classname(suite_name: &str) -> String {
    suite_name
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

fn seconds(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

/// Write report to file
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let xml = generate_junit_xml(report)?;
    std::fs::write(path, xml)
        .with_context(|| format!("Failed to write JUnit report: {}", path.display()))?;
    println!(
        "{} JUnit report saved to: {}",
        "🧾".to_string().blue(),
        path.display().to_string().cyan()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{ResponseBody, StepResult};
    use serde_json::json;

    fn record(name: &str, status: StepStatus, code: u16, validation: &str) -> StepRecord {
        StepRecord {
            result: StepResult::new(
                name,
                status,
                code,
                ResponseBody::Parsed(json!({"message": "nope"})),
                validation,
            )
            .with_duration(1500),
            request: None,
            response_meta: None,
        }
    }

    #[test]
    fn test_generate_junit_xml() {
        let report = Report::new(
            "test-session",
            "Provider Scheduling Workflow",
            "http://api.test",
            vec![
                record("Login", StepStatus::Pass, 200, "ok"),
                record(
                    "Add Provider",
                    StepStatus::Fail,
                    400,
                    "Expected status 200 or 201, got 400 (nope)",
                ),
                record("Get Provider", StepStatus::Error, 0, "Request failed: <timeout>"),
            ],
            None,
        );

        let xml = generate_junit_xml(&report).expect("Failed to generate XML");

        assert!(xml.contains(r#"<testsuites name="Provider Scheduling Workflow""#));
        assert!(xml.contains(r#"tests="3""#));
        assert!(xml.contains(r#"failures="1""#));
        assert!(xml.contains(r#"errors="1""#));
        assert!(xml.contains(
            r#"<testcase name="Login" classname="provider_scheduling_workflow" time="1.500"></testcase>"#
        ));
        assert!(xml.contains(
            r#"<failure message="Expected status 200 or 201, got 400 (nope)" type="AssertionError">"#
        ));
        assert!(xml.contains(r#"<error message="Request failed: &lt;timeout&gt;" type="StepError">"#));
        assert!(!xml.contains("system-out"));
    }

    #[test]
    fn test_aborted_run_is_noted() {
        let mut report = Report::new(
            "s",
            "Suite",
            "http://api.test",
            vec![record("Login", StepStatus::Fail, 401, "Expected status 200, got 401")],
            None,
        );
        report.aborted = Some(crate::report::types::AbortInfo {
            step: "Login".to_string(),
            reason: "Expected status 200, got 401".to_string(),
        });

        let xml = generate_junit_xml(&report).unwrap();
        assert!(xml.contains("<system-out>Run aborted at "));
        assert!(xml.contains("Expected status 200, got 401</system-out>"));
    }
}
