use crate::runner::state::{StepRecord, StepResult, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pass/fail tallies over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub errors: u32,
    pub success_rate: u32,
}

/// Tally an ordered sequence of step results
pub fn aggregate<'a, I>(results: I) -> ReportSummary
where
    I: IntoIterator<Item = &'a StepResult>,
{
    let (passed, failed, errors) =
        results
            .into_iter()
            .fold((0, 0, 0), |(p, f, e), result| match result.status {
                StepStatus::Pass => (p + 1, f, e),
                StepStatus::Fail => (p, f + 1, e),
                StepStatus::Error => (p, f, e + 1),
            });
    let total = passed + failed + errors;

    ReportSummary {
        total,
        passed,
        failed,
        errors,
        success_rate: success_rate(passed, total),
    }
}

/// Percentage of passed steps, rounded half up. Zero for an empty run.
pub fn success_rate(passed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (passed, total) = (u64::from(passed), u64::from(total));
    ((passed * 200 + total) / (2 * total)) as u32
}

/// Where and why a run stopped early
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortInfo {
    pub step: String,
    pub reason: String,
}

/// Results of one workflow run, as rendered and persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub session_id: String,
    pub suite_name: String,
    pub base_url: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub results: Vec<StepRecord>,
    #[serde(default)]
    pub aborted: Option<AbortInfo>,
}

impl Report {
    pub fn new(
        session_id: &str,
        suite_name: &str,
        base_url: &str,
        results: Vec<StepRecord>,
        aborted: Option<AbortInfo>,
    ) -> Self {
        let summary = aggregate(results.iter().map(|r| &r.result));
        Self {
            session_id: session_id.to_string(),
            suite_name: suite_name.to_string(),
            base_url: base_url.to_string(),
            generated_at: Utc::now(),
            summary,
            results,
            aborted,
        }
    }

    pub fn step_results(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter().map(|r| &r.result)
    }
}
