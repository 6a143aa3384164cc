use super::state::{StepResult, StepStatus};
use crate::report::types::ReportSummary;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Workflow execution events for real-time updates
#[derive(Debug, Clone)]
pub enum TestEvent {
    SessionStarted {
        session_id: String,
        suite_name: String,
        base_url: String,
        step_count: usize,
    },
    SessionFinished {
        summary: ReportSummary,
    },

    StepStarted {
        index: usize,
        name: String,
        method: String,
        url: String,
    },
    StepRecorded {
        index: usize,
        result: StepResult,
    },
    StepSkipped {
        name: String,
        reason: String,
    },
    RunAborted {
        step: String,
        reason: String,
    },
}

/// Receiver of execution events
pub trait EventSink: Send {
    fn emit(&mut self, event: &TestEvent);
}

/// Sink that keeps every event in memory
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<TestEvent>>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<TestEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &TestEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// One console line for a recorded step
pub fn format_step_line(index: usize, result: &StepResult) -> String {
    let label = format!("[{}] {} ({})", index + 1, result.name, result.status_code);
    match result.status {
        StepStatus::Pass => format!("  {} {}", "✓".green(), label),
        StepStatus::Fail => format!(
            "  {} {} - {}",
            "✗".red(),
            label.red(),
            result.validation
        ),
        StepStatus::Error => format!(
            "  {} {} - {}",
            "⚠".yellow(),
            label.yellow(),
            result.validation
        ),
    }
}

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener {
    spinner: Option<ProgressBar>,
    interactive: bool,
}

impl ConsoleEventListener {
    pub fn new() -> Self {
        Self {
            spinner: None,
            interactive: std::io::stdout().is_terminal(),
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn start_spinner(&mut self, message: String) {
        self.clear_spinner();
        // No spinner when piped, to keep escape codes out of logs
        if !self.interactive {
            return;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("    {spinner} {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }
}

impl Default for ConsoleEventListener {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ConsoleEventListener {
    fn emit(&mut self, event: &TestEvent) {
        match event {
            TestEvent::SessionStarted {
                session_id,
                suite_name,
                base_url,
                step_count,
            } => {
                println!(
                    "\n{} {} ({} steps)",
                    "▶".green().bold(),
                    suite_name.white().bold(),
                    step_count
                );
                println!("  Target: {}", base_url.cyan());
                println!("  Session: {}\n", session_id.dimmed());
            }

            TestEvent::StepStarted {
                index,
                name,
                method,
                url,
            } => {
                log::debug!("step {} '{}': {} {}", index + 1, name, method, url);
                self.start_spinner(format!("[{}] {}... ", index + 1, name.dimmed()));
            }

            TestEvent::StepRecorded { index, result } => {
                self.clear_spinner();
                println!("{}", format_step_line(*index, result));
            }

            TestEvent::StepSkipped { name, reason } => {
                self.clear_spinner();
                println!("  {} {} ({})", "○".yellow(), name, reason.dimmed());
            }

            TestEvent::RunAborted { step, reason } => {
                self.clear_spinner();
                println!(
                    "\n  {} Aborting run: '{}' failed: {}",
                    "■".red().bold(),
                    step,
                    reason
                );
            }

            TestEvent::SessionFinished { summary } => {
                self.clear_spinner();
                println!(
                    "\n{} Workflow finished: {} passed, {} failed, {} errors",
                    "■".blue().bold(),
                    summary.passed.to_string().green(),
                    summary.failed.to_string().red(),
                    summary.errors.to_string().yellow()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::ResponseBody;

    fn plain(text: &str) -> String {
        regex::Regex::new(r"\x1b\[[0-9;]*m")
            .unwrap()
            .replace_all(text, "")
            .to_string()
    }

    #[test]
    fn test_step_line_shows_status_code_and_validation() {
        let pass = StepResult::new(
            "Login",
            StepStatus::Pass,
            200,
            ResponseBody::Parsed(serde_json::Value::Null),
            "Status 200 matched",
        );
        assert_eq!(plain(&format_step_line(0, &pass)), "  ✓ [1] Login (200)");

        let fail = StepResult::new(
            "Get Provider",
            StepStatus::Fail,
            404,
            ResponseBody::Parsed(serde_json::Value::Null),
            "Expected status 200, got 404",
        );
        assert_eq!(
            plain(&format_step_line(2, &fail)),
            "  ✗ [3] Get Provider (404) - Expected status 200, got 404"
        );

        let error = StepResult::new(
            "Get Patient",
            StepStatus::Error,
            0,
            ResponseBody::Unparsed("refused".to_string()),
            "Request failed: refused",
        );
        assert!(plain(&format_step_line(6, &error)).contains("[7] Get Patient (0) - Request failed"));
    }
}
