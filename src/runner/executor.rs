use std::collections::BTreeMap;
use std::time::Instant;
use uuid::Uuid;

use super::client::{HttpRequest, HttpResponse, Transport};
use super::context::{json_to_string, RunContext};
use super::events::{EventSink, TestEvent};
use super::fixtures;
use super::state::{parse_json, Recorder, ResponseBody, StepResult, StepStatus};
use crate::error::StepError;
use crate::parser::types::{StepDefinition, Workflow, ACCESS_TOKEN_VAR};
use crate::report::types::{aggregate, AbortInfo, Report};
use crate::utils::config::Config;

/// Result of checking one response against a step's expectations
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub status: StepStatus,
    pub status_code: u16,
    pub body: ResponseBody,
    pub validation: String,
    /// Values to store in the run context, only filled on success
    pub captures: Vec<(String, String)>,
}

/// Everything a finished run leaves behind
pub struct RunOutcome {
    pub report: Report,
    pub context: RunContext,
}

/// Runs one workflow against one API. Created per run and consumed by `run`.
pub struct WorkflowExecutor {
    transport: Box<dyn Transport>,
    context: RunContext,
    recorder: Recorder,
    config: Config,
    session_id: String,
}

impl WorkflowExecutor {
    pub fn new(transport: Box<dyn Transport>, sink: Box<dyn EventSink>, config: &Config) -> Self {
        let mut context = RunContext::new();
        fixtures::seed_vars(&mut context, config);

        Self {
            transport,
            context,
            recorder: Recorder::new(sink),
            config: config.clone(),
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Execute the steps in order. A failing hard step stops the run; the
    /// report covers whatever was recorded up to that point.
    pub async fn run(mut self, workflow: &Workflow) -> RunOutcome {
        self.recorder.emit(TestEvent::SessionStarted {
            session_id: self.session_id.clone(),
            suite_name: workflow.name.clone(),
            base_url: self.config.base_url.clone(),
            step_count: workflow.steps.len(),
        });

        let mut aborted = None;
        for (index, step) in workflow.steps.iter().enumerate() {
            let status = self.execute_step(index, workflow, step).await;
            if status.is_pass() {
                continue;
            }

            let reason = self
                .recorder
                .last()
                .map(|r| r.result.validation.clone())
                .unwrap_or_default();

            if self.is_soft_fail(step) {
                log::info!("soft failure in '{}', continuing: {}", step.name, reason);
                continue;
            }

            log::warn!("'{}' failed, skipping remaining steps: {}", step.name, reason);
            self.recorder.emit(TestEvent::RunAborted {
                step: step.name.clone(),
                reason: reason.clone(),
            });
            for skipped in &workflow.steps[index + 1..] {
                self.recorder.emit(TestEvent::StepSkipped {
                    name: skipped.name.clone(),
                    reason: format!("skipped after '{}' failed", step.name),
                });
            }
            aborted = Some(AbortInfo {
                step: step.name.clone(),
                reason,
            });
            break;
        }

        let WorkflowExecutor {
            context,
            mut recorder,
            config,
            session_id,
            ..
        } = self;

        let summary = aggregate(recorder.records().iter().map(|r| &r.result));
        recorder.emit(TestEvent::SessionFinished { summary });

        let report = Report::new(
            &session_id,
            &workflow.name,
            &config.base_url,
            recorder.into_records(),
            aborted,
        );

        RunOutcome { report, context }
    }

    fn is_soft_fail(&self, step: &StepDefinition) -> bool {
        step.soft_fail || self.config.is_soft_fail(&step.name)
    }

    async fn execute_step(
        &mut self,
        index: usize,
        workflow: &Workflow,
        step: &StepDefinition,
    ) -> StepStatus {
        if let Some(missing) = step
            .required_identifiers()
            .into_iter()
            .find(|name| !self.context.has_var(name))
        {
            let err = StepError::MissingIdentifier(missing.to_string());
            return self.record_error(step, &err);
        }

        let request = match self.build_request(workflow, step) {
            Ok(request) => request,
            Err(err) => return self.record_error(step, &err),
        };

        self.recorder.emit(TestEvent::StepStarted {
            index,
            name: step.name.clone(),
            method: request.method.clone(),
            url: request.url.clone(),
        });

        let started = Instant::now();
        let sent = self.transport.send(&request).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match sent {
            Err(err) => {
                let message = err.to_string();
                let result = StepResult::new(
                    &step.name,
                    StepStatus::Error,
                    0,
                    ResponseBody::Unparsed(message.clone()),
                    &message,
                )
                .with_duration(duration_ms);
                self.recorder
                    .record_exchange(result, Some(request.capture()), None);
                StepStatus::Error
            }
            Ok(response) => {
                let evaluation = evaluate_response(step, &workflow.message_path, &response);
                for (name, value) in &evaluation.captures {
                    log::info!("captured {} from '{}'", name, step.name);
                    self.context.set_var(name, value);
                }

                let result = StepResult::new(
                    &step.name,
                    evaluation.status,
                    evaluation.status_code,
                    evaluation.body,
                    &evaluation.validation,
                )
                .with_duration(duration_ms);
                self.recorder.record_exchange(
                    result,
                    Some(request.capture()),
                    Some(response.capture()),
                );
                evaluation.status
            }
        }
    }

    fn record_error(&mut self, step: &StepDefinition, err: &StepError) -> StepStatus {
        let message = err.to_string();
        self.recorder.record(
            &step.name,
            StepStatus::Error,
            0,
            ResponseBody::Unparsed(message.clone()),
            &message,
        );
        StepStatus::Error
    }

    fn build_request(
        &self,
        workflow: &Workflow,
        step: &StepDefinition,
    ) -> Result<HttpRequest, StepError> {
        let mut unresolved = self.context.unresolved(&step.path);
        for value in workflow.headers.values().chain(step.headers.values()) {
            unresolved.extend(self.context.unresolved(value));
        }
        if let Some(body) = &step.body {
            unresolved.extend(self.context.unresolved_in_value(body));
        }
        if !unresolved.is_empty() {
            unresolved.dedup();
            return Err(StepError::InvalidRequest(format!(
                "unresolved placeholders: {}",
                unresolved.join(", ")
            )));
        }

        let path = self.context.substitute_vars(&step.path);
        let url = join_url(&self.config.base_url, &path);

        let mut headers = BTreeMap::new();
        for (k, v) in workflow.headers.iter().chain(step.headers.iter()) {
            headers.insert(k.clone(), self.context.substitute_vars(v));
        }
        if step.auth {
            let token = self.context.get_var(ACCESS_TOKEN_VAR).unwrap_or_default();
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }

        Ok(HttpRequest {
            method: step.method.to_uppercase(),
            url,
            headers,
            body: step.body.as_ref().map(|b| self.context.substitute_value(b)),
        })
    }
}

/// Check a response against a step's expectations.
///
/// Unparseable bodies are errors with status code 0; status, message and
/// capture mismatches are failures.
pub fn evaluate_response(
    step: &StepDefinition,
    message_path: &str,
    response: &HttpResponse,
) -> Evaluation {
    let json = match parse_json(&response.body) {
        Ok(value) => value,
        Err(err) => {
            let validation = format!(
                "{} (HTTP {})",
                StepError::Parse(err.to_string()),
                response.status
            );
            return failed(
                StepStatus::Error,
                0,
                ResponseBody::Unparsed(response.body.clone()),
                validation,
            );
        }
    };

    let message = json
        .pointer(message_path)
        .and_then(|m| m.as_str())
        .map(|m| m.to_string());

    if !step.expect.status.accepts(response.status) {
        let mut validation = format!(
            "Expected status {}, got {}",
            step.expect.status.describe(),
            response.status
        );
        if let Some(m) = &message {
            validation.push_str(&format!(" ({})", m));
        }
        return failed(
            StepStatus::Fail,
            response.status,
            ResponseBody::Parsed(json),
            validation,
        );
    }

    if let Some(expected) = &step.expect.message {
        if message.as_deref() != Some(expected.as_str()) {
            let validation = format!(
                "Expected message '{}', got {}",
                expected,
                message
                    .map(|m| format!("'{}'", m))
                    .unwrap_or_else(|| "no message".to_string())
            );
            return failed(
                StepStatus::Fail,
                response.status,
                ResponseBody::Parsed(json),
                validation,
            );
        }
    }

    let mut captures = Vec::new();
    for (name, path) in &step.capture {
        match lookup(&json, path) {
            Some(value) if !value.is_null() => captures.push((name.clone(), json_to_string(value))),
            _ => {
                let validation = format!("Response is missing '{}' at {}", name, path);
                return failed(
                    StepStatus::Fail,
                    response.status,
                    ResponseBody::Parsed(json),
                    validation,
                );
            }
        }
    }

    let mut validation = format!(
        "Status {} matched expected {}",
        response.status,
        step.expect.status.describe()
    );
    if !captures.is_empty() {
        let names: Vec<_> = captures.iter().map(|(n, _)| n.as_str()).collect();
        validation.push_str(&format!("; captured {}", names.join(", ")));
    }

    Evaluation {
        status: StepStatus::Pass,
        status_code: response.status,
        body: ResponseBody::Parsed(json),
        validation,
        captures,
    }
}

fn failed(status: StepStatus, status_code: u16, body: ResponseBody, validation: String) -> Evaluation {
    Evaluation {
        status,
        status_code,
        body,
        validation,
        captures: Vec::new(),
    }
}

/// Resolve a JSON pointer (`/data/id`) or dotted path (`data.id`)
fn lookup<'a>(json: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    if path == "$" || path == "." {
        return Some(json);
    }
    let pointer = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path.replace('.', "/"))
    };
    json.pointer(&pointer)
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
