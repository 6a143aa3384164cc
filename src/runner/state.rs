use super::events::{EventSink, TestEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const UNDISPLAYABLE_RESPONSE: &str = "<response could not be displayed>";

/// Step outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Pass,
    Fail,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pass => "PASS",
            StepStatus::Fail => "FAIL",
            StepStatus::Error => "ERROR",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, StepStatus::Pass)
    }
}

/// Captured response body, either parsed JSON or the raw text that failed to parse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ResponseBody {
    Parsed(serde_json::Value),
    Unparsed(String),
}

impl ResponseBody {
    /// Parse a raw body, keeping the raw text when it is not JSON
    pub fn parse(raw: &str) -> Self {
        match parse_json(raw) {
            Ok(value) => ResponseBody::Parsed(value),
            Err(_) => ResponseBody::Unparsed(raw.to_string()),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, ResponseBody::Parsed(_))
    }

    /// Single-line form used in console output
    pub fn display(&self) -> String {
        match self {
            ResponseBody::Parsed(value) => {
                serde_json::to_string(value).unwrap_or_else(|_| UNDISPLAYABLE_RESPONSE.to_string())
            }
            ResponseBody::Unparsed(raw) => raw.clone(),
        }
    }

    /// Multi-line form used in the HTML report
    pub fn pretty(&self) -> String {
        match self {
            ResponseBody::Parsed(value) => serde_json::to_string_pretty(value)
                .unwrap_or_else(|_| UNDISPLAYABLE_RESPONSE.to_string()),
            ResponseBody::Unparsed(raw) => raw.clone(),
        }
    }
}

/// Parse a response body as JSON. Blank bodies become `null`.
pub fn parse_json(raw: &str) -> Result<serde_json::Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(raw)
}

/// Outcome of one executed workflow step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    pub status_code: u16,
    pub response: ResponseBody,
    pub validation: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl StepResult {
    pub fn new(
        name: &str,
        status: StepStatus,
        status_code: u16,
        response: ResponseBody,
        validation: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            status,
            status_code,
            response,
            validation: validation.to_string(),
            timestamp: Utc::now(),
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Request as it was sent, with credentials masked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestCapture {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCapture {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
}

/// A step result plus whatever was captured of the HTTP exchange behind it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    #[serde(flatten)]
    pub result: StepResult,
    #[serde(default)]
    pub request: Option<RequestCapture>,
    #[serde(default)]
    pub response_meta: Option<ResponseCapture>,
}

/// Append-only log of step results for a single run.
///
/// Every recorded step is echoed to the event sink as it lands.
pub struct Recorder {
    records: Vec<StepRecord>,
    sink: Box<dyn EventSink>,
}

impl Recorder {
    pub fn new(sink: Box<dyn EventSink>) -> Self {
        Self {
            records: Vec::new(),
            sink,
        }
    }

    pub fn record(
        &mut self,
        name: &str,
        status: StepStatus,
        status_code: u16,
        response: ResponseBody,
        validation: &str,
    ) {
        let result = StepResult::new(name, status, status_code, response, validation);
        self.record_exchange(result, None, None);
    }

    pub fn record_exchange(
        &mut self,
        result: StepResult,
        request: Option<RequestCapture>,
        response_meta: Option<ResponseCapture>,
    ) {
        self.sink.emit(&TestEvent::StepRecorded {
            index: self.records.len(),
            result: result.clone(),
        });
        self.records.push(StepRecord {
            result,
            request,
            response_meta,
        });
    }

    pub fn emit(&mut self, event: TestEvent) {
        self.sink.emit(&event);
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }

    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }
}
