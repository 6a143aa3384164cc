use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Context variable that holds the bearer token for authenticated steps
pub const ACCESS_TOKEN_VAR: &str = "accessToken";

/// A workflow file: shared request settings plus the ordered steps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub name: String,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// JSON pointer to the human-readable message in response bodies
    #[serde(default = "default_message_path")]
    pub message_path: String,

    pub steps: Vec<StepDefinition>,
}

fn default_message_path() -> String {
    "/message".to_string()
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_true() -> bool {
    true
}

/// One HTTP interaction and what its response must look like
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub name: String,

    #[serde(default = "default_method")]
    pub method: String,

    /// Path relative to the base URL, or an absolute URL
    pub path: String,

    /// Send `Authorization: Bearer ${accessToken}`
    #[serde(default = "default_true")]
    pub auth: bool,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub body: Option<serde_json::Value>,

    #[serde(default)]
    pub expect: Expectation,

    /// Context variable -> JSON pointer (or dotted path) into the response body
    #[serde(default)]
    pub capture: BTreeMap<String, String>,

    /// Identifiers that must have been captured before this step can run
    #[serde(default)]
    pub requires: Vec<String>,

    /// Record failures but keep the run going
    #[serde(default)]
    pub soft_fail: bool,
}

impl StepDefinition {
    pub fn required_identifiers(&self) -> Vec<&str> {
        let mut required = Vec::new();
        if self.auth {
            required.push(ACCESS_TOKEN_VAR);
        }
        for name in &self.requires {
            if !required.contains(&name.as_str()) {
                required.push(name.as_str());
            }
        }
        required
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    #[serde(default)]
    pub status: StatusExpectation,

    /// Exact message expected at the workflow's message path
    #[serde(default)]
    pub message: Option<String>,
}

/// Accepted HTTP status codes, written as `200` or `[200, 201]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusExpectation {
    One(u16),
    Many(Vec<u16>),
}

impl Default for StatusExpectation {
    fn default() -> Self {
        StatusExpectation::One(200)
    }
}

impl StatusExpectation {
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            StatusExpectation::One(code) => *code == status,
            StatusExpectation::Many(codes) => codes.contains(&status),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StatusExpectation::One(code) => code.to_string(),
            StatusExpectation::Many(codes) => codes
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}
