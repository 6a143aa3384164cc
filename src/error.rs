use thiserror::Error;

/// Failures that can happen while executing a single workflow step
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body was not valid JSON
    #[error("Response is not valid JSON: {0}")]
    Parse(String),

    /// A value this step depends on was never captured
    #[error("Missing required identifier '{0}'")]
    MissingIdentifier(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for StepError {
    fn from(err: reqwest::Error) -> Self {
        StepError::Transport(err.to_string())
    }
}
