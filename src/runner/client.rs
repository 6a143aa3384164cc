use super::state::{RequestCapture, ResponseCapture};
use crate::error::StepError;
use async_trait::async_trait;
use std::collections::BTreeMap;

const MASK: &str = "********";

/// Outgoing request, fully resolved
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Copy for the report, with credentials masked
    pub fn capture(&self) -> RequestCapture {
        RequestCapture {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), mask_header(k, v)))
                .collect(),
            body: self.body.as_ref().map(mask_body),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn capture(&self) -> ResponseCapture {
        ResponseCapture {
            status: self.status,
            headers: self.headers.clone(),
        }
    }
}

/// Sends requests to the API under test
#[async_trait]
pub trait Transport: Send + Sync {
    /// Any HTTP status is a response; only failures to get one are errors
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, StepError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, StepError> {
        let method = request
            .method
            .parse::<reqwest::Method>()
            .map_err(|_| StepError::InvalidRequest(format!("invalid method {}", request.method)))?;

        let mut req = self.client.request(method, &request.url);
        for (k, v) in &request.headers {
            req = req.header(k, v);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        log::debug!("{} {}", request.method, request.url);
        let res = req.send().await?;
        let status = res.status().as_u16();
        let headers = res
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).to_string(),
                )
            })
            .collect();
        let body = res.text().await?;
        log::debug!("{} {} -> {} ({} bytes)", request.method, request.url, status, body.len());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn mask_header(name: &str, value: &str) -> String {
    if !name.eq_ignore_ascii_case("authorization") {
        return value.to_string();
    }
    match value.split_once(' ') {
        Some((scheme, _)) => format!("{} {}", scheme, MASK),
        None => MASK.to_string(),
    }
}

fn mask_body(body: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match body {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let key = k.to_lowercase();
                    if key.contains("password") || key.contains("secret") {
                        (k.clone(), Value::String(MASK.to_string()))
                    } else {
                        (k.clone(), mask_body(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_body).collect()),
        other => other.clone(),
    }
}
