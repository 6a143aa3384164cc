//! Scripted HTTP transport shared by the runner tests

use super::client::{HttpRequest, HttpResponse, Transport};
use crate::error::StepError;
use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub type Reply = Result<HttpResponse, StepError>;

/// Transport that answers from a route table keyed by method and path.
/// Queued replies are consumed in order; the last one repeats.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    routes: Arc<Mutex<HashMap<(String, String), VecDeque<Reply>>>>,
    sent: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn route(self, method: &str, path: &str, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn replace(self, method: &str, path: &str, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), VecDeque::from([reply]));
        self
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, StepError> {
        self.sent.lock().unwrap().push(request.clone());

        let path = request
            .url
            .trim_start_matches("http://api.test")
            .split('?')
            .next()
            .unwrap_or_default()
            .to_string();
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(request.method.clone(), path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Err(StepError::Transport(format!("no route for {}", path))),
        }
    }
}

pub fn reply(status: u16, body: serde_json::Value) -> Reply {
    Ok(HttpResponse {
        status,
        headers: BTreeMap::new(),
        body: body.to_string(),
    })
}

pub fn healthy_api() -> ScriptedTransport {
    ScriptedTransport::default()
        .route(
            "POST",
            "/api/v1/auth/login",
            reply(200, json!({"data": {"accessToken": "tok-1"}})),
        )
        .route(
            "POST",
            "/api/v1/providers",
            reply(
                201,
                json!({"message": "Provider added successfully", "data": {"id": "prv-1"}}),
            ),
        )
        .route(
            "GET",
            "/api/v1/providers/prv-1",
            reply(200, json!({"data": {"id": "prv-1"}})),
        )
        .route(
            "PUT",
            "/api/v1/providers/prv-1/availability",
            reply(200, json!({"message": "Availability updated successfully"})),
        )
        .route(
            "GET",
            "/api/v1/providers/prv-1/availability",
            reply(
                200,
                json!({"data": {"slots": [{"startTime": "2026-10-20T09:00:00Z"}]}}),
            ),
        )
        .route(
            "POST",
            "/api/v1/patients",
            reply(
                201,
                json!({"message": "Patient created successfully", "data": {"id": "pat-1"}}),
            ),
        )
        .route(
            "GET",
            "/api/v1/patients/pat-1",
            reply(200, json!({"data": {"id": "pat-1"}})),
        )
        .route(
            "POST",
            "/api/v1/appointments",
            reply(
                201,
                json!({"message": "Appointment booked successfully", "data": {"id": "apt-1"}}),
            ),
        )
}
