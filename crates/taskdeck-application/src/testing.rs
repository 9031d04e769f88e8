//! Shared test fixtures: a scripted request gateway and sample payloads.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use taskdeck_core::gateway::{ApiRequest, GatewayError, Method, RequestGateway};
use taskdeck_core::task::Task;
use taskdeck_core::user::Identity;
use tokio::sync::Semaphore;

type Scripted = Result<Value, GatewayError>;

/// A gateway that answers from per-route queues and records every request.
///
/// A gated gateway holds each request after recording it until the test
/// releases a permit, which lets tests observe state mid-flight.
pub(crate) struct MockGateway {
    responses: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
    gate: Option<Semaphore>,
}

impl MockGateway {
    pub(crate) fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    /// Queues a response for the next request to `method path`.
    pub(crate) fn respond(&self, method: Method, path: impl Into<String>, response: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry((method, path.into()))
            .or_default()
            .push_back(response);
    }

    /// Lets `count` held requests complete.
    pub(crate) fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Yields until at least `count` requests have reached the gateway.
    pub(crate) async fn wait_for_requests(&self, count: usize) {
        while self.request_count() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl RequestGateway for MockGateway {
    async fn send(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        let key = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.responses
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(GatewayError::Status {
                    code: 500,
                    detail: format!("no scripted response for {} {}", key.0.as_str(), key.1),
                })
            })
    }
}

pub(crate) fn identity(id: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: None,
        username: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub(crate) fn identity_json(id: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{id}@example.com"),
        "name": null,
        "username": null,
        "created_at": "2024-05-01T10:00:00.000001",
        "updated_at": null
    })
}

pub(crate) fn server_task_json(id: &str, title: &str, completed: bool) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "is_completed": completed,
        "user_id": "u1",
        "created_at": "2024-05-01T10:00:00",
        "updated_at": "2024-05-01T10:00:00"
    })
}

pub(crate) fn server_task(id: &str, title: &str, completed: bool) -> Task {
    serde_json::from_value(server_task_json(id, title, completed)).unwrap()
}
