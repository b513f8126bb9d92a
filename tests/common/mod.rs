//! Shared utilities for integration testing: a recording mock service that
//! stands in for the cloud backends and for callback targets.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use tokio::net::TcpListener;

/// One captured request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: HashMap<String, String>,
    pub body: serde_json::Value,
    pub raw_body: String,
}

impl RecordedRequest {
    /// The routing key this request was matched under.
    pub fn key(&self) -> String {
        match self.headers.get("x-amz-target") {
            Some(target) => target.clone(),
            None => format!("{} {}", self.method, self.path),
        }
    }
}

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    once: Mutex<HashMap<String, VecDeque<(u16, serde_json::Value)>>>,
    sticky: Mutex<HashMap<String, (u16, serde_json::Value)>>,
}

/// A programmable mock server. Requests are keyed by their
/// `X-Amz-Target` header when present, otherwise by `"METHOD path"`.
#[derive(Clone)]
pub struct MockCloud {
    endpoint: String,
    state: Arc<MockState>,
}

/// Start the mock on an ephemeral port.
pub async fn start_mock_cloud() -> MockCloud {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .fallback(handle)
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockCloud {
        endpoint: format!("http://{addr}"),
        state,
    }
}

#[allow(dead_code)]
impl MockCloud {
    pub fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    /// Respond to every request matching `key` with this status and body.
    pub fn stub(&self, key: &str, status: u16, body: serde_json::Value) {
        self.state
            .sticky
            .lock()
            .unwrap()
            .insert(key.to_string(), (status, body));
    }

    /// Respond once, taking precedence over a sticky stub.
    pub fn stub_once(&self, key: &str, status: u16, body: serde_json::Value) {
        self.state
            .once
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back((status, body));
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Captured requests matching a routing key.
    pub fn calls(&self, key: &str) -> Vec<RecordedRequest> {
        self.recorded()
            .into_iter()
            .filter(|r| r.key() == key)
            .collect()
    }
}

async fn handle(State(state): State<Arc<MockState>>, request: Request) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let raw_body = String::from_utf8_lossy(&bytes).to_string();

    let mut headers = HashMap::new();
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_string(), value.to_string());
        }
    }

    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().unwrap_or("").to_string(),
        headers,
        body: serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null),
        raw_body,
    };
    let key = recorded.key();
    state.requests.lock().unwrap().push(recorded);

    if let Some(queue) = state.once.lock().unwrap().get_mut(&key) {
        if let Some((status, body)) = queue.pop_front() {
            return respond(status, body);
        }
    }
    if let Some((status, body)) = state.sticky.lock().unwrap().get(&key) {
        return respond(*status, body.clone());
    }
    respond(200, serde_json::json!({}))
}

fn respond(status: u16, body: serde_json::Value) -> (StatusCode, axum::Json<serde_json::Value>) {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        axum::Json(body),
    )
}
