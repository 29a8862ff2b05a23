//! Mock recognition backend
//!
//! Canned JSON responses keyed by method and path under `/api`. Every
//! request is recorded (method, path, query, Authorization, body) so tests
//! can assert on exactly what went over the wire, including that nothing did.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

const PREFIX: &str = "/api";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path relative to the API base (`/users/`, `/auth/me`, ...)
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Default)]
struct MockBackendState {
    responses: HashMap<(String, String), (StatusCode, Value)>,
    requests: Vec<RecordedRequest>,
}

pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<RwLock<MockBackendState>>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Start a mock backend on a random port
    pub async fn start() -> Self {
        let state = Arc::new(RwLock::new(MockBackendState::default()));

        let app = Router::new()
            .fallback(handle_any)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// What the client should be configured with
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, PREFIX)
    }

    /// Answer `method path` with `status` and a JSON body
    pub async fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap();
        self.state
            .write()
            .await
            .responses
            .insert((method.to_uppercase(), path.to_string()), (status, body));
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.read().await.requests.clone()
    }

    pub async fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub async fn request_count(&self) -> usize {
        self.state.read().await.requests.len()
    }

    /// Stop the mock server
    pub async fn stop(self) {
        self.handle.abort();
    }
}

async fn handle_any(
    State(state): State<Arc<RwLock<MockBackendState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(PREFIX)
        .unwrap_or(uri.path())
        .to_string();
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let mut state = state.write().await;
    state.requests.push(RecordedRequest {
        method: method.as_str().to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: header_text(header::AUTHORIZATION),
        content_type: header_text(header::CONTENT_TYPE),
        body: body.to_vec(),
    });

    match state.responses.get(&(method.as_str().to_string(), path)) {
        Some((status, Value::Null)) => (*status, "").into_response(),
        Some((status, body)) => (*status, Json(body.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Not found" })),
        )
            .into_response(),
    }
}
