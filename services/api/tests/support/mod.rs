//! Fake admin backend for integration tests
//!
//! Every request is recorded; responses come from a fixed table of canned
//! routes. Unknown routes answer 404.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use api::models::User;
use api::session::SessionContext;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use common::config::ClientConfig;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A canned response
#[derive(Debug, Clone)]
pub struct Canned {
    pub method: Method,
    pub path: String,
    pub status: u16,
    /// `Null` answers with an empty body, a string is sent as raw text
    pub body: Value,
}

impl Canned {
    pub fn new(method: Method, path: &str, status: u16, body: Value) -> Self {
        Self {
            method,
            path: path.to_string(),
            status,
            body,
        }
    }
}

/// A request as the backend saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path without the `/api` prefix
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

struct Shared {
    routes: Vec<Canned>,
    requests: Mutex<Vec<Recorded>>,
}

/// Fake backend bound to a random local port; shuts down on drop
pub struct FakeBackend {
    pub addr: SocketAddr,
    shared: Arc<Shared>,
    _shutdown_tx: Option<oneshot::Sender<()>>,
}

impl FakeBackend {
    pub async fn spawn(routes: Vec<Canned>) -> Self {
        let shared = Arc::new(Shared {
            routes,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(handle).with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().expect("Failed to read local address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        Self {
            addr,
            shared,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Client configuration pointing at this backend
    pub fn config(&self) -> ClientConfig {
        config_for(&format!("http://{}/api", self.addr))
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.requests.lock().clone()
    }

    /// The single request received so far
    pub fn only_request(&self) -> Recorded {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request: {:?}", requests);
        requests[0].clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            tx.send(()).ok();
        }
    }
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api")
        .unwrap_or(uri.path())
        .to_string();
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    shared.requests.lock().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: header_text(header::AUTHORIZATION),
        content_type: header_text(header::CONTENT_TYPE),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let Some(canned) = shared
        .routes
        .iter()
        .find(|route| route.method == method && route.path == path)
    else {
        let body = json!({"message": "Not found"}).to_string();
        return (StatusCode::NOT_FOUND, body).into_response();
    };

    let status = StatusCode::from_u16(canned.status).expect("invalid canned status");
    let body = match &canned.body {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Configuration for an arbitrary base URL with a short timeout
pub fn config_for(api_url: &str) -> ClientConfig {
    ClientConfig {
        api_url: api_url.to_string(),
        timeout_ms: 5_000,
        ..ClientConfig::default()
    }
}

/// Address nothing listens on
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().expect("Failed to read local address");
    drop(listener);
    format!("http://{}/api", addr)
}

pub fn admin_user() -> User {
    User::from_value(&json!({
        "id": 1,
        "name": "Admin",
        "email": "admin@example.com",
        "role": 1
    }))
    .expect("valid user fixture")
}

/// Session holding a token, displaying an admin page
pub fn signed_in_session(token: &str) -> SessionContext {
    let session = SessionContext::in_memory();
    session.set_session(token.to_string(), admin_user());
    session
        .save_to_storage(true)
        .expect("Failed to persist session");
    session.set_location("/admin/users");
    session
}
