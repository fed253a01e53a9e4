//! Canned admin backend and session fixtures for console tests

#![allow(dead_code)]

use std::sync::Arc;

use api::ApiClient;
use api::session::SessionContext;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use common::config::ClientConfig;
use common::storage::{FileStore, KeyValueStore};
use console::session::SessionStore;
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

type Route = (Method, &'static str, u16, Value);

struct Backend {
    routes: Vec<Route>,
    hits: Mutex<Vec<(Method, String, String)>>,
}

/// Local backend answering from a fixed route list; unknown routes get 404
pub struct CannedBackend {
    base_url: String,
    backend: Arc<Backend>,
    _shutdown: oneshot::Sender<()>,
}

impl CannedBackend {
    pub async fn start(routes: Vec<Route>) -> Self {
        let backend = Arc::new(Backend {
            routes,
            hits: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(answer).with_state(backend.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test backend");
        let addr = listener.local_addr().expect("Failed to read backend address");

        let (shutdown, stopped) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    stopped.await.ok();
                })
                .await
                .ok();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            backend,
            _shutdown: shutdown,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `(method, path, body)` of every request, in arrival order
    pub fn hits(&self) -> Vec<(Method, String, String)> {
        self.backend.hits.lock().clone()
    }
}

async fn answer(State(backend): State<Arc<Backend>>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().trim_start_matches("/api").to_string();
    backend.hits.lock().push((
        method.clone(),
        path.clone(),
        String::from_utf8_lossy(&body).into_owned(),
    ));

    match backend
        .routes
        .iter()
        .find(|(route_method, route_path, _, _)| *route_method == method && *route_path == path)
    {
        Some((_, _, status, body)) => {
            let status = StatusCode::from_u16(*status).expect("invalid status");
            let text = match body {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (status, [(header::CONTENT_TYPE, "application/json")], text).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A console wired to a backend with session storage in a temporary file
pub struct Console {
    pub client: ApiClient,
    pub sessions: SessionStore,
    pub storage: Arc<dyn KeyValueStore>,
    pub dir: TempDir,
}

impl Console {
    pub fn new(api_url: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path().join("storage.json")));
        Self::with_storage(api_url, storage, dir)
    }

    /// A fresh console over the same storage file, as after a restart
    pub fn reopen(self) -> Self {
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(FileStore::new(self.dir.path().join("storage.json")));
        let api_url = self.client.http.base_url().to_string();
        let console = Self::with_storage(&api_url, storage, self.dir);
        console.sessions.load_from_storage();
        console
    }

    fn with_storage(api_url: &str, storage: Arc<dyn KeyValueStore>, dir: TempDir) -> Self {
        let config = ClientConfig {
            api_url: api_url.to_string(),
            timeout_ms: 5_000,
            ..ClientConfig::default()
        };
        let context = SessionContext::new(storage.clone());
        let client = ApiClient::new(&config, context).expect("Failed to create API client");
        let sessions = SessionStore::from_client(&client);
        Self {
            client,
            sessions,
            storage,
            dir,
        }
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
