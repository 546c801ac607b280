//! In-process backend for tests
//!
//! Serves canned envelopes from an axum router bound to `127.0.0.1:0` and
//! records every request it sees. `GET /auth/csrf-token`, `POST /auth/login`
//! and `POST /auth/logout` behave like the real backend; other routes answer
//! from stubs, with writes defaulting to a `data: null` success.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::client::ApiClient;
use crate::config::ApiConfig;
use crate::session::SessionStore;

pub const SESSION_COOKIE: &str = "SESSION=abc123";

/// Success envelope around `data`.
pub fn ok(data: Value) -> Value {
    json!({"code": 200, "data": data, "errMessage": null, "isSuccess": true})
}

/// Failed envelope.
pub fn fail(code: i64, message: &str) -> Value {
    json!({"code": code, "data": null, "errMessage": message, "isSuccess": false})
}

#[derive(Debug, Clone)]
pub enum Reply {
    Json(StatusCode, Value),
    Raw(StatusCode, String),
    Empty(StatusCode),
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Reply::Json(StatusCode::OK, body)
    }

    pub fn json_status(status: StatusCode, body: Value) -> Self {
        Reply::Json(status, body)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(status, body) => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                body.to_string(),
            )
                .into_response(),
            Reply::Raw(status, body) => (status, body).into_response(),
            Reply::Empty(status) if status == StatusCode::NO_CONTENT => status.into_response(),
            Reply::Empty(status) => (status, [(header::CONTENT_LENGTH, "0")]).into_response(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Default)]
struct Backend {
    requests: Mutex<Vec<Recorded>>,
    stubs: Mutex<HashMap<(Method, String), Reply>>,
    csrf_hits: AtomicUsize,
    csrf_fails: AtomicBool,
}

pub struct TestServer {
    backend: Arc<Backend>,
    root: String,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let backend = Arc::new(Backend::default());
        let app = Router::new().fallback(handle).with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            backend,
            root: format!("http://{addr}"),
        }
    }

    /// `http://127.0.0.1:port`, for external targets.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn api_base(&self) -> String {
        format!("{}/api", self.root)
    }

    pub fn config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_base(),
            cookie: None,
        }
    }

    /// Fresh client with its own session and cookie jar.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config(), SessionStore::new()).unwrap()
    }

    /// Answer `method path` (without `/api` and query) with `reply`.
    pub async fn stub(&self, method: Method, path: &str, reply: Reply) {
        self.backend
            .stubs
            .lock()
            .await
            .insert((method, path.to_string()), reply);
    }

    pub fn fail_csrf(&self) {
        self.backend.csrf_fails.store(true, Ordering::SeqCst);
    }

    pub fn csrf_hits(&self) -> usize {
        self.backend.csrf_hits.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<Recorded> {
        self.backend.requests.lock().await.clone()
    }

    /// Recorded requests other than CSRF token fetches.
    pub async fn calls(&self) -> Vec<Recorded> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.path != "/auth/csrf-token")
            .collect()
    }
}

async fn handle(
    State(backend): State<Arc<Backend>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path();
    let path = path.strip_prefix("/api").unwrap_or(path).to_string();

    backend.requests.lock().await.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });

    if let Some(reply) = backend.stubs.lock().await.get(&(method.clone(), path.clone())) {
        return reply.clone().into_response();
    }

    match (method, path.as_str()) {
        (Method::GET, "/auth/csrf-token") => {
            let n = backend.csrf_hits.fetch_add(1, Ordering::SeqCst) + 1;
            // Long enough for concurrent callers to pile up behind the first.
            tokio::time::sleep(Duration::from_millis(50)).await;
            if backend.csrf_fails.load(Ordering::SeqCst) {
                return Reply::json_status(StatusCode::INTERNAL_SERVER_ERROR, fail(500, "csrf unavailable"))
                    .into_response();
            }
            Reply::json(ok(json!({"tokenValue": format!("tok-{n}")}))).into_response()
        }
        (Method::POST, "/auth/login") => (
            [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
            Reply::json(ok(json!({"id": 1, "username": "reader", "role": "ROLE_USER"}))),
        )
            .into_response(),
        (Method::POST, "/auth/logout") => (
            [(header::SET_COOKIE, "SESSION=; Max-Age=0; Path=/".to_string())],
            Reply::json(ok(Value::Null)),
        )
            .into_response(),
        (Method::GET, _) => {
            Reply::json_status(StatusCode::NOT_FOUND, fail(404, "no such route")).into_response()
        }
        _ => Reply::json(ok(Value::Null)).into_response(),
    }
}
