//! Shared harness for the relay integration tests: a scriptable stand-in for the
//! backend origin and helpers that serve the real relay router on an ephemeral port.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Uri},
    response::Response,
    Router,
};
use bytes::Bytes;
use careerhub_core::ports::{BackendGateway, BackendReply, BackendRequest, PortResult};
use relay_lib::{
    adapters::HttpBackendGateway,
    config::Config,
    web::{self, state::AppState},
};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::Level;

//=========================================================================================
// Mock Backend Origin
//=========================================================================================

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub cookie: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

impl Recorded {
    pub fn has_cookie(&self, pair: &str) -> bool {
        self.cookie
            .as_deref()
            .map_or(false, |c| c.split(';').any(|p| p.trim() == pair))
    }
}

/// What the backend answers.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub set_cookies: Vec<String>,
}

impl Canned {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
            set_cookies: Vec::new(),
        }
    }

    pub fn html(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/html; charset=UTF-8",
            body: body.to_string(),
            set_cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, set_cookie: &str) -> Self {
        self.set_cookies.push(set_cookie.to_string());
        self
    }
}

type Responder = dyn Fn(&Recorded) -> Canned + Send + Sync;

struct MockState {
    responder: Box<Responder>,
    hits: Mutex<Vec<Recorded>>,
}

pub struct MockBackend {
    pub url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&Recorded) -> Canned + Send + Sync + 'static,
    {
        let state = Arc::new(MockState {
            responder: Box::new(responder),
            hits: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(capture).with_state(state.clone());
        let url = serve(app).await;
        Self { url, state }
    }

    pub fn hits(&self) -> Vec<Recorded> {
        self.state.hits.lock().unwrap().clone()
    }

    pub fn hits_to(&self, path: &str) -> Vec<Recorded> {
        self.hits().into_iter().filter(|h| h.path == path).collect()
    }
}

async fn capture(
    State(mock): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let recorded = Recorded {
        method,
        path: uri.path().to_string(),
        cookie: header_text(header::COOKIE),
        accept: header_text(header::ACCEPT),
        content_type: header_text(header::CONTENT_TYPE),
        body: serde_json::from_slice(&body).ok(),
    };

    let canned = (mock.responder)(&recorded);
    mock.hits.lock().unwrap().push(recorded);

    let mut builder = axum::http::Response::builder()
        .status(canned.status)
        .header(header::CONTENT_TYPE, canned.content_type);
    for set_cookie in &canned.set_cookies {
        builder = builder.header(header::SET_COOKIE, set_cookie.as_str());
    }
    builder.body(Body::from(canned.body)).unwrap()
}

//=========================================================================================
// Counting Gateway
//=========================================================================================

/// A gateway that never leaves the process. Used to prove a request was
/// rejected before anything was forwarded.
#[derive(Default)]
pub struct CountingGateway {
    calls: AtomicUsize,
}

impl CountingGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendGateway for CountingGateway {
    async fn forward(&self, _request: BackendRequest) -> PortResult<BackendReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(BackendReply {
            status: 200,
            body: r#"{"success":true}"#.to_string(),
            set_cookies: Vec::new(),
        })
    }
}

//=========================================================================================
// Relay
//=========================================================================================

pub fn test_config(backend_url: &str, production: bool) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        backend_url: backend_url.to_string(),
        production,
        log_level: Level::DEBUG,
        allowed_origin: "http://localhost:3000".to_string(),
    }
}

/// Serves the relay in front of an arbitrary gateway and returns its base URL.
pub async fn start_relay_with(backend: Arc<dyn BackendGateway>, production: bool) -> String {
    let state = Arc::new(AppState {
        backend,
        config: Arc::new(test_config("http://127.0.0.1:9", production)),
    });
    serve(web::router(state)).await
}

/// Serves the relay in front of a real HTTP backend.
pub async fn start_relay(backend_url: &str, production: bool) -> String {
    let gateway = HttpBackendGateway::new(backend_url).unwrap();
    let state = Arc::new(AppState {
        backend: Arc::new(gateway),
        config: Arc::new(test_config(backend_url, production)),
    });
    serve(web::router(state)).await
}

/// A base URL nothing is listening on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
