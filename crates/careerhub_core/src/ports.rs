//! crates/careerhub_core/src/ports.rs
//!
//! Defines the service contracts (traits) at the two network seams of the system.
//! The session store talks to the relay only through `RelayService`; the relay
//! talks to the backend origin only through `BackendGateway`. Concrete HTTP
//! adapters live in the `relay` service crate.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::Endpoint;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the HTTP client in use.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Transport error: {0}")]
    Transport(String),
    /// The peer answered but the answer could not be read.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Session Store → Relay
//=========================================================================================

/// A call from the session store to one of the relay endpoints.
#[derive(Debug, Clone)]
pub struct RelayCall {
    pub endpoint: Endpoint,
    pub body: Option<Value>,
}

impl RelayCall {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint, body: None }
    }

    pub fn with_body(endpoint: Endpoint, body: Value) -> Self {
        Self { endpoint, body: Some(body) }
    }
}

/// What the relay answered, before any interpretation.
#[derive(Debug, Clone)]
pub struct RelayReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RelayReply {
    /// A JSON reply, mostly useful for fakes in tests.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_string(),
        }
    }
}

#[async_trait]
pub trait RelayService: Send + Sync {
    /// Sends one call to the relay. The adapter is expected to carry the
    /// session cookie across calls the way a browser would.
    async fn send(&self, call: RelayCall) -> PortResult<RelayReply>;
}

//=========================================================================================
// Relay → Backend Origin
//=========================================================================================

/// A request forwarded by the relay to the backend origin.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub endpoint: Endpoint,
    /// The inbound `Cookie` header, forwarded untouched.
    pub cookie: Option<String>,
    pub body: Option<Value>,
}

/// The backend's answer. `set_cookies` holds every `Set-Cookie` header value.
#[derive(Debug, Clone, Default)]
pub struct BackendReply {
    pub status: u16,
    pub body: String,
    pub set_cookies: Vec<String>,
}

#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Forwards one request to the backend origin.
    async fn forward(&self, request: BackendRequest) -> PortResult<BackendReply>;
}
