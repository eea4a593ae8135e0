//! services/relay/src/error.rs
//!
//! Defines the error types for the relay service: `ApiError` for startup and
//! `RelayError` for failures inside a single relayed request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use careerhub_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for starting and running the `relay` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a failure to build the outbound HTTP client.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//=========================================================================================
// Per-request Errors
//=========================================================================================

/// Body of every relay-originated error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Body returned when the backend answered with something other than JSON.
#[derive(Debug, Serialize, ToSchema)]
pub struct UnexpectedFormatBody {
    pub error: String,
    /// The raw backend body.
    pub details: String,
    /// The backend's status code.
    pub status: u16,
}

/// Everything that can stop a request from being relayed normally.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Required fields were missing or malformed. Never reaches the backend.
    #[error("{0}")]
    BadRequest(String),

    /// The backend answered, but not with JSON.
    #[error("Backend returned an unexpected error format (status {status})")]
    UnexpectedFormat { status: u16, details: String },

    /// The inbound body was not the JSON object we expected.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// The backend could not be reached.
    #[error("Backend unreachable: {0}")]
    Backend(#[from] PortError),
}

impl RelayError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        RelayError::BadRequest(message.into())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
            }
            RelayError::UnexpectedFormat { status, details } => {
                error!(status, "Backend returned a non-JSON body");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(UnexpectedFormatBody {
                        error: "Backend returned an unexpected error format".to_string(),
                        details,
                        status,
                    }),
                )
                    .into_response()
            }
            RelayError::MalformedBody(reason) => {
                error!("Failed to read request body: {}", reason);
                internal_server_error()
            }
            RelayError::Backend(e) => {
                error!("Failed to reach the backend: {:?}", e);
                internal_server_error()
            }
        }
    }
}

fn internal_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}
