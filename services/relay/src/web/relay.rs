//! services/relay/src/web/relay.rs
//!
//! The six relayed endpoints. Each handler checks its required fields, forwards
//! the call to the backend origin with the browser's cookies, and answers with
//! the backend's status and JSON body plus the re-issued cookies.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use careerhub_core::{
    domain::Endpoint,
    ports::BackendRequest,
    validation::{is_verification_code, MIN_PASSWORD_LEN},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{error::Category, Value};
use std::{sync::Arc, time::Instant};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    error::{ErrorBody, RelayError, UnexpectedFormatBody},
    web::{cookies, state::AppState},
};

const LOGIN_REQUIRED: &str = "Email and password are required";
const STEP1_REQUIRED: &str = "All fields are required";
const VERIFY_REQUIRED: &str = "Email and verification code are required";
const PROFILE_REQUIRED: &str = "User ID and birth date are required";

//=========================================================================================
// Request Payloads
//=========================================================================================

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterStep1Request {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Authenticate with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Backend response, relayed with its cookies"),
        (status = 400, description = "Email or password missing", body = ErrorBody),
        (status = 500, description = "Backend unreachable or unexpected format", body = UnexpectedFormatBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let request: LoginRequest = parse_body(&body, LOGIN_REQUIRED)?;
    if filled(&request.email).is_none() || filled(&request.password).is_none() {
        return Err(RelayError::bad_request(LOGIN_REQUIRED));
    }
    relay(&state, Endpoint::Login, &headers, Some(to_value(&request)?)).await
}

/// End the backend session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Backend response, relayed with its clearing cookies"),
        (status = 500, description = "Backend unreachable", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    relay(&state, Endpoint::Logout, &headers, None).await
}

/// Registration step one: create the account.
#[utoipa::path(
    post,
    path = "/api/auth/register/step1",
    request_body = RegisterStep1Request,
    responses(
        (status = 201, description = "Account created, verification code sent"),
        (status = 400, description = "Missing fields, mismatched or short password", body = ErrorBody),
        (status = 422, description = "Backend field errors, relayed"),
        (status = 500, description = "Backend unreachable or unexpected format", body = UnexpectedFormatBody)
    )
)]
pub async fn register_step1_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let request: RegisterStep1Request = parse_body(&body, STEP1_REQUIRED)?;
    let required = [
        &request.first_name,
        &request.last_name,
        &request.email,
        &request.password,
        &request.password_confirmation,
    ];
    if required.iter().any(|field| filled(field).is_none()) {
        return Err(RelayError::bad_request(STEP1_REQUIRED));
    }
    if request.password != request.password_confirmation {
        return Err(RelayError::bad_request("Passwords do not match"));
    }
    let password_len = request.password.as_deref().map_or(0, |p| p.chars().count());
    if password_len < MIN_PASSWORD_LEN {
        return Err(RelayError::bad_request(
            "Password must be at least 8 characters long",
        ));
    }
    relay(&state, Endpoint::RegisterStep1, &headers, Some(to_value(&request)?)).await
}

/// Registration step two: confirm the emailed code.
#[utoipa::path(
    post,
    path = "/api/auth/register/step2/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified"),
        (status = 400, description = "Missing email or code, or code is not 6 digits", body = ErrorBody),
        (status = 500, description = "Backend unreachable or unexpected format", body = UnexpectedFormatBody)
    )
)]
pub async fn verify_email_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let request: VerifyEmailRequest = parse_body(&body, VERIFY_REQUIRED)?;
    let code = match (filled(&request.email), filled(&request.code)) {
        (Some(_), Some(code)) => code,
        _ => {
            return Err(RelayError::bad_request(VERIFY_REQUIRED))
        }
    };
    if !is_verification_code(code) {
        return Err(RelayError::bad_request("Verification code must be 6 digits"));
    }
    relay(&state, Endpoint::VerifyEmail, &headers, Some(to_value(&request)?)).await
}

/// Registration step three: submit the profile.
///
/// Only `user_id` and `birth_date` are checked here. The whole body is forwarded.
#[utoipa::path(
    post,
    path = "/api/auth/register/step3/complete-profile",
    request_body(content_type = "application/json", description = "Profile fields; `user_id` and `birth_date` are required."),
    responses(
        (status = 200, description = "Profile saved"),
        (status = 400, description = "User ID or birth date missing", body = ErrorBody),
        (status = 500, description = "Backend unreachable or unexpected format", body = UnexpectedFormatBody)
    )
)]
pub async fn complete_profile_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let request: Value = parse_body(&body, PROFILE_REQUIRED)?;
    let Some(fields) = request.as_object() else {
        return Err(RelayError::bad_request(PROFILE_REQUIRED));
    };
    if !truthy(fields.get("user_id")) || !truthy(fields.get("birth_date")) {
        return Err(RelayError::bad_request(PROFILE_REQUIRED));
    }
    relay(&state, Endpoint::CompleteProfile, &headers, Some(request)).await
}

/// Fetch the currently authenticated user.
#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "The authenticated user"),
        (status = 401, description = "No session, relayed from the backend"),
        (status = 500, description = "Backend unreachable or unexpected format", body = UnexpectedFormatBody)
    )
)]
pub async fn current_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    relay(&state, Endpoint::CurrentUser, &headers, None).await
}

//=========================================================================================
// Forwarding
//=========================================================================================

/// Forwards one call and turns the backend's answer into the relay's response.
async fn relay(
    state: &AppState,
    endpoint: Endpoint,
    headers: &HeaderMap,
    body: Option<Value>,
) -> Result<Response, RelayError> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let started = Instant::now();
    let reply = state
        .backend
        .forward(BackendRequest {
            endpoint,
            cookie,
            body,
        })
        .await?;

    info!(
        endpoint = %endpoint,
        status = reply.status,
        set_cookies = reply.set_cookies.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Backend responded"
    );

    let payload: Value = serde_json::from_str(&reply.body).map_err(|_| {
        warn!(endpoint = %endpoint, status = reply.status, "Backend body is not JSON");
        RelayError::UnexpectedFormat {
            status: reply.status,
            details: reply.body.clone(),
        }
    })?;

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let jar = cookies::reissue(&reply.set_cookies, state.config.production);
    Ok((status, jar, Json(payload)).into_response())
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Reads the JSON body. Well-formed JSON of the wrong shape (a number where a
/// string is expected, an array instead of an object) is the caller's mistake
/// and answers `required`; broken JSON is a 500.
fn parse_body<T: DeserializeOwned>(body: &Bytes, required: &str) -> Result<T, RelayError> {
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        Category::Data => RelayError::bad_request(required),
        Category::Io | Category::Syntax | Category::Eof => {
            RelayError::MalformedBody(e.to_string())
        }
    })
}

fn to_value<T: Serialize>(request: &T) -> Result<Value, RelayError> {
    serde_json::to_value(request).map_err(|e| RelayError::MalformedBody(e.to_string()))
}

/// A present, non-empty string field.
fn filled(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Loose presence check for untyped fields: null, false, 0 and "" count as missing.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
