//! services/relay/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the health probe.

use axum::response::{IntoResponse, Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::error::{ErrorBody, UnexpectedFormatBody};
use crate::web::relay::{
    self, LoginRequest, RegisterStep1Request, VerifyEmailRequest,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        relay::login_handler,
        relay::logout_handler,
        relay::register_step1_handler,
        relay::verify_email_handler,
        relay::complete_profile_handler,
        relay::current_user_handler,
        healthz,
    ),
    components(
        schemas(
            LoginRequest,
            RegisterStep1Request,
            VerifyEmailRequest,
            ErrorBody,
            UnexpectedFormatBody,
            HealthResponse
        )
    ),
    tags(
        (name = "CareerHub Relay", description = "Same-origin relay for the CareerHub authentication API.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// Liveness probe. Does not touch the backend.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "The relay is up", body = HealthResponse)
    )
)]
pub async fn healthz() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
