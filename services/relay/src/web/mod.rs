pub mod cookies;
pub mod middleware;
pub mod relay;
pub mod rest;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use careerhub_core::Endpoint;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use state::AppState;

/// Builds the relay router: the six relayed endpoints, the health probe,
/// request diagnostics and CORS for the configured browser origin.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = match state.config.allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, ACCEPT]),
        Err(e) => {
            warn!("Ignoring invalid ALLOWED_ORIGIN: {}", e);
            CorsLayer::new()
        }
    };

    Router::new()
        .route(Endpoint::Login.path(), post(relay::login_handler))
        .route(Endpoint::Logout.path(), post(relay::logout_handler))
        .route(Endpoint::RegisterStep1.path(), post(relay::register_step1_handler))
        .route(Endpoint::VerifyEmail.path(), post(relay::verify_email_handler))
        .route(Endpoint::CompleteProfile.path(), post(relay::complete_profile_handler))
        .route(Endpoint::CurrentUser.path(), get(relay::current_user_handler))
        .route("/healthz", get(rest::healthz))
        .layer(axum_middleware::from_fn(middleware::trace_exchange))
        .layer(cors)
        .with_state(state)
}
