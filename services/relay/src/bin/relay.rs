//! services/relay/src/bin/relay.rs

use relay_lib::{
    adapters::HttpBackendGateway,
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::Router;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting relay...");

    // --- 2. Initialize the Backend Gateway ---
    let backend = Arc::new(HttpBackendGateway::new(config.backend_url.clone())?);
    info!(
        backend = %config.backend_url,
        production = config.production,
        "Relaying to backend origin"
    );

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        backend,
        config: config.clone(),
    });

    // --- 4. Create the Web Router ---
    // Merge the relay with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
