//! services/relay/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use careerhub_core::ports::BackendGateway;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn BackendGateway>,
    pub config: Arc<Config>,
}
