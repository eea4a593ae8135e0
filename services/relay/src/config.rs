//! services/relay/src/config.rs
//!
//! Defines the relay's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;

use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Base URL of the backend origin, without a trailing slash.
    pub backend_url: String,
    /// Production mode marks re-issued cookies `Secure`.
    pub production: bool,
    pub log_level: Level,
    /// Browser origin allowed to call the relay with credentials.
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        // --- Backend Origin ---
        let backend_url = lookup("BACKEND_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("BACKEND_URL".to_string()))?;
        let backend_url = normalize_backend_url(&backend_url)?;

        // --- Environment Mode ---
        let production = lookup("APP_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .map_or(false, |mode| mode.trim().eq_ignore_ascii_case("production"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        if axum::http::HeaderValue::from_str(&allowed_origin).is_err() {
            return Err(ConfigError::InvalidValue(
                "ALLOWED_ORIGIN".to_string(),
                format!("'{}' is not a valid header value", allowed_origin),
            ));
        }

        Ok(Self {
            bind_address,
            backend_url,
            production,
            log_level,
            allowed_origin,
        })
    }
}

fn normalize_backend_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue("BACKEND_URL".to_string(), reason);

    let url = reqwest::Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_backend_is_set() {
        let config = load(&[("BACKEND_URL", "http://api.internal:8000/")]).unwrap();
        assert_eq!(config.backend_url, "http://api.internal:8000");
        assert_eq!(config.bind_address.port(), 3000);
        assert!(!config.production);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn backend_url_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(var)) if var == "BACKEND_URL"));
    }

    #[test]
    fn backend_url_must_be_http() {
        let err = load(&[("BACKEND_URL", "ftp://files.example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "BACKEND_URL"));
    }

    #[test]
    fn production_mode_from_app_env_or_node_env() {
        let config = load(&[("BACKEND_URL", "https://api.example.com"), ("APP_ENV", "Production")]).unwrap();
        assert!(config.production);

        let config = load(&[("BACKEND_URL", "https://api.example.com"), ("NODE_ENV", "production")]).unwrap();
        assert!(config.production);

        let config = load(&[("BACKEND_URL", "https://api.example.com"), ("APP_ENV", "staging")]).unwrap();
        assert!(!config.production);
    }

    #[test]
    fn bad_bind_address_is_reported() {
        let err = load(&[("BACKEND_URL", "http://localhost:8000"), ("BIND_ADDRESS", "nowhere")]).unwrap_err();
        assert!(err.to_string().contains("BIND_ADDRESS"));
    }
}
