//! Application state for the connector server.

use std::sync::Arc;
use url::Url;

use connector_core::crypto::EncryptionKey;
use connector_core::db::DbPool;

/// Server configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Externally reachable base URL (used for manifest and webhook URLs).
    pub base_url: String,
    /// Parsed base URL.
    pub base_url_parsed: Url,
    /// Socket address to bind.
    pub bind_addr: String,
    /// Database URL.
    pub database_url: String,
    /// GitHub API base override (GitHub Enterprise, tests).
    pub github_api_base: Option<String>,
    /// Whether dev mode is enabled.
    pub dev_mode: bool,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let base_url = std::env::var("CONNECTOR_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let base_url_parsed =
            Url::parse(&base_url).map_err(|e| format!("Invalid CONNECTOR_BASE_URL: {}", e))?;

        let dev_mode = std::env::var("CONNECTOR_DEV_MODE").ok() == Some("true".to_string());

        // Validate HTTPS in production
        if !dev_mode && base_url_parsed.scheme() != "https" {
            let host = base_url_parsed.host_str().unwrap_or("");
            let is_loopback = host == "localhost" || host == "127.0.0.1" || host == "::1";
            if !is_loopback {
                return Err("CONNECTOR_BASE_URL must use HTTPS in production. Set CONNECTOR_DEV_MODE=true for development.".to_string());
            }
        }

        Ok(Self {
            base_url,
            base_url_parsed,
            bind_addr: std::env::var("CONNECTOR_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:connector.db".to_string()),
            github_api_base: std::env::var("CONNECTOR_GITHUB_API_BASE").ok(),
            dev_mode,
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Encryption key for storing credentials.
    pub encryption_key: Option<EncryptionKey>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(db: DbPool, config: ServerConfig, encryption_key: Option<EncryptionKey>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            encryption_key,
        }
    }

    /// Gets the encryption key, returning an error if not configured.
    pub fn require_encryption_key(&self) -> Result<&EncryptionKey, &'static str> {
        self.encryption_key
            .as_ref()
            .ok_or("ENCRYPTION_KEY not configured")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars_unset(
            ["CONNECTOR_BASE_URL", "CONNECTOR_DEV_MODE", "DATABASE_URL"],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config.base_url, "http://localhost:8080");
                assert_eq!(config.database_url, "sqlite:connector.db");
                assert!(!config.dev_mode);
            },
        );
    }

    #[test]
    fn test_from_env_rejects_http_in_production() {
        temp_env::with_vars(
            [
                ("CONNECTOR_BASE_URL", Some("http://connector.example.com")),
                ("CONNECTOR_DEV_MODE", None),
            ],
            || {
                let result = ServerConfig::from_env();
                assert!(result.is_err());
            },
        );
    }

    #[test]
    fn test_from_env_allows_http_in_dev_mode() {
        temp_env::with_vars(
            [
                ("CONNECTOR_BASE_URL", Some("http://connector.example.com")),
                ("CONNECTOR_DEV_MODE", Some("true")),
            ],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert!(config.dev_mode);
            },
        );
    }
}
