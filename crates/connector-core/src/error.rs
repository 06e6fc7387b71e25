//! Error types for the connector core library.

use thiserror::Error;

/// Core error type for the connector.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parsing error in {field}: {message}")]
    DateParse {
        field: &'static str,
        message: String,
    },

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("GitHub API error: {0}")]
    GitHub(String),
}

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;
