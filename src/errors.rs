//! Errors for the telemetry recorder.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Upstream API request failed")]
    ApiRequestError(#[from] reqwest::Error),

    #[error("Upstream API returned HTTP {status}: {context}")]
    ApiStatusError {
        status: reqwest::StatusCode,
        context: String,
    },

    #[error("Serialization error")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("No node found for external id {0}")]
    NodeNotFound(String),

    #[error("Database connection error: {0}")]
    DatabaseConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}
