//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The event config could not be loaded. Fatal for that page load only.
    #[error("Event config unavailable at {path}: {message}")]
    ConfigUnavailable { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, ServerError>;
