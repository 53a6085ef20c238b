//! Error types for the application.

use thiserror::Error;

/// Error raised while handling a single inbound event.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    IoError { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Contact/bridge store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Errors while persisting inbound media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to create download directory '{path}': {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write media file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors decoding or encoding the JSON-lines protocol wire.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64 media payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Unknown media type: {0}")]
    UnknownMediaType(String),
}

/// Result type alias for event handling.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for media persistence.
pub type MediaResult<T> = std::result::Result<T, MediaError>;

/// Result type alias for wire decoding.
pub type WireResult<T> = std::result::Result<T, WireError>;
