// src/error.rs

//! Unified error handling for the timeline application.

use std::fmt;

use thiserror::Error;

/// Result type alias for timeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page fetch failed at the transport level
    #[error("Transport error for {key}: {message}")]
    Transport { key: String, message: String },

    /// Extractor produced unusable output
    #[error("Extraction error for {context}: {message}")]
    Extraction { context: String, message: String },

    /// Candidate record failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record store write/read failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Update targeted a row that does not exist
    #[error("Record not found: id {0}")]
    RecordNotFound(i64),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a transport error with the work-unit key as context.
    pub fn transport(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create an extraction error with context.
    pub fn extraction(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Extraction {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }
}
