//! Core error types for desencosta-core.
//!
//! The reminder subsystem has a small taxonomy of its own
//! ([`ReminderError`]); storage and configuration failures are kept in
//! separate enums and folded into [`CoreError`] at the crate boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for desencosta-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Reminder scheduling errors
    #[error("Reminder error: {0}")]
    Reminder(#[from] ReminderError),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while computing or installing a reminder schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    /// Notification permission was refused by the user or platform.
    #[error("Notification permission denied")]
    PermissionDenied,

    /// Settings that cannot produce a schedule.
    #[error("Invalid reminder configuration for '{field}': {message}")]
    InvalidConfiguration { field: String, message: String },

    /// The platform scheduler rejected the request.
    #[error("Notification backend failure: {0}")]
    SchedulingBackendFailure(String),
}

impl ReminderError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ReminderError::InvalidConfiguration {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Key-value and database errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored value could not be encoded or decoded
    #[error("Malformed value for key '{key}': {message}")]
    Malformed { key: String, message: String },

    /// A store lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
