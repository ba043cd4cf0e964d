//! Core error types for focustimer-core.
//!
//! The timer engine itself never fails: out-of-range input is clamped and
//! collaborator failures are absorbed at the call site. These types describe
//! what the collaborators (settings store, notification sink, config file)
//! can report back.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focustimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by a [`PersistenceStore`](crate::storage::PersistenceStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A value could not be encoded for storage
    #[error("Failed to encode value for '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The store refused the operation (e.g. writes disabled)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
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

    /// Dotted key does not name a configuration field
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Text does not name a phase
    #[error("Unknown phase '{0}' (expected work, short-break or long-break)")]
    UnknownPhase(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[source] std::io::Error),
}

/// Errors reported by a [`NotificationSink`](crate::sink::NotificationSink).
#[derive(Error, Debug)]
pub enum SinkError {
    /// Audible/haptic alert could not be played
    #[error("Alert failed: {0}")]
    Alert(String),

    /// Analytics event could not be delivered
    #[error("Event '{name}' not delivered: {message}")]
    Delivery { name: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
