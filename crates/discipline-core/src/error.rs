//! Core error types for discipline-core.
//!
//! Most failures in this crate are recovered locally: corrupt persisted
//! values are reset, invalid timetable rows are dropped and duplicate user
//! actions are no-ops. The types here cover what is left over, plus the
//! diagnostics attached to the recovered cases.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for discipline-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store errors.
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

    /// A persisted value could not be decoded into its expected shape.
    #[error("Corrupt value under key '{key}': {message}")]
    Corrupt { key: String, message: String },
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Reasons a single timetable entry is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Time string is not `HH:MM` within a single day
    #[error("Invalid time for '{field}': {value:?}")]
    InvalidTime { field: String, value: String },

    /// Block does not end after it starts
    #[error("Invalid time range for '{name}': end ({end}) must be after start ({start})")]
    InvalidRange {
        name: String,
        start: String,
        end: String,
    },

    /// Block name is missing or blank
    #[error("Block name must not be empty")]
    EmptyName,

    /// Another block already uses this name
    #[error("Duplicate block name: {0}")]
    DuplicateName(String),

    /// Severity must be a positive integer
    #[error("Invalid severity for '{name}': {value}")]
    InvalidSeverity { name: String, value: String },

    /// Entry is missing fields or has the wrong field types
    #[error("Malformed entry: {0}")]
    Malformed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseBusy
                    || err.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_error_names_key() {
        let err = StorageError::Corrupt {
            key: "timetable".into(),
            message: "expected array".into(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt value under key 'timetable': expected array"
        );
    }

    #[test]
    fn storage_error_converts_into_core_error() {
        let err: CoreError = StorageError::Locked.into();
        assert!(matches!(err, CoreError::Storage(StorageError::Locked)));
    }
}
