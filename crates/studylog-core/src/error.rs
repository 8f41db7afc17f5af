//! Core error types for studylog-core.
//!
//! Structural edits on the question-bank hierarchy fail with
//! [`HierarchyError`]; persistence and configuration failures are wrapped by
//! [`CoreError`]. Analytics never return errors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studylog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Structural edit rejected by the hierarchy
    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
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

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Local validation failures of structural edits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// The bank id does not exist
    #[error("Question bank not found: {0}")]
    BankNotFound(String),

    /// A structural edit referenced a missing node
    #[error("Path not found: {}", .0.join(" / "))]
    PathNotFound(Vec<String>),

    /// Question range with start > end
    #[error("Invalid question range: start ({start}) must not exceed end ({end})")]
    InvalidRange { start: u32, end: u32 },

    /// Sibling name collision
    #[error("A sibling named '{0}' already exists")]
    DuplicateName(String),

    /// Node kind not allowed under its parent
    #[error("A {child} cannot be placed under {parent}")]
    KindMismatch { parent: String, child: String },

    /// Empty or whitespace-only name
    #[error("Name cannot be empty")]
    EmptyName,

    /// Name containing the path separator `/`
    #[error("Name must not contain '/': {0}")]
    InvalidName(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
