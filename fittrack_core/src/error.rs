//! Error types for the fittrack_core library.

use crate::store::StoreError;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fittrack_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Remote document store fault
    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout catalog edit rejected
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Daily progress edit rejected
    #[error("Progress error: {0}")]
    Progress(String),

    /// Food log or library edit rejected
    #[error("Food error: {0}")]
    Food(String),

    /// A string that is not a canonical `YYYY-MM-DD` date key
    #[error("Invalid date key: {0:?}")]
    InvalidDateKey(String),

    /// A user id that cannot be used as a storage namespace
    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),
}
