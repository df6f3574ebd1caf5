//! Error types for the contents manager.

use thiserror::Error;

/// Storage-related errors raised by backends and persistent stores
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors surfaced by the contents manager to its callers
#[derive(Debug, Error)]
pub enum ContentsError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unexpected model type: {0:?}")]
    InvalidModelType(String),

    #[error("Notebook validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Trust store unavailable: {0}")]
    TrustStoreUnavailable(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ContentsError {
    /// HTTP-style status code a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ContentsError::NotFound(_) => 404,
            ContentsError::InvalidPath(_)
            | ContentsError::InvalidModelType(_)
            | ContentsError::ValidationFailed(_)
            | ContentsError::InvalidOperation(_)
            | ContentsError::InvalidContent(_) => 400,
            ContentsError::AlreadyExists(_) => 409,
            ContentsError::TrustStoreUnavailable(_) => 503,
            ContentsError::ConfigError(_) => 500,
            ContentsError::Storage(StorageError::NotFound(_)) => 404,
            ContentsError::Storage(StorageError::AlreadyExists(_)) => 409,
            ContentsError::Storage(StorageError::InvalidPath(_)) => 400,
            ContentsError::Storage(_) => 500,
        }
    }
}

impl From<config::ConfigError> for ContentsError {
    fn from(err: config::ConfigError) -> Self {
        ContentsError::ConfigError(err.to_string())
    }
}
