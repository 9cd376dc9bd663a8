//! Error types for the remote store and local storage

use thiserror::Error;

/// Failures of a remote catalog subscription
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// Request could not be sent or the body could not be read
    #[error("Request failed: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("HTTP error: {0}")]
    Status(u16),

    /// Body was not the expected document shape
    #[error("Decode failed: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

impl From<ureq::Error> for StoreError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) => StoreError::Status(code),
            other => StoreError::Transport(other.to_string()),
        }
    }
}

/// Failures of the on-device key/value store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
