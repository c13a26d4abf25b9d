//! Error types for permission adapters
//!
//! Status queries never surface these errors; they only describe
//! infrastructure failures (storage, platform bindings, request lifecycle).

use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors produced by permission adapters and their collaborators
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("Storage error: {reason}")]
    Storage { reason: String },

    #[error("Storage not available")]
    StorageUnavailable,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Peripheral manager unavailable: {reason}")]
    ManagerUnavailable { reason: String },

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Permission request {request_id} timed out after {duration_ms}ms")]
    RequestTimedOut { request_id: String, duration_ms: u64 },

    #[error("Permission request {request_id} was cancelled")]
    RequestCancelled { request_id: String },
}

impl PermissionError {
    /// Create a storage error with a reason
    pub fn storage_error<T: Into<String>>(reason: T) -> Self {
        PermissionError::Storage {
            reason: reason.into(),
        }
    }

    /// Create a manager construction error with a reason
    pub fn manager_unavailable<T: Into<String>>(reason: T) -> Self {
        PermissionError::ManagerUnavailable {
            reason: reason.into(),
        }
    }
}

/// Result type for permission operations
pub type Result<T> = core::result::Result<T, PermissionError>;
