//! # Worker Error Types

use thiserror::Error;

/// Errors raised by the background cache worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Precaching failed; nothing from this version was kept.
    #[error("Install of '{version}' failed: {reason}")]
    InstallFailed { version: String, reason: String },

    /// The network request produced no response.
    #[error("Network error: {0}")]
    Network(String),

    /// Cache storage rejected an operation.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The worker task is gone.
    #[error("Worker channel closed")]
    ChannelClosed,
}

impl WorkerError {
    pub fn install_failed(version: &str, reason: impl Into<String>) -> Self {
        WorkerError::InstallFailed {
            version: version.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;
