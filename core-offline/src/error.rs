//! # Offline Error Types

use thiserror::Error;

/// Errors raised while preparing or leaving offline mode.
#[derive(Error, Debug)]
pub enum OfflineError {
    /// The quiz catalog could not be listed.
    #[error("Quiz catalog unavailable: {0}")]
    Catalog(String),

    /// A value could not be written to the enhanced store.
    #[error("Failed to persist '{0}'")]
    Persist(String),

    /// Queued results could not be delivered.
    #[error("Result sync failed: {0}")]
    Sync(String),

    /// A value could not be converted to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for offline operations.
pub type Result<T> = std::result::Result<T, OfflineError>;
