//! # Storage Error Types
//!
//! Error types for the enhanced store and its codec pipeline.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur inside the enhanced store.
///
/// Public store operations never return these; they are logged and turned
/// into `false` or a default value at the boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    // ========================================================================
    // Codec Errors
    // ========================================================================
    /// Value could not be serialized or compressed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Stored text could not be turned back into a value.
    #[error("Decode error: {0}")]
    Decode(String),

    // ========================================================================
    // Medium Errors
    // ========================================================================
    /// The key-value medium is full.
    #[error("Storage capacity exceeded while writing '{key}'")]
    CapacityExceeded { key: String },

    /// Any other failure reported by the key-value medium.
    #[error("Storage medium error: {0}")]
    Medium(String),
}

impl StorageError {
    /// Returns `true` if freeing space could make the operation succeed.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, StorageError::CapacityExceeded { .. })
    }
}

impl From<BridgeError> for StorageError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::CapacityExceeded { key, .. } => StorageError::CapacityExceeded { key },
            other => StorageError::Medium(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Decode(err.to_string())
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_conversion() {
        let err: StorageError = BridgeError::CapacityExceeded {
            key: "enhanced_quiz".to_string(),
            requested: 4096,
        }
        .into();

        assert!(err.is_capacity_exceeded());
        assert!(err.to_string().contains("enhanced_quiz"));
    }

    #[test]
    fn test_other_bridge_errors_become_medium_errors() {
        let err: StorageError = BridgeError::OperationFailed("disk unplugged".to_string()).into();

        assert!(!err.is_capacity_exceeded());
        assert!(matches!(err, StorageError::Medium(ref msg) if msg.contains("disk unplugged")));
    }
}
