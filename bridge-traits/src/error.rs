use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The persistent medium refused a write because it is full.
    #[error("Storage capacity exceeded while writing '{key}' ({requested} bytes requested)")]
    CapacityExceeded { key: String, requested: usize },

    /// The request never produced a response (offline, DNS, reset, timeout).
    #[error("Network failure: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether this error means the medium ran out of space.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, BridgeError::CapacityExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
