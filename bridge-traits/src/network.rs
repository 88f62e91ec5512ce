//! Connectivity Monitoring Abstraction
//!
//! Provides the online/offline signal the offline orchestrator reacts to.

use chrono::{DateTime, Utc};

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Connected to network
    Connected,
    /// Not connected to any network
    Disconnected,
    /// Connection status unknown or indeterminate
    Indeterminate,
}

impl NetworkStatus {
    /// Online means "a request could plausibly leave the device".
    ///
    /// An indeterminate status is treated as online, matching how browsers
    /// report `navigator.onLine` when they cannot tell.
    pub fn is_online(self) -> bool {
        !matches!(self, NetworkStatus::Disconnected)
    }
}

/// A single connectivity observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub status: NetworkStatus,
    /// When the host observed this status
    pub observed_at: DateTime<Utc>,
}

impl NetworkInfo {
    pub fn new(status: NetworkStatus) -> Self {
        Self {
            status,
            observed_at: Utc::now(),
        }
    }

    pub fn online() -> Self {
        Self::new(NetworkStatus::Connected)
    }

    pub fn offline() -> Self {
        Self::new(NetworkStatus::Disconnected)
    }
}

/// Network monitor trait
///
/// Provides connectivity information so the core can:
/// - Report whether the app is currently online
/// - Flush queued quiz results once connectivity returns
///
/// # Platform Support
///
/// - **Desktop**: periodic reachability probe
/// - **Web**: `navigator.onLine` plus `online`/`offline` window events
///
/// # Example
///
/// ```ignore
/// use bridge_traits::network::NetworkMonitor;
///
/// async fn can_sync(monitor: &dyn NetworkMonitor) -> bool {
///     monitor.is_connected().await
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait NetworkMonitor: PlatformSendSync {
    /// Get current network information
    async fn get_network_info(&self) -> Result<NetworkInfo>;

    /// Check if currently online. Lookup failures count as online.
    async fn is_connected(&self) -> bool {
        match self.get_network_info().await {
            Ok(info) => info.status.is_online(),
            Err(_) => true,
        }
    }

    /// Subscribe to network status changes
    ///
    /// Returns a stream of network info updates. Implementations should
    /// emit an event whenever network status changes.
    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>>;
}

/// Stream of network status changes
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait NetworkChangeStream: PlatformSend {
    /// Get the next network info update
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<NetworkInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    struct FailingMonitor;

    #[async_trait::async_trait]
    impl NetworkMonitor for FailingMonitor {
        async fn get_network_info(&self) -> Result<NetworkInfo> {
            Err(BridgeError::NotAvailable("no probe".to_string()))
        }

        async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>> {
            Err(BridgeError::NotAvailable("no probe".to_string()))
        }
    }

    #[test]
    fn test_status_online_mapping() {
        assert!(NetworkStatus::Connected.is_online());
        assert!(NetworkStatus::Indeterminate.is_online());
        assert!(!NetworkStatus::Disconnected.is_online());
        assert_eq!(NetworkInfo::offline().status, NetworkStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_unknown_connectivity_counts_as_online() {
        assert!(FailingMonitor.is_connected().await);
    }
}
