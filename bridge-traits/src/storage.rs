//! Persistent Key-Value Medium and Quota Abstractions
//!
//! Provides platform-agnostic traits for the string key-value medium the
//! offline store persists into, and for the host's storage quota API.

use crate::{error::Result, platform::PlatformSendSync};

/// Synchronous string key-value medium.
///
/// Abstracts platform-specific persistent storage:
/// - Web: `localStorage`
/// - Desktop: a JSON file in the application data directory
/// - Tests: an in-memory map with an optional byte capacity
///
/// The host serializes access to the medium, so a single `write` is atomic:
/// after an error the previous value (or absence) for that key is intact.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// fn remember_theme(medium: &dyn KeyValueStore) -> Result<()> {
///     medium.write("theme", "\"dark\"")?;
///     Ok(())
/// }
/// ```
pub trait KeyValueStore: PlatformSendSync {
    /// Read the value stored under `key`, `None` when absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::CapacityExceeded`](crate::BridgeError::CapacityExceeded)
    /// when the medium is full.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// List every key currently stored, in the medium's enumeration order.
    fn list_keys(&self) -> Result<Vec<String>>;

    /// Number of stored keys.
    fn len(&self) -> Result<usize> {
        Ok(self.list_keys()?.len())
    }

    /// Whether the medium holds no keys at all.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Raw storage estimate reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageEstimate {
    /// Bytes currently used by this origin/application
    pub usage: u64,
    /// Bytes the host is willing to grant
    pub quota: u64,
}

/// Storage quota estimation trait
///
/// Mirrors `navigator.storage.estimate()` on the web. Hosts that cannot report
/// quota return [`BridgeError::NotAvailable`](crate::BridgeError::NotAvailable);
/// callers treat that as unconstrained capacity.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait QuotaEstimator: PlatformSendSync {
    /// Estimate current usage and quota.
    async fn estimate(&self) -> Result<StorageEstimate>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<BTreeMap<String, String>>,
    }

    impl KeyValueStore for MapStore {
        fn read(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().get(key).cloned())
        }

        fn write(&self, key: &str, value: &str) -> Result<()> {
            if value.len() > 8 {
                return Err(BridgeError::CapacityExceeded {
                    key: key.to_string(),
                    requested: value.len(),
                });
            }
            self.entries.lock().insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.entries.lock().remove(key);
            Ok(())
        }

        fn list_keys(&self) -> Result<Vec<String>> {
            Ok(self.entries.lock().keys().cloned().collect())
        }
    }

    #[test]
    fn test_default_len_helpers() {
        let store = MapStore::default();
        assert!(store.is_empty().unwrap());

        store.write("a", "1").unwrap();
        store.write("b", "2").unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert!(!store.is_empty().unwrap());
    }

    #[test]
    fn test_capacity_error_is_detectable() {
        let store = MapStore::default();
        let err = store.write("big", "0123456789").unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(store.read("big").unwrap(), None);
    }

    #[test]
    fn test_storage_estimate_default() {
        let estimate = StorageEstimate::default();
        assert_eq!(estimate.usage, 0);
        assert_eq!(estimate.quota, 0);
    }
}
