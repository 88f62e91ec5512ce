//! Key-Value Medium Implementations
//!
//! Two adapters for [`KeyValueStore`]: a purely in-memory map and a JSON file
//! in the application data directory. Both account bytes the way a browser
//! accounts `localStorage` (key plus value length) and refuse writes past an
//! optional capacity with [`BridgeError::CapacityExceeded`].

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{KeyValueStore, QuotaEstimator, StorageEstimate},
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_DIR_NAME: &str = "quiz-offline-core";
const STORE_FILE_NAME: &str = "offline-store.json";

/// Map plus byte accounting shared by both adapters.
#[derive(Debug, Default)]
struct Entries {
    map: BTreeMap<String, String>,
    used: usize,
    capacity: Option<usize>,
}

impl Entries {
    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    fn from_map(map: BTreeMap<String, String>, capacity: Option<usize>) -> Self {
        let used = map.iter().map(|(k, v)| k.len() + v.len()).sum();
        Self { map, used, capacity }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<Option<String>> {
        let previous = self.map.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
        let requested = key.len() + value.len();
        let projected = self.used - previous + requested;

        if let Some(capacity) = self.capacity {
            if projected > capacity {
                return Err(BridgeError::CapacityExceeded {
                    key: key.to_string(),
                    requested,
                });
            }
        }

        self.used = projected;
        Ok(self.map.insert(key.to_string(), value.to_string()))
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.map.remove(key);
        if let Some(value) = &removed {
            self.used -= key.len() + value.len();
        }
        removed
    }

    fn estimate(&self) -> Result<StorageEstimate> {
        match self.capacity {
            Some(quota) => Ok(StorageEstimate {
                usage: self.used as u64,
                quota: quota as u64,
            }),
            None => Err(BridgeError::NotAvailable(
                "medium has no configured capacity".to_string(),
            )),
        }
    }
}

/// In-memory key-value medium.
///
/// Useful for tests and for hosts without durable storage. Contents are lost
/// when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<Entries>,
}

impl MemoryKeyValueStore {
    /// Create an unbounded medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a medium that refuses writes once `bytes` would be exceeded.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::with_capacity(Some(bytes))),
        }
    }

    /// Bytes currently accounted (sum of key and value lengths).
    pub fn used_bytes(&self) -> usize {
        self.entries.lock().used
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().map.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().put(key, value).map(|_| ())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().map.keys().cloned().collect())
    }
}

#[async_trait]
impl QuotaEstimator for MemoryKeyValueStore {
    async fn estimate(&self) -> Result<StorageEstimate> {
        self.entries.lock().estimate()
    }
}

/// Key-value medium persisted as a single JSON object on disk.
///
/// Every mutation rewrites the file through a temporary sibling followed by a
/// rename, so a crash never leaves a half-written file behind. A failed flush
/// rolls the in-memory change back.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileKeyValueStore {
    /// Open (or create) the store in the platform data directory.
    pub fn open_default(capacity: Option<usize>) -> Result<Self> {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join(APP_DIR_NAME);

        Self::open(data_dir.join(STORE_FILE_NAME), capacity)
    }

    /// Open (or create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>, capacity: Option<usize>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let map = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Store file is corrupt, starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = ?path, keys = map.len(), "Opened key-value store");

        Ok(Self {
            path,
            entries: Mutex::new(Entries::from_map(map, capacity)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string(map)
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to serialize store: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().map.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        let previous = entries.put(key, value)?;

        if let Err(e) = self.flush(&entries.map) {
            entries.remove(key);
            if let Some(previous) = previous {
                // Restoring a value that already fit cannot exceed capacity.
                let _ = entries.put(key, &previous);
            }
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.flush(&entries.map) {
            let _ = entries.put(key, &previous);
            return Err(e);
        }
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().map.keys().cloned().collect())
    }
}

#[async_trait]
impl QuotaEstimator for FileKeyValueStore {
    async fn estimate(&self) -> Result<StorageEstimate> {
        self.entries.lock().estimate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryKeyValueStore::new();
        store.write("a", "1").unwrap();

        assert_eq!(store.read("a").unwrap(), Some("1".to_string()));
        assert_eq!(store.list_keys().unwrap(), vec!["a".to_string()]);

        store.delete("a").unwrap();
        store.delete("a").unwrap();
        assert_eq!(store.read("a").unwrap(), None);
        assert_eq!(store.used_bytes(), 0);
    }

    #[test]
    fn test_capacity_refuses_write_and_keeps_previous_value() {
        let store = MemoryKeyValueStore::with_capacity(10);
        store.write("k", "12345").unwrap();

        let err = store.write("k", "0123456789").unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(store.read("k").unwrap(), Some("12345".to_string()));
        assert_eq!(store.used_bytes(), 6);
    }

    #[test]
    fn test_overwrite_accounts_replaced_value() {
        let store = MemoryKeyValueStore::with_capacity(10);
        store.write("k", "123456789").unwrap();
        store.write("k", "abcdefghi").unwrap();
        assert_eq!(store.used_bytes(), 10);
    }

    #[tokio::test]
    async fn test_estimate_requires_capacity() {
        let unbounded = MemoryKeyValueStore::new();
        assert!(matches!(
            unbounded.estimate().await,
            Err(BridgeError::NotAvailable(_))
        ));

        let bounded = MemoryKeyValueStore::with_capacity(100);
        bounded.write("ab", "cd").unwrap();
        let estimate = bounded.estimate().await.unwrap();
        assert_eq!(estimate, StorageEstimate { usage: 4, quota: 100 });
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let store = FileKeyValueStore::open(&path, None).unwrap();
            store.write("enhanced_quiz", "{\"value\":1}").unwrap();
            store.write("theme", "\"dark\"").unwrap();
            store.delete("theme").unwrap();
        }

        let reopened = FileKeyValueStore::open(&path, None).unwrap();
        assert_eq!(
            reopened.read("enhanced_quiz").unwrap(),
            Some("{\"value\":1}".to_string())
        );
        assert_eq!(reopened.read("theme").unwrap(), None);
    }

    #[test]
    fn test_file_store_recovers_from_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileKeyValueStore::open(&path, Some(64)).unwrap();
        assert!(store.is_empty().unwrap());
    }
}
