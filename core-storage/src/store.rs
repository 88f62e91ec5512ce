//! # Enhanced Store
//!
//! Key-value persistence with metadata, compression, obfuscation, expiry and
//! eviction on top of a plain string medium.
//!
//! Every managed value lives under `enhanced_<key>` as an encoded
//! [`StoredItem`]. When a managed write fails (encoding error, full medium)
//! the value is written as plain JSON under the bare key instead; reads fall
//! back to that slot when no managed slot exists. Plain slots carry no
//! metadata, never expire and are never evicted.
//!
//! Public operations never return errors. Failures are logged and reported
//! as `false` or as an absent value.

use crate::codec::{ItemCodec, StorageOptions, StoredItem};
use crate::config::StoreConfig;
use crate::encryption::XorCipher;
use crate::error::{Result, StorageError};
use crate::eviction::{plan_eviction, EvictionCandidate};
use crate::quota::QuotaMonitor;
use crate::stats::StorageStats;
use bridge_traits::{Clock, KeyValueStore, QuotaEstimator, SystemClock};
use core_runtime::events::{CoreEvent, EventBus, StorageEvent};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of one eviction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Items deleted
    pub removed: usize,
    /// Items the plan named but the medium refused to delete
    pub failed: usize,
    pub expired_only: bool,
}

/// Persistent store for quiz data.
///
/// # Example
///
/// ```rust,ignore
/// use core_storage::{EnhancedStore, StorageOptions};
/// use std::time::Duration;
///
/// let store = EnhancedStore::new(medium, Some(estimator));
/// store
///     .set("draft", &answers, StorageOptions::new().expires_in(Duration::from_secs(3600)))
///     .await;
///
/// let answers: Vec<String> = store.get_or("draft", Vec::new());
/// ```
pub struct EnhancedStore {
    medium: Arc<dyn KeyValueStore>,
    quota: QuotaMonitor,
    codec: ItemCodec,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    event_bus: Option<Arc<EventBus>>,
}

impl EnhancedStore {
    /// Create a store over `medium` with the default configuration.
    pub fn new(
        medium: Arc<dyn KeyValueStore>,
        quota_estimator: Option<Arc<dyn QuotaEstimator>>,
    ) -> Self {
        let config = StoreConfig::default();

        Self {
            medium,
            quota: QuotaMonitor::new(quota_estimator).with_high_water_mark(config.high_water_mark),
            codec: ItemCodec::new(XorCipher::new(&config.cipher_key)),
            config,
            clock: Arc::new(SystemClock),
            event_bus: None,
        }
    }

    /// Replace the store configuration.
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.quota = self.quota.with_high_water_mark(config.high_water_mark);
        self.codec = ItemCodec::new(XorCipher::new(&config.cipher_key));
        self.config = config;
        self
    }

    /// Set the time source used for write timestamps and expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set event bus for storage events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Store `value` under `key`.
    ///
    /// Runs an eviction pass first when usage is above the high-water mark.
    /// Returns `false` only when neither the managed nor the plain write
    /// succeeded.
    #[instrument(skip(self, value, options))]
    pub async fn set<T>(&self, key: &str, value: &T, options: StorageOptions) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        let estimate = self.quota.estimate().await;
        if !self.quota.is_available_for(&estimate) {
            warn!(
                usage = estimate.usage_bytes,
                quota = estimate.quota_bytes,
                "Storage quota nearly exhausted, evicting before write"
            );
            self.emit(StorageEvent::QuotaPressure {
                usage_bytes: estimate.usage_bytes,
                quota_bytes: estimate.quota_bytes,
            });

            if let Err(e) = self.evict() {
                warn!(error = %e, "Eviction failed, attempting write anyway");
            }
        }

        match self.write_managed(key, value, &options) {
            Ok(()) => {
                debug!("Stored managed item");
                true
            }
            Err(e) => {
                warn!(error = %e, "Managed write failed, storing plain value");
                self.emit(StorageEvent::FallbackWrite {
                    key: key.to_string(),
                    reason: e.to_string(),
                });

                match self.write_plain(key, value) {
                    Ok(()) => true,
                    Err(e) => {
                        error!(error = %e, "Failed to store value");
                        false
                    }
                }
            }
        }
    }

    fn write_managed<T>(&self, key: &str, value: &T, options: &StorageOptions) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let item = StoredItem::new(value, self.clock.unix_timestamp_millis(), options.expiry);
        let encoded = self.codec.encode(&item, options)?;
        self.medium.write(&self.config.managed_key(key), &encoded)?;
        Ok(())
    }

    fn write_plain<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(value).map_err(|e| StorageError::Encode(e.to_string()))?;

        self.medium.write(key, &json)?;

        // A stale managed slot would shadow the plain value on the next read.
        // Only dropped once the plain value is safely written.
        self.medium.delete(&self.config.managed_key(key))?;
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read the value stored under `key`.
    ///
    /// Expired items are deleted on sight. Missing, expired or undecodable
    /// values read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let managed_key = self.config.managed_key(key);

        let raw = match self.medium.read(&managed_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.read_plain(key),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read managed item");
                return None;
            }
        };

        let item: StoredItem<T> = match self.codec.decode(&raw) {
            Ok(item) => item,
            Err(e) => {
                warn!(key = %key, error = %e, "Stored item is unreadable");
                return None;
            }
        };

        if item.is_expired(self.clock.unix_timestamp_millis()) {
            debug!(key = %key, "Stored item expired");
            if let Err(e) = self.medium.delete(&managed_key) {
                warn!(key = %key, error = %e, "Failed to delete expired item");
            }
            self.emit(StorageEvent::ItemExpired {
                key: key.to_string(),
            });
            return None;
        }

        Some(item.value)
    }

    /// Read the value stored under `key`, or `default` when there is none.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    fn read_plain<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.medium.read(key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(key = %key, error = %e, "Plain value is not valid JSON");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read plain value");
                None
            }
        }
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Delete both the managed and the plain slot of `key`.
    pub fn remove(&self, key: &str) -> bool {
        let managed = self.medium.delete(&self.config.managed_key(key));
        let plain = self.medium.delete(key);

        match managed.and(plain) {
            Ok(()) => true,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to remove item");
                false
            }
        }
    }

    /// Delete every managed key. Plain slots are left alone.
    #[instrument(skip(self))]
    pub fn clear_managed(&self) -> bool {
        let keys = match self.managed_keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Failed to list stored keys");
                return false;
            }
        };

        let mut removed = 0;
        let mut ok = true;
        for key in keys {
            match self.medium.delete(&key) {
                Ok(()) => removed += 1,
                Err(e) => {
                    error!(key = %key, error = %e, "Failed to delete managed item");
                    ok = false;
                }
            }
        }

        info!(removed, "Cleared managed storage");
        self.emit(StorageEvent::Cleared { removed });
        ok
    }

    /// Run one eviction pass.
    #[instrument(skip(self))]
    pub fn reclaim(&self) -> bool {
        match self.evict() {
            Ok(report) => report.failed == 0,
            Err(e) => {
                error!(error = %e, "Eviction failed");
                false
            }
        }
    }

    /// Delete expired items, or the oldest fifth when none have expired.
    ///
    /// Items whose metadata cannot be decoded are skipped. Once the plan is
    /// made every named key is attempted, even if some deletions fail.
    pub fn evict(&self) -> Result<EvictionReport> {
        let mut candidates = Vec::new();
        for key in self.managed_keys()? {
            let raw = match self.medium.read(&key)? {
                Some(raw) => raw,
                None => continue,
            };

            match self.codec.decode_metadata(&raw) {
                Ok(metadata) => candidates.push(EvictionCandidate { key, metadata }),
                Err(e) => debug!(key = %key, error = %e, "Skipping undecodable item"),
            }
        }

        let plan = plan_eviction(candidates, self.clock.unix_timestamp_millis());

        let mut report = EvictionReport {
            expired_only: plan.expired_only,
            ..Default::default()
        };
        for key in &plan.keys {
            match self.medium.delete(key) {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to evict item");
                    report.failed += 1;
                }
            }
        }

        info!(
            removed = report.removed,
            expired_only = report.expired_only,
            "Eviction pass completed"
        );
        self.emit(StorageEvent::EvictionCompleted {
            removed: report.removed,
            expired_only: report.expired_only,
        });

        Ok(report)
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Usage, quota and key counts. Fields that cannot be read are zero.
    pub async fn stats(&self) -> StorageStats {
        let estimate = self.quota.estimate().await;

        let (item_count, managed_item_count) = match self.medium.list_keys() {
            Ok(keys) => {
                let managed = keys.iter().filter(|k| self.config.is_managed(k)).count();
                (keys.len(), managed)
            }
            Err(e) => {
                warn!(error = %e, "Failed to list stored keys");
                (0, 0)
            }
        };

        StorageStats {
            usage_bytes: estimate.usage_bytes,
            quota_bytes: estimate.quota_bytes,
            percent_used: estimate.usage_ratio() * 100.0,
            item_count,
            managed_item_count,
            calculated_at: self.clock.now(),
        }
    }

    fn managed_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .medium
            .list_keys()?
            .into_iter()
            .filter(|k| self.config.is_managed(k))
            .collect())
    }

    fn emit(&self, event: StorageEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Storage(event));
        }
    }
}

impl std::fmt::Debug for EnhancedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancedStore")
            .field("medium", &"KeyValueStore { ... }")
            .field("quota", &self.quota)
            .field("config", &self.config)
            .finish()
    }
}
