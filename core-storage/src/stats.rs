//! Storage statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of storage usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Bytes used, as reported by the host estimate
    pub usage_bytes: u64,

    /// Bytes granted by the host, 0 when unknown
    pub quota_bytes: u64,

    /// `usage / quota` as a percentage (0 to 100)
    pub percent_used: f64,

    /// Keys held by the medium
    pub item_count: usize,

    /// Keys carrying the managed prefix
    pub managed_item_count: usize,

    /// When the snapshot was taken
    pub calculated_at: DateTime<Utc>,
}

impl StorageStats {
    /// Keys written without metadata, outside the managed keyspace.
    pub fn unmanaged_item_count(&self) -> usize {
        self.item_count.saturating_sub(self.managed_item_count)
    }

    /// Returns true if usage is above 90% of a known quota.
    pub fn is_near_capacity(&self) -> bool {
        self.quota_bytes > 0 && self.percent_used > 90.0
    }
}
