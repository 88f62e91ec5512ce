//! Storage quota monitoring

use crate::config::QUOTA_HIGH_WATER_MARK;
use bridge_traits::QuotaEstimator;
use std::sync::Arc;
use tracing::debug;

/// Usage and quota of the storage medium, in bytes.
///
/// A quota of 0 means the host did not report one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaEstimate {
    pub usage_bytes: u64,
    pub quota_bytes: u64,
}

impl QuotaEstimate {
    /// `usage / quota`, or 0 when no quota is known.
    pub fn usage_ratio(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 0.0;
        }

        self.usage_bytes as f64 / self.quota_bytes as f64
    }

    /// Whether usage is below `high_water_mark` of the quota.
    ///
    /// An unknown quota is treated as unconstrained.
    pub fn is_below(&self, high_water_mark: f64) -> bool {
        self.quota_bytes == 0 || (self.usage_bytes as f64) < self.quota_bytes as f64 * high_water_mark
    }
}

/// Reads the host's storage estimate.
#[derive(Clone)]
pub struct QuotaMonitor {
    estimator: Option<Arc<dyn QuotaEstimator>>,
    high_water_mark: f64,
}

impl QuotaMonitor {
    pub fn new(estimator: Option<Arc<dyn QuotaEstimator>>) -> Self {
        Self {
            estimator,
            high_water_mark: QUOTA_HIGH_WATER_MARK,
        }
    }

    pub fn with_high_water_mark(mut self, ratio: f64) -> Self {
        self.high_water_mark = ratio;
        self
    }

    /// Current estimate. Missing or failing estimators report `{0, 0}`.
    pub async fn estimate(&self) -> QuotaEstimate {
        let Some(estimator) = &self.estimator else {
            return QuotaEstimate::default();
        };

        match estimator.estimate().await {
            Ok(raw) => QuotaEstimate {
                usage_bytes: raw.usage,
                quota_bytes: raw.quota,
            },
            Err(e) => {
                debug!(error = %e, "Storage estimate unavailable, treating quota as unconstrained");
                QuotaEstimate::default()
            }
        }
    }

    /// Whether a write may proceed without eviction.
    pub async fn is_available(&self) -> bool {
        self.is_available_for(&self.estimate().await)
    }

    pub fn is_available_for(&self, estimate: &QuotaEstimate) -> bool {
        estimate.is_below(self.high_water_mark)
    }
}

impl std::fmt::Debug for QuotaMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaMonitor")
            .field(
                "estimator",
                &self.estimator.as_ref().map(|_| "QuotaEstimator { ... }"),
            )
            .field("high_water_mark", &self.high_water_mark)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{BridgeError, StorageEstimate};
    use mockall::mock;

    mock! {
        Estimator {}

        #[async_trait::async_trait]
        impl QuotaEstimator for Estimator {
            async fn estimate(&self) -> bridge_traits::error::Result<StorageEstimate>;
        }
    }

    fn monitor_reporting(usage: u64, quota: u64) -> QuotaMonitor {
        let mut estimator = MockEstimator::new();
        estimator
            .expect_estimate()
            .returning(move || Ok(StorageEstimate { usage, quota }));
        QuotaMonitor::new(Some(Arc::new(estimator)))
    }

    #[tokio::test]
    async fn test_missing_estimator_is_unconstrained() {
        let monitor = QuotaMonitor::new(None);

        assert_eq!(monitor.estimate().await, QuotaEstimate::default());
        assert!(monitor.is_available().await);
    }

    #[tokio::test]
    async fn test_failing_estimator_is_unconstrained() {
        let mut estimator = MockEstimator::new();
        estimator
            .expect_estimate()
            .returning(|| Err(BridgeError::NotAvailable("storage.estimate".to_string())));
        let monitor = QuotaMonitor::new(Some(Arc::new(estimator)));

        assert_eq!(monitor.estimate().await, QuotaEstimate::default());
        assert!(monitor.is_available().await);
    }

    #[tokio::test]
    async fn test_high_water_mark() {
        assert!(monitor_reporting(899, 1000).is_available().await);
        assert!(!monitor_reporting(900, 1000).is_available().await);
        assert!(!monitor_reporting(1000, 1000).is_available().await);
        assert!(monitor_reporting(5000, 0).is_available().await);
    }

    #[tokio::test]
    async fn test_custom_high_water_mark() {
        let monitor = monitor_reporting(600, 1000).with_high_water_mark(0.5);
        assert!(!monitor.is_available().await);
    }

    #[test]
    fn test_usage_ratio() {
        let estimate = QuotaEstimate {
            usage_bytes: 250,
            quota_bytes: 1000,
        };
        assert_eq!(estimate.usage_ratio(), 0.25);
        assert_eq!(QuotaEstimate::default().usage_ratio(), 0.0);
    }
}
