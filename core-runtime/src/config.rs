//! # Core Configuration Module
//!
//! Provides configuration management for the offline quiz core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings for the core library.
//! It enforces fail-fast validation to ensure all required bridges are provided
//! before initialization.
//!
//! ## Required Dependencies
//!
//! - `KeyValueStore` - The persistent medium behind the enhanced store
//!
//! ## Optional Dependencies
//!
//! - `QuotaEstimator` - Storage usage/quota (absent means unconstrained)
//! - `HttpClient` - Network access for the cache worker (desktop default: reqwest)
//! - `CacheStorage` - Cache generations for the cache worker (desktop default: in-memory)
//! - `NetworkMonitor` - Connectivity detection (desktop default: TCP probe)
//! - `Clock` - Time source (default: system clock)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! every bridge are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .key_value_store(Arc::new(MyLocalStorage))
//!     .storage_capacity_bytes(5 * 1024 * 1024)
//!     .origin("https://quiz.example")
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! The builder validates all required dependencies and provides actionable error
//! messages when capabilities are missing:
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! // Without desktop-shims this fails: no KeyValueStore was provided
//! let err = CoreConfig::builder().build().unwrap_err();
//! assert!(err.to_string().contains("KeyValueStore"));
//! ```

use crate::error::{Error, Result};
use crate::manifest;
use bridge_traits::{
    CacheStorage, Clock, HttpClient, KeyValueStore, NetworkMonitor, QuotaEstimator, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of the offline quiz catalog snapshot (7 days).
pub const DEFAULT_OFFLINE_CATALOG_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default origin used to resolve manifest paths into full URLs.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Core configuration for the offline quiz core.
///
/// This struct holds all dependencies and settings required to initialize
/// the core library. Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Persistent key-value medium (required)
    pub key_value_store: Arc<dyn KeyValueStore>,

    /// Host storage estimate (optional, absent means unconstrained)
    pub quota_estimator: Option<Arc<dyn QuotaEstimator>>,

    /// Network access for the cache worker
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Cache generations for the cache worker
    pub cache_storage: Option<Arc<dyn CacheStorage>>,

    /// Connectivity signal
    pub network_monitor: Option<Arc<dyn NetworkMonitor>>,

    /// Time source
    pub clock: Arc<dyn Clock>,

    /// Byte capacity applied to the desktop default medium
    pub storage_capacity_bytes: Option<usize>,

    /// Offline orchestrator settings
    pub offline: OfflineSettings,

    /// Cache worker settings
    pub worker: WorkerSettings,

    /// Feature flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("key_value_store", &"KeyValueStore { ... }")
            .field(
                "quota_estimator",
                &self
                    .quota_estimator
                    .as_ref()
                    .map(|_| "QuotaEstimator { ... }"),
            )
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "cache_storage",
                &self.cache_storage.as_ref().map(|_| "CacheStorage { ... }"),
            )
            .field(
                "network_monitor",
                &self
                    .network_monitor
                    .as_ref()
                    .map(|_| "NetworkMonitor { ... }"),
            )
            .field("storage_capacity_bytes", &self.storage_capacity_bytes)
            .field("offline", &self.offline)
            .field("worker", &self.worker)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Run the background cache worker (requires HttpClient and CacheStorage)
    pub enable_cache_worker: bool,

    /// Watch connectivity and sync queued results on reconnect
    /// (requires NetworkMonitor)
    pub enable_connectivity_watch: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_cache_worker: true,
            enable_connectivity_watch: false,
        }
    }
}

/// Offline orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineSettings {
    /// Lifetime of the catalog snapshot taken by `enable_offline_mode`
    pub catalog_ttl: Duration,
}

impl Default for OfflineSettings {
    fn default() -> Self {
        Self {
            catalog_ttl: DEFAULT_OFFLINE_CATALOG_TTL,
        }
    }
}

/// Background cache worker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Cache generation name of this build
    pub cache_version: String,
    /// Origin that manifest paths resolve against
    pub origin: String,
    /// Paths fetched during install
    pub precache: Vec<String>,
    /// Navigation fallback path
    pub offline_url: String,
    /// Image fallback path
    pub placeholder_url: String,
    /// URL marker selecting network-first routing
    pub api_path_marker: String,
    /// Schemes that are never intercepted
    pub disallowed_schemes: Vec<String>,
    /// Activate a newly installed version without waiting for `SkipWaiting`
    pub skip_waiting_on_install: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            cache_version: manifest::CACHE_VERSION.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            precache: manifest::PRECACHE_MANIFEST
                .iter()
                .map(|p| p.to_string())
                .collect(),
            offline_url: manifest::OFFLINE_URL.to_string(),
            placeholder_url: manifest::PLACEHOLDER_URL.to_string(),
            api_path_marker: manifest::API_PATH_MARKER.to_string(),
            disallowed_schemes: manifest::DISALLOWED_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_waiting_on_install: false,
        }
    }
}

impl WorkerSettings {
    /// Full URL of a manifest path under the configured origin.
    pub fn resolve(&self, path: &str) -> String {
        manifest::resolve(&self.origin, path)
    }

    /// Validates the worker settings.
    pub fn validate(&self) -> Result<()> {
        if self.cache_version.trim().is_empty() {
            return Err(Error::Config("Cache version cannot be empty".to_string()));
        }

        if !self.origin.starts_with("http://") && !self.origin.starts_with("https://") {
            return Err(Error::Config(format!(
                "Origin must be an http(s) URL, got '{}'",
                self.origin
            )));
        }

        if self.api_path_marker.is_empty() {
            return Err(Error::Config("API path marker cannot be empty".to_string()));
        }

        for fallback in [&self.offline_url, &self.placeholder_url] {
            if !self.precache.iter().any(|p| p == fallback) {
                return Err(Error::Config(format!(
                    "Fallback '{}' must be part of the precache manifest",
                    fallback
                )));
            }
        }

        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Storage capacity and catalog lifetime are non-zero
    /// - Worker settings are consistent
    /// - Feature flags are consistent with available bridges
    pub fn validate(&self) -> Result<()> {
        if self.storage_capacity_bytes == Some(0) {
            return Err(Error::Config(
                "Storage capacity must be greater than 0 bytes".to_string(),
            ));
        }

        if self.offline.catalog_ttl.is_zero() {
            return Err(Error::Config(
                "Offline catalog TTL must be greater than zero".to_string(),
            ));
        }

        self.worker.validate()?;

        if self.features.enable_cache_worker && self.http_client.is_none() {
            return Err(Error::Config(
                "Cache worker enabled but no HttpClient provided. \
                 Disable the feature or inject an HttpClient implementation."
                    .to_string(),
            ));
        }

        if self.features.enable_cache_worker && self.cache_storage.is_none() {
            return Err(Error::Config(
                "Cache worker enabled but no CacheStorage provided. \
                 Disable the feature or inject a CacheStorage implementation."
                    .to_string(),
            ));
        }

        if self.features.enable_connectivity_watch && self.network_monitor.is_none() {
            return Err(Error::Config(
                "Connectivity watch enabled but no NetworkMonitor provided. \
                 Disable the feature or inject a NetworkMonitor implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn key_value_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "KeyValueStore".to_string(),
        message: "KeyValueStore implementation is required for offline persistence. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default FileKeyValueStore. \
                 Web: inject a localStorage-backed store."
            .to_string(),
    }
}

/// Medium plus the estimator it doubles as.
type DefaultMedium = (Arc<dyn KeyValueStore>, Option<Arc<dyn QuotaEstimator>>);

#[cfg(feature = "desktop-shims")]
fn provide_default_medium(path: Option<&PathBuf>, capacity: Option<usize>) -> Result<DefaultMedium> {
    use bridge_desktop::FileKeyValueStore;

    let store = match path {
        Some(path) => FileKeyValueStore::open(path.clone(), capacity),
        None => FileKeyValueStore::open_default(capacity),
    }
    .map_err(|e| Error::Internal(format!("Failed to open default KeyValueStore: {}", e)))?;

    let store = Arc::new(store);
    let estimator = match capacity {
        Some(_) => Some(store.clone() as Arc<dyn QuotaEstimator>),
        None => None,
    };
    Ok((store as Arc<dyn KeyValueStore>, estimator))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_medium(
    _path: Option<&PathBuf>,
    _capacity: Option<usize>,
) -> Result<DefaultMedium> {
    Err(key_value_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(origin: &str) -> Option<Arc<dyn HttpClient>> {
    Some(Arc::new(
        bridge_desktop::ReqwestHttpClient::new().with_origin(origin),
    ))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_origin: &str) -> Option<Arc<dyn HttpClient>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_cache_storage() -> Option<Arc<dyn CacheStorage>> {
    Some(Arc::new(bridge_desktop::MemoryCacheStorage::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_cache_storage() -> Option<Arc<dyn CacheStorage>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_network_monitor() -> Option<Arc<dyn NetworkMonitor>> {
    Some(Arc::new(bridge_desktop::DesktopNetworkMonitor::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_network_monitor() -> Option<Arc<dyn NetworkMonitor>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](CoreConfigBuilder::build) to create the final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    key_value_store: Option<Arc<dyn KeyValueStore>>,
    quota_estimator: Option<Arc<dyn QuotaEstimator>>,
    http_client: Option<Arc<dyn HttpClient>>,
    cache_storage: Option<Arc<dyn CacheStorage>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    clock: Option<Arc<dyn Clock>>,
    storage_path: Option<PathBuf>,
    storage_capacity_bytes: Option<usize>,
    offline: OfflineSettings,
    worker: WorkerSettings,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the persistent key-value medium (required unless `desktop-shims`).
    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.key_value_store = Some(store);
        self
    }

    /// Sets the quota estimator.
    ///
    /// Without one the store treats capacity as unconstrained, unless the
    /// desktop default medium is used with a capacity.
    pub fn quota_estimator(mut self, estimator: Arc<dyn QuotaEstimator>) -> Self {
        self.quota_estimator = Some(estimator);
        self
    }

    /// Sets the HTTP client used by the cache worker.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the cache storage used by the cache worker.
    pub fn cache_storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.cache_storage = Some(storage);
        self
    }

    /// Sets the network monitor.
    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    /// Sets the time source. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// File used by the desktop default medium.
    ///
    /// Default: `<data dir>/quiz-offline-core/offline-store.json`
    pub fn storage_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Byte capacity of the desktop default medium.
    pub fn storage_capacity_bytes(mut self, bytes: usize) -> Self {
        self.storage_capacity_bytes = Some(bytes);
        self
    }

    /// Lifetime of the offline catalog snapshot. Default: 7 days.
    pub fn offline_catalog_ttl(mut self, ttl: Duration) -> Self {
        self.offline.catalog_ttl = ttl;
        self
    }

    /// Origin that precache paths and fallbacks resolve against.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.worker.origin = origin.into();
        self
    }

    /// Cache generation name of this build.
    pub fn cache_version(mut self, version: impl Into<String>) -> Self {
        self.worker.cache_version = version.into();
        self
    }

    /// Activate new worker versions immediately after install.
    ///
    /// Default: false
    pub fn skip_waiting_on_install(mut self, enabled: bool) -> Self {
        self.worker.skip_waiting_on_install = enabled;
        self
    }

    /// Replace all worker settings at once.
    pub fn worker_settings(mut self, settings: WorkerSettings) -> Self {
        self.worker = settings;
        self
    }

    /// Enables or disables the background cache worker.
    ///
    /// Default: true
    pub fn enable_cache_worker(mut self, enabled: bool) -> Self {
        self.features.enable_cache_worker = enabled;
        self
    }

    /// Enables or disables the connectivity watch.
    ///
    /// Requires a `NetworkMonitor` to be provided.
    ///
    /// Default: false
    pub fn enable_connectivity_watch(mut self, enabled: bool) -> Self {
        self.features.enable_connectivity_watch = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - The key-value medium is missing and no desktop default exists
    /// - Configuration values are invalid
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let (key_value_store, default_estimator) = match self.key_value_store {
            Some(store) => (store, None),
            None => provide_default_medium(self.storage_path.as_ref(), self.storage_capacity_bytes)?,
        };

        let http_client = self
            .http_client
            .or_else(|| provide_default_http_client(&self.worker.origin));

        let config = CoreConfig {
            key_value_store,
            quota_estimator: self.quota_estimator.or(default_estimator),
            http_client,
            cache_storage: self.cache_storage.or_else(provide_default_cache_storage),
            network_monitor: self.network_monitor.or_else(provide_default_network_monitor),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            storage_capacity_bytes: self.storage_capacity_bytes,
            offline: self.offline,
            worker: self.worker,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{
        cache::CacheStorage,
        error::Result as BridgeResult,
        http::{CacheKey, HttpRequest, HttpResponse},
        network::{NetworkChangeStream, NetworkInfo},
        BridgeError,
    };

    struct NullStore;

    impl KeyValueStore for NullStore {
        fn read(&self, _key: &str) -> BridgeResult<Option<String>> {
            Ok(None)
        }

        fn write(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }

        fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct NullHttp;

    #[async_trait]
    impl HttpClient for NullHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Err(BridgeError::Network("offline".to_string()))
        }
    }

    struct NullCaches;

    #[async_trait]
    impl CacheStorage for NullCaches {
        async fn cache_names(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn open(&self, _name: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn delete_cache(&self, _name: &str) -> BridgeResult<bool> {
            Ok(false)
        }

        async fn lookup(&self, _name: &str, _key: &CacheKey) -> BridgeResult<Option<HttpResponse>> {
            Ok(None)
        }

        async fn put(&self, _name: &str, _key: CacheKey, _response: HttpResponse) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct NullMonitor;

    #[async_trait]
    impl NetworkMonitor for NullMonitor {
        async fn get_network_info(&self) -> BridgeResult<NetworkInfo> {
            Ok(NetworkInfo::online())
        }

        async fn subscribe_changes(&self) -> BridgeResult<Box<dyn NetworkChangeStream>> {
            Err(BridgeError::NotAvailable("static".to_string()))
        }
    }

    fn full_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .key_value_store(Arc::new(NullStore))
            .http_client(Arc::new(NullHttp))
            .cache_storage(Arc::new(NullCaches))
            .network_monitor(Arc::new(NullMonitor))
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_key_value_store() {
        let err = CoreConfig::builder().build().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("KeyValueStore"));
        assert!(msg.contains("offline persistence"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = CoreConfig::builder()
            .storage_path(dir.path().join("store.json"))
            .storage_capacity_bytes(1024)
            .build()
            .unwrap();

        config.key_value_store.write("k", "v").unwrap();
        assert_eq!(config.key_value_store.read("k").unwrap().as_deref(), Some("v"));
        assert!(config.quota_estimator.is_some());
        assert!(config.http_client.is_some());
        assert!(config.cache_storage.is_some());
    }

    #[test]
    fn test_builder_with_all_bridges() {
        let config = full_builder().build().unwrap();

        assert!(config.quota_estimator.is_none());
        assert_eq!(config.offline.catalog_ttl, DEFAULT_OFFLINE_CATALOG_TTL);
        assert_eq!(config.worker.cache_version, manifest::CACHE_VERSION);
        assert!(!config.worker.skip_waiting_on_install);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let err = full_builder().storage_capacity_bytes(0).build().unwrap_err();
        assert!(err.to_string().contains("Storage capacity"));
    }

    #[test]
    fn test_validate_rejects_zero_catalog_ttl() {
        let err = full_builder()
            .offline_catalog_ttl(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("catalog TTL"));
    }

    #[test]
    fn test_validate_rejects_unlisted_fallback() {
        let settings = WorkerSettings {
            precache: vec!["/".to_string(), "/offline".to_string()],
            ..WorkerSettings::default()
        };
        let err = full_builder().worker_settings(settings).build().unwrap_err();
        assert!(err.to_string().contains("/placeholder.svg"));
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        let err = full_builder().origin("quiz.example").build().unwrap_err();
        assert!(err.to_string().contains("Origin"));
    }

    #[test]
    fn test_connectivity_watch_requires_monitor() {
        let config = CoreConfig {
            network_monitor: None,
            ..full_builder().build().unwrap()
        };
        let with_watch = CoreConfig {
            features: FeatureFlags {
                enable_connectivity_watch: true,
                ..FeatureFlags::default()
            },
            ..config
        };
        let err = with_watch.validate().unwrap_err();
        assert!(err.to_string().contains("NetworkMonitor"));
    }

    #[test]
    fn test_cache_worker_can_be_disabled_without_bridges() {
        let config = CoreConfig {
            http_client: None,
            cache_storage: None,
            ..full_builder().enable_cache_worker(false).build().unwrap()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_worker_settings_resolve() {
        let settings = WorkerSettings {
            origin: "https://quiz.example/".to_string(),
            ..WorkerSettings::default()
        };
        assert_eq!(settings.resolve("/offline"), "https://quiz.example/offline");
    }

    #[test]
    fn test_debug_redacts_bridges() {
        let config = full_builder().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("KeyValueStore { ... }"));
        assert!(debug.contains("quiz-offline-v1"));
    }
}
