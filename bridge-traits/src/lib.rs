//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the offline quiz core and
//! platform-specific implementations. Each trait represents a capability that
//! the core requires but that must be implemented differently per platform
//! (desktop, web).
//!
//! ## Traits
//!
//! ### Persistence
//! - [`KeyValueStore`](storage::KeyValueStore) - Synchronous string key-value medium
//! - [`QuotaEstimator`](storage::QuotaEstimator) - Host storage usage/quota estimate
//! - [`CacheStorage`](cache::CacheStorage) - Named generations of cached responses
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async fetch primitive
//! - [`NetworkMonitor`](network::NetworkMonitor) - Online/offline detection
//! - [`WorkerHost`](background::WorkerHost) - Registration of the background cache worker
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ In Progress |
//! | Web      | TBD                 | 📋 Planned |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let store = config.key_value_store
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "KeyValueStore".to_string(),
//!         message: "No key-value medium provided. \
//!                  Desktop: ensure default feature is enabled. \
//!                  Web: inject a localStorage adapter.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should:
//!
//! - Report a full medium as [`BridgeError::CapacityExceeded`]
//! - Report a failed fetch (no response at all) as [`BridgeError::Network`]
//! - Convert other platform errors to `OperationFailed` with context
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds on native targets so the page
//! context and the background worker task can share implementations.

pub mod background;
pub mod cache;
pub mod error;
pub mod http;
pub mod network;
pub mod platform;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::{WorkerHost, WorkerMessage, WorkerRegistration};
pub use cache::CacheStorage;
pub use http::{
    CacheKey, HttpClient, HttpMethod, HttpRequest, HttpResponse, RequestDestination, RequestMode,
    ResponseType, RetryPolicy,
};
pub use network::{NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkStatus};
pub use platform::{PlatformSend, PlatformSendSync};
pub use storage::{KeyValueStore, QuotaEstimator, StorageEstimate};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
