//! # Core Storage
//!
//! Enhanced key-value persistence for offline quiz data.
//!
//! ## Overview
//!
//! The host only offers a small synchronous string medium (`localStorage` on
//! the web, a JSON file on desktop). This crate layers on top of it:
//! - Metadata per item (write time, optional absolute expiry)
//! - LZ4 compression, on by default
//! - Optional value obfuscation with an integrity tag
//! - Lazy expiry on read
//! - Quota-aware eviction before writes
//! - Plain-JSON fallback writes when the managed write fails
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │     EnhancedStore                      │
//! │  - set() / get() / get_or()            │
//! │  - remove() / clear_managed()          │
//! │  - reclaim() / stats()                 │
//! └────────┬───────────────────────────────┘
//!          │
//!          ├──> ItemCodec (JSON → LZ4 → XOR)
//!          ├──> QuotaMonitor (QuotaEstimator)
//!          ├──> plan_eviction (pure)
//!          └──> KeyValueStore (medium)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_storage::{EnhancedStore, StorageOptions};
//! use std::sync::Arc;
//!
//! # async fn example(store: &EnhancedStore) {
//! store.set("last_category", "geography", StorageOptions::default()).await;
//!
//! let category: Option<String> = store.get("last_category");
//!
//! let stats = store.stats().await;
//! println!("{} of {} bytes used", stats.usage_bytes, stats.quota_bytes);
//! # }
//! ```

pub mod codec;
pub mod compression;
pub mod config;
pub mod encryption;
pub mod error;
pub mod eviction;
pub mod quota;
pub mod stats;
pub mod store;

pub use codec::{ItemCodec, ItemMetadata, StorageOptions, StoredItem};
pub use config::{StoreConfig, DEFAULT_CIPHER_KEY, MANAGED_KEY_PREFIX, QUOTA_HIGH_WATER_MARK};
pub use encryption::XorCipher;
pub use error::{Result, StorageError};
pub use eviction::{plan_eviction, EvictionCandidate, EvictionPlan};
pub use quota::{QuotaEstimate, QuotaMonitor};
pub use stats::StorageStats;
pub use store::{EnhancedStore, EvictionReport};
