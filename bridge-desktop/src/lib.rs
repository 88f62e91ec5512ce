//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides implementations of the bridge traits using
//! desktop-appropriate libraries:
//! - `KeyValueStore` + `QuotaEstimator` backed by a JSON file (`FileKeyValueStore`)
//!   or an in-memory map (`MemoryKeyValueStore`)
//! - `HttpClient` using `reqwest`
//! - `CacheStorage` kept in process memory
//! - `NetworkMonitor` using a TCP reachability probe
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileKeyValueStore, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let medium = FileKeyValueStore::open_default(Some(5 * 1024 * 1024))?;
//!     let http_client = ReqwestHttpClient::new().with_origin("https://quiz.example");
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod cache;
mod http;
mod kv_store;
mod network;

pub use cache::MemoryCacheStorage;
pub use http::ReqwestHttpClient;
pub use kv_store::{FileKeyValueStore, MemoryKeyValueStore};
pub use network::DesktopNetworkMonitor;
