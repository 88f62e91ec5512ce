//! # Core Worker
//!
//! The background cache worker: a task that sits between the page and the
//! network, precaches the application shell and keeps it usable offline.
//!
//! ## Overview
//!
//! - **Install**: fetch every manifest asset into a cache generation named
//!   after the worker version. Any failure discards the whole install.
//! - **Activate**: delete every other generation.
//! - **Fetch**: API calls go network-first with a `503` offline answer;
//!   everything else goes cache-first, with the offline page for navigations,
//!   a placeholder for images and a `408` answer otherwise.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_worker::{spawn_worker, CacheCoordinator};
//! use bridge_traits::HttpRequest;
//!
//! let (worker, _task) = spawn_worker(CacheCoordinator::new(http, caches, settings));
//! worker.register().await?;
//!
//! let outcome = worker.fetch(HttpRequest::navigate("http://localhost:3000/quiz/1")).await;
//! ```

pub mod actor;
pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod response;
pub mod strategy;

pub use actor::{spawn_worker, WorkerHandle};
pub use coordinator::{CacheCoordinator, FetchHandler};
pub use error::{Result, WorkerError};
pub use lifecycle::WorkerState;
pub use response::{FetchOutcome, SyntheticKind, SyntheticResponse};
pub use strategy::{Route, RoutePolicy};
