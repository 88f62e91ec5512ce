//! # Event Bus System
//!
//! Provides an event-driven architecture for the offline quiz core using `tokio::sync::broadcast`.
//! This module enables decoupled communication between core modules through typed events.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for different domains
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   emit    ┌───────────┐
//! │ Enhanced Store ├──────────>│           │
//! └────────────────┘           │           │
//!                              │ EventBus  │
//! ┌────────────────┐   emit    │ (broadcast│   subscribe   ┌────────────┐
//! │  Orchestrator  ├──────────>│  channel) ├──────────────>│ Subscriber │
//! └────────────────┘           │           │               └────────────┘
//!                              │           │
//! ┌────────────────┐   emit    │           │
//! │  Cache Worker  ├──────────>│           │
//! └────────────────┘           └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, OfflineEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Offline(OfflineEvent::ConnectivityChanged { online: false }))
//!     .ok();
//! ```
//!
//! ## Error Handling
//!
//! The event bus uses `tokio::sync::broadcast`, which can produce two types of errors:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting with no subscribers returns an error that publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Enhanced store events
    Storage(StorageEvent),
    /// Offline mode and result queue events
    Offline(OfflineEvent),
    /// Background cache worker events
    Worker(WorkerEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Storage(e) => e.description(),
            CoreEvent::Offline(e) => e.description(),
            CoreEvent::Worker(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Offline(OfflineEvent::SyncFailed { .. }) => EventSeverity::Error,
            CoreEvent::Worker(WorkerEvent::InstallFailed { .. }) => EventSeverity::Error,
            CoreEvent::Storage(StorageEvent::FallbackWrite { .. }) => EventSeverity::Warning,
            CoreEvent::Storage(StorageEvent::QuotaPressure { .. }) => EventSeverity::Warning,
            CoreEvent::Offline(OfflineEvent::ModeEnabled { .. })
            | CoreEvent::Offline(OfflineEvent::ModeDisabled { .. })
            | CoreEvent::Offline(OfflineEvent::SyncCompleted { .. })
            | CoreEvent::Worker(WorkerEvent::StateChanged { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Storage Events
// ============================================================================

/// Events emitted by the enhanced store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum StorageEvent {
    /// Usage crossed the high-water mark before a write.
    QuotaPressure {
        usage_bytes: u64,
        quota_bytes: u64,
    },
    /// The managed write failed and the value was stored as plain JSON.
    FallbackWrite {
        key: String,
        /// Why the managed write failed
        reason: String,
    },
    /// A read found an expired item and deleted it.
    ItemExpired { key: String },
    /// An eviction pass finished.
    EvictionCompleted {
        /// Number of items deleted
        removed: usize,
        /// Whether only expired items were deleted
        expired_only: bool,
    },
    /// Every managed key was removed.
    Cleared { removed: usize },
}

impl StorageEvent {
    fn description(&self) -> &str {
        match self {
            StorageEvent::QuotaPressure { .. } => "Storage quota high-water mark reached",
            StorageEvent::FallbackWrite { .. } => "Stored value without metadata",
            StorageEvent::ItemExpired { .. } => "Expired item removed",
            StorageEvent::EvictionCompleted { .. } => "Eviction pass completed",
            StorageEvent::Cleared { .. } => "Managed storage cleared",
        }
    }
}

// ============================================================================
// Offline Events
// ============================================================================

/// Events emitted by the offline orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum OfflineEvent {
    /// Offline mode switched on after a catalog snapshot.
    ModeEnabled { quiz_count: usize },
    /// Offline mode switched off after flushing queued results.
    ModeDisabled { synced_results: usize },
    /// A quiz result was queued while offline.
    ResultQueued { result_id: String, queue_len: usize },
    /// Queued results were handed to the result sink.
    SyncCompleted { synced_results: usize },
    /// Flushing queued results failed; the queue is untouched.
    SyncFailed { message: String },
    /// The connectivity signal changed.
    ConnectivityChanged { online: bool },
}

impl OfflineEvent {
    fn description(&self) -> &str {
        match self {
            OfflineEvent::ModeEnabled { .. } => "Offline mode enabled",
            OfflineEvent::ModeDisabled { .. } => "Offline mode disabled",
            OfflineEvent::ResultQueued { .. } => "Quiz result queued",
            OfflineEvent::SyncCompleted { .. } => "Offline results synced",
            OfflineEvent::SyncFailed { .. } => "Offline result sync failed",
            OfflineEvent::ConnectivityChanged { .. } => "Connectivity changed",
        }
    }
}

// ============================================================================
// Worker Events
// ============================================================================

/// Events emitted by the background cache worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum WorkerEvent {
    /// A worker version moved to a new lifecycle state.
    StateChanged { version: String, state: String },
    /// Precaching failed; the version became redundant.
    InstallFailed { version: String, message: String },
    /// An outdated cache generation was deleted during activation.
    GenerationDeleted { name: String },
    /// A request was answered by a fallback instead of the network.
    FallbackServed { url: String, kind: String },
}

impl WorkerEvent {
    fn description(&self) -> &str {
        match self {
            WorkerEvent::StateChanged { .. } => "Worker state changed",
            WorkerEvent::InstallFailed { .. } => "Worker install failed",
            WorkerEvent::GenerationDeleted { .. } => "Old cache generation deleted",
            WorkerEvent::FallbackServed { .. } => "Offline fallback served",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let worker_events = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Worker(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
