//! # Offline Orchestrator
//!
//! Moves the application in and out of offline mode.
//!
//! ## Workflow
//!
//! ### Enable
//! 1. Snapshot the quiz catalog into `offline_quizzes` (compressed, 7-day expiry)
//! 2. Register the background cache worker so it warms its cache (best effort)
//! 3. Set the offline flag
//!
//! ### Disable
//! 1. Submit every queued result to the `ResultSink`
//! 2. Remove the submitted results from `offline_results`
//! 3. Clear the offline flag
//!
//! Both directions are all-or-nothing: if a persistence or sync step fails
//! the flag keeps its previous value and the call returns `false`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_offline::OfflineOrchestrator;
//!
//! # async fn example(orchestrator: &OfflineOrchestrator) {
//! if orchestrator.enable_offline_mode().await {
//!     let quizzes = orchestrator.queued_quizzes();
//!     println!("{} quizzes available offline", quizzes.len());
//! }
//!
//! orchestrator
//!     .record_offline_result(&serde_json::json!({"quizId": "geo-1", "score": 9}))
//!     .await;
//! # }
//! ```

use crate::catalog::{OfflineQuiz, QuizCatalog};
use crate::error::{OfflineError, Result};
use crate::results::QueuedResult;
use crate::sync::{NoopResultSink, ResultSink};
use bridge_traits::{Clock, NetworkChangeStream, NetworkMonitor, SystemClock, WorkerHost};
use core_runtime::config::OfflineSettings;
use core_runtime::events::{CoreEvent, EventBus, OfflineEvent};
use core_runtime::manifest::{OFFLINE_QUIZZES_KEY, OFFLINE_RESULTS_KEY};
use core_storage::{EnhancedStore, StorageOptions};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Coordinates offline mode for one application instance.
pub struct OfflineOrchestrator {
    store: Arc<EnhancedStore>,
    catalog: Arc<dyn QuizCatalog>,
    sink: Arc<dyn ResultSink>,
    worker_host: Option<Arc<dyn WorkerHost>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    clock: Arc<dyn Clock>,
    settings: OfflineSettings,
    event_bus: Option<Arc<EventBus>>,
    offline_mode: AtomicBool,
}

impl OfflineOrchestrator {
    /// Create an orchestrator persisting into `store` and snapshotting `catalog`.
    ///
    /// Results are synced into a [`NoopResultSink`] until another sink is set.
    pub fn new(store: Arc<EnhancedStore>, catalog: Arc<dyn QuizCatalog>) -> Self {
        Self {
            store,
            catalog,
            sink: Arc::new(NoopResultSink),
            worker_host: None,
            network_monitor: None,
            clock: Arc::new(SystemClock),
            settings: OfflineSettings::default(),
            event_bus: None,
            offline_mode: AtomicBool::new(false),
        }
    }

    pub fn with_result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Set the host used to register the background cache worker.
    pub fn with_worker_host(mut self, host: Arc<dyn WorkerHost>) -> Self {
        self.worker_host = Some(host);
        self
    }

    pub fn with_network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings(mut self, settings: OfflineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set event bus for offline events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Whether offline mode is currently enabled.
    pub fn is_offline_mode(&self) -> bool {
        self.offline_mode.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Mode switching
    // ========================================================================

    /// Snapshot the catalog, warm the worker cache and enter offline mode.
    ///
    /// Calling it again takes a fresh snapshot.
    #[instrument(skip(self))]
    pub async fn enable_offline_mode(&self) -> bool {
        let quiz_count = match self.snapshot_catalog().await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "Failed to enable offline mode");
                return false;
            }
        };

        self.register_worker().await;

        self.offline_mode.store(true, Ordering::SeqCst);
        info!(quiz_count, "Offline mode enabled");
        self.emit(OfflineEvent::ModeEnabled { quiz_count });
        true
    }

    /// Sync queued results and leave offline mode.
    ///
    /// Offline mode stays on when the sync fails.
    #[instrument(skip(self))]
    pub async fn disable_offline_mode(&self) -> bool {
        match self.flush_results().await {
            Ok(synced_results) => {
                self.offline_mode.store(false, Ordering::SeqCst);
                info!(synced_results, "Offline mode disabled");
                self.emit(OfflineEvent::ModeDisabled { synced_results });
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to disable offline mode");
                self.emit(OfflineEvent::SyncFailed {
                    message: e.to_string(),
                });
                false
            }
        }
    }

    async fn snapshot_catalog(&self) -> Result<usize> {
        let quizzes = self.catalog.list_quizzes().await?;
        let saved_at = self.clock.unix_timestamp_millis();

        let snapshot: Vec<OfflineQuiz> = quizzes
            .into_iter()
            .map(|quiz| OfflineQuiz::from_quiz(quiz, saved_at))
            .collect();

        let options = StorageOptions::new()
            .compress(true)
            .expires_in(self.settings.catalog_ttl);

        if !self.store.set(OFFLINE_QUIZZES_KEY, &snapshot, options).await {
            return Err(OfflineError::Persist(OFFLINE_QUIZZES_KEY.to_string()));
        }

        Ok(snapshot.len())
    }

    async fn register_worker(&self) {
        let Some(host) = &self.worker_host else {
            debug!("No worker host, skipping cache warm-up");
            return;
        };

        match host.register().await {
            Ok(registration) => info!(
                version = %registration.version,
                active = registration.active,
                "Cache worker registered"
            ),
            Err(e) => warn!(error = %e, "Cache worker registration failed"),
        }
    }

    // ========================================================================
    // Catalog and results
    // ========================================================================

    /// Quizzes saved by the last successful `enable_offline_mode`, if the
    /// snapshot has not expired.
    pub fn queued_quizzes(&self) -> Vec<OfflineQuiz> {
        self.store.get_or(OFFLINE_QUIZZES_KEY, Vec::new())
    }

    /// Results waiting to be synced.
    pub fn queued_results(&self) -> Vec<QueuedResult> {
        self.store.get_or(OFFLINE_RESULTS_KEY, Vec::new())
    }

    /// Append a quiz result to the offline queue.
    ///
    /// The queue is read, extended and written back; two overlapping calls
    /// can lose one of the results.
    #[instrument(skip(self, result))]
    pub async fn record_offline_result<T>(&self, result: &T) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        let payload = match serde_json::to_value(result) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Quiz result is not serializable");
                return false;
            }
        };

        let entry = QueuedResult::new(payload, self.clock.unix_timestamp_millis());
        let result_id = entry.offline_id.clone();

        let mut queue = self.queued_results();
        queue.push(entry);
        let queue_len = queue.len();

        if !self
            .store
            .set(OFFLINE_RESULTS_KEY, &queue, StorageOptions::default())
            .await
        {
            error!("Failed to persist offline result");
            return false;
        }

        debug!(result_id = %result_id, queue_len, "Queued offline result");
        self.emit(OfflineEvent::ResultQueued {
            result_id,
            queue_len,
        });
        true
    }

    /// Submit queued results and remove them from the queue.
    ///
    /// An empty queue counts as a successful sync.
    #[instrument(skip(self))]
    pub async fn sync_offline_results(&self) -> bool {
        match self.flush_results().await {
            Ok(synced_results) => {
                self.emit(OfflineEvent::SyncCompleted { synced_results });
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to sync offline results");
                self.emit(OfflineEvent::SyncFailed {
                    message: e.to_string(),
                });
                false
            }
        }
    }

    async fn flush_results(&self) -> Result<usize> {
        let queued = self.queued_results();
        if queued.is_empty() {
            return Ok(0);
        }

        let submitted: HashSet<String> = queued.iter().map(|r| r.offline_id.clone()).collect();
        self.sink.submit(queued).await?;

        // Results queued while the sink was busy stay in the queue
        let remaining: Vec<QueuedResult> = self
            .queued_results()
            .into_iter()
            .filter(|r| !submitted.contains(&r.offline_id))
            .collect();

        if !self
            .store
            .set(OFFLINE_RESULTS_KEY, &remaining, StorageOptions::default())
            .await
        {
            return Err(OfflineError::Persist(OFFLINE_RESULTS_KEY.to_string()));
        }

        info!(synced = submitted.len(), remaining = remaining.len(), "Synced offline results");
        Ok(submitted.len())
    }

    // ========================================================================
    // Connectivity
    // ========================================================================

    /// Whether the host currently reports connectivity. Unknown counts as online.
    pub async fn is_online(&self) -> bool {
        match &self.network_monitor {
            Some(monitor) => monitor.is_connected().await,
            None => true,
        }
    }

    /// Stream of connectivity changes, `None` when no monitor is available.
    ///
    /// Drop the stream to unsubscribe.
    pub async fn subscribe_connectivity(&self) -> Option<Box<dyn NetworkChangeStream>> {
        let monitor = self.network_monitor.as_ref()?;

        match monitor.subscribe_changes().await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, "Connectivity changes unavailable");
                None
            }
        }
    }

    /// Follow connectivity until the monitor's stream ends, syncing queued
    /// results every time the device comes back online.
    pub async fn watch_connectivity(&self) {
        let Some(mut changes) = self.subscribe_connectivity().await else {
            return;
        };

        let mut online = self.is_online().await;
        info!(online, "Watching connectivity");

        while let Some(change) = changes.next().await {
            let now_online = change.status.is_online();
            if now_online == online {
                continue;
            }
            online = now_online;

            info!(online, "Connectivity changed");
            self.emit(OfflineEvent::ConnectivityChanged { online });

            if online {
                self.sync_offline_results().await;
            }
        }

        debug!("Connectivity stream closed");
    }

    fn emit(&self, event: OfflineEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Offline(event));
        }
    }
}

impl std::fmt::Debug for OfflineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineOrchestrator")
            .field("offline_mode", &self.is_offline_mode())
            .field("settings", &self.settings)
            .field("worker_host", &self.worker_host.is_some())
            .field("network_monitor", &self.network_monitor.is_some())
            .finish()
    }
}
