//! Core service façade and bootstrap helpers.
//!
//! This crate wires a validated [`CoreConfig`] into the three subsystems of
//! the offline core: the enhanced store, the offline orchestrator and the
//! background cache worker. Desktop apps typically enable the `desktop-shims`
//! feature, which lets `CoreConfig` fill in file, reqwest and in-memory cache
//! adapters from `bridge-desktop`.
//!
//! ```text
//!            CoreService
//!   ┌────────────┼──────────────────┐
//!   ▼            ▼                  ▼
//! EnhancedStore  OfflineOrchestrator  WorkerHandle ──► cache worker task
//!   ▲            │  │                   ▲
//!   └────────────┘  └── WorkerHost ─────┘
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::http::HttpRequest;
use core_offline::{NoopResultSink, OfflineOrchestrator, QuizCatalog, ResultSink};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream};
use core_storage::EnhancedStore;
use core_worker::{spawn_worker, CacheCoordinator, FetchOutcome, WorkerHandle};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Capacity of the shared event bus.
const EVENT_BUS_CAPACITY: usize = 256;

/// Everything the core needs from the host.
pub struct CoreDependencies {
    pub config: CoreConfig,
    pub catalog: Arc<dyn QuizCatalog>,
    pub result_sink: Arc<dyn ResultSink>,
}

impl CoreDependencies {
    /// Construct a dependency bundle. Results are discarded on sync until a
    /// sink is provided with [`CoreDependencies::with_result_sink`].
    pub fn new(config: CoreConfig, catalog: Arc<dyn QuizCatalog>) -> Self {
        Self {
            config,
            catalog,
            result_sink: Arc::new(NoopResultSink),
        }
    }

    pub fn with_result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.result_sink = sink;
        self
    }
}

/// Running offline core.
///
/// Cloning is cheap; every clone shares the same store, orchestrator and
/// worker task.
#[derive(Clone)]
pub struct CoreService {
    store: Arc<EnhancedStore>,
    orchestrator: Arc<OfflineOrchestrator>,
    worker: Option<WorkerHandle>,
    event_bus: Arc<EventBus>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl CoreService {
    /// Build every subsystem and spawn the background tasks.
    ///
    /// Must be called from inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `InitializationFailed` when no runtime is available
    /// - `CapabilityMissing` when the cache worker is enabled without an
    ///   HTTP client or cache storage
    pub async fn start(deps: CoreDependencies) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            CoreError::InitializationFailed(format!("no tokio runtime available: {}", e))
        })?;

        let CoreDependencies {
            config,
            catalog,
            result_sink,
        } = deps;

        let event_bus = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));
        let mut tasks = Vec::new();

        let store = Arc::new(
            EnhancedStore::new(config.key_value_store.clone(), config.quota_estimator.clone())
                .with_clock(config.clock.clone())
                .with_event_bus(event_bus.clone()),
        );

        let mut orchestrator = OfflineOrchestrator::new(store.clone(), catalog)
            .with_result_sink(result_sink)
            .with_clock(config.clock.clone())
            .with_settings(config.offline.clone())
            .with_event_bus(event_bus.clone());

        if let Some(monitor) = config.network_monitor.clone() {
            orchestrator = orchestrator.with_network_monitor(monitor);
        }

        let worker = if config.features.enable_cache_worker {
            let http = config.http_client.clone().ok_or_else(|| {
                CoreError::CapabilityMissing {
                    capability: "HttpClient".to_string(),
                    message: "the cache worker needs network access".to_string(),
                }
            })?;
            let caches = config.cache_storage.clone().ok_or_else(|| {
                CoreError::CapabilityMissing {
                    capability: "CacheStorage".to_string(),
                    message: "the cache worker needs somewhere to keep generations".to_string(),
                }
            })?;

            let coordinator = CacheCoordinator::new(http, caches, config.worker.clone())
                .with_event_bus(event_bus.clone());
            let (handle, task) = spawn_worker(coordinator);
            tasks.push(task);

            orchestrator = orchestrator.with_worker_host(Arc::new(handle.clone()));
            Some(handle)
        } else {
            info!("Cache worker disabled");
            None
        };

        let orchestrator = Arc::new(orchestrator);

        if config.features.enable_connectivity_watch {
            if config.network_monitor.is_some() {
                let watcher = orchestrator.clone();
                tasks.push(runtime.spawn(async move {
                    watcher.watch_connectivity().await;
                }));
            } else {
                warn!("Connectivity watch enabled without a network monitor");
            }
        }

        info!(
            cache_worker = worker.is_some(),
            background_tasks = tasks.len(),
            "Core service started"
        );

        Ok(Self {
            store,
            orchestrator,
            worker,
            event_bus,
            tasks: Arc::new(Mutex::new(tasks)),
        })
    }

    pub fn store(&self) -> &Arc<EnhancedStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &Arc<OfflineOrchestrator> {
        &self.orchestrator
    }

    /// Handle to the cache worker, if it was enabled.
    pub fn worker(&self) -> Option<&WorkerHandle> {
        self.worker.as_ref()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Subscribe to every event emitted by the core.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    /// Subscribe to a subset of events.
    pub fn subscribe_filtered<F>(&self, predicate: F) -> EventStream
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.subscribe_events().filter(predicate)
    }

    /// Route a request through the cache worker.
    ///
    /// Without a worker every request passes through to the network.
    pub async fn fetch(&self, request: HttpRequest) -> FetchOutcome {
        match &self.worker {
            Some(worker) => worker.fetch(request).await,
            None => FetchOutcome::PassThrough,
        }
    }

    /// Stop every background task. Clones of this service stop too.
    pub fn shutdown(&self) {
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in &tasks {
            task.abort();
        }
        info!(stopped = tasks.len(), "Core service shut down");
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("store", &self.store)
            .field("orchestrator", &self.orchestrator)
            .field("worker", &self.worker.is_some())
            .field("background_tasks", &self.tasks.lock().len())
            .finish()
    }
}

/// Start a core service backed by the desktop default adapters.
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(catalog: Arc<dyn QuizCatalog>) -> Result<CoreService> {
    let config = CoreConfig::builder().build()?;
    CoreService::start(CoreDependencies::new(config, catalog)).await
}
