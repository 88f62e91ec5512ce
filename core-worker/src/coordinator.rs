//! # Cache Coordinator
//!
//! Owns the cache generations of one worker version: precaches the manifest
//! on install, deletes older generations on activation and answers
//! intercepted requests.
//!
//! A previous version counts as active when its generation already exists in
//! cache storage at startup. Generations belong to the same family when their
//! names differ only in the trailing version number (`quiz-offline-v1`,
//! `quiz-offline-v2`); any other cache name is not a previous version, but
//! activation still deletes it. Until this version activates, requests are
//! answered on behalf of that previous version.
//!
//! The coordinator is driven by the actor in [`crate::actor`]; it does not
//! spawn anything itself.

use crate::error::{Result, WorkerError};
use crate::lifecycle::WorkerState;
use crate::response::{FetchOutcome, SyntheticResponse};
use crate::strategy::{Route, RoutePolicy};
use bridge_traits::{
    CacheKey, CacheStorage, HttpClient, HttpRequest, HttpResponse, RequestDestination,
    ResponseType, WorkerRegistration,
};
use core_runtime::config::WorkerSettings;
use core_runtime::events::{CoreEvent, EventBus, WorkerEvent};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Install and activation logic for one worker version.
pub struct CacheCoordinator {
    http: Arc<dyn HttpClient>,
    caches: Arc<dyn CacheStorage>,
    settings: WorkerSettings,
    policy: RoutePolicy,
    event_bus: Option<Arc<EventBus>>,
    state: WorkerState,
    /// Generation currently answering requests
    active_generation: Option<String>,
}

impl CacheCoordinator {
    pub fn new(
        http: Arc<dyn HttpClient>,
        caches: Arc<dyn CacheStorage>,
        settings: WorkerSettings,
    ) -> Self {
        let policy = RoutePolicy::from_settings(&settings);

        Self {
            http,
            caches,
            settings,
            policy,
            event_bus: None,
            state: WorkerState::Parsed,
            active_generation: None,
        }
    }

    /// Set event bus for lifecycle events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn version(&self) -> &str {
        &self.settings.cache_version
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Generation answering requests, if any version is active.
    pub fn active_generation(&self) -> Option<&str> {
        self.active_generation.as_deref()
    }

    fn is_active(&self) -> bool {
        self.active_generation.as_deref() == Some(self.version())
    }

    /// Pick up generations left by an earlier run.
    ///
    /// If this version's generation exists it becomes active right away;
    /// otherwise the newest older generation of the same family keeps
    /// serving. Caches with unrelated names are ignored here.
    pub async fn restore(&mut self) {
        let names = match self.caches.cache_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Failed to list cache generations");
                return;
            }
        };

        if names.iter().any(|n| n == self.version()) {
            info!(version = %self.version(), "Resuming active cache generation");
            self.active_generation = Some(self.version().to_string());
            self.set_state(WorkerState::Active);
        } else if let Some(previous) = names
            .iter()
            .rev()
            .find(|n| is_generation_of(n, self.version()))
        {
            info!(previous = %previous, "Previous cache generation is active");
            self.active_generation = Some(previous.clone());
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Install this version and activate it when allowed.
    ///
    /// Registering an installed or active version does nothing. The first
    /// version activates immediately; a later one waits for
    /// [`skip_waiting`](Self::skip_waiting) unless the settings say otherwise.
    #[instrument(skip(self), fields(version = %self.settings.cache_version))]
    pub async fn register(&mut self) -> Result<WorkerRegistration> {
        if matches!(self.state, WorkerState::Parsed | WorkerState::Redundant) {
            self.install().await?;

            if self.active_generation.is_none() || self.settings.skip_waiting_on_install {
                self.activate().await;
            } else {
                info!("New version installed, waiting for SKIP_WAITING");
            }
        }

        Ok(self.registration())
    }

    /// Activate a waiting version right away.
    pub async fn skip_waiting(&mut self) {
        if self.state.is_waiting() {
            info!(version = %self.version(), "Skip waiting requested");
            self.activate().await;
        } else {
            debug!(state = %self.state, "Skip waiting ignored, nothing is waiting");
        }
    }

    pub fn registration(&self) -> WorkerRegistration {
        WorkerRegistration {
            version: self.version().to_string(),
            active: self.is_active(),
        }
    }

    async fn install(&mut self) -> Result<()> {
        self.transition(WorkerState::Installing);

        match self.precache().await {
            Ok(count) => {
                info!(assets = count, "Precache complete");
                self.transition(WorkerState::Installed);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Install failed");
                self.transition(WorkerState::Redundant);
                self.emit(WorkerEvent::InstallFailed {
                    version: self.version().to_string(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Fetch every manifest asset, then store them all or none.
    async fn precache(&self) -> Result<usize> {
        let version = self.version().to_string();

        let mut fetched = Vec::with_capacity(self.settings.precache.len());
        for path in &self.settings.precache {
            let url = self.settings.resolve(path);
            let response = self
                .http
                .execute(HttpRequest::get(url.clone()))
                .await
                .map_err(|e| WorkerError::Network(format!("{}: {}", url, e)))?;

            if !response.is_success() {
                return Err(WorkerError::install_failed(
                    &version,
                    format!("{} returned {}", url, response.status),
                ));
            }

            fetched.push((CacheKey::get(url), response));
        }

        let existed = self
            .caches
            .has_cache(&version)
            .await
            .map_err(|e| WorkerError::Cache(e.to_string()))?;

        self.caches
            .open(&version)
            .await
            .map_err(|e| WorkerError::Cache(e.to_string()))?;

        let count = fetched.len();
        for (key, response) in fetched {
            if let Err(e) = self.caches.put(&version, key, response).await {
                if !existed {
                    if let Err(cleanup) = self.caches.delete_cache(&version).await {
                        warn!(error = %cleanup, "Failed to discard partial generation");
                    }
                }
                return Err(WorkerError::install_failed(&version, e.to_string()));
            }
        }

        Ok(count)
    }

    async fn activate(&mut self) {
        self.transition(WorkerState::Activating);

        match self.caches.cache_names().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| n != self.version()) {
                    match self.caches.delete_cache(&name).await {
                        Ok(_) => {
                            info!(generation = %name, "Deleted old cache generation");
                            self.emit(WorkerEvent::GenerationDeleted { name });
                        }
                        Err(e) => warn!(generation = %name, error = %e, "Failed to delete old cache generation"),
                    }
                }
            }
            Err(e) => warn!(error = %e, "Failed to list cache generations"),
        }

        self.active_generation = Some(self.version().to_string());
        self.transition(WorkerState::Active);
    }

    fn transition(&mut self, next: WorkerState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "Unexpected worker state transition");
        }
        self.set_state(next);
    }

    fn set_state(&mut self, next: WorkerState) {
        self.state = next;
        debug!(state = %next, "Worker state changed");
        self.emit(WorkerEvent::StateChanged {
            version: self.version().to_string(),
            state: next.to_string(),
        });
    }

    // ========================================================================
    // Fetch
    // ========================================================================

    /// A detached handler answering requests for the active generation.
    ///
    /// `None` while no version is active: nothing intercepts requests then.
    pub fn fetch_handler(&self) -> Option<FetchHandler> {
        let generation = self.active_generation.clone()?;

        Some(FetchHandler {
            http: self.http.clone(),
            caches: self.caches.clone(),
            settings: self.settings.clone(),
            policy: self.policy.clone(),
            generation,
            event_bus: self.event_bus.clone(),
        })
    }

    /// Answer `request`, or pass it through when no version is active.
    pub async fn handle_fetch(&self, request: HttpRequest) -> FetchOutcome {
        match self.fetch_handler() {
            Some(handler) => handler.handle(request).await,
            None => FetchOutcome::PassThrough,
        }
    }

    fn emit(&self, event: WorkerEvent) {
        emit(&self.event_bus, event);
    }
}

impl std::fmt::Debug for CacheCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheCoordinator")
            .field("version", &self.settings.cache_version)
            .field("state", &self.state)
            .field("active_generation", &self.active_generation)
            .finish()
    }
}

/// Answers intercepted requests against one cache generation.
///
/// Cheap to clone; the actor hands one to each in-flight request so slow
/// network calls never block lifecycle messages.
#[derive(Clone)]
pub struct FetchHandler {
    http: Arc<dyn HttpClient>,
    caches: Arc<dyn CacheStorage>,
    settings: WorkerSettings,
    policy: RoutePolicy,
    generation: String,
    event_bus: Option<Arc<EventBus>>,
}

impl FetchHandler {
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub async fn handle(&self, request: HttpRequest) -> FetchOutcome {
        match self.policy.classify(&request) {
            Route::PassThrough => FetchOutcome::PassThrough,
            Route::NetworkFirst => self.network_first(request).await,
            Route::CacheFirst => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: HttpRequest) -> FetchOutcome {
        let key = request.cache_key();
        let url = request.url.clone();

        match self.http.execute(request).await {
            Ok(response) => FetchOutcome::Network(response),
            Err(e) => {
                debug!(error = %e, "API request failed, trying cache");
                if let Some(cached) = self.lookup(&key).await {
                    return FetchOutcome::Cache(cached);
                }

                warn!("API request failed offline");
                let synthetic = SyntheticResponse::offline();
                self.emit(WorkerEvent::FallbackServed {
                    url,
                    kind: synthetic.kind.as_str().to_string(),
                });
                FetchOutcome::Synthetic(synthetic)
            }
        }
    }

    async fn cache_first(&self, request: HttpRequest) -> FetchOutcome {
        let key = request.cache_key();

        if let Some(cached) = self.lookup(&key).await {
            debug!("Cache hit");
            return FetchOutcome::Cache(cached);
        }

        let is_navigation = request.is_navigation();
        let destination = request.destination;
        let url = request.url.clone();

        match self.http.execute(request).await {
            Ok(response) => {
                if response.status == 200 && response.response_type == ResponseType::Basic {
                    if let Err(e) = self
                        .caches
                        .put(&self.generation, key, response.clone())
                        .await
                    {
                        warn!(error = %e, "Failed to cache response");
                    }
                }
                FetchOutcome::Network(response)
            }
            Err(e) => {
                debug!(error = %e, "Request failed, looking for a fallback");
                self.fallback(url, is_navigation, destination).await
            }
        }
    }

    async fn fallback(
        &self,
        url: String,
        is_navigation: bool,
        destination: RequestDestination,
    ) -> FetchOutcome {
        let fallback_path = if is_navigation {
            Some(&self.settings.offline_url)
        } else if destination == RequestDestination::Image {
            Some(&self.settings.placeholder_url)
        } else {
            None
        };

        if let Some(path) = fallback_path {
            let key = CacheKey::get(self.settings.resolve(path));
            if let Some(response) = self.lookup(&key).await {
                info!(fallback = %path, "Serving cached fallback");
                self.emit(WorkerEvent::FallbackServed {
                    url,
                    kind: path.clone(),
                });
                return FetchOutcome::Fallback(response);
            }
        }

        let synthetic = SyntheticResponse::network_error();
        self.emit(WorkerEvent::FallbackServed {
            url,
            kind: synthetic.kind.as_str().to_string(),
        });
        FetchOutcome::Synthetic(synthetic)
    }

    async fn lookup(&self, key: &CacheKey) -> Option<HttpResponse> {
        match self.caches.lookup_any(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed");
                None
            }
        }
    }

    fn emit(&self, event: WorkerEvent) {
        emit(&self.event_bus, event);
    }
}

fn emit(bus: &Option<Arc<EventBus>>, event: WorkerEvent) {
    if let Some(bus) = bus {
        let _ = bus.emit(CoreEvent::Worker(event));
    }
}

/// Whether `name` is another generation of the family `version` belongs to.
fn is_generation_of(name: &str, version: &str) -> bool {
    let is_version_char = |c: char| c.is_ascii_digit() || c == '.';
    let family = version.trim_end_matches(is_version_char);

    name != version
        && name
            .strip_prefix(family)
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(is_version_char))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_family() {
        assert!(is_generation_of("quiz-offline-v0", "quiz-offline-v1"));
        assert!(is_generation_of("quiz-offline-v12", "quiz-offline-v1"));
        assert!(is_generation_of("quiz-offline-v1.1", "quiz-offline-v2"));

        assert!(!is_generation_of("quiz-offline-v1", "quiz-offline-v1"));
        assert!(!is_generation_of("unrelated-cache", "quiz-offline-v1"));
        assert!(!is_generation_of("quiz-offline-v", "quiz-offline-v1"));
        assert!(!is_generation_of("quiz-offline-v1-images", "quiz-offline-v1"));
    }
}
