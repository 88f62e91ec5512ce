//! End-to-end tests for the core service wiring

use bridge_desktop::{MemoryCacheStorage, MemoryKeyValueStore};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{BridgeError, HttpClient, HttpRequest, HttpResponse};
use core_offline::{QueuedResult, Quiz, ResultSink, StaticQuizCatalog};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, OfflineEvent};
use core_runtime::manifest::PRECACHE_MANIFEST;
use core_service::{CoreDependencies, CoreError, CoreService};
use core_worker::{FetchOutcome, WorkerState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const ORIGIN: &str = "http://localhost:3000";

/// Serves every manifest asset until switched offline.
#[derive(Default)]
struct StaticSite {
    offline: AtomicBool,
}

#[async_trait::async_trait]
impl HttpClient for StaticSite {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BridgeError::Network("offline".to_string()));
        }

        let path = request.url.trim_start_matches(ORIGIN);
        if PRECACHE_MANIFEST.contains(&path) {
            Ok(HttpResponse::new(200, format!("asset {}", path)))
        } else {
            Ok(HttpResponse::new(404, "not found"))
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    submitted: Mutex<Vec<QueuedResult>>,
}

#[async_trait::async_trait]
impl ResultSink for RecordingSink {
    async fn submit(&self, results: Vec<QueuedResult>) -> core_offline::Result<()> {
        self.submitted.lock().extend(results);
        Ok(())
    }
}

fn catalog() -> Arc<StaticQuizCatalog> {
    Arc::new(StaticQuizCatalog::new(vec![
        Quiz {
            id: "q1".to_string(),
            title: "Capitals".to_string(),
            category: "geography".to_string(),
            questions: vec![],
        },
        Quiz {
            id: "q2".to_string(),
            title: "Rivers".to_string(),
            category: "geography".to_string(),
            questions: vec![],
        },
    ]))
}

fn config(site: Arc<StaticSite>, cache_worker: bool) -> CoreConfig {
    CoreConfig::builder()
        .key_value_store(Arc::new(MemoryKeyValueStore::new()))
        .http_client(site)
        .cache_storage(Arc::new(MemoryCacheStorage::new()))
        .origin(ORIGIN)
        .enable_cache_worker(cache_worker)
        .build()
        .expect("valid config")
}

#[tokio::test]
async fn test_enable_offline_mode_installs_worker() {
    let site = Arc::new(StaticSite::default());
    let service = CoreService::start(CoreDependencies::new(config(site, true), catalog()))
        .await
        .unwrap();

    assert!(service.orchestrator().enable_offline_mode().await);
    assert!(service.orchestrator().is_offline_mode());
    assert_eq!(service.orchestrator().queued_quizzes().len(), 2);

    let worker = service.worker().expect("worker enabled");
    assert_eq!(worker.state().await.unwrap(), WorkerState::Active);

    service.shutdown();
}

#[tokio::test]
async fn test_precached_assets_served_offline() {
    let site = Arc::new(StaticSite::default());
    let service = CoreService::start(CoreDependencies::new(config(site.clone(), true), catalog()))
        .await
        .unwrap();
    assert!(service.orchestrator().enable_offline_mode().await);

    site.offline.store(true, Ordering::SeqCst);

    match service.fetch(HttpRequest::get(format!("{}/favicon.ico", ORIGIN))).await {
        FetchOutcome::Cache(response) => {
            assert_eq!(response.text().unwrap(), "asset /favicon.ico");
        }
        other => panic!("expected cached response, got {:?}", other),
    }

    service.shutdown();
}

#[tokio::test]
async fn test_without_worker_requests_pass_through() {
    let site = Arc::new(StaticSite::default());
    let service = CoreService::start(CoreDependencies::new(config(site, false), catalog()))
        .await
        .unwrap();

    assert!(service.worker().is_none());
    assert!(matches!(
        service.fetch(HttpRequest::get(format!("{}/", ORIGIN))).await,
        FetchOutcome::PassThrough
    ));

    // Offline mode still works; there is simply no worker to register
    assert!(service.orchestrator().enable_offline_mode().await);
}

#[tokio::test]
async fn test_results_reach_sink_on_disable() {
    let site = Arc::new(StaticSite::default());
    let sink = Arc::new(RecordingSink::default());
    let deps = CoreDependencies::new(config(site, false), catalog()).with_result_sink(sink.clone());
    let service = CoreService::start(deps).await.unwrap();

    assert!(service.orchestrator().enable_offline_mode().await);
    assert!(
        service
            .orchestrator()
            .record_offline_result(&serde_json::json!({"quizId": "q1", "score": 7}))
            .await
    );
    assert!(service.orchestrator().disable_offline_mode().await);

    let submitted = sink.submitted.lock();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].payload["score"], 7);
    assert!(service.orchestrator().queued_results().is_empty());
}

#[tokio::test]
async fn test_events_are_shared_across_subsystems() {
    let site = Arc::new(StaticSite::default());
    let service = CoreService::start(CoreDependencies::new(config(site, false), catalog()))
        .await
        .unwrap();
    let mut events = service.subscribe_filtered(|event| matches!(event, CoreEvent::Offline(_)));

    assert!(service.orchestrator().enable_offline_mode().await);

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("event in time")
        .unwrap();
    assert!(matches!(
        event,
        CoreEvent::Offline(OfflineEvent::ModeEnabled { quiz_count: 2 })
    ));
}

#[tokio::test]
async fn test_missing_worker_capability_is_reported() {
    let site = Arc::new(StaticSite::default());
    let mut config = config(site, true);
    config.cache_storage = None;

    let err = CoreService::start(CoreDependencies::new(config, catalog()))
        .await
        .unwrap_err();

    match err {
        CoreError::CapabilityMissing { capability, .. } => assert_eq!(capability, "CacheStorage"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_shutdown_stops_worker() {
    let site = Arc::new(StaticSite::default());
    let service = CoreService::start(CoreDependencies::new(config(site, true), catalog()))
        .await
        .unwrap();
    let clone = service.clone();

    service.shutdown();
    tokio::task::yield_now().await;

    let worker = clone.worker().expect("worker enabled");
    assert!(worker.register().await.is_err());
    assert!(matches!(
        clone.fetch(HttpRequest::get(format!("{}/", ORIGIN))).await,
        FetchOutcome::PassThrough
    ));
}

#[test]
fn test_start_requires_runtime() {
    let site = Arc::new(StaticSite::default());
    let deps = CoreDependencies::new(config(site, false), catalog());

    let result = futures::executor::block_on(CoreService::start(deps));
    assert!(matches!(result, Err(CoreError::InitializationFailed(_))));
}
