//! In-memory Cache Storage

use async_trait::async_trait;
use bridge_traits::{
    cache::CacheStorage,
    error::Result,
    http::{CacheKey, HttpResponse},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

type Generation = HashMap<CacheKey, HttpResponse>;

/// Process-local [`CacheStorage`] keeping every generation in memory.
///
/// Generations are kept in creation order so `cache_names` and `lookup_any`
/// behave like the web `CacheStorage`.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: RwLock<Vec<(String, Generation)>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in the named cache (0 when missing).
    pub fn entry_count(&self, name: &str) -> usize {
        self.caches
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entries)| entries.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn cache_names(&self) -> Result<Vec<String>> {
        Ok(self.caches.read().iter().map(|(n, _)| n.clone()).collect())
    }

    async fn open(&self, name: &str) -> Result<()> {
        let mut caches = self.caches.write();
        if !caches.iter().any(|(n, _)| n == name) {
            debug!(cache = name, "Created cache");
            caches.push((name.to_string(), Generation::new()));
        }
        Ok(())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool> {
        let mut caches = self.caches.write();
        let before = caches.len();
        caches.retain(|(n, _)| n != name);
        Ok(caches.len() != before)
    }

    async fn lookup(&self, name: &str, key: &CacheKey) -> Result<Option<HttpResponse>> {
        Ok(self
            .caches
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, entries)| entries.get(key).cloned()))
    }

    async fn put(&self, name: &str, key: CacheKey, response: HttpResponse) -> Result<()> {
        let mut caches = self.caches.write();
        match caches.iter_mut().find(|(n, _)| n == name) {
            Some((_, entries)) => {
                entries.insert(key, response);
            }
            None => {
                let mut entries = Generation::new();
                entries.insert(key, response);
                caches.push((name.to_string(), entries));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_creates_cache_and_lookup_hits() {
        let storage = MemoryCacheStorage::new();
        let key = CacheKey::get("https://quiz.example/");

        storage
            .put("v1", key.clone(), HttpResponse::new(200, "home"))
            .await
            .unwrap();

        let hit = storage.lookup("v1", &key).await.unwrap().unwrap();
        assert_eq!(hit.text().unwrap(), "home");
        assert!(storage.lookup("v2", &key).await.unwrap().is_none());
        assert_eq!(storage.entry_count("v1"), 1);
    }

    #[tokio::test]
    async fn test_names_keep_creation_order_and_delete() {
        let storage = MemoryCacheStorage::new();
        storage.open("old").await.unwrap();
        storage.open("new").await.unwrap();
        storage.open("old").await.unwrap();

        assert_eq!(storage.cache_names().await.unwrap(), vec!["old", "new"]);
        assert!(storage.delete_cache("old").await.unwrap());
        assert!(!storage.delete_cache("old").await.unwrap());
        assert!(!storage.has_cache("old").await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_any_searches_all_generations() {
        let storage = MemoryCacheStorage::new();
        let key = CacheKey::get("https://quiz.example/offline");
        storage.open("v1").await.unwrap();
        storage
            .put("v2", key.clone(), HttpResponse::new(200, "offline"))
            .await
            .unwrap();

        assert!(storage.lookup_any(&key).await.unwrap().is_some());
    }
}
