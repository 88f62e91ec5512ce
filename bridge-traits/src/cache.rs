//! Cache Storage Abstraction
//!
//! Named, versioned bundles of cached network responses (mirrors the web
//! `CacheStorage` API). Only the background cache worker talks to this trait.

use crate::{
    error::Result,
    http::{CacheKey, HttpResponse},
    platform::PlatformSendSync,
};

/// Cache storage trait
///
/// Each cache is identified by a name; the cache worker uses its version
/// string as the name, so one name equals one cache generation.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::cache::CacheStorage;
/// use bridge_traits::http::CacheKey;
///
/// async fn cached_home(caches: &dyn CacheStorage) -> Result<bool> {
///     Ok(caches.lookup("quiz-offline-v1", &CacheKey::get("/")).await?.is_some())
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait CacheStorage: PlatformSendSync {
    /// Names of every existing cache, in creation order.
    async fn cache_names(&self) -> Result<Vec<String>>;

    /// Create the named cache if it does not exist yet.
    async fn open(&self, name: &str) -> Result<()>;

    /// Delete the named cache and all its entries.
    ///
    /// Returns `true` if a cache was removed.
    async fn delete_cache(&self, name: &str) -> Result<bool>;

    /// Look up a response in the named cache.
    ///
    /// A missing cache or missing entry both yield `Ok(None)`.
    async fn lookup(&self, name: &str, key: &CacheKey) -> Result<Option<HttpResponse>>;

    /// Store a response in the named cache, creating the cache if needed.
    async fn put(&self, name: &str, key: CacheKey, response: HttpResponse) -> Result<()>;

    /// Look up a response across every cache, oldest cache first.
    async fn lookup_any(&self, key: &CacheKey) -> Result<Option<HttpResponse>> {
        for name in self.cache_names().await? {
            if let Some(response) = self.lookup(&name, key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Whether the named cache exists.
    async fn has_cache(&self, name: &str) -> Result<bool> {
        Ok(self.cache_names().await?.iter().any(|n| n == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Caches {}

        #[async_trait::async_trait]
        impl CacheStorage for Caches {
            async fn cache_names(&self) -> Result<Vec<String>>;
            async fn open(&self, name: &str) -> Result<()>;
            async fn delete_cache(&self, name: &str) -> Result<bool>;
            async fn lookup(&self, name: &str, key: &CacheKey) -> Result<Option<HttpResponse>>;
            async fn put(&self, name: &str, key: CacheKey, response: HttpResponse) -> Result<()>;
        }
    }

    #[tokio::test]
    async fn test_lookup_any_returns_first_hit() {
        let mut caches = MockCaches::new();
        caches
            .expect_cache_names()
            .returning(|| Ok(vec!["v1".to_string(), "v2".to_string(), "v3".to_string()]));
        caches.expect_lookup().times(2).returning(|name, _| {
            Ok((name == "v2").then(|| HttpResponse::new(200, "from v2")))
        });

        let hit = caches.lookup_any(&CacheKey::get("/")).await.unwrap();
        assert_eq!(hit.unwrap().text().unwrap(), "from v2");
    }

    #[tokio::test]
    async fn test_lookup_any_miss() {
        let mut caches = MockCaches::new();
        caches.expect_cache_names().returning(|| Ok(vec![]));
        caches.expect_lookup().never();

        assert!(caches.lookup_any(&CacheKey::get("/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_has_cache() {
        let mut caches = MockCaches::new();
        caches
            .expect_cache_names()
            .returning(|| Ok(vec!["quiz-offline-v1".to_string()]));

        assert!(caches.has_cache("quiz-offline-v1").await.unwrap());
        assert!(!caches.has_cache("quiz-offline-v0").await.unwrap());
    }
}
