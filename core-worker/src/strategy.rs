//! Request routing
//!
//! Decides how the worker answers an intercepted request.

use bridge_traits::{HttpMethod, HttpRequest};
use core_runtime::config::WorkerSettings;

/// How a request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; the request goes straight to the network
    PassThrough,
    /// Network first, cache as fallback, never stored
    NetworkFirst,
    /// Cache first, network on miss, successful responses stored
    CacheFirst,
}

/// Routing rules derived from the worker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    api_path_marker: String,
    disallowed_schemes: Vec<String>,
}

impl RoutePolicy {
    pub fn new(api_path_marker: impl Into<String>, disallowed_schemes: Vec<String>) -> Self {
        Self {
            api_path_marker: api_path_marker.into(),
            disallowed_schemes,
        }
    }

    pub fn from_settings(settings: &WorkerSettings) -> Self {
        Self::new(
            settings.api_path_marker.clone(),
            settings.disallowed_schemes.clone(),
        )
    }

    pub fn classify(&self, request: &HttpRequest) -> Route {
        if request.method != HttpMethod::Get {
            return Route::PassThrough;
        }

        let url = request.url.to_ascii_lowercase();
        if self
            .disallowed_schemes
            .iter()
            .any(|scheme| url.starts_with(&scheme.to_ascii_lowercase()))
        {
            return Route::PassThrough;
        }

        if url_path(&request.url).contains(&self.api_path_marker) {
            Route::NetworkFirst
        } else {
            Route::CacheFirst
        }
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::from_settings(&WorkerSettings::default())
    }
}

/// Path component of `url`, without query or fragment.
///
/// Relative URLs are returned as they are, minus query and fragment.
pub fn url_path(url: &str) -> &str {
    let without_scheme = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => url,
    };

    let end = without_scheme
        .find(['?', '#'])
        .unwrap_or(without_scheme.len());
    &without_scheme[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_path() {
        assert_eq!(url_path("https://quiz.example/api/quizzes?page=2"), "/api/quizzes");
        assert_eq!(url_path("https://quiz.example"), "/");
        assert_eq!(url_path("https://quiz.example/#top"), "/");
        assert_eq!(url_path("/offline"), "/offline");
    }

    #[test]
    fn test_non_get_passes_through() {
        let policy = RoutePolicy::default();
        let request = HttpRequest::new(HttpMethod::Post, "https://quiz.example/api/results");

        assert_eq!(policy.classify(&request), Route::PassThrough);
    }

    #[test]
    fn test_extension_schemes_pass_through() {
        let policy = RoutePolicy::default();

        for url in [
            "chrome-extension://abcdef/script.js",
            "moz-extension://abcdef/script.js",
            "Chrome-Extension://abcdef/api/x",
        ] {
            assert_eq!(policy.classify(&HttpRequest::get(url)), Route::PassThrough, "{}", url);
        }
    }

    #[test]
    fn test_api_requests_are_network_first() {
        let policy = RoutePolicy::default();
        let request = HttpRequest::get("https://quiz.example/api/leaderboard");

        assert_eq!(policy.classify(&request), Route::NetworkFirst);
    }

    #[test]
    fn test_marker_in_query_does_not_count() {
        let policy = RoutePolicy::default();
        let request = HttpRequest::get("https://quiz.example/search?next=/api/x");

        assert_eq!(policy.classify(&request), Route::CacheFirst);
    }

    #[test]
    fn test_everything_else_is_cache_first() {
        let policy = RoutePolicy::default();

        assert_eq!(
            policy.classify(&HttpRequest::navigate("https://quiz.example/quiz/geo-1")),
            Route::CacheFirst
        );
        assert_eq!(
            policy.classify(&HttpRequest::get("https://quiz.example/app/globals.css")),
            Route::CacheFirst
        );
    }
}
