//! # Worker Manifest
//!
//! Constants shared by the page context and the background cache worker. The
//! two contexts never share memory; this module is the only thing they agree
//! on at build time.

/// Name of the current cache generation. Bump it to ship a new worker
/// version; activation deletes every other generation.
pub const CACHE_VERSION: &str = "quiz-offline-v1";

/// Page served to navigations when both network and cache miss.
pub const OFFLINE_URL: &str = "/offline";

/// Image served to image requests when both network and cache miss.
pub const PLACEHOLDER_URL: &str = "/placeholder.svg";

/// Assets fetched and stored during install. Both fallbacks must be listed
/// here or they can never be served.
pub const PRECACHE_MANIFEST: &[&str] = &[
    "/",
    OFFLINE_URL,
    "/favicon.ico",
    "/manifest.json",
    "/app/globals.css",
    PLACEHOLDER_URL,
];

/// Requests whose URL contains this marker are routed network-first.
pub const API_PATH_MARKER: &str = "/api/";

/// URL schemes the worker never intercepts.
pub const DISALLOWED_SCHEMES: &[&str] = &["chrome-extension:", "moz-extension:", "safari-web-extension:"];

/// Storage key holding the offline quiz catalog snapshot.
pub const OFFLINE_QUIZZES_KEY: &str = "offline_quizzes";

/// Storage key holding quiz results recorded while offline.
pub const OFFLINE_RESULTS_KEY: &str = "offline_results";

/// Join an origin and a manifest path into a full URL.
///
/// Absolute URLs pass through unchanged.
pub fn resolve(origin: &str, path: &str) -> String {
    if path.contains("://") {
        return path.to_string();
    }
    format!("{}{}", origin.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_are_precached() {
        assert!(PRECACHE_MANIFEST.contains(&OFFLINE_URL));
        assert!(PRECACHE_MANIFEST.contains(&PLACEHOLDER_URL));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve("https://quiz.example/", "/offline"),
            "https://quiz.example/offline"
        );
        assert_eq!(resolve("https://quiz.example", "/"), "https://quiz.example/");
        assert_eq!(
            resolve("https://quiz.example", "https://cdn.example/x.css"),
            "https://cdn.example/x.css"
        );
    }
}
