//! Fetch outcomes
//!
//! Every intercepted request resolves to exactly one [`FetchOutcome`].

use bridge_traits::HttpResponse;
use serde::{Deserialize, Serialize};

/// Body of the synthetic response returned to API calls while offline.
pub const OFFLINE_BODY: &str = r#"{"error":"offline"}"#;

/// Body of the synthetic response returned when a page asset is unreachable.
pub const NETWORK_ERROR_BODY: &str = "Network error happened";

/// Why a synthetic response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticKind {
    /// An API call failed and nothing was cached
    Offline,
    /// A page asset failed and no fallback was cached
    NetworkError,
}

impl SyntheticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntheticKind::Offline => "offline",
            SyntheticKind::NetworkError => "network_error",
        }
    }
}

/// A response the worker made up instead of fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticResponse {
    pub kind: SyntheticKind,
    pub status: u16,
    pub body: String,
    pub content_type: String,
}

impl SyntheticResponse {
    /// `503` with a JSON error body.
    pub fn offline() -> Self {
        Self {
            kind: SyntheticKind::Offline,
            status: 503,
            body: OFFLINE_BODY.to_string(),
            content_type: "application/json".to_string(),
        }
    }

    /// `408` with a plain-text body.
    pub fn network_error() -> Self {
        Self {
            kind: SyntheticKind::NetworkError,
            status: 408,
            body: NETWORK_ERROR_BODY.to_string(),
            content_type: "text/plain".to_string(),
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        HttpResponse::new(self.status, self.body.clone())
            .with_header("Content-Type", self.content_type.clone())
    }
}

/// How an intercepted request was answered.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The worker did not intercept; the caller fetches directly
    PassThrough,
    /// Answered by the network
    Network(HttpResponse),
    /// Answered from the cache
    Cache(HttpResponse),
    /// The network failed and a cached fallback page or image was served
    Fallback(HttpResponse),
    /// Neither network nor cache could answer
    Synthetic(SyntheticResponse),
}

impl FetchOutcome {
    /// The response to hand back to the page, `None` for pass-through.
    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            FetchOutcome::PassThrough => None,
            FetchOutcome::Network(response)
            | FetchOutcome::Cache(response)
            | FetchOutcome::Fallback(response) => Some(response),
            FetchOutcome::Synthetic(synthetic) => Some(synthetic.to_http_response()),
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::PassThrough => "pass_through",
            FetchOutcome::Network(_) => "network",
            FetchOutcome::Cache(_) => "cache",
            FetchOutcome::Fallback(_) => "fallback",
            FetchOutcome::Synthetic(_) => "synthetic",
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, FetchOutcome::Synthetic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_response() {
        let response = SyntheticResponse::offline().to_http_response();

        assert_eq!(response.status, 503);
        assert_eq!(response.content_type(), Some("application/json"));
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["error"], "offline");
    }

    #[test]
    fn test_network_error_response() {
        let response = SyntheticResponse::network_error().to_http_response();

        assert_eq!(response.status, 408);
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.text().unwrap(), "Network error happened");
    }

    #[test]
    fn test_synthetic_wire_format() {
        let json = serde_json::to_value(SyntheticResponse::offline()).unwrap();
        assert_eq!(json["kind"], "offline");
        assert_eq!(json["status"], 503);
    }

    #[test]
    fn test_outcome_response() {
        assert!(FetchOutcome::PassThrough.into_response().is_none());

        let cached = FetchOutcome::Cache(HttpResponse::new(200, "cached"));
        assert_eq!(cached.source(), "cache");
        assert_eq!(cached.into_response().unwrap().text().unwrap(), "cached");

        let synthetic = FetchOutcome::Synthetic(SyntheticResponse::network_error());
        assert!(synthetic.is_synthetic());
        assert_eq!(synthetic.into_response().unwrap().status, 408);
    }
}
