//! Background Cache Worker Host
//!
//! The page-side view of the background cache worker: registration and
//! message posting. The worker itself lives in `core-worker`.

use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync};

/// Message posted from a page to the background worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Promote a waiting worker version to active without waiting for
    /// existing pages to close.
    SkipWaiting,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRegistration {
    /// Cache version of the worker that handled the registration
    pub version: String,
    /// Whether that version already controls fetches
    pub active: bool,
}

/// Background worker host trait
///
/// Abstracts how the page reaches the background cache worker:
/// - **Web**: `navigator.serviceWorker.register()` and `postMessage`
/// - **Desktop**: a channel into an in-process worker task
///
/// Registration is idempotent; registering an already running worker
/// returns its current registration.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::{WorkerHost, WorkerMessage};
///
/// async fn update_now(host: &dyn WorkerHost) -> Result<()> {
///     host.register().await?;
///     host.post_message(WorkerMessage::SkipWaiting).await
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait WorkerHost: PlatformSendSync {
    /// Register (install) the background worker.
    async fn register(&self) -> Result<WorkerRegistration>;

    /// Deliver a message to the worker.
    async fn post_message(&self, message: WorkerMessage) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_waiting_wire_format() {
        let json = serde_json::to_string(&WorkerMessage::SkipWaiting).unwrap();
        assert_eq!(json, r#"{"type":"SKIP_WAITING"}"#);

        let parsed: WorkerMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, WorkerMessage::SkipWaiting);
    }
}
