//! Delivery of queued results

use crate::error::Result;
use crate::results::QueuedResult;
use bridge_traits::PlatformSendSync;
use tracing::debug;

/// Destination for results recorded while offline.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait ResultSink: PlatformSendSync {
    /// Deliver `results`. On error none of them count as delivered.
    async fn submit(&self, results: Vec<QueuedResult>) -> Result<()>;
}

/// Accepts and drops every result.
///
/// There is no server-side results API yet, so syncing only empties the
/// local queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResultSink;

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl ResultSink for NoopResultSink {
    async fn submit(&self, results: Vec<QueuedResult>) -> Result<()> {
        debug!(count = results.len(), "Discarding synced results");
        Ok(())
    }
}
