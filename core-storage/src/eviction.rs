//! Eviction planning
//!
//! Deciding what to evict is kept free of I/O: the store gathers candidates
//! from the medium and deletes whatever the plan names.

use crate::codec::ItemMetadata;

/// A managed item considered for eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionCandidate {
    /// Full medium key, prefix included
    pub key: String,
    pub metadata: ItemMetadata,
}

/// Keys chosen for deletion by one eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionPlan {
    pub keys: Vec<String>,
    /// `true` when only expired items were chosen
    pub expired_only: bool,
}

impl EvictionPlan {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Number of oldest items removed when nothing has expired: a fifth,
/// rounded up.
pub fn oldest_share(count: usize) -> usize {
    count.div_ceil(5)
}

/// Plan an eviction pass over `candidates` at `now_ms`.
///
/// Expired items are removed first and, if there are any, nothing else is.
/// Otherwise the oldest fifth by write time goes; ties keep enumeration order.
pub fn plan_eviction(mut candidates: Vec<EvictionCandidate>, now_ms: i64) -> EvictionPlan {
    let expired: Vec<String> = candidates
        .iter()
        .filter(|c| c.metadata.is_expired(now_ms))
        .map(|c| c.key.clone())
        .collect();

    if !expired.is_empty() {
        return EvictionPlan {
            keys: expired,
            expired_only: true,
        };
    }

    let take = oldest_share(candidates.len());
    candidates.sort_by_key(|c| c.metadata.timestamp);

    EvictionPlan {
        keys: candidates.into_iter().take(take).map(|c| c.key).collect(),
        expired_only: false,
    }
}
