//! In-process command reuse timers.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Keyed expiry map backing the gate's cooldown check.
///
/// Keys come from [`super::CooldownScope::key`]. Expiries for a key only
/// ever move forward: applying a shorter cooldown while a longer one is
/// still running leaves the longer expiry in place. Nothing is persisted;
/// restarts clear all timers.
#[derive(Clone, Default)]
pub struct CooldownTracker {
    expiries: Arc<DashMap<String, Instant>>,
}

impl CooldownTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time before `key` may be used again. Expired entries are
    /// dropped when observed.
    #[must_use]
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let expiry = self.expiries.get(key).map(|entry| *entry)?;
        if expiry > now {
            return Some(expiry - now);
        }
        // Recheck under the shard lock; a fresh cooldown may have landed
        // since the read above.
        self.expiries.remove_if(key, |_, stored| *stored <= now);
        None
    }

    /// Start a cooldown of `duration` on `key`, keeping the later expiry if
    /// one is already running.
    pub fn apply(&self, key: &str, duration: Duration) {
        let candidate = Instant::now() + duration;
        self.expiries
            .entry(key.to_string())
            .and_modify(|expiry| *expiry = (*expiry).max(candidate))
            .or_insert(candidate);
    }

    /// Drop every expired entry. Meant for a periodic housekeeping task;
    /// correctness never depends on it running.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.expiries.retain(|_, expiry| *expiry > now);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}
