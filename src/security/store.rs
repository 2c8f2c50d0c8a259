//! Expiring key store backing the cooldown limiter.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Storage seam for cooldown entries.
///
/// Implementations must be safe for concurrent single-key operations; the
/// limiter serializes its own compound check-then-insert on top.
pub trait CooldownStore: Send + Sync {
    /// Time left on `key`, or `None` if it is absent or has expired.
    fn remaining(&self, key: &str) -> Option<Duration>;

    /// Start a countdown of `ttl` on `key`, replacing any existing entry.
    /// Returns the deadline now recorded for `key`.
    fn insert(&self, key: &str, ttl: Duration) -> Instant;

    /// Drop `key` only if its deadline is still `deadline`. A newer entry
    /// for the same key is left alone. Returns whether anything was removed.
    fn remove_if_deadline(&self, key: &str, deadline: Instant) -> bool;

    /// Number of tracked keys, including any not yet swept.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory TTL store keyed by string.
///
/// Each entry holds its expiry deadline. Reads never extend a deadline.
#[derive(Clone, Default)]
pub struct TtlStore {
    entries: Arc<DashMap<String, Instant>>,
}

impl TtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry whose deadline has passed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, deadline| *deadline > now);
        before.saturating_sub(self.entries.len())
    }

    /// Periodically purge expired entries until shutdown is signalled.
    pub fn spawn_sweeper(
        &self,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged = store.purge_expired();
                        if purged > 0 {
                            tracing::debug!(purged, remaining = store.entries.len(), "Swept expired cooldowns");
                        }
                        crate::observability::metrics::record_cooldown_entries(store.entries.len());
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Cooldown sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

impl CooldownStore for TtlStore {
    fn remaining(&self, key: &str) -> Option<Duration> {
        let deadline = self.entries.get(key).map(|entry| *entry.value())?;
        let now = Instant::now();
        if deadline > now {
            Some(deadline - now)
        } else {
            self.entries.remove_if(key, |_, d| *d <= now);
            None
        }
    }

    fn insert(&self, key: &str, ttl: Duration) -> Instant {
        let deadline = Instant::now() + ttl;
        self.entries.insert(key.to_string(), deadline);
        deadline
    }

    fn remove_if_deadline(&self, key: &str, deadline: Instant) -> bool {
        self.entries.remove_if(key, |_, d| *d == deadline).is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
