//! Bounded, age-limited response cache.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub trait CacheEntry {
    fn fetched_at(&self) -> Instant;

    fn age(&self) -> Duration {
        self.fetched_at().elapsed()
    }
}

/// Shared cache of provider responses. Entries are replaced, never mutated.
pub struct ResponseCache<K, V> {
    entries: DashMap<K, V>,
    ttl: Duration,
    max_entries: usize,
}

impl<K, V> ResponseCache<K, V>
where
    K: Clone + Eq + Hash,
    V: CacheEntry + Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry younger than the TTL.
    pub fn fresh(&self, key: &K) -> Option<V> {
        self.within(key, self.ttl)
    }

    /// Entry younger than twice the TTL, for use when the provider is down.
    pub fn stale(&self, key: &K) -> Option<V> {
        self.within(key, self.ttl.saturating_mul(2))
    }

    fn within(&self, key: &K, max_age: Duration) -> Option<V> {
        let entry = self.entries.get(key)?;
        (entry.age() <= max_age).then(|| entry.value().clone())
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value);
        if self.entries.len() > self.max_entries {
            self.prune();
        }
    }

    /// Drop entries past the stale window, then the oldest until the size
    /// bound holds.
    pub fn prune(&self) {
        let stale_after = self.ttl.saturating_mul(2);
        self.entries.retain(|_, value| value.age() <= stale_after);

        let excess = self.entries.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return;
        }

        let mut by_age: Vec<(K, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at()))
            .collect();
        by_age.sort_by_key(|(_, fetched_at)| *fetched_at);
        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        tracing::debug!(evicted = excess, remaining = self.entries.len(), "pruned cache");
    }
}
