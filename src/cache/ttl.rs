//! Time-boxed in-memory cache.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::observability::metrics;

#[derive(Debug)]
struct Slot<V> {
    value: V,
    /// Stamp of the insert that wrote `value`.
    generation: u64,
}

/// A concurrent key/value cache whose entries expire a fixed time after insert.
///
/// Every `put` schedules a one-shot deletion of that key. The deletion only
/// removes the entry if it still carries the generation stamp of the insert
/// that scheduled it, so overwriting a key invalidates the older expiry.
/// Reads never extend an entry's lifetime. There is no capacity bound.
///
/// Cloning the cache clones a handle; all clones share the same entries.
#[derive(Debug)]
pub struct TtlCache<V> {
    name: &'static str,
    entries: Arc<DashMap<String, Slot<V>>>,
    next_generation: Arc<AtomicU64>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            entries: self.entries.clone(),
            next_generation: self.next_generation.clone(),
        }
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty cache. `name` labels its logs and metrics.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Arc::new(DashMap::new()),
            next_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Store `value` under `key`, replacing any previous value, and schedule
    /// its removal after `ttl`.
    ///
    /// Must be called from within a Tokio runtime; without one the value is
    /// not cached at all.
    pub fn put(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(cache = self.name, key = %key, "No runtime to schedule expiry, not caching");
                return;
            }
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(key.clone(), Slot { value, generation });
        metrics::record_cache_size(self.name, self.entries.len());

        let entries: Weak<DashMap<String, Slot<V>>> = Arc::downgrade(&self.entries);
        let name = self.name;
        handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            let Some(entries) = entries.upgrade() else {
                return;
            };
            let removed = entries
                .remove_if(&key, |_, slot| slot.generation == generation)
                .is_some();
            if removed {
                tracing::debug!(cache = name, key = %key, "Cache entry expired");
                metrics::record_cache_expired(name);
                metrics::record_cache_size(name, entries.len());
            }
        });
    }

    /// Look up `key`. Never blocks on expiry and never refreshes the TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.entries.get(key).map(|slot| slot.value.clone());
        metrics::record_cache_lookup(self.name, value.is_some());
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
