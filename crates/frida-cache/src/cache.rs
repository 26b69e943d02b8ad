use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use frida_core::DeviceManager;
use indexmap::IndexMap;

use crate::{CacheEntry, CacheKey};

/// Concurrency-safe store of resolved handles.
///
/// Entries are written once and never removed; the cache lives as long as
/// its last owner. Concurrent stores to the same key are allowed and the last
/// one wins.
pub struct ResolutionCache<M>
where
    M: DeviceManager,
{
    entries: RwLock<IndexMap<CacheKey, CacheEntry<M>>>,

    /// Per-key locks serializing resolutions that must not run twice. Only
    /// keys with a resolution in flight have one.
    gates: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl<M> ResolutionCache<M>
where
    M: DeviceManager,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the entry stored under `key`, if any.
    pub fn load(&self, key: &CacheKey) -> Option<CacheEntry<M>> {
        // Entries are immutable once written, so a poisoned lock still
        // guards consistent data.
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// Stores `entry` under `key`, replacing any previous entry.
    pub fn store(&self, key: CacheKey, entry: CacheEntry<M>) {
        tracing::trace!(%key, ?entry, "storing cache entry");

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, entry);
    }

    /// Returns `true` if an entry is stored under `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(key)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    /// Returns `true` if nothing was stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the stored keys in insertion order.
    pub fn keys(&self) -> Vec<CacheKey> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }

    /// Returns the lock serializing resolutions of `key`.
    ///
    /// Every resolver sharing this cache gets the same lock for the same key.
    pub(crate) fn gate(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(key.clone()).or_default())
    }

    /// Hands back a lock obtained from [`gate`](Self::gate).
    ///
    /// The lock is dropped from the map once nobody else holds or waits on
    /// it, so a key that keeps failing leaves nothing behind.
    pub(crate) fn release_gate(&self, key: &CacheKey, gate: Arc<Mutex<()>>) {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);

        // One reference in the map, one in `gate`.
        let idle = match gates.get(key) {
            Some(current) => Arc::ptr_eq(current, &gate) && Arc::strong_count(&gate) == 2,
            None => false,
        };

        if idle {
            gates.remove(key);
        }
    }

    #[cfg(test)]
    pub(crate) fn gate_count(&self) -> usize {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<M> Default for ResolutionCache<M>
where
    M: DeviceManager,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Locks a gate returned by [`ResolutionCache::gate`].
///
/// A resolution that panicked leaves nothing half-written behind, so a
/// poisoned gate is simply taken over.
pub(crate) fn lock(gate: &Mutex<()>) -> MutexGuard<'_, ()> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}
