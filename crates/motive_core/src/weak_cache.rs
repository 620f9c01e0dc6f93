//! Weak-reference lookup cache
//!
//! The cache shares values but never keeps them alive: an entry stays
//! reachable only while some external `Arc` holds the value. Dead entries are
//! not removed eagerly. Owners call [`WeakCache::mark_dirty`] when a value is
//! dropped and the next insert compacts the table.
//!
//! Pinned entries are held strongly and survive compaction and
//! [`WeakCache::clear`].

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};

use rustc_hash::FxHashMap;

pub struct WeakCache<K, T> {
    entries: RwLock<FxHashMap<K, Weak<T>>>,
    pinned: RwLock<FxHashMap<K, Arc<T>>>,
    dirty: AtomicBool,
}

impl<K: Eq + Hash + Clone, T> Default for WeakCache<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, T> WeakCache<K, T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            pinned: RwLock::new(FxHashMap::default()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Look up a live value
    pub fn get(&self, key: &K) -> Option<Arc<T>> {
        if let Some(value) = self.pinned.read().unwrap().get(key) {
            return Some(value.clone());
        }
        self.entries
            .read()
            .unwrap()
            .get(key)
            .and_then(|weak| weak.upgrade())
    }

    /// Register a value without taking ownership of it
    pub fn insert(&self, key: K, value: &Arc<T>) {
        let mut entries = self.entries.write().unwrap();
        if self.dirty.swap(false, Ordering::AcqRel) {
            let before = entries.len();
            entries.retain(|_, weak| weak.strong_count() > 0);
            tracing::trace!(removed = before - entries.len(), "compacted weak cache");
        }
        entries.insert(key, Arc::downgrade(value));
    }

    /// Register a value that is never evicted
    pub fn pin(&self, key: K, value: Arc<T>) {
        self.pinned.write().unwrap().insert(key, value);
    }

    /// Note that some cached value may have been dropped
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Number of table entries, dead ones included, plus pinned entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len() + self.pinned.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries whose value is still alive
    pub fn live_count(&self) -> usize {
        let live = self
            .entries
            .read()
            .unwrap()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count();
        live + self.pinned.read().unwrap().len()
    }

    /// Drop all unpinned entries
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
        self.dirty.store(false, Ordering::Release);
    }

    /// Drop everything, pinned entries included
    pub fn reset(&self) {
        self.clear();
        self.pinned.write().unwrap().clear();
    }
}
