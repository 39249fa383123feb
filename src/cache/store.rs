//! Entry Store Module
//!
//! The keyed backing store a cache handle delegates physical storage to,
//! and an in-memory implementation with LRU capacity eviction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::cache::{CacheEntry, EntryKey, LruTracker};

// == Add Outcome ==
/// Result of [`EntryStore::add`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome<V> {
    /// The key was absent and the entry is now stored
    Added {
        /// Entries removed to make room
        evicted: Vec<CacheEntry<V>>,
    },
    /// The key was already present; nothing was written
    AlreadyExists,
}

// == Entry Store Trait ==
/// Keyed storage behind a cache handle.
///
/// Implementations are internally synchronized. Every method is atomic with
/// respect to the others, but sequences of calls are not.
pub trait EntryStore<V>: Send + Sync {
    /// Returns the stored entry, expired or not.
    fn get(&self, key: &EntryKey) -> Option<CacheEntry<V>>;

    /// Stores `entry`, replacing any previous entry under the same key.
    ///
    /// Returns the entries evicted to make room.
    fn put(&self, entry: CacheEntry<V>) -> Vec<CacheEntry<V>>;

    /// Stores `entry` only if its key is absent.
    fn add(&self, entry: CacheEntry<V>) -> AddOutcome<V>;

    /// Removes and returns the entry under `key`.
    fn remove(&self, key: &EntryKey) -> Option<CacheEntry<V>>;

    /// Stamps the last access time of the entry under `key`.
    fn touch(&self, key: &EntryKey, at: DateTime<Utc>) -> Option<CacheEntry<V>>;

    /// Removes the entry under `key` if it has expired at `now`.
    fn remove_if_expired(&self, key: &EntryKey, now: DateTime<Utc>) -> Option<CacheEntry<V>>;

    /// Removes and returns every entry expired at `now`.
    fn remove_expired(&self, now: DateTime<Utc>) -> Vec<CacheEntry<V>>;

    /// Number of stored entries, including expired ones not yet purged.
    fn count(&self) -> usize;

    fn clear(&self);
}

// == Memory Store ==
#[derive(Debug)]
struct Inner<V> {
    /// Key-value storage
    entries: HashMap<EntryKey, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<EntryKey>,
}

/// In-memory store with LRU eviction at capacity.
#[derive(Debug)]
pub struct MemoryStore<V> {
    inner: Mutex<Inner<V>>,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl<V> MemoryStore<V> {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` entries (at least one).
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
            }),
            max_entries: max_entries.max(1),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl<V> Inner<V> {
    /// Evicts least recently used entries until a new key fits.
    fn make_room(&mut self, max_entries: usize) -> Vec<CacheEntry<V>> {
        let mut evicted = Vec::new();
        while self.entries.len() >= max_entries {
            let Some(oldest) = self.lru.evict_oldest() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                evicted.push(entry);
            }
        }
        evicted
    }

    fn insert(&mut self, key: EntryKey, entry: CacheEntry<V>) {
        self.lru.touch(&key);
        self.entries.insert(key, entry);
    }
}

impl<V: Clone + Send> EntryStore<V> for MemoryStore<V> {
    fn get(&self, key: &EntryKey) -> Option<CacheEntry<V>> {
        // Lock is exclusive: reads move the key to the front of the LRU order
        let mut inner = self.inner.lock();
        let entry = inner.entries.get(key).cloned()?;
        inner.lru.touch(key);
        Some(entry)
    }

    fn put(&self, entry: CacheEntry<V>) -> Vec<CacheEntry<V>> {
        let key = entry.entry_key();
        let mut inner = self.inner.lock();

        let evicted = if inner.entries.contains_key(&key) {
            Vec::new()
        } else {
            inner.make_room(self.max_entries)
        };
        inner.insert(key, entry);
        evicted
    }

    fn add(&self, entry: CacheEntry<V>) -> AddOutcome<V> {
        let key = entry.entry_key();
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            return AddOutcome::AlreadyExists;
        }
        let evicted = inner.make_room(self.max_entries);
        inner.insert(key, entry);
        AddOutcome::Added { evicted }
    }

    fn remove(&self, key: &EntryKey) -> Option<CacheEntry<V>> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.remove(key)?;
        inner.lru.remove(key);
        Some(entry)
    }

    fn touch(&self, key: &EntryKey, at: DateTime<Utc>) -> Option<CacheEntry<V>> {
        let mut inner = self.inner.lock();
        let current = inner.entries.remove(key)?;
        let touched = current.touched(at);
        inner.insert(key.clone(), touched.clone());
        Some(touched)
    }

    fn remove_if_expired(&self, key: &EntryKey, now: DateTime<Utc>) -> Option<CacheEntry<V>> {
        let mut inner = self.inner.lock();
        if !inner.entries.get(key)?.is_expired_at(now) {
            return None;
        }
        inner.lru.remove(key);
        inner.entries.remove(key)
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> Vec<CacheEntry<V>> {
        let mut inner = self.inner.lock();
        let expired_keys: Vec<EntryKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = Vec::with_capacity(expired_keys.len());
        for key in expired_keys {
            inner.lru.remove(&key);
            if let Some(entry) = inner.entries.remove(&key) {
                removed.push(entry);
            }
        }
        removed
    }

    fn count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.lru.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(key: &str, value: &str) -> CacheEntry<String> {
        CacheEntry::new(key, value.to_string())
    }

    fn in_a_minute() -> DateTime<Utc> {
        Utc::now() + chrono::Duration::seconds(60)
    }

    #[test]
    fn test_store_new() {
        let store: MemoryStore<String> = MemoryStore::new(100);
        assert_eq!(store.count(), 0);
        assert_eq!(store.max_entries(), 100);
        assert_eq!(MemoryStore::<String>::new(0).max_entries(), 1);
    }

    #[test]
    fn test_store_put_and_get() {
        let store = MemoryStore::new(100);

        assert!(store.put(entry("key1", "value1")).is_empty());
        let found = store.get(&EntryKey::new("key1")).unwrap();

        assert_eq!(found.value(), "value1");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_store_regions_are_isolated() {
        let store = MemoryStore::new(100);

        store.put(CacheEntry::in_region("k", "a", "in a".to_string()));
        store.put(entry("k", "no region"));

        assert_eq!(
            store.get(&EntryKey::in_region("k", "a")).unwrap().value(),
            "in a"
        );
        assert_eq!(store.get(&EntryKey::new("k")).unwrap().value(), "no region");
        assert!(store.get(&EntryKey::in_region("k", "b")).is_none());
    }

    #[test]
    fn test_store_overwrite() {
        let store = MemoryStore::new(100);

        store.put(entry("key1", "value1"));
        store.put(entry("key1", "value2"));

        assert_eq!(store.get(&EntryKey::new("key1")).unwrap().value(), "value2");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_store_add_only_when_absent() {
        let store = MemoryStore::new(100);

        assert!(matches!(
            store.add(entry("key1", "first")),
            AddOutcome::Added { .. }
        ));
        assert_eq!(store.add(entry("key1", "second")), AddOutcome::AlreadyExists);
        assert_eq!(store.get(&EntryKey::new("key1")).unwrap().value(), "first");
    }

    #[test]
    fn test_store_remove() {
        let store = MemoryStore::new(100);

        store.put(entry("key1", "value1"));
        assert!(store.remove(&EntryKey::new("key1")).is_some());
        assert!(store.remove(&EntryKey::new("key1")).is_none());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_store_lru_eviction() {
        let store = MemoryStore::new(3);

        store.put(entry("key1", "value1"));
        store.put(entry("key2", "value2"));
        store.put(entry("key3", "value3"));

        // Cache is full, adding key4 should evict key1 (oldest)
        let evicted = store.put(entry("key4", "value4"));

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].key(), "key1");
        assert_eq!(store.count(), 3);
        assert!(store.get(&EntryKey::new("key1")).is_none());
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let store = MemoryStore::new(3);

        store.put(entry("key1", "value1"));
        store.put(entry("key2", "value2"));
        store.put(entry("key3", "value3"));

        store.get(&EntryKey::new("key1"));

        // Adding key4 should evict key2 (now oldest)
        let evicted = store.add(entry("key4", "value4"));
        match evicted {
            AddOutcome::Added { evicted } => assert_eq!(evicted[0].key(), "key2"),
            AddOutcome::AlreadyExists => panic!("key4 was absent"),
        }
        assert!(store.get(&EntryKey::new("key1")).is_some());
    }

    #[test]
    fn test_store_touch() {
        let store = MemoryStore::new(10);
        store.put(entry("key1", "value1"));

        let at = in_a_minute();
        let touched = store.touch(&EntryKey::new("key1"), at).unwrap();

        assert_eq!(touched.last_accessed_utc(), at);
        assert_eq!(store.get(&EntryKey::new("key1")).unwrap().last_accessed_utc(), at);
        assert!(store.touch(&EntryKey::new("missing"), at).is_none());
    }

    #[test]
    fn test_store_remove_if_expired() {
        let store = MemoryStore::new(10);
        store.put(entry("short", "v").with_absolute_expiration(Duration::from_secs(1)));
        store.put(entry("forever", "v").with_no_expiration());

        assert!(store
            .remove_if_expired(&EntryKey::new("short"), Utc::now())
            .is_none());
        assert!(store
            .remove_if_expired(&EntryKey::new("short"), in_a_minute())
            .is_some());
        assert!(store
            .remove_if_expired(&EntryKey::new("forever"), in_a_minute())
            .is_none());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_store_remove_expired() {
        let store = MemoryStore::new(100);

        store.put(entry("key1", "value1").with_absolute_expiration(Duration::from_secs(1)));
        store.put(entry("key2", "value2").with_absolute_expiration(Duration::from_secs(600)));

        let removed = store.remove_expired(in_a_minute());
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].key(), "key1");
        assert_eq!(store.count(), 1);
        assert!(store.get(&EntryKey::new("key2")).is_some());
    }

    #[test]
    fn test_store_clear() {
        let store = MemoryStore::new(100);
        store.put(entry("a", "1"));
        store.put(entry("b", "2"));

        store.clear();
        assert_eq!(store.count(), 0);
    }
}
