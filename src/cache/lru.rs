//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for capacity eviction.

use std::collections::VecDeque;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub struct LruTracker<K> {
    /// Order of keys by access time
    order: VecDeque<K>,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }
}

impl<K: PartialEq + Clone> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    pub fn touch(&mut self, key: &K) {
        self.remove(key);
        self.order.push_front(key.clone());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &K) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        self.order.pop_back()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntryKey;

    fn key(name: &str) -> EntryKey {
        EntryKey::new(name)
    }

    #[test]
    fn test_lru_new() {
        let mut lru: LruTracker<EntryKey> = LruTracker::new();
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::new();

        lru.touch(&key("key1"));
        lru.touch(&key("key2"));
        lru.touch(&key("key3"));

        // Touch key1 again - should move to front
        lru.touch(&key("key1"));

        assert_eq!(lru.evict_oldest(), Some(key("key2")));
        assert_eq!(lru.evict_oldest(), Some(key("key3")));
        assert_eq!(lru.evict_oldest(), Some(key("key1")));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_regions_are_distinct_keys() {
        let mut lru = LruTracker::new();

        lru.touch(&EntryKey::in_region("k", "a"));
        lru.touch(&EntryKey::in_region("k", "b"));
        lru.touch(&key("k"));
        lru.remove(&EntryKey::in_region("k", "a"));

        assert_eq!(lru.evict_oldest(), Some(EntryKey::in_region("k", "b")));
        assert_eq!(lru.evict_oldest(), Some(key("k")));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove_nonexistent_key() {
        let mut lru = LruTracker::new();

        lru.touch(&key("key1"));
        lru.remove(&key("nonexistent"));

        assert_eq!(lru.evict_oldest(), Some(key("key1")));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();
        lru.touch(&key("a"));
        lru.touch(&key("b"));

        lru.clear();
        assert_eq!(lru.evict_oldest(), None);
    }
}
