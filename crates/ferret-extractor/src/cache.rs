//! Fixed-capacity least-recently-used map

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Map with a fixed capacity that evicts the least recently used key
///
/// Both [`get`](Self::get) and [`put`](Self::put) mark the key as most
/// recently used. The cache does no locking of its own; wrap it in a mutex
/// when several tasks share it.
///
/// # Examples
///
/// ```
/// use ferret_extractor::RecencyCache;
///
/// let mut cache = RecencyCache::new(2);
/// cache.put(1, "a");
/// cache.put(2, "b");
/// cache.get(&1);
/// cache.put(3, "c");
///
/// assert!(cache.contains(&1));
/// assert!(!cache.contains(&2));
/// ```
#[derive(Debug)]
pub struct RecencyCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    // Front is least recently used
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> RecencyCache<K, V> {
    /// Create a cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Look up a key, marking it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.entries.contains_key(key) {
            self.touch(key);
        }
        self.entries.get(key)
    }

    /// Insert or replace a value, marking the key most recently used
    ///
    /// Returns the entry evicted to make room, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.entries.contains_key(&key) {
            self.touch(&key);
            self.entries.insert(key, value);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.order
                .pop_front()
                .and_then(|oldest| self.entries.remove_entry(&oldest))
        } else {
            None
        };

        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        evicted
    }

    /// Whether a key is cached, without touching it
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}
