//! Keyed value cache with change publication
//!
//! A [`KeyedCache`] holds the latest known value per key and reports merges
//! that changed something to a single [`ChangeListener`]. Snapshots are
//! versioned: a snapshot is only handed to the listener if no newer one has
//! been handed out already, so concurrent merges never make observers go back
//! in time.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Receives every published snapshot of a [`KeyedCache`].
pub type ChangeListener<K, V> = Arc<dyn Fn(Arc<HashMap<K, V>>) + Send + Sync>;

struct Entries<K, V> {
    values: HashMap<K, V>,
    version: u64,
}

/// Thread-safe map of the latest value per key.
pub struct KeyedCache<K, V> {
    entries: RwLock<Entries<K, V>>,
    published: Mutex<u64>,
    listener: Option<ChangeListener<K, V>>,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    /// An empty cache without a listener.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries {
                values: HashMap::new(),
                version: 0,
            }),
            published: Mutex::new(0),
            listener: None,
        }
    }

    /// Report changed snapshots to `listener`.
    ///
    /// The listener runs synchronously inside [`cache`](Self::cache) and must
    /// not merge into the same cache.
    pub fn with_listener(mut self, listener: ChangeListener<K, V>) -> Self {
        self.listener = Some(listener);
        self
    }

    // ─── Queries ───

    /// Cached value for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.read().values.get(key).cloned()
    }

    /// Whether `key` has a value.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().values.contains_key(key)
    }

    /// Copy of the whole map.
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.entries.read().values.clone()
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.entries.read().values.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().values.is_empty()
    }

    /// Version of the latest merge that changed the map.
    pub fn version(&self) -> u64 {
        self.entries.read().version
    }

    // ─── Mutations ───

    /// Merge `updates` into the cache. Publishes one snapshot and returns
    /// `true` iff a value was added or changed.
    pub fn cache(&self, updates: impl IntoIterator<Item = (K, V)>) -> bool {
        let (version, snapshot) = {
            let mut entries = self.entries.write();
            let mut changed = false;
            for (key, value) in updates {
                if entries.values.get(&key) != Some(&value) {
                    entries.values.insert(key, value);
                    changed = true;
                }
            }
            if !changed {
                return false;
            }
            entries.version += 1;
            (entries.version, Arc::new(entries.values.clone()))
        };
        self.publish(version, snapshot);
        true
    }

    /// Drop every cached value. Publishes an empty snapshot if the cache held anything.
    pub fn clear(&self) {
        let (version, snapshot) = {
            let mut entries = self.entries.write();
            if entries.values.is_empty() {
                return;
            }
            entries.values.clear();
            entries.version += 1;
            (entries.version, Arc::new(HashMap::new()))
        };
        self.publish(version, snapshot);
    }

    fn publish(&self, version: u64, snapshot: Arc<HashMap<K, V>>) {
        let mut published = self.published.lock();
        if version <= *published {
            tracing::trace!(version, latest = *published, "stale cache snapshot skipped");
            return;
        }
        *published = version;
        tracing::debug!(version, keys = snapshot.len(), "cache snapshot published");
        if let Some(listener) = &self.listener {
            listener(snapshot);
        }
    }
}

impl<K, V> Default for KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}
