//! Cache-backed value resolution
//!
//! A [`ValueResolver`] answers lookups from its [`KeyedCache`] and schedules
//! misses on a [`RequestCoalescer`]. Each dispatched batch drops keys that
//! got cached in the meantime, fetches the rest through a [`BatchFetcher`]
//! under a [`RetryPolicy`] and merges the answer back into the cache.
//! Fetch failures are logged and dropped; the next lookup of a missing key
//! schedules it again.

use feedsync_core::{BatchFetcher, RetryPolicy, RetryableError};
use futures::future::BoxFuture;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::cache::KeyedCache;
use crate::coalescer::{Batch, BatchHandler, RequestCoalescer};
use crate::config::CoalescerConfig;

/// Read-through front of a [`KeyedCache`].
pub struct ValueResolver<K, V> {
    name: &'static str,
    cache: Arc<KeyedCache<K, V>>,
    coalescer: RequestCoalescer<K>,
}

impl<K, V> ValueResolver<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start a resolver named `name` (used in logs) on the current tokio runtime.
    pub fn new(
        name: &'static str,
        cache: Arc<KeyedCache<K, V>>,
        fetcher: Arc<dyn BatchFetcher<K, V>>,
        config: CoalescerConfig,
        retry: RetryPolicy,
    ) -> Self {
        let handler = batch_handler(name, cache.clone(), fetcher, retry);
        Self {
            name,
            cache,
            coalescer: RequestCoalescer::new(config, handler),
        }
    }

    /// Cached value for `key`. A miss schedules a fetch and returns `None`.
    pub fn get_or_request(&self, key: &K) -> Option<V> {
        let value = self.cache.get(key);
        if value.is_none() {
            self.coalescer.offer(key.clone());
        }
        value
    }

    /// Cached value for `key`, without scheduling anything.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.cache.get(key)
    }

    /// Schedule every key of `keys` that is not cached yet.
    pub fn request(&self, keys: impl IntoIterator<Item = K>) {
        for key in keys {
            if !self.cache.contains(&key) {
                self.coalescer.offer(key);
            }
        }
    }

    /// Merge known values directly, e.g. ones embedded in a fetched page.
    pub fn cache(&self, values: impl IntoIterator<Item = (K, V)>) -> bool {
        self.cache.cache(values)
    }

    /// The underlying cache.
    pub fn store(&self) -> &Arc<KeyedCache<K, V>> {
        &self.cache
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn batch_handler<K, V>(
    name: &'static str,
    cache: Arc<KeyedCache<K, V>>,
    fetcher: Arc<dyn BatchFetcher<K, V>>,
    retry: RetryPolicy,
) -> BatchHandler<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    Arc::new(move |batch: Batch<K>| -> BoxFuture<'static, ()> {
        let cache = cache.clone();
        let fetcher = fetcher.clone();
        let retry = retry.clone();
        Box::pin(async move {
            let keys: Vec<K> = batch.keys.into_iter().filter(|key| !cache.contains(key)).collect();
            if keys.is_empty() {
                tracing::trace!(resolver = name, index = batch.index, "batch already cached");
                return;
            }

            let outcome = retry
                .execute_with_context(|| fetcher.fetch(keys.clone()))
                .await;
            match outcome.result {
                Ok(values) => {
                    let changed = cache.cache(values);
                    tracing::debug!(
                        resolver = name,
                        keys = keys.len(),
                        attempts = outcome.attempts,
                        changed,
                        "batch resolved"
                    );
                }
                Err(error) if error.is_cancelled() => {
                    tracing::debug!(resolver = name, "batch fetch cancelled");
                }
                Err(error) => {
                    tracing::warn!(
                        resolver = name,
                        keys = keys.len(),
                        attempts = outcome.attempts,
                        %error,
                        "batch fetch failed"
                    );
                }
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::FeedsError;
    use feedsync_testkit::MockBatchFetcher;
    use std::time::Duration;

    fn config() -> CoalescerConfig {
        CoalescerConfig::default()
            .with_initial_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(50))
    }

    #[tokio::test(start_paused = true)]
    async fn miss_is_fetched_once_and_cached() {
        let fetcher = Arc::new(MockBatchFetcher::new([("a", 1), ("b", 2)]));
        let resolver = ValueResolver::new(
            "test",
            Arc::new(KeyedCache::new()),
            fetcher.clone(),
            config(),
            RetryPolicy::none(),
        );

        assert_eq!(resolver.get_or_request(&"a"), None);
        assert_eq!(resolver.get_or_request(&"b"), None);
        assert_eq!(resolver.get_or_request(&"a"), None);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(resolver.peek(&"a"), Some(1));
        assert_eq!(resolver.get_or_request(&"b"), Some(2));
        assert_eq!(fetcher.calls(), vec![vec!["a", "b"]]);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cached_keys_skip_the_fetch() {
        let fetcher = Arc::new(MockBatchFetcher::new([("a", 1)]));
        let resolver = ValueResolver::new(
            "test",
            Arc::new(KeyedCache::new()),
            fetcher.clone(),
            config(),
            RetryPolicy::none(),
        );

        resolver.get_or_request(&"a");
        resolver.cache([("a", 7)]);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(fetcher.invocations(), 0);
        assert_eq!(resolver.peek(&"a"), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_failure_is_attempted_three_times() {
        let fetcher = Arc::new(
            MockBatchFetcher::new([("a", 1)]).fail_next(10, FeedsError::network("offline")),
        );
        let resolver = ValueResolver::new(
            "test",
            Arc::new(KeyedCache::new()),
            fetcher.clone(),
            config(),
            RetryPolicy::exponential().with_max_attempts(3),
        );

        resolver.request(["a"]);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(fetcher.invocations(), 3);
        assert_eq!(resolver.peek(&"a"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let fetcher = Arc::new(MockBatchFetcher::new([("a", 1)]).fail_next(1, FeedsError::not_found("a")));
        let resolver = ValueResolver::new(
            "test",
            Arc::new(KeyedCache::new()),
            fetcher.clone(),
            config(),
            RetryPolicy::exponential(),
        );

        resolver.request(["a"]);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(fetcher.invocations(), 1);
    }
}
