//! Scripted fetchers and recording listeners
//!
//! Every mock records its calls so tests can assert on what the runtime
//! asked for, and can be scripted to fail a number of times first.

use async_trait::async_trait;
use feedsync_core::models::ActivityData;
use feedsync_core::{
    ActivityFetcher, BatchFetcher, EventListener, FeedFetcher, FeedId, FeedPage, FeedsError, ListQuery,
    ListenerError, PageFetcher, PaginationResult, Result,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Batch fetcher
// ============================================================================

/// A [`BatchFetcher`] answering from a fixed table.
///
/// Keys absent from the table are absent from the answer.
pub struct MockBatchFetcher<K, V> {
    table: Mutex<HashMap<K, V>>,
    failures: Mutex<VecDeque<FeedsError>>,
    calls: Mutex<Vec<Vec<K>>>,
    invocations: AtomicUsize,
}

impl<K, V> MockBatchFetcher<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// A fetcher that knows the given entries.
    pub fn new(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            table: Mutex::new(entries.into_iter().collect()),
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            invocations: AtomicUsize::new(0),
        }
    }

    /// Fail the next `times` invocations with `error`.
    pub fn fail_next(self, times: usize, error: FeedsError) -> Self {
        self.failures.lock().extend(std::iter::repeat(error).take(times));
        self
    }

    /// Change the value served for `key`.
    pub fn set(&self, key: K, value: V) {
        self.table.lock().insert(key, value);
    }

    /// Keys of every invocation, in call order.
    pub fn calls(&self) -> Vec<Vec<K>> {
        self.calls.lock().clone()
    }

    /// Number of invocations, failed ones included.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<K, V> BatchFetcher<K, V> for MockBatchFetcher<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn fetch(&self, keys: Vec<K>) -> Result<HashMap<K, V>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(keys.clone());
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        let table = self.table.lock();
        Ok(keys
            .into_iter()
            .filter_map(|key| table.get(&key).cloned().map(|value| (key, value)))
            .collect())
    }
}

// ============================================================================
// Page fetchers
// ============================================================================

/// A [`PageFetcher`] serving scripted pages in order.
pub struct MockPageFetcher<T> {
    pages: Mutex<VecDeque<Result<PaginationResult<T>>>>,
    cursors: Mutex<Vec<Option<String>>>,
}

impl<T> MockPageFetcher<T> {
    /// A fetcher that serves `pages` one per call, then empty last pages.
    pub fn new(pages: impl IntoIterator<Item = PaginationResult<T>>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().map(Ok).collect()),
            cursors: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failure after the pages queued so far.
    pub fn then_fail(self, error: FeedsError) -> Self {
        self.pages.lock().push_back(Err(error));
        self
    }

    /// The `next` cursor of every call, in call order.
    pub fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().clone()
    }
}

#[async_trait]
impl<T, F> PageFetcher<T, F> for MockPageFetcher<T>
where
    T: Send + 'static,
    F: Send + Sync + 'static,
{
    async fn fetch_page(&self, _query: &ListQuery<F>, next: Option<String>) -> Result<PaginationResult<T>> {
        self.cursors.lock().push(next);
        self.pages
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(PaginationResult::last(Vec::new())))
    }
}

/// An [`ActivityFetcher`] answering from a fixed set.
pub struct MockActivityFetcher {
    activities: Mutex<HashMap<String, ActivityData>>,
}

impl MockActivityFetcher {
    /// A fetcher that knows `activities`.
    pub fn new(activities: impl IntoIterator<Item = ActivityData>) -> Self {
        Self {
            activities: Mutex::new(activities.into_iter().map(|a| (a.id.clone(), a)).collect()),
        }
    }
}

#[async_trait]
impl ActivityFetcher for MockActivityFetcher {
    async fn fetch_activity(&self, activity_id: &str) -> Result<ActivityData> {
        self.activities
            .lock()
            .get(activity_id)
            .cloned()
            .ok_or_else(|| FeedsError::not_found(format!("activity {activity_id}")))
    }
}

/// A [`FeedFetcher`] serving scripted feed pages in order.
pub struct MockFeedFetcher {
    pages: Mutex<VecDeque<Result<FeedPage>>>,
    calls: Mutex<Vec<(FeedId, Option<String>)>>,
}

impl MockFeedFetcher {
    /// A fetcher that serves `pages` one per call.
    pub fn new(pages: impl IntoIterator<Item = FeedPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every `(fid, next)` requested, in call order.
    pub fn calls(&self) -> Vec<(FeedId, Option<String>)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl FeedFetcher for MockFeedFetcher {
    async fn fetch_feed(&self, fid: &FeedId, next: Option<String>) -> Result<FeedPage> {
        self.calls.lock().push((fid.clone(), next));
        self.pages
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(FeedsError::not_found(format!("feed {fid}"))))
    }
}

// ============================================================================
// Listeners
// ============================================================================

/// An [`EventListener`] that records every event it sees.
pub struct RecordingListener<E> {
    events: Mutex<Vec<E>>,
}

impl<E: Clone> RecordingListener<E> {
    /// An empty recorder.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Events seen so far.
    pub fn events(&self) -> Vec<E> {
        self.events.lock().clone()
    }

    /// Number of events seen so far.
    pub fn count(&self) -> usize {
        self.events.lock().len()
    }
}

impl<E: Clone> Default for RecordingListener<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + Sync> EventListener<E> for RecordingListener<E> {
    fn on_event(&self, event: &E) -> std::result::Result<(), ListenerError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batch_fetcher_fails_then_answers() {
        let fetcher = MockBatchFetcher::new([("a", 1), ("b", 2)]).fail_next(1, FeedsError::network("down"));

        assert!(fetcher.fetch(vec!["a"]).await.is_err());
        let answer = fetcher.fetch(vec!["a", "c"]).await.unwrap();

        assert_eq!(answer.len(), 1);
        assert_eq!(answer.get("a"), Some(&1));
        assert_eq!(fetcher.invocations(), 2);
        assert_eq!(fetcher.calls(), vec![vec!["a"], vec!["a", "c"]]);
    }
}
