//! Per-feed values of the signed-in user
//!
//! Two key spaces are resolved lazily per [`FeedId`]: the user's capabilities
//! on a feed and the user's own follows and membership of it. Every change
//! to either cache is announced on the event bus as one
//! [`StateEvent::FeedCapabilitiesUpdated`] or
//! [`StateEvent::FeedOwnValuesUpdated`] carrying the full snapshot, which
//! views pick their own entries from.

use feedsync_core::models::{ActivityData, FeedCapabilities, FeedData, FeedOwnValues};
use feedsync_core::{BatchFetcher, EventBus, FeedId, RetryPolicy, StateEvent};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{ChangeListener, KeyedCache};
use crate::config::CoalescerConfig;
use crate::resolver::ValueResolver;

fn bus_listener<V>(
    bus: EventBus<StateEvent>,
    to_event: fn(Arc<HashMap<FeedId, V>>) -> StateEvent,
) -> ChangeListener<FeedId, V>
where
    V: Send + Sync + 'static,
{
    Arc::new(move |snapshot| {
        let event = to_event(snapshot);
        let delivered = bus.publish(&event);
        tracing::trace!(event = event.name(), delivered, "own values published");
    })
}

// ============================================================================
// Capabilities
// ============================================================================

/// Resolves the current user's capabilities per feed.
pub struct FeedCapabilitiesService {
    resolver: ValueResolver<FeedId, FeedCapabilities>,
}

impl FeedCapabilitiesService {
    /// Start the service; changes are published on `bus`.
    pub fn new(
        bus: EventBus<StateEvent>,
        fetcher: Arc<dyn BatchFetcher<FeedId, FeedCapabilities>>,
        config: CoalescerConfig,
        retry: RetryPolicy,
    ) -> Self {
        let listener = bus_listener(bus, |capabilities| StateEvent::FeedCapabilitiesUpdated { capabilities });
        let cache = Arc::new(KeyedCache::new().with_listener(listener));
        Self {
            resolver: ValueResolver::new("feed_capabilities", cache, fetcher, config, retry),
        }
    }

    /// Capabilities on `fid`, scheduling a fetch when unknown.
    pub fn get_or_request(&self, fid: &FeedId) -> Option<FeedCapabilities> {
        self.resolver.get_or_request(fid)
    }

    /// Capabilities on `fid`, if known.
    pub fn peek(&self, fid: &FeedId) -> Option<FeedCapabilities> {
        self.resolver.peek(fid)
    }

    /// Schedule every unknown feed of `fids`.
    pub fn request(&self, fids: impl IntoIterator<Item = FeedId>) {
        self.resolver.request(fids);
    }

    /// Record capabilities embedded in fetched feeds.
    pub fn cache_from_feeds<'a>(&self, feeds: impl IntoIterator<Item = &'a FeedData>) -> bool {
        self.resolver.cache(
            feeds
                .into_iter()
                .filter_map(|feed| Some((feed.fid.clone(), feed.own_capabilities.clone()?))),
        )
    }

    /// Record capabilities embedded in the current feed of fetched activities.
    pub fn cache_from_activities<'a>(&self, activities: impl IntoIterator<Item = &'a ActivityData>) -> bool {
        self.cache_from_feeds(activities.into_iter().filter_map(|activity| activity.current_feed.as_ref()))
    }

    /// The underlying cache.
    pub fn cache(&self) -> &Arc<KeyedCache<FeedId, FeedCapabilities>> {
        self.resolver.store()
    }
}

// ============================================================================
// Own follows and membership
// ============================================================================

/// Resolves the current user's follows and membership per feed.
pub struct FeedOwnValuesService {
    resolver: ValueResolver<FeedId, FeedOwnValues>,
}

impl FeedOwnValuesService {
    /// Start the service; changes are published on `bus`.
    pub fn new(
        bus: EventBus<StateEvent>,
        fetcher: Arc<dyn BatchFetcher<FeedId, FeedOwnValues>>,
        config: CoalescerConfig,
        retry: RetryPolicy,
    ) -> Self {
        let listener = bus_listener(bus, |values| StateEvent::FeedOwnValuesUpdated { values });
        let cache = Arc::new(KeyedCache::new().with_listener(listener));
        Self {
            resolver: ValueResolver::new("feed_own_values", cache, fetcher, config, retry),
        }
    }

    /// Own values for `fid`, scheduling a fetch when unknown.
    pub fn get_or_request(&self, fid: &FeedId) -> Option<FeedOwnValues> {
        self.resolver.get_or_request(fid)
    }

    /// Own values for `fid`, if known.
    pub fn peek(&self, fid: &FeedId) -> Option<FeedOwnValues> {
        self.resolver.peek(fid)
    }

    /// Schedule every unknown feed of `fids`.
    pub fn request(&self, fids: impl IntoIterator<Item = FeedId>) {
        self.resolver.request(fids);
    }

    /// Record known values, e.g. after the user followed a feed.
    pub fn cache_values(&self, values: impl IntoIterator<Item = (FeedId, FeedOwnValues)>) -> bool {
        self.resolver.cache(values)
    }

    /// The underlying cache.
    pub fn cache(&self) -> &Arc<KeyedCache<FeedId, FeedOwnValues>> {
        self.resolver.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use feedsync_core::models::FeedOwnCapability;
    use feedsync_testkit::{FeedBuilder, MockBatchFetcher, RecordingListener};
    use std::time::Duration;

    fn caps() -> FeedCapabilities {
        [FeedOwnCapability::ReadFeed].into_iter().collect()
    }

    #[tokio::test(start_paused = true)]
    async fn fetched_capabilities_are_published_once() {
        let bus = EventBus::<StateEvent>::new();
        let recorder = Arc::new(RecordingListener::<StateEvent>::new());
        let _sub = bus.subscribe(recorder.clone());
        let fid = FeedId::new("user", "alice");
        let fetcher = Arc::new(MockBatchFetcher::new([(fid.clone(), caps())]));
        let service = FeedCapabilitiesService::new(bus, fetcher, CoalescerConfig::default(), RetryPolicy::none());

        assert_eq!(service.get_or_request(&fid), None);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(service.get_or_request(&fid), Some(caps()));

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_matches!(&events[0], StateEvent::FeedCapabilitiesUpdated { capabilities } if capabilities.get(&fid) == Some(&caps()));
    }

    #[tokio::test]
    async fn feeds_without_capabilities_are_skipped() {
        let bus = EventBus::<StateEvent>::new();
        let recorder = Arc::new(RecordingListener::<StateEvent>::new());
        let _sub = bus.subscribe(recorder.clone());
        let fetcher = Arc::new(MockBatchFetcher::<FeedId, FeedCapabilities>::new([]));
        let service = FeedCapabilitiesService::new(bus, fetcher, CoalescerConfig::default(), RetryPolicy::none());

        let with = FeedBuilder::new("user:alice").capabilities(caps()).build();
        let without = FeedBuilder::new("user:bob").build();
        assert!(service.cache_from_feeds([&with, &without]));
        assert!(!service.cache_from_feeds([&with]));

        assert_eq!(service.cache().len(), 1);
        assert_eq!(recorder.count(), 1);
    }
}
