//! Feed lists

use feedsync_core::models::{FeedCapabilities, FeedData, FeedField};
use feedsync_core::{
    EventListener, FeedId, Identifiable, ListQuery, ListenerError, ObservableView, PaginationData,
    StateEvent,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::{membership_after_update, Membership};
use crate::store::{InsertionPolicy, PaginatedStateStore, PaginatedView};

/// Mutations a feed list accepts from its router.
pub trait FeedListMutations: Send + Sync {
    /// Whether the feed is loaded.
    fn contains_feed(&self, fid: &FeedId) -> bool;
    /// A matching feed was created or changed.
    fn on_feed_upserted(&self, feed: &FeedData);
    /// A feed left the list.
    fn on_feed_removed(&self, fid: &FeedId);
    /// The capabilities cache published a new snapshot. Returns whether any feed changed.
    fn on_capabilities_updated(&self, capabilities: &HashMap<FeedId, FeedCapabilities>) -> bool;
}

/// Routes bus events to a [`FeedListMutations`] by filter.
pub struct FeedListEventHandler {
    query: ListQuery<FeedField>,
    state: Arc<dyn FeedListMutations>,
}

impl FeedListEventHandler {
    /// Create a router for `state`, scoped by `query`'s filter.
    pub fn new(query: ListQuery<FeedField>, state: Arc<dyn FeedListMutations>) -> Self {
        Self { query, state }
    }

    fn route(&self, event: &StateEvent) -> bool {
        let state = self.state.as_ref();
        match event {
            StateEvent::FeedAdded { feed } if self.query.matches(feed) => {
                state.on_feed_upserted(feed);
                true
            }
            StateEvent::FeedUpdated { feed } => {
                match membership_after_update(&self.query, feed, state.contains_feed(&feed.fid)) {
                    Membership::Upsert => state.on_feed_upserted(feed),
                    Membership::Remove => state.on_feed_removed(&feed.fid),
                    Membership::Skip => return false,
                }
                true
            }
            StateEvent::FeedDeleted { fid } if state.contains_feed(fid) => {
                state.on_feed_removed(fid);
                true
            }
            StateEvent::FeedCapabilitiesUpdated { capabilities } => state.on_capabilities_updated(capabilities),
            _ => false,
        }
    }
}

impl EventListener<StateEvent> for FeedListEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), "feed list updated");
        }
        Ok(())
    }
}

/// Observable state of a feed list.
pub struct FeedListState {
    query: ListQuery<FeedField>,
    store: PaginatedStateStore<FeedData>,
}

impl FeedListState {
    /// Create an empty list for `query`.
    pub fn new(query: ListQuery<FeedField>) -> Self {
        let insertion = query.comparator().map_or(InsertionPolicy::Start, InsertionPolicy::Sorted);
        Self {
            query,
            store: PaginatedStateStore::new(insertion),
        }
    }

    /// The list's query.
    pub fn query(&self) -> &ListQuery<FeedField> {
        &self.query
    }

    /// Observable feeds.
    pub fn feeds(&self) -> ObservableView<Vec<FeedData>> {
        self.store.observe()
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.store.can_load_more()
    }

    /// Install a fetched page.
    pub fn apply_page(&self, models: Vec<FeedData>, pagination: PaginationData, replace: bool) {
        if replace {
            self.store.replace(models, pagination);
        } else {
            self.store.append_page(models, pagination);
        }
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> FeedListEventHandler {
        FeedListEventHandler::new(self.query.clone(), self.clone())
    }
}

impl PaginatedView<FeedData> for FeedListState {
    fn store(&self) -> &PaginatedStateStore<FeedData> {
        &self.store
    }
}

impl FeedListMutations for FeedListState {
    fn contains_feed(&self, fid: &FeedId) -> bool {
        self.store.contains(&fid.raw_value())
    }

    fn on_feed_upserted(&self, feed: &FeedData) {
        let id = feed.id();
        if !self.store.update(&id, |existing| *existing = existing.merged_with(feed)) {
            self.store.upsert(feed.clone());
        }
    }

    fn on_feed_removed(&self, fid: &FeedId) {
        self.store.remove(&fid.raw_value());
    }

    fn on_capabilities_updated(&self, capabilities: &HashMap<FeedId, FeedCapabilities>) -> bool {
        self.store.update_all(|feed| match capabilities.get(&feed.fid) {
            Some(caps) if feed.own_capabilities.as_ref() != Some(caps) => {
                feed.own_capabilities = Some(caps.clone());
                true
            }
            _ => false,
        })
    }
}
