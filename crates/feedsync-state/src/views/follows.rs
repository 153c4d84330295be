//! Follow lists

use feedsync_core::models::{FollowData, FollowField};
use feedsync_core::{
    EventListener, Identifiable, ListQuery, ListenerError, ObservableView, PaginationData, StateEvent,
};
use std::sync::Arc;

use super::{membership_after_update, Membership};
use crate::store::{InsertionPolicy, PaginatedStateStore, PaginatedView};

/// Mutations a follow list accepts from its router.
pub trait FollowListMutations: Send + Sync {
    /// Whether the follow is loaded.
    fn contains_follow(&self, follow_id: &str) -> bool;
    /// A matching follow was created or changed.
    fn on_follow_upserted(&self, follow: FollowData);
    /// A follow left the list.
    fn on_follow_removed(&self, follow_id: &str);
}

/// Routes bus events to a [`FollowListMutations`] by filter.
pub struct FollowListEventHandler {
    query: ListQuery<FollowField>,
    state: Arc<dyn FollowListMutations>,
}

impl FollowListEventHandler {
    /// Create a router for `state`, scoped by `query`'s filter.
    pub fn new(query: ListQuery<FollowField>, state: Arc<dyn FollowListMutations>) -> Self {
        Self { query, state }
    }

    fn route(&self, event: &StateEvent) -> bool {
        let state = self.state.as_ref();
        match event {
            StateEvent::FollowAdded { follow } if self.query.matches(follow) => {
                state.on_follow_upserted(follow.clone());
                true
            }
            StateEvent::FollowUpdated { follow } => {
                let id = follow.id();
                match membership_after_update(&self.query, follow, state.contains_follow(&id)) {
                    Membership::Upsert => state.on_follow_upserted(follow.clone()),
                    Membership::Remove => state.on_follow_removed(&id),
                    Membership::Skip => return false,
                }
                true
            }
            StateEvent::FollowDeleted { follow } => {
                let id = follow.id();
                if !state.contains_follow(&id) {
                    return false;
                }
                state.on_follow_removed(&id);
                true
            }
            _ => false,
        }
    }
}

impl EventListener<StateEvent> for FollowListEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), "follow list updated");
        }
        Ok(())
    }
}

/// Observable state of a follow list.
pub struct FollowListState {
    query: ListQuery<FollowField>,
    store: PaginatedStateStore<FollowData>,
}

impl FollowListState {
    /// Create an empty list for `query`.
    pub fn new(query: ListQuery<FollowField>) -> Self {
        let insertion = query.comparator().map_or(InsertionPolicy::Start, InsertionPolicy::Sorted);
        Self {
            query,
            store: PaginatedStateStore::new(insertion),
        }
    }

    /// The list's query.
    pub fn query(&self) -> &ListQuery<FollowField> {
        &self.query
    }

    /// Observable follows.
    pub fn follows(&self) -> ObservableView<Vec<FollowData>> {
        self.store.observe()
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.store.can_load_more()
    }

    /// Install a fetched page.
    pub fn apply_page(&self, models: Vec<FollowData>, pagination: PaginationData, replace: bool) {
        if replace {
            self.store.replace(models, pagination);
        } else {
            self.store.append_page(models, pagination);
        }
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> FollowListEventHandler {
        FollowListEventHandler::new(self.query.clone(), self.clone())
    }
}

impl PaginatedView<FollowData> for FollowListState {
    fn store(&self) -> &PaginatedStateStore<FollowData> {
        &self.store
    }
}

impl FollowListMutations for FollowListState {
    fn contains_follow(&self, follow_id: &str) -> bool {
        self.store.contains(follow_id)
    }

    fn on_follow_upserted(&self, follow: FollowData) {
        self.store.upsert(follow);
    }

    fn on_follow_removed(&self, follow_id: &str) {
        self.store.remove(follow_id);
    }
}
