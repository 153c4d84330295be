//! Single-feed state
//!
//! A feed view combines the feed's own data, its activity timeline, its
//! follow graph around the feed and its members. Activity events are routed
//! exactly as for an activity list scoped to the feed's id; everything else
//! is filtered by `fid`.

use feedsync_core::models::{
    ActivityData, ActivityField, FeedCapabilities, FeedData, FeedMemberData, FeedOwnValues, FollowData,
};
use feedsync_core::{
    EventListener, FeedId, FeedPage, Identifiable, ListQuery, ListenerError, Observable, ObservableView,
    PaginationData, StateEvent,
};
use std::sync::Arc;

use super::activity_list::{route_activity_event, ActivityCollectionMutations, ActivityListState, ActivityScope};
use crate::store::{InsertionPolicy, PaginatedStateStore, PaginatedView};

/// Mutations a feed state accepts from its router.
pub trait FeedMutations: Send + Sync {
    /// The feed's activity timeline.
    fn activities(&self) -> &dyn ActivityCollectionMutations;
    /// Server copy of the feed after an edit.
    fn on_feed_updated(&self, feed: &FeedData);
    /// The feed was deleted.
    fn on_feed_removed(&self);
    /// A follow into or out of the feed was created or changed.
    fn on_follow_upserted(&self, follow: &FollowData);
    /// A follow into or out of the feed was deleted.
    fn on_follow_removed(&self, follow: &FollowData);
    /// A member joined or changed.
    fn on_member_upserted(&self, member: FeedMemberData);
    /// A member left.
    fn on_member_removed(&self, user_id: &str);
    /// The current user's capabilities on the feed were published. Returns whether anything changed.
    fn on_capabilities_updated(&self, capabilities: &FeedCapabilities) -> bool;
    /// The current user's follows or membership of the feed changed.
    fn on_own_values_updated(&self, values: &FeedOwnValues);
}

/// Routes bus events for one feed to a [`FeedMutations`].
pub struct FeedEventHandler {
    fid: FeedId,
    scope: ActivityScope,
    state: Arc<dyn FeedMutations>,
}

impl FeedEventHandler {
    /// Create a router for the feed `scope.fid`. A scope without a feed id
    /// is narrowed to `fid`.
    pub fn new(fid: FeedId, scope: ActivityScope, state: Arc<dyn FeedMutations>) -> Self {
        let scope = scope.with_fid(fid.clone());
        Self { fid, scope, state }
    }

    fn route(&self, event: &StateEvent) -> bool {
        let fid = &self.fid;
        let state = self.state.as_ref();
        match event {
            StateEvent::FeedUpdated { feed } if feed.fid == *fid => state.on_feed_updated(feed),
            StateEvent::FeedDeleted { fid: deleted } if deleted == fid => state.on_feed_removed(),
            StateEvent::FollowAdded { follow } | StateEvent::FollowUpdated { follow } if follow.touches(fid) => {
                state.on_follow_upserted(follow);
            }
            StateEvent::FollowDeleted { follow } if follow.touches(fid) => state.on_follow_removed(follow),
            StateEvent::FeedMemberAdded { fid: target, member } | StateEvent::FeedMemberUpdated { fid: target, member }
                if target == fid =>
            {
                state.on_member_upserted(member.clone());
            }
            StateEvent::FeedMemberRemoved { fid: target, user_id } if target == fid => {
                state.on_member_removed(user_id);
            }
            StateEvent::FeedCapabilitiesUpdated { capabilities } => {
                let own = capabilities
                    .get(fid)
                    .is_some_and(|caps| state.on_capabilities_updated(caps));
                // Activities may carry other feeds' capabilities too.
                let routed = route_activity_event(event, &self.scope, state.activities());
                return own || routed;
            }
            StateEvent::FeedOwnValuesUpdated { values } => match values.get(fid) {
                Some(values) => state.on_own_values_updated(values),
                None => return false,
            },
            _ => return route_activity_event(event, &self.scope, state.activities()),
        }
        true
    }
}

impl EventListener<StateEvent> for FeedEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), fid = %self.fid, "feed updated");
        }
        Ok(())
    }
}

/// Observable state of one feed.
pub struct FeedState {
    fid: FeedId,
    feed: Observable<Option<FeedData>>,
    deleted: Observable<bool>,
    activities: ActivityListState,
    followers: PaginatedStateStore<FollowData>,
    following: PaginatedStateStore<FollowData>,
    follow_requests: PaginatedStateStore<FollowData>,
    members: PaginatedStateStore<FeedMemberData>,
    own_capabilities: Observable<Option<FeedCapabilities>>,
    own_values: Observable<FeedOwnValues>,
}

impl FeedState {
    /// Create an empty state for `fid` whose timeline is loaded with `query`.
    pub fn new(fid: FeedId, query: ListQuery<ActivityField>, current_user_id: impl Into<String>) -> Self {
        let scope = ActivityScope::new(query, current_user_id).with_fid(fid.clone());
        Self::with_scope(fid, scope)
    }

    /// Create an empty state with a custom activity scope, e.g. a different
    /// insertion policy. The scope is narrowed to `fid`.
    pub fn with_scope(fid: FeedId, scope: ActivityScope) -> Self {
        Self {
            activities: ActivityListState::new(scope.with_fid(fid.clone())),
            fid,
            feed: Observable::new(None),
            deleted: Observable::new(false),
            followers: PaginatedStateStore::new(InsertionPolicy::Start),
            following: PaginatedStateStore::new(InsertionPolicy::Start),
            follow_requests: PaginatedStateStore::new(InsertionPolicy::Start),
            members: PaginatedStateStore::new(InsertionPolicy::Start),
            own_capabilities: Observable::new(None),
            own_values: Observable::new(FeedOwnValues::default()),
        }
    }

    /// The feed id.
    pub fn fid(&self) -> &FeedId {
        &self.fid
    }

    // ─── Observables ───

    /// Observable feed data; `None` until loaded and after deletion.
    pub fn feed(&self) -> ObservableView<Option<FeedData>> {
        self.feed.view()
    }

    /// Observable deletion flag.
    pub fn deleted(&self) -> ObservableView<bool> {
        self.deleted.view()
    }

    /// Observable activity timeline.
    pub fn activities(&self) -> ObservableView<Vec<ActivityData>> {
        self.activities.activities()
    }

    /// The timeline's list state, for paging.
    pub fn activity_list(&self) -> &ActivityListState {
        &self.activities
    }

    /// Accepted follows targeting this feed.
    pub fn followers(&self) -> ObservableView<Vec<FollowData>> {
        self.followers.observe()
    }

    /// Accepted follows from this feed.
    pub fn following(&self) -> ObservableView<Vec<FollowData>> {
        self.following.observe()
    }

    /// Pending follow requests addressed to this feed.
    pub fn follow_requests(&self) -> ObservableView<Vec<FollowData>> {
        self.follow_requests.observe()
    }

    /// Members of the feed.
    pub fn members(&self) -> ObservableView<Vec<FeedMemberData>> {
        self.members.observe()
    }

    /// The current user's capabilities on the feed.
    pub fn own_capabilities(&self) -> ObservableView<Option<FeedCapabilities>> {
        self.own_capabilities.view()
    }

    /// The current user's follows and membership of the feed.
    pub fn own_values(&self) -> ObservableView<FeedOwnValues> {
        self.own_values.view()
    }

    /// Whether another timeline page exists.
    pub fn can_load_more(&self) -> bool {
        self.activities.can_load_more()
    }

    // ─── Loading ───

    /// Install a freshly fetched feed page, replacing everything loaded so far.
    pub fn apply_feed_page(&self, page: FeedPage) {
        let FeedPage {
            feed,
            activities,
            followers,
            following,
            follow_requests,
            members,
        } = page;

        if let Some(caps) = feed.own_capabilities.clone() {
            self.own_capabilities.set(Some(caps));
        }
        self.feed.set(Some(feed));
        self.deleted.modify(|deleted| std::mem::replace(deleted, false));
        self.activities
            .apply_page(activities.models, activities.pagination, true);
        self.followers.replace(followers, PaginationData::default());
        self.following.replace(following, PaginationData::default());
        self.follow_requests
            .replace(follow_requests, PaginationData::default());
        self.members.replace(members, PaginationData::default());
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> FeedEventHandler {
        FeedEventHandler::new(self.fid.clone(), self.activities.scope().clone(), self.clone())
    }
}

impl PaginatedView<ActivityData> for FeedState {
    fn store(&self) -> &PaginatedStateStore<ActivityData> {
        self.activities.store()
    }
}

impl FeedMutations for FeedState {
    fn activities(&self) -> &dyn ActivityCollectionMutations {
        &self.activities
    }

    fn on_feed_updated(&self, feed: &FeedData) {
        let mut caps = None;
        self.feed.update(|slot| {
            let merged = match slot.as_ref() {
                Some(existing) => existing.merged_with(feed),
                None => feed.clone(),
            };
            caps = merged.own_capabilities.clone();
            *slot = Some(merged);
        });
        if let Some(caps) = caps {
            self.on_capabilities_updated(&caps);
        }
    }

    fn on_feed_removed(&self) {
        self.feed.set(None);
        self.deleted.set(true);
    }

    fn on_follow_upserted(&self, follow: &FollowData) {
        // A status change can move a follow between lists.
        self.on_follow_removed(follow);
        if follow.is_follower_of(&self.fid) {
            self.followers.upsert(follow.clone());
        }
        if follow.is_following_of(&self.fid) {
            self.following.upsert(follow.clone());
        }
        if follow.is_request_to(&self.fid) {
            self.follow_requests.upsert(follow.clone());
        }
    }

    fn on_follow_removed(&self, follow: &FollowData) {
        let id = follow.id();
        self.followers.remove(&id);
        self.following.remove(&id);
        self.follow_requests.remove(&id);
    }

    fn on_member_upserted(&self, member: FeedMemberData) {
        self.members.upsert(member);
    }

    fn on_member_removed(&self, user_id: &str) {
        self.members.remove(user_id);
    }

    fn on_capabilities_updated(&self, capabilities: &FeedCapabilities) -> bool {
        let own = self.own_capabilities.modify(|slot| {
            if slot.as_ref() == Some(capabilities) {
                return false;
            }
            *slot = Some(capabilities.clone());
            true
        });
        let feed = self.feed.modify(|slot| match slot.as_mut() {
            Some(feed) if feed.own_capabilities.as_ref() != Some(capabilities) => {
                feed.own_capabilities = Some(capabilities.clone());
                true
            }
            _ => false,
        });
        own || feed
    }

    fn on_own_values_updated(&self, values: &FeedOwnValues) {
        self.own_values.modify(|slot| {
            if slot == values {
                return false;
            }
            *slot = values.clone();
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::models::{FeedOwnCapability, FollowStatus};
    use feedsync_testkit::{ActivityBuilder, FeedBuilder, FollowBuilder};
    use std::collections::HashMap;

    fn state() -> Arc<FeedState> {
        Arc::new(FeedState::new(FeedId::new("user", "alice"), ListQuery::new(), "alice"))
    }

    #[test]
    fn follow_moves_from_requests_to_followers() {
        let state = state();
        let handler = state.event_handler();
        let pending = FollowBuilder::new("user:bob", "user:alice")
            .status(FollowStatus::Pending)
            .build();
        handler.on_event(&StateEvent::FollowAdded { follow: pending.clone() }).unwrap();
        assert_eq!(state.follow_requests().get().len(), 1);
        assert!(state.followers().get().is_empty());

        let accepted = FollowBuilder::new("user:bob", "user:alice")
            .status(FollowStatus::Accepted)
            .build();
        handler.on_event(&StateEvent::FollowUpdated { follow: accepted }).unwrap();
        assert!(state.follow_requests().get().is_empty());
        assert_eq!(state.followers().get().len(), 1);
    }

    #[test]
    fn events_for_other_feeds_are_ignored() {
        let state = state();
        let handler = state.event_handler();
        let activity = ActivityBuilder::new("a1").user("alice").build();
        handler
            .on_event(&StateEvent::ActivityAdded {
                fid: FeedId::new("user", "bob"),
                activity,
            })
            .unwrap();
        handler
            .on_event(&StateEvent::FeedDeleted {
                fid: FeedId::new("user", "bob"),
            })
            .unwrap();
        assert!(state.activities().get().is_empty());
        assert!(!state.deleted().get());
    }

    #[test]
    fn own_activity_lands_on_timeline() {
        let state = state();
        let handler = state.event_handler();
        let activity = ActivityBuilder::new("a1").user("alice").build();
        handler
            .on_event(&StateEvent::ActivityAdded {
                fid: FeedId::new("user", "alice"),
                activity,
            })
            .unwrap();
        assert_eq!(state.activities().get().len(), 1);
    }

    #[test]
    fn capabilities_for_fid_update_feed() {
        let state = state();
        state.on_feed_updated(&FeedBuilder::new("user:alice").build());
        let caps: FeedCapabilities = [FeedOwnCapability::ReadFeed].into_iter().collect();
        let mut map = HashMap::new();
        map.insert(FeedId::new("user", "alice"), caps.clone());

        state
            .event_handler()
            .on_event(&StateEvent::FeedCapabilitiesUpdated {
                capabilities: Arc::new(map),
            })
            .unwrap();

        assert_eq!(state.own_capabilities().get(), Some(caps.clone()));
        assert_eq!(state.feed().get().and_then(|feed| feed.own_capabilities), Some(caps));
    }
}
