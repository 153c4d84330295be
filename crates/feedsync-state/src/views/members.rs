//! Member lists of a feed

use feedsync_core::models::{FeedMemberData, MemberField};
use feedsync_core::{
    EventListener, FeedId, ListQuery, ListenerError, ObservableView, PaginationData, StateEvent,
};
use std::sync::Arc;

use super::{membership_after_update, Membership};
use crate::store::{InsertionPolicy, PaginatedStateStore, PaginatedView};

/// Mutations a member list accepts from its router.
pub trait MemberListMutations: Send + Sync {
    /// Whether the member is loaded.
    fn contains_member(&self, user_id: &str) -> bool;
    /// A matching member joined or changed.
    fn on_member_upserted(&self, member: FeedMemberData);
    /// A member left the list.
    fn on_member_removed(&self, user_id: &str);
}

/// Routes bus events for one feed's members to a [`MemberListMutations`].
pub struct MemberListEventHandler {
    fid: FeedId,
    query: ListQuery<MemberField>,
    state: Arc<dyn MemberListMutations>,
}

impl MemberListEventHandler {
    /// Create a router for members of `fid` matching `query`.
    pub fn new(fid: FeedId, query: ListQuery<MemberField>, state: Arc<dyn MemberListMutations>) -> Self {
        Self { fid, query, state }
    }

    fn route(&self, event: &StateEvent) -> bool {
        let state = self.state.as_ref();
        match event {
            StateEvent::FeedMemberAdded { fid, member } if *fid == self.fid && self.query.matches(member) => {
                state.on_member_upserted(member.clone());
                true
            }
            StateEvent::FeedMemberUpdated { fid, member } if *fid == self.fid => {
                let loaded = state.contains_member(&member.user.id);
                match membership_after_update(&self.query, member, loaded) {
                    Membership::Upsert => state.on_member_upserted(member.clone()),
                    Membership::Remove => state.on_member_removed(&member.user.id),
                    Membership::Skip => return false,
                }
                true
            }
            StateEvent::FeedMemberRemoved { fid, user_id } if *fid == self.fid && state.contains_member(user_id) => {
                state.on_member_removed(user_id);
                true
            }
            _ => false,
        }
    }
}

impl EventListener<StateEvent> for MemberListEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), fid = %self.fid, "member list updated");
        }
        Ok(())
    }
}

/// Observable state of a feed's member list.
pub struct MemberListState {
    fid: FeedId,
    query: ListQuery<MemberField>,
    store: PaginatedStateStore<FeedMemberData>,
}

impl MemberListState {
    /// Create an empty member list for `fid`.
    pub fn new(fid: FeedId, query: ListQuery<MemberField>) -> Self {
        let insertion = InsertionPolicy::from_comparator(query.comparator());
        Self {
            fid,
            query,
            store: PaginatedStateStore::new(insertion),
        }
    }

    /// The feed.
    pub fn fid(&self) -> &FeedId {
        &self.fid
    }

    /// The list's query.
    pub fn query(&self) -> &ListQuery<MemberField> {
        &self.query
    }

    /// Observable members.
    pub fn members(&self) -> ObservableView<Vec<FeedMemberData>> {
        self.store.observe()
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.store.can_load_more()
    }

    /// Install a fetched page.
    pub fn apply_page(&self, models: Vec<FeedMemberData>, pagination: PaginationData, replace: bool) {
        if replace {
            self.store.replace(models, pagination);
        } else {
            self.store.append_page(models, pagination);
        }
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> MemberListEventHandler {
        MemberListEventHandler::new(self.fid.clone(), self.query.clone(), self.clone())
    }
}

impl PaginatedView<FeedMemberData> for MemberListState {
    fn store(&self) -> &PaginatedStateStore<FeedMemberData> {
        &self.store
    }
}

impl MemberListMutations for MemberListState {
    fn contains_member(&self, user_id: &str) -> bool {
        self.store.contains(user_id)
    }

    fn on_member_upserted(&self, member: FeedMemberData) {
        self.store.upsert(member);
    }

    fn on_member_removed(&self, user_id: &str) {
        self.store.remove(user_id);
    }
}
