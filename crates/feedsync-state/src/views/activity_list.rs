//! Activity lists
//!
//! [`ActivityListState`] backs a query-scoped list of activities. The routing
//! in [`route_activity_event`] is shared with feed views, which hold the same
//! kind of list scoped to one feed.

use feedsync_core::models::{
    ActivityData, ActivityField, BookmarkData, CommentData, FeedCapabilities, PollData, PollVoteData,
    ReactionData,
};
use feedsync_core::{
    EventListener, FeedId, ListQuery, ListenerError, ObservableView, PaginationData, StateEvent,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::insertion::{default_policy, InsertionAction, OnNewActivity};
use crate::store::{InsertionPolicy, PaginatedStateStore, PaginatedView};

/// Mutations an activity collection accepts from its router.
pub trait ActivityCollectionMutations: Send + Sync {
    /// Whether the activity is loaded.
    fn contains_activity(&self, activity_id: &str) -> bool;
    /// Whether an activity carrying this poll is loaded.
    fn contains_poll(&self, poll_id: &str) -> bool;

    /// Insert a new activity at the decided position.
    fn on_activity_inserted(&self, activity: ActivityData, action: InsertionAction);
    /// Replace a loaded activity with the server's copy.
    fn on_activity_updated(&self, activity: &ActivityData);
    /// Drop a loaded activity.
    fn on_activity_removed(&self, activity_id: &str);

    /// A reaction was added to a loaded activity.
    fn on_reaction_added(&self, activity: &ActivityData, reaction: ReactionData);
    /// A reaction was removed from a loaded activity.
    fn on_reaction_removed(&self, activity: &ActivityData, reaction: &ReactionData);

    /// A comment or reply was added to a loaded activity.
    fn on_comment_added(&self, comment: CommentData);
    /// A comment on a loaded activity was edited.
    fn on_comment_updated(&self, comment: &CommentData);
    /// A comment on a loaded activity was deleted.
    fn on_comment_removed(&self, comment: &CommentData);

    /// A loaded activity was bookmarked or a bookmark moved.
    fn on_bookmark_upserted(&self, bookmark: &BookmarkData);
    /// A bookmark of a loaded activity was removed.
    fn on_bookmark_removed(&self, bookmark: &BookmarkData);

    /// A poll on a loaded activity changed or closed.
    fn on_poll_updated(&self, poll: &PollData);
    /// A poll on a loaded activity was deleted.
    fn on_poll_removed(&self, poll_id: &str);
    /// A vote was cast or changed on a loaded poll.
    fn on_poll_vote_upserted(&self, poll: &PollData, vote: PollVoteData);
    /// A vote was removed from a loaded poll.
    fn on_poll_vote_removed(&self, poll: &PollData, vote: &PollVoteData);

    /// The capabilities cache published a new snapshot. Returns whether any item changed.
    fn on_capabilities_updated(&self, capabilities: &HashMap<FeedId, FeedCapabilities>) -> bool;
}

// ============================================================================
// Routing
// ============================================================================

/// Scope of an activity collection.
#[derive(Clone)]
pub struct ActivityScope {
    /// Only events delivered for this feed apply (`None`: any feed)
    pub fid: Option<FeedId>,
    /// Query the list was loaded with
    pub query: ListQuery<ActivityField>,
    /// Id of the signed-in user
    pub current_user_id: String,
    /// Policy for newly created activities
    pub on_new_activity: OnNewActivity,
}

impl ActivityScope {
    /// Scope over all feeds with the default insertion policy.
    pub fn new(query: ListQuery<ActivityField>, current_user_id: impl Into<String>) -> Self {
        Self {
            fid: None,
            query,
            current_user_id: current_user_id.into(),
            on_new_activity: default_policy(),
        }
    }

    /// Restrict to events delivered for `fid`
    pub fn with_fid(mut self, fid: FeedId) -> Self {
        self.fid = Some(fid);
        self
    }

    /// Install a custom insertion policy
    pub fn with_on_new_activity(mut self, policy: OnNewActivity) -> Self {
        self.on_new_activity = policy;
        self
    }

    fn accepts_fid(&self, fid: &FeedId) -> bool {
        self.fid.as_ref().map_or(true, |own| own == fid)
    }
}

impl std::fmt::Debug for ActivityScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityScope")
            .field("fid", &self.fid)
            .field("query", &self.query)
            .field("current_user_id", &self.current_user_id)
            .finish_non_exhaustive()
    }
}

/// Route one event to an activity collection. Returns whether a mutation ran.
pub fn route_activity_event(
    event: &StateEvent,
    scope: &ActivityScope,
    state: &dyn ActivityCollectionMutations,
) -> bool {
    match event {
        StateEvent::ActivityAdded { fid, activity } if scope.accepts_fid(fid) => {
            let action = (scope.on_new_activity)(&scope.query, activity, &scope.current_user_id);
            if action == InsertionAction::Ignore {
                return false;
            }
            state.on_activity_inserted(activity.clone(), action);
            true
        }
        StateEvent::ActivityUpdated { fid, activity } if scope.accepts_fid(fid) => {
            if !state.contains_activity(&activity.id) {
                return false;
            }
            if scope.query.matches(activity) {
                state.on_activity_updated(activity);
            } else {
                state.on_activity_removed(&activity.id);
            }
            true
        }
        StateEvent::ActivityDeleted { fid, activity_id }
            if scope.accepts_fid(fid) && state.contains_activity(activity_id) =>
        {
            state.on_activity_removed(activity_id);
            true
        }
        StateEvent::ActivityReactionAdded { fid, activity, reaction }
            if scope.accepts_fid(fid) && state.contains_activity(&activity.id) =>
        {
            state.on_reaction_added(activity, reaction.clone());
            true
        }
        StateEvent::ActivityReactionDeleted { fid, activity, reaction }
            if scope.accepts_fid(fid) && state.contains_activity(&activity.id) =>
        {
            state.on_reaction_removed(activity, reaction);
            true
        }
        StateEvent::CommentAdded { fid, comment }
            if scope.accepts_fid(fid) && state.contains_activity(&comment.object_id) =>
        {
            state.on_comment_added(comment.clone());
            true
        }
        StateEvent::CommentUpdated { fid, comment }
            if scope.accepts_fid(fid) && state.contains_activity(&comment.object_id) =>
        {
            state.on_comment_updated(comment);
            true
        }
        StateEvent::CommentDeleted { fid, comment }
            if scope.accepts_fid(fid) && state.contains_activity(&comment.object_id) =>
        {
            state.on_comment_removed(comment);
            true
        }
        StateEvent::BookmarkAdded { bookmark } | StateEvent::BookmarkUpdated { bookmark }
            if state.contains_activity(&bookmark.activity.id) =>
        {
            state.on_bookmark_upserted(bookmark);
            true
        }
        StateEvent::BookmarkDeleted { bookmark } if state.contains_activity(&bookmark.activity.id) => {
            state.on_bookmark_removed(bookmark);
            true
        }
        StateEvent::PollUpdated { fid, poll } | StateEvent::PollClosed { fid, poll }
            if scope.accepts_fid(fid) && state.contains_poll(&poll.id) =>
        {
            state.on_poll_updated(poll);
            true
        }
        StateEvent::PollDeleted { fid, poll_id } if scope.accepts_fid(fid) && state.contains_poll(poll_id) => {
            state.on_poll_removed(poll_id);
            true
        }
        StateEvent::PollVoteCasted { fid, poll, vote } | StateEvent::PollVoteChanged { fid, poll, vote }
            if scope.accepts_fid(fid) && state.contains_poll(&poll.id) =>
        {
            state.on_poll_vote_upserted(poll, vote.clone());
            true
        }
        StateEvent::PollVoteRemoved { fid, poll, vote }
            if scope.accepts_fid(fid) && state.contains_poll(&poll.id) =>
        {
            state.on_poll_vote_removed(poll, vote);
            true
        }
        StateEvent::FeedCapabilitiesUpdated { capabilities } => state.on_capabilities_updated(capabilities),
        _ => false,
    }
}

/// Routes bus events to an [`ActivityCollectionMutations`].
pub struct ActivityListEventHandler {
    scope: ActivityScope,
    state: Arc<dyn ActivityCollectionMutations>,
}

impl ActivityListEventHandler {
    /// Create a router for `state` within `scope`.
    pub fn new(scope: ActivityScope, state: Arc<dyn ActivityCollectionMutations>) -> Self {
        Self { scope, state }
    }
}

impl EventListener<StateEvent> for ActivityListEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if route_activity_event(event, &self.scope, self.state.as_ref()) {
            tracing::debug!(event = event.name(), "activity list updated");
        }
        Ok(())
    }
}

// ============================================================================
// State
// ============================================================================

/// Observable state of an activity list.
pub struct ActivityListState {
    scope: ActivityScope,
    store: PaginatedStateStore<ActivityData>,
}

impl ActivityListState {
    /// Create an empty list for `scope`. Sorted insertion follows the query's sort.
    pub fn new(scope: ActivityScope) -> Self {
        let insertion = InsertionPolicy::from_comparator(scope.query.comparator());
        Self {
            scope,
            store: PaginatedStateStore::new(insertion),
        }
    }

    /// The list's scope.
    pub fn scope(&self) -> &ActivityScope {
        &self.scope
    }

    /// Observable activities.
    pub fn activities(&self) -> ObservableView<Vec<ActivityData>> {
        self.store.observe()
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.store.can_load_more()
    }

    /// Install a fetched page.
    pub fn apply_page(&self, models: Vec<ActivityData>, pagination: PaginationData, replace: bool) {
        if replace {
            self.store.replace(models, pagination);
        } else {
            self.store.append_page(models, pagination);
        }
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> ActivityListEventHandler {
        ActivityListEventHandler::new(self.scope.clone(), self.clone())
    }

    fn user(&self) -> &str {
        &self.scope.current_user_id
    }

    fn update_poll_holder(&self, poll_id: &str, f: impl Fn(&mut ActivityData) -> bool) {
        self.store
            .update_all(|activity| activity.poll_id() == Some(poll_id) && f(activity));
    }
}

impl PaginatedView<ActivityData> for ActivityListState {
    fn store(&self) -> &PaginatedStateStore<ActivityData> {
        &self.store
    }
}

impl ActivityCollectionMutations for ActivityListState {
    fn contains_activity(&self, activity_id: &str) -> bool {
        self.store.contains(activity_id)
    }

    fn contains_poll(&self, poll_id: &str) -> bool {
        self.store.any(|activity| activity.poll_id() == Some(poll_id))
    }

    fn on_activity_inserted(&self, activity: ActivityData, action: InsertionAction) {
        match action {
            InsertionAction::AddToStart => {
                self.store.insert_at_start(activity);
            }
            InsertionAction::AddToEnd => {
                self.store.insert_at_end(activity);
            }
            InsertionAction::Ignore => {}
        }
    }

    fn on_activity_updated(&self, activity: &ActivityData) {
        self.store
            .update(&activity.id, |existing| *existing = existing.merged_with(activity));
    }

    fn on_activity_removed(&self, activity_id: &str) {
        self.store.remove(activity_id);
    }

    fn on_reaction_added(&self, activity: &ActivityData, reaction: ReactionData) {
        let user = self.user();
        self.store
            .update(&activity.id, |existing| existing.add_reaction(activity, reaction, user));
    }

    fn on_reaction_removed(&self, activity: &ActivityData, reaction: &ReactionData) {
        let user = self.user();
        self.store
            .update(&activity.id, |existing| existing.remove_reaction(activity, reaction, user));
    }

    fn on_comment_added(&self, comment: CommentData) {
        let activity_id = comment.object_id.clone();
        self.store
            .update(&activity_id, |existing| existing.add_comment(comment));
    }

    fn on_comment_updated(&self, comment: &CommentData) {
        self.store.update(&comment.object_id, |existing| {
            existing.update_comment(comment);
        });
    }

    fn on_comment_removed(&self, comment: &CommentData) {
        self.store.update(&comment.object_id, |existing| {
            existing.remove_comment(comment);
        });
    }

    fn on_bookmark_upserted(&self, bookmark: &BookmarkData) {
        let user = self.user();
        self.store
            .update(&bookmark.activity.id, |existing| existing.upsert_bookmark(bookmark, user));
    }

    fn on_bookmark_removed(&self, bookmark: &BookmarkData) {
        let user = self.user();
        self.store
            .update(&bookmark.activity.id, |existing| existing.remove_bookmark(bookmark, user));
    }

    fn on_poll_updated(&self, poll: &PollData) {
        self.update_poll_holder(&poll.id, |activity| activity.update_poll(poll));
    }

    fn on_poll_removed(&self, poll_id: &str) {
        self.update_poll_holder(poll_id, |activity| activity.remove_poll(poll_id));
    }

    fn on_poll_vote_upserted(&self, poll: &PollData, vote: PollVoteData) {
        let user = self.user();
        self.update_poll_holder(&poll.id, |activity| {
            activity.upsert_poll_vote(poll, vote.clone(), user)
        });
    }

    fn on_poll_vote_removed(&self, poll: &PollData, vote: &PollVoteData) {
        let user = self.user();
        self.update_poll_holder(&poll.id, |activity| activity.remove_poll_vote(poll, vote, user));
    }

    fn on_capabilities_updated(&self, capabilities: &HashMap<FeedId, FeedCapabilities>) -> bool {
        self.store.update_all(|activity| {
            let Some(fid) = activity.current_feed.as_ref().map(|feed| feed.fid.clone()) else {
                return false;
            };
            capabilities
                .get(&fid)
                .is_some_and(|caps| activity.set_own_capabilities(&fid, caps))
        })
    }
}
