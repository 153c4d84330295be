//! Single-activity detail view

use feedsync_core::models::{
    find_in_tree_mut, ActivityData, BookmarkData, CommentData, PollData, PollVoteData, ReactionData,
};
use feedsync_core::{EventListener, FeedId, ListenerError, Observable, ObservableView, StateEvent};
use std::sync::Arc;

/// Mutations the detail state accepts from its router.
pub trait ActivityMutations: Send + Sync {
    /// Id of the poll attached to the loaded activity.
    fn poll_id(&self) -> Option<String>;

    /// Server copy after an edit.
    fn on_activity_updated(&self, activity: &ActivityData);
    /// The activity was deleted.
    fn on_activity_removed(&self);
    /// A reaction was added.
    fn on_reaction_added(&self, activity: &ActivityData, reaction: ReactionData);
    /// A reaction was removed.
    fn on_reaction_removed(&self, activity: &ActivityData, reaction: &ReactionData);
    /// A comment or reply was added.
    fn on_comment_added(&self, comment: CommentData);
    /// A comment was edited.
    fn on_comment_updated(&self, comment: &CommentData);
    /// A comment was deleted.
    fn on_comment_removed(&self, comment: &CommentData);
    /// A reaction was added to one of the comments.
    fn on_comment_reaction_added(&self, comment: &CommentData, reaction: ReactionData);
    /// A reaction was removed from one of the comments.
    fn on_comment_reaction_removed(&self, comment: &CommentData, reaction: &ReactionData);
    /// The activity was bookmarked or a bookmark moved.
    fn on_bookmark_upserted(&self, bookmark: &BookmarkData);
    /// A bookmark was removed.
    fn on_bookmark_removed(&self, bookmark: &BookmarkData);
    /// The poll changed or closed.
    fn on_poll_updated(&self, poll: &PollData);
    /// The poll was deleted.
    fn on_poll_removed(&self);
    /// A vote was cast or changed.
    fn on_poll_vote_upserted(&self, poll: &PollData, vote: PollVoteData);
    /// A vote was removed.
    fn on_poll_vote_removed(&self, poll: &PollData, vote: &PollVoteData);
}

/// Routes bus events for one activity to an [`ActivityMutations`].
pub struct ActivityEventHandler {
    fid: FeedId,
    activity_id: String,
    state: Arc<dyn ActivityMutations>,
}

impl ActivityEventHandler {
    /// Create a router for activity `activity_id` as seen through `fid`.
    pub fn new(fid: FeedId, activity_id: impl Into<String>, state: Arc<dyn ActivityMutations>) -> Self {
        Self {
            fid,
            activity_id: activity_id.into(),
            state,
        }
    }

    fn is_own_poll(&self, fid: &FeedId, poll_id: &str) -> bool {
        *fid == self.fid && self.state.poll_id().as_deref() == Some(poll_id)
    }

    fn route(&self, event: &StateEvent) -> bool {
        let id = self.activity_id.as_str();
        let state = self.state.as_ref();
        match event {
            StateEvent::ActivityUpdated { fid, activity } if *fid == self.fid && activity.id == id => {
                state.on_activity_updated(activity);
            }
            StateEvent::ActivityDeleted { fid, activity_id } if *fid == self.fid && activity_id == id => {
                state.on_activity_removed();
            }
            StateEvent::ActivityReactionAdded { activity, reaction, .. } if activity.id == id => {
                state.on_reaction_added(activity, reaction.clone());
            }
            StateEvent::ActivityReactionDeleted { activity, reaction, .. } if activity.id == id => {
                state.on_reaction_removed(activity, reaction);
            }
            StateEvent::CommentAdded { comment, .. } if comment.object_id == id => {
                state.on_comment_added(comment.clone());
            }
            StateEvent::CommentUpdated { comment, .. } if comment.object_id == id => {
                state.on_comment_updated(comment);
            }
            StateEvent::CommentDeleted { comment, .. } if comment.object_id == id => {
                state.on_comment_removed(comment);
            }
            StateEvent::CommentReactionAdded { comment, reaction, .. } if comment.object_id == id => {
                state.on_comment_reaction_added(comment, reaction.clone());
            }
            StateEvent::CommentReactionDeleted { comment, reaction, .. } if comment.object_id == id => {
                state.on_comment_reaction_removed(comment, reaction);
            }
            StateEvent::BookmarkAdded { bookmark } | StateEvent::BookmarkUpdated { bookmark }
                if bookmark.activity.id == id =>
            {
                state.on_bookmark_upserted(bookmark);
            }
            StateEvent::BookmarkDeleted { bookmark } if bookmark.activity.id == id => {
                state.on_bookmark_removed(bookmark);
            }
            StateEvent::PollUpdated { fid, poll } | StateEvent::PollClosed { fid, poll }
                if self.is_own_poll(fid, &poll.id) =>
            {
                state.on_poll_updated(poll);
            }
            StateEvent::PollDeleted { fid, poll_id } if self.is_own_poll(fid, poll_id) => {
                state.on_poll_removed();
            }
            StateEvent::PollVoteCasted { fid, poll, vote } | StateEvent::PollVoteChanged { fid, poll, vote }
                if self.is_own_poll(fid, &poll.id) =>
            {
                state.on_poll_vote_upserted(poll, vote.clone());
            }
            StateEvent::PollVoteRemoved { fid, poll, vote } if self.is_own_poll(fid, &poll.id) => {
                state.on_poll_vote_removed(poll, vote);
            }
            _ => return false,
        }
        true
    }
}

impl EventListener<StateEvent> for ActivityEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), activity = %self.activity_id, "activity updated");
        }
        Ok(())
    }
}

/// Observable state of a single activity.
pub struct ActivityState {
    fid: FeedId,
    activity_id: String,
    current_user_id: String,
    activity: Observable<Option<ActivityData>>,
    deleted: Observable<bool>,
}

impl ActivityState {
    /// Create an empty detail state for `activity_id` seen through `fid`.
    pub fn new(fid: FeedId, activity_id: impl Into<String>, current_user_id: impl Into<String>) -> Self {
        Self {
            fid,
            activity_id: activity_id.into(),
            current_user_id: current_user_id.into(),
            activity: Observable::new(None),
            deleted: Observable::new(false),
        }
    }

    /// The feed the activity is viewed through.
    pub fn fid(&self) -> &FeedId {
        &self.fid
    }

    /// The activity id.
    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }

    /// Observable activity; `None` until loaded and after deletion.
    pub fn activity(&self) -> ObservableView<Option<ActivityData>> {
        self.activity.view()
    }

    /// Observable deletion flag.
    pub fn deleted(&self) -> ObservableView<bool> {
        self.deleted.view()
    }

    /// Install a freshly fetched activity.
    pub fn set_activity(&self, activity: ActivityData) {
        self.activity.set(Some(activity));
        self.deleted.modify(|deleted| std::mem::replace(deleted, false));
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> ActivityEventHandler {
        ActivityEventHandler::new(self.fid.clone(), self.activity_id.clone(), self.clone())
    }

    fn edit(&self, f: impl FnOnce(&mut ActivityData)) {
        self.activity.modify(|slot| match slot.as_mut() {
            Some(activity) => {
                f(activity);
                true
            }
            None => false,
        });
    }
}

impl ActivityMutations for ActivityState {
    fn poll_id(&self) -> Option<String> {
        self.activity
            .with(|slot| slot.as_ref().and_then(|a| a.poll_id().map(str::to_string)))
    }

    fn on_activity_updated(&self, activity: &ActivityData) {
        self.activity.update(|slot| {
            *slot = Some(match slot.as_ref() {
                Some(existing) => existing.merged_with(activity),
                None => activity.clone(),
            });
        });
    }

    fn on_activity_removed(&self) {
        self.activity.set(None);
        self.deleted.set(true);
    }

    fn on_reaction_added(&self, activity: &ActivityData, reaction: ReactionData) {
        let user = self.current_user_id.as_str();
        self.edit(|existing| existing.add_reaction(activity, reaction, user));
    }

    fn on_reaction_removed(&self, activity: &ActivityData, reaction: &ReactionData) {
        let user = self.current_user_id.as_str();
        self.edit(|existing| existing.remove_reaction(activity, reaction, user));
    }

    fn on_comment_added(&self, comment: CommentData) {
        self.edit(|existing| existing.add_comment(comment));
    }

    fn on_comment_updated(&self, comment: &CommentData) {
        self.edit(|existing| {
            existing.update_comment(comment);
        });
    }

    fn on_comment_removed(&self, comment: &CommentData) {
        self.edit(|existing| {
            existing.remove_comment(comment);
        });
    }

    fn on_comment_reaction_added(&self, comment: &CommentData, reaction: ReactionData) {
        let user = self.current_user_id.as_str();
        self.edit(|existing| {
            if let Some(target) = find_in_tree_mut(&mut existing.comments, &comment.id) {
                target.add_reaction(comment, reaction, user);
            }
        });
    }

    fn on_comment_reaction_removed(&self, comment: &CommentData, reaction: &ReactionData) {
        let user = self.current_user_id.as_str();
        self.edit(|existing| {
            if let Some(target) = find_in_tree_mut(&mut existing.comments, &comment.id) {
                target.remove_reaction(comment, reaction, user);
            }
        });
    }

    fn on_bookmark_upserted(&self, bookmark: &BookmarkData) {
        let user = self.current_user_id.as_str();
        self.edit(|existing| existing.upsert_bookmark(bookmark, user));
    }

    fn on_bookmark_removed(&self, bookmark: &BookmarkData) {
        let user = self.current_user_id.as_str();
        self.edit(|existing| existing.remove_bookmark(bookmark, user));
    }

    fn on_poll_updated(&self, poll: &PollData) {
        self.edit(|existing| {
            existing.update_poll(poll);
        });
    }

    fn on_poll_removed(&self) {
        self.edit(|existing| existing.poll = None);
    }

    fn on_poll_vote_upserted(&self, poll: &PollData, vote: PollVoteData) {
        let user = self.current_user_id.as_str();
        self.edit(|existing| {
            existing.upsert_poll_vote(poll, vote, user);
        });
    }

    fn on_poll_vote_removed(&self, poll: &PollData, vote: &PollVoteData) {
        let user = self.current_user_id.as_str();
        self.edit(|existing| {
            existing.remove_poll_vote(poll, vote, user);
        });
    }
}
