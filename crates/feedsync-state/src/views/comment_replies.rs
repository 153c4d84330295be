//! Reply threads under a single comment

use feedsync_core::models::{CommentData, CommentField, ReactionData};
use feedsync_core::{
    EventListener, Filter, ListQuery, ListenerError, ObservableView, PaginationData, StateEvent,
};
use std::sync::Arc;

use super::comment_list::{CommentListMutations, CommentListState};
use super::{membership_after_update, Membership};
use crate::store::{PaginatedStateStore, PaginatedView};

/// Routes bus events for the replies under `parent_id` on `object_id`.
///
/// Direct replies are the list's items and must match `query`; deeper
/// replies attach under them.
pub struct CommentReplyListEventHandler {
    object_id: String,
    parent_id: String,
    query: ListQuery<CommentField>,
    state: Arc<dyn CommentListMutations>,
}

impl CommentReplyListEventHandler {
    /// Create a router for the replies to `parent_id` matching `query`.
    pub fn new(
        object_id: impl Into<String>,
        parent_id: impl Into<String>,
        query: ListQuery<CommentField>,
        state: Arc<dyn CommentListMutations>,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            parent_id: parent_id.into(),
            query,
            state,
        }
    }

    fn is_direct_reply(&self, comment: &CommentData) -> bool {
        comment.parent_id.as_deref() == Some(self.parent_id.as_str())
    }

    fn route(&self, event: &StateEvent) -> bool {
        let state = self.state.as_ref();
        match event {
            StateEvent::CommentAdded { comment, .. } if comment.object_id == self.object_id => {
                if self.is_direct_reply(comment) {
                    if !self.query.matches(comment) {
                        return false;
                    }
                    state.on_comment_upserted(comment.clone());
                    return true;
                }
                match comment.parent_id.as_deref() {
                    Some(parent) if state.contains_comment(parent) => state.on_reply_added(comment.clone()),
                    _ => return false,
                }
                true
            }
            StateEvent::CommentUpdated { comment, .. } if comment.object_id == self.object_id => {
                let loaded = state.contains_comment(&comment.id);
                if self.is_direct_reply(comment) {
                    match membership_after_update(&self.query, comment, loaded) {
                        Membership::Upsert => state.on_comment_upserted(comment.clone()),
                        Membership::Remove => state.on_comment_removed(&comment.id),
                        Membership::Skip => return false,
                    }
                } else if loaded {
                    state.on_reply_updated(comment);
                } else {
                    return false;
                }
                true
            }
            StateEvent::CommentDeleted { comment, .. } if state.contains_comment(&comment.id) => {
                state.on_comment_removed(&comment.id);
                true
            }
            StateEvent::CommentReactionAdded { comment, reaction, .. } if state.contains_comment(&comment.id) => {
                state.on_comment_reaction_added(comment, reaction.clone());
                true
            }
            StateEvent::CommentReactionDeleted { comment, reaction, .. }
                if state.contains_comment(&comment.id) =>
            {
                state.on_comment_reaction_removed(comment, reaction);
                true
            }
            _ => false,
        }
    }
}

impl EventListener<StateEvent> for CommentReplyListEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), parent = %self.parent_id, "reply list updated");
        }
        Ok(())
    }
}

/// Observable state of the replies under one comment.
pub struct CommentReplyListState {
    object_id: String,
    parent_id: String,
    inner: CommentListState,
}

impl CommentReplyListState {
    /// Create an empty reply list. `query` contributes sort and page size;
    /// its filter is narrowed to direct replies of `parent_id`.
    pub fn new(
        object_id: impl Into<String>,
        parent_id: impl Into<String>,
        query: ListQuery<CommentField>,
        current_user_id: impl Into<String>,
    ) -> Self {
        let parent_id = parent_id.into();
        let scoped = Filter::equal(CommentField::ParentId, parent_id.as_str());
        let filter = match query.filter.clone() {
            Some(existing) => Filter::and([scoped, existing]),
            None => scoped,
        };
        let query = ListQuery {
            filter: Some(filter),
            ..query
        };
        Self {
            object_id: object_id.into(),
            parent_id,
            inner: CommentListState::new(query, current_user_id),
        }
    }

    /// The parent comment id.
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// The query pages are fetched with.
    pub fn query(&self) -> &ListQuery<CommentField> {
        self.inner.query()
    }

    /// Observable direct replies.
    pub fn replies(&self) -> ObservableView<Vec<CommentData>> {
        self.inner.comments()
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.inner.can_load_more()
    }

    /// Install a fetched page.
    pub fn apply_page(&self, models: Vec<CommentData>, pagination: PaginationData, replace: bool) {
        self.inner.apply_page(models, pagination, replace);
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> CommentReplyListEventHandler {
        CommentReplyListEventHandler::new(
            self.object_id.clone(),
            self.parent_id.clone(),
            self.query().clone(),
            self.clone(),
        )
    }
}

impl PaginatedView<CommentData> for CommentReplyListState {
    fn store(&self) -> &PaginatedStateStore<CommentData> {
        self.inner.store()
    }
}

impl CommentListMutations for CommentReplyListState {
    fn contains_comment(&self, comment_id: &str) -> bool {
        self.inner.contains_comment(comment_id)
    }

    fn on_comment_upserted(&self, comment: CommentData) {
        self.inner.on_comment_upserted(comment);
    }

    fn on_reply_added(&self, reply: CommentData) {
        self.inner.on_reply_added(reply);
    }

    fn on_reply_updated(&self, reply: &CommentData) {
        self.inner.on_reply_updated(reply);
    }

    fn on_comment_removed(&self, comment_id: &str) {
        self.inner.on_comment_removed(comment_id);
    }

    fn on_comment_reaction_added(&self, comment: &CommentData, reaction: ReactionData) {
        self.inner.on_comment_reaction_added(comment, reaction);
    }

    fn on_comment_reaction_removed(&self, comment: &CommentData, reaction: &ReactionData) {
        self.inner.on_comment_reaction_removed(comment, reaction);
    }
}
