//! Comment lists
//!
//! A comment list holds top-level comments matching its query, with loaded
//! replies nested inside them. Replies never join the top level; they are
//! attached under their parent when the parent is loaded.

use feedsync_core::models::{CommentData, CommentField, ReactionData};
use feedsync_core::{EventListener, ListQuery, ListenerError, ObservableView, PaginationData, StateEvent};
use std::sync::Arc;

use crate::store::{InsertionPolicy, PaginatedStateStore, PaginatedView};

/// Mutations a comment list accepts from its router.
pub trait CommentListMutations: Send + Sync {
    /// Whether the comment is loaded, at any depth.
    fn contains_comment(&self, comment_id: &str) -> bool;
    /// A top-level comment was added or changed.
    fn on_comment_upserted(&self, comment: CommentData);
    /// A reply was added under a loaded comment.
    fn on_reply_added(&self, reply: CommentData);
    /// A loaded reply was edited.
    fn on_reply_updated(&self, reply: &CommentData);
    /// A loaded comment or reply left the list.
    fn on_comment_removed(&self, comment_id: &str);
    /// A reaction was added to a loaded comment.
    fn on_comment_reaction_added(&self, comment: &CommentData, reaction: ReactionData);
    /// A reaction was removed from a loaded comment.
    fn on_comment_reaction_removed(&self, comment: &CommentData, reaction: &ReactionData);
}

/// Routes bus events to a [`CommentListMutations`] by filter.
pub struct CommentListEventHandler {
    query: ListQuery<CommentField>,
    state: Arc<dyn CommentListMutations>,
}

impl CommentListEventHandler {
    /// Create a router for `state`, scoped by `query`'s filter.
    pub fn new(query: ListQuery<CommentField>, state: Arc<dyn CommentListMutations>) -> Self {
        Self { query, state }
    }

    fn route(&self, event: &StateEvent) -> bool {
        let state = self.state.as_ref();
        match event {
            StateEvent::CommentAdded { comment, .. } => match comment.parent_id.as_deref() {
                Some(parent) if state.contains_comment(parent) => {
                    state.on_reply_added(comment.clone());
                    true
                }
                Some(_) => false,
                None if self.query.matches(comment) => {
                    state.on_comment_upserted(comment.clone());
                    true
                }
                None => false,
            },
            StateEvent::CommentUpdated { comment, .. } => {
                let loaded = state.contains_comment(&comment.id);
                if !self.query.matches(comment) {
                    if loaded {
                        state.on_comment_removed(&comment.id);
                    }
                    return loaded;
                }
                match (&comment.parent_id, loaded) {
                    (None, _) => state.on_comment_upserted(comment.clone()),
                    (Some(_), true) => state.on_reply_updated(comment),
                    (Some(_), false) => return false,
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

impl EventListener<StateEvent> for CommentListEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), "comment list updated");
        }
        Ok(())
    }
}

/// Observable state of a comment list.
pub struct CommentListState {
    query: ListQuery<CommentField>,
    current_user_id: String,
    store: PaginatedStateStore<CommentData>,
}

impl CommentListState {
    /// Create an empty list for `query`.
    pub fn new(query: ListQuery<CommentField>, current_user_id: impl Into<String>) -> Self {
        let insertion = InsertionPolicy::from_comparator(query.comparator());
        Self {
            query,
            current_user_id: current_user_id.into(),
            store: PaginatedStateStore::new(insertion),
        }
    }

    /// The list's query.
    pub fn query(&self) -> &ListQuery<CommentField> {
        &self.query
    }

    /// Observable top-level comments.
    pub fn comments(&self) -> ObservableView<Vec<CommentData>> {
        self.store.observe()
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.store.can_load_more()
    }

    /// Install a fetched page.
    pub fn apply_page(&self, models: Vec<CommentData>, pagination: PaginationData, replace: bool) {
        if replace {
            self.store.replace(models, pagination);
        } else {
            self.store.append_page(models, pagination);
        }
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> CommentListEventHandler {
        CommentListEventHandler::new(self.query.clone(), self.clone())
    }

    fn edit_comment(&self, comment_id: &str, f: impl FnOnce(&mut CommentData)) {
        let mut f = Some(f);
        self.store.update_all(|top| {
            let Some(target) = top.find_mut(comment_id) else {
                return false;
            };
            match f.take() {
                Some(f) => {
                    f(target);
                    true
                }
                None => false,
            }
        });
    }
}

impl PaginatedView<CommentData> for CommentListState {
    fn store(&self) -> &PaginatedStateStore<CommentData> {
        &self.store
    }
}

impl CommentListMutations for CommentListState {
    fn contains_comment(&self, comment_id: &str) -> bool {
        self.store.any(|top| top.contains(comment_id))
    }

    fn on_comment_upserted(&self, comment: CommentData) {
        if !self.store.update(&comment.id, |existing| *existing = existing.merged_with(&comment)) {
            self.store.upsert(comment);
        }
    }

    fn on_reply_added(&self, reply: CommentData) {
        let Some(parent) = reply.parent_id.clone() else {
            return;
        };
        self.edit_comment(&parent, |target| {
            target.add_reply(reply);
        });
    }

    fn on_reply_updated(&self, reply: &CommentData) {
        self.edit_comment(&reply.id, |target| *target = target.merged_with(reply));
    }

    fn on_comment_removed(&self, comment_id: &str) {
        if !self.store.remove(comment_id) {
            self.store.update_all(|top| top.remove_reply(comment_id));
        }
    }

    fn on_comment_reaction_added(&self, comment: &CommentData, reaction: ReactionData) {
        let user = self.current_user_id.as_str();
        self.edit_comment(&comment.id, |target| target.add_reaction(comment, reaction, user));
    }

    fn on_comment_reaction_removed(&self, comment: &CommentData, reaction: &ReactionData) {
        let user = self.current_user_id.as_str();
        self.edit_comment(&comment.id, |target| target.remove_reaction(comment, reaction, user));
    }
}
