//! Reaction lists for an activity or a comment

use feedsync_core::models::{ReactionData, ReactionField};
use feedsync_core::{
    EventListener, Identifiable, ListQuery, ListenerError, ObservableView, PaginationData, StateEvent,
};
use std::sync::Arc;

use crate::store::{InsertionPolicy, PaginatedStateStore, PaginatedView};

/// The object whose reactions a list shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReactionScope {
    /// Reactions on an activity
    Activity(String),
    /// Reactions on a comment
    Comment(String),
}

/// Mutations a reaction list accepts from its router.
pub trait ReactionListMutations: Send + Sync {
    /// Whether the reaction is loaded.
    fn contains_reaction(&self, reaction_id: &str) -> bool;
    /// A reaction was added.
    fn on_reaction_upserted(&self, reaction: ReactionData);
    /// A reaction was removed.
    fn on_reaction_removed(&self, reaction_id: &str);
}

/// Routes bus events to a [`ReactionListMutations`].
pub struct ReactionListEventHandler {
    scope: ReactionScope,
    query: ListQuery<ReactionField>,
    state: Arc<dyn ReactionListMutations>,
}

impl ReactionListEventHandler {
    /// Create a router for reactions on `scope` matching `query`.
    pub fn new(scope: ReactionScope, query: ListQuery<ReactionField>, state: Arc<dyn ReactionListMutations>) -> Self {
        Self { scope, query, state }
    }

    fn route(&self, event: &StateEvent) -> bool {
        let (added, reaction) = match (&self.scope, event) {
            (ReactionScope::Activity(id), StateEvent::ActivityReactionAdded { activity, reaction, .. })
                if activity.id == *id =>
            {
                (true, reaction)
            }
            (ReactionScope::Activity(id), StateEvent::ActivityReactionDeleted { activity, reaction, .. })
                if activity.id == *id =>
            {
                (false, reaction)
            }
            (ReactionScope::Comment(id), StateEvent::CommentReactionAdded { comment, reaction, .. })
                if comment.id == *id =>
            {
                (true, reaction)
            }
            (ReactionScope::Comment(id), StateEvent::CommentReactionDeleted { comment, reaction, .. })
                if comment.id == *id =>
            {
                (false, reaction)
            }
            _ => return false,
        };

        if added {
            if !self.query.matches(reaction) {
                return false;
            }
            self.state.on_reaction_upserted(reaction.clone());
        } else {
            let id = reaction.id();
            if !self.state.contains_reaction(&id) {
                return false;
            }
            self.state.on_reaction_removed(&id);
        }
        true
    }
}

impl EventListener<StateEvent> for ReactionListEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), scope = ?self.scope, "reaction list updated");
        }
        Ok(())
    }
}

/// Observable state of a reaction list.
pub struct ReactionListState {
    scope: ReactionScope,
    query: ListQuery<ReactionField>,
    store: PaginatedStateStore<ReactionData>,
}

impl ReactionListState {
    /// Create an empty list. New reactions go to the top unless the query sorts.
    pub fn new(scope: ReactionScope, query: ListQuery<ReactionField>) -> Self {
        let insertion = query.comparator().map_or(InsertionPolicy::Start, InsertionPolicy::Sorted);
        Self {
            scope,
            query,
            store: PaginatedStateStore::new(insertion),
        }
    }

    /// The reacted-to object.
    pub fn scope(&self) -> &ReactionScope {
        &self.scope
    }

    /// The query pages are fetched with.
    pub fn query(&self) -> &ListQuery<ReactionField> {
        &self.query
    }

    /// Observable reactions.
    pub fn reactions(&self) -> ObservableView<Vec<ReactionData>> {
        self.store.observe()
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.store.can_load_more()
    }

    /// Install a fetched page.
    pub fn apply_page(&self, models: Vec<ReactionData>, pagination: PaginationData, replace: bool) {
        if replace {
            self.store.replace(models, pagination);
        } else {
            self.store.append_page(models, pagination);
        }
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> ReactionListEventHandler {
        ReactionListEventHandler::new(self.scope.clone(), self.query.clone(), self.clone())
    }
}

impl PaginatedView<ReactionData> for ReactionListState {
    fn store(&self) -> &PaginatedStateStore<ReactionData> {
        &self.store
    }
}

impl ReactionListMutations for ReactionListState {
    fn contains_reaction(&self, reaction_id: &str) -> bool {
        self.store.contains(reaction_id)
    }

    fn on_reaction_upserted(&self, reaction: ReactionData) {
        self.store.upsert(reaction);
    }

    fn on_reaction_removed(&self, reaction_id: &str) {
        self.store.remove(reaction_id);
    }
}
