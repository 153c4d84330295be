//! Bookmark and bookmark-folder lists

use feedsync_core::models::{BookmarkData, BookmarkField, BookmarkFolderData, BookmarkFolderField};
use feedsync_core::{
    EventListener, Identifiable, ListQuery, ListenerError, ObservableView, PaginationData, StateEvent,
};
use std::sync::Arc;

use super::{membership_after_update, Membership};
use crate::store::{InsertionPolicy, PaginatedStateStore, PaginatedView};

// ============================================================================
// Bookmarks
// ============================================================================

/// Mutations a bookmark list accepts from its router.
pub trait BookmarkListMutations: Send + Sync {
    /// Whether the bookmark is loaded.
    fn contains_bookmark(&self, bookmark_id: &str) -> bool;
    /// Whether any loaded bookmark is filed in the folder.
    fn contains_folder(&self, folder_id: &str) -> bool;
    /// A matching bookmark was created or changed.
    fn on_bookmark_upserted(&self, bookmark: BookmarkData);
    /// A bookmark left the list.
    fn on_bookmark_removed(&self, bookmark_id: &str);
    /// A folder holding loaded bookmarks was edited.
    fn on_folder_updated(&self, folder: &BookmarkFolderData);
    /// A folder holding loaded bookmarks was deleted, taking its bookmarks with it.
    fn on_folder_removed(&self, folder_id: &str);
}

/// Routes bus events to a [`BookmarkListMutations`] by filter.
pub struct BookmarkListEventHandler {
    query: ListQuery<BookmarkField>,
    state: Arc<dyn BookmarkListMutations>,
}

impl BookmarkListEventHandler {
    /// Create a router for `state`, scoped by `query`'s filter.
    pub fn new(query: ListQuery<BookmarkField>, state: Arc<dyn BookmarkListMutations>) -> Self {
        Self { query, state }
    }

    fn route(&self, event: &StateEvent) -> bool {
        let state = self.state.as_ref();
        match event {
            StateEvent::BookmarkAdded { bookmark } if self.query.matches(bookmark) => {
                state.on_bookmark_upserted(bookmark.clone());
            }
            StateEvent::BookmarkUpdated { bookmark } => {
                let id = bookmark.id();
                match membership_after_update(&self.query, bookmark, state.contains_bookmark(&id)) {
                    Membership::Upsert => state.on_bookmark_upserted(bookmark.clone()),
                    Membership::Remove => state.on_bookmark_removed(&id),
                    Membership::Skip => return false,
                }
            }
            StateEvent::BookmarkDeleted { bookmark } if state.contains_bookmark(&bookmark.id()) => {
                state.on_bookmark_removed(&bookmark.id());
            }
            StateEvent::BookmarkFolderUpdated { folder } if state.contains_folder(&folder.id) => {
                state.on_folder_updated(folder);
            }
            StateEvent::BookmarkFolderDeleted { folder_id } if state.contains_folder(folder_id) => {
                state.on_folder_removed(folder_id);
            }
            _ => return false,
        }
        true
    }
}

impl EventListener<StateEvent> for BookmarkListEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), "bookmark list updated");
        }
        Ok(())
    }
}

/// Observable state of a bookmark list.
pub struct BookmarkListState {
    query: ListQuery<BookmarkField>,
    store: PaginatedStateStore<BookmarkData>,
}

impl BookmarkListState {
    /// Create an empty list for `query`.
    pub fn new(query: ListQuery<BookmarkField>) -> Self {
        let insertion = query.comparator().map_or(InsertionPolicy::Start, InsertionPolicy::Sorted);
        Self {
            query,
            store: PaginatedStateStore::new(insertion),
        }
    }

    /// The list's query.
    pub fn query(&self) -> &ListQuery<BookmarkField> {
        &self.query
    }

    /// Observable bookmarks.
    pub fn bookmarks(&self) -> ObservableView<Vec<BookmarkData>> {
        self.store.observe()
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.store.can_load_more()
    }

    /// Install a fetched page.
    pub fn apply_page(&self, models: Vec<BookmarkData>, pagination: PaginationData, replace: bool) {
        if replace {
            self.store.replace(models, pagination);
        } else {
            self.store.append_page(models, pagination);
        }
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> BookmarkListEventHandler {
        BookmarkListEventHandler::new(self.query.clone(), self.clone())
    }
}

impl PaginatedView<BookmarkData> for BookmarkListState {
    fn store(&self) -> &PaginatedStateStore<BookmarkData> {
        &self.store
    }
}

impl BookmarkListMutations for BookmarkListState {
    fn contains_bookmark(&self, bookmark_id: &str) -> bool {
        self.store.contains(bookmark_id)
    }

    fn contains_folder(&self, folder_id: &str) -> bool {
        self.store.any(|bookmark| bookmark.folder_id() == folder_id)
    }

    fn on_bookmark_upserted(&self, bookmark: BookmarkData) {
        self.store.upsert(bookmark);
    }

    fn on_bookmark_removed(&self, bookmark_id: &str) {
        self.store.remove(bookmark_id);
    }

    fn on_folder_updated(&self, folder: &BookmarkFolderData) {
        self.store.update_all(|bookmark| match bookmark.folder.as_mut() {
            Some(existing) if existing.id == folder.id && existing != folder => {
                *existing = folder.clone();
                true
            }
            _ => false,
        });
    }

    fn on_folder_removed(&self, folder_id: &str) {
        self.store.retain(|bookmark| bookmark.folder_id() != folder_id);
    }
}

// ============================================================================
// Bookmark folders
// ============================================================================

/// Mutations a bookmark-folder list accepts from its router.
pub trait BookmarkFolderListMutations: Send + Sync {
    /// Whether the folder is loaded.
    fn contains_folder(&self, folder_id: &str) -> bool;
    /// A matching folder appeared or changed.
    fn on_folder_upserted(&self, folder: BookmarkFolderData);
    /// A folder left the list.
    fn on_folder_removed(&self, folder_id: &str);
}

/// Routes bus events to a [`BookmarkFolderListMutations`] by filter.
pub struct BookmarkFolderListEventHandler {
    query: ListQuery<BookmarkFolderField>,
    state: Arc<dyn BookmarkFolderListMutations>,
}

impl BookmarkFolderListEventHandler {
    /// Create a router for `state`, scoped by `query`'s filter.
    pub fn new(query: ListQuery<BookmarkFolderField>, state: Arc<dyn BookmarkFolderListMutations>) -> Self {
        Self { query, state }
    }

    fn route(&self, event: &StateEvent) -> bool {
        let state = self.state.as_ref();
        match event {
            StateEvent::BookmarkFolderUpdated { folder } => {
                match membership_after_update(&self.query, folder, state.contains_folder(&folder.id)) {
                    Membership::Upsert => state.on_folder_upserted(folder.clone()),
                    Membership::Remove => state.on_folder_removed(&folder.id),
                    Membership::Skip => return false,
                }
            }
            StateEvent::BookmarkFolderDeleted { folder_id } if state.contains_folder(folder_id) => {
                state.on_folder_removed(folder_id);
            }
            StateEvent::BookmarkAdded { bookmark } => match &bookmark.folder {
                // A bookmark filed into a folder this list has not seen creates it here.
                Some(folder) if !state.contains_folder(&folder.id) && self.query.matches(folder) => {
                    state.on_folder_upserted(folder.clone());
                }
                _ => return false,
            },
            _ => return false,
        }
        true
    }
}

impl EventListener<StateEvent> for BookmarkFolderListEventHandler {
    fn on_event(&self, event: &StateEvent) -> Result<(), ListenerError> {
        if self.route(event) {
            tracing::debug!(event = event.name(), "bookmark folder list updated");
        }
        Ok(())
    }
}

/// Observable state of a bookmark-folder list.
pub struct BookmarkFolderListState {
    query: ListQuery<BookmarkFolderField>,
    store: PaginatedStateStore<BookmarkFolderData>,
}

impl BookmarkFolderListState {
    /// Create an empty list for `query`.
    pub fn new(query: ListQuery<BookmarkFolderField>) -> Self {
        let insertion = query.comparator().map_or(InsertionPolicy::Start, InsertionPolicy::Sorted);
        Self {
            query,
            store: PaginatedStateStore::new(insertion),
        }
    }

    /// The list's query.
    pub fn query(&self) -> &ListQuery<BookmarkFolderField> {
        &self.query
    }

    /// Observable folders.
    pub fn folders(&self) -> ObservableView<Vec<BookmarkFolderData>> {
        self.store.observe()
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.store.can_load_more()
    }

    /// Install a fetched page.
    pub fn apply_page(&self, models: Vec<BookmarkFolderData>, pagination: PaginationData, replace: bool) {
        if replace {
            self.store.replace(models, pagination);
        } else {
            self.store.append_page(models, pagination);
        }
    }

    /// A router bound to this state.
    pub fn event_handler(self: &Arc<Self>) -> BookmarkFolderListEventHandler {
        BookmarkFolderListEventHandler::new(self.query.clone(), self.clone())
    }
}

impl PaginatedView<BookmarkFolderData> for BookmarkFolderListState {
    fn store(&self) -> &PaginatedStateStore<BookmarkFolderData> {
        &self.store
    }
}

impl BookmarkFolderListMutations for BookmarkFolderListState {
    fn contains_folder(&self, folder_id: &str) -> bool {
        self.store.contains(folder_id)
    }

    fn on_folder_upserted(&self, folder: BookmarkFolderData) {
        self.store.upsert(folder);
    }

    fn on_folder_removed(&self, folder_id: &str) {
        self.store.remove(folder_id);
    }
}
