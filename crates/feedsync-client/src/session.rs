//! Session wiring
//!
//! A [`FeedsSession`] owns the event bus and the shared own-value services
//! for one signed-in user, and builds view controllers bound to them. The
//! transport feeds decoded push events in through [`FeedsSession::publish`].

use feedsync_core::models::{
    ActivityData, ActivityField, BookmarkData, BookmarkField, BookmarkFolderData, BookmarkFolderField,
    CommentData, CommentField, FeedCapabilities, FeedData, FeedField, FeedMemberData, FeedOwnValues, FollowData,
    FollowField, MemberField, ReactionData, ReactionField,
};
use feedsync_core::{
    ActivityFetcher, BatchFetcher, EventBus, FeedFetcher, FeedId, FeedPage, ListQuery, PageFetcher, StateEvent,
};
use feedsync_state::{
    ActivityListState, ActivityScope, ActivityState, BookmarkFolderListState, BookmarkListState, CommentListState,
    CommentReplyListState, FeedListState, FeedState, FollowListState, MemberListState, OnNewActivity,
    ReactionListState, ReactionScope,
};
use std::sync::Arc;

use crate::config::{ConfigError, FeedsConfig};
use crate::lists::{ActivityView, FeedPageHook, FeedView, ListController, PageHook};
use crate::own_values::{FeedCapabilitiesService, FeedOwnValuesService};

/// Controller of an activity list.
pub type ActivityListController = ListController<ActivityData, ActivityField, ActivityListState>;
/// Controller of a comment list.
pub type CommentListController = ListController<CommentData, CommentField, CommentListState>;
/// Controller of a reply thread.
pub type CommentReplyListController = ListController<CommentData, CommentField, CommentReplyListState>;
/// Controller of a reaction list.
pub type ReactionListController = ListController<ReactionData, ReactionField, ReactionListState>;
/// Controller of a follow list.
pub type FollowListController = ListController<FollowData, FollowField, FollowListState>;
/// Controller of a member list.
pub type MemberListController = ListController<FeedMemberData, MemberField, MemberListState>;
/// Controller of a feed list.
pub type FeedListController = ListController<FeedData, FeedField, FeedListState>;
/// Controller of a bookmark list.
pub type BookmarkListController = ListController<BookmarkData, BookmarkField, BookmarkListState>;
/// Controller of a bookmark-folder list.
pub type BookmarkFolderListController = ListController<BookmarkFolderData, BookmarkFolderField, BookmarkFolderListState>;

/// Runtime for one signed-in user.
pub struct FeedsSession {
    config: FeedsConfig,
    bus: EventBus<StateEvent>,
    capabilities: Option<Arc<FeedCapabilitiesService>>,
    own_values: Option<Arc<FeedOwnValuesService>>,
}

impl FeedsSession {
    /// Validate `config` and create a session with an empty bus.
    pub fn new(config: FeedsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(user = %config.user_id, "feeds session started");
        Ok(Self {
            config,
            bus: EventBus::new(),
            capabilities: None,
            own_values: None,
        })
    }

    /// Resolve feed capabilities through `fetcher`. Needs a tokio runtime.
    pub fn with_capabilities(mut self, fetcher: Arc<dyn BatchFetcher<FeedId, FeedCapabilities>>) -> Self {
        self.capabilities = Some(Arc::new(FeedCapabilitiesService::new(
            self.bus.clone(),
            fetcher,
            self.config.coalescer,
            self.config.retry.policy(),
        )));
        self
    }

    /// Resolve own follows and membership through `fetcher`. Needs a tokio runtime.
    pub fn with_own_values(mut self, fetcher: Arc<dyn BatchFetcher<FeedId, FeedOwnValues>>) -> Self {
        self.own_values = Some(Arc::new(FeedOwnValuesService::new(
            self.bus.clone(),
            fetcher,
            self.config.coalescer,
            self.config.retry.policy(),
        )));
        self
    }

    // ─── Accessors ───

    /// Session configuration.
    pub fn config(&self) -> &FeedsConfig {
        &self.config
    }

    /// The signed-in user.
    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    /// The session's event bus.
    pub fn bus(&self) -> &EventBus<StateEvent> {
        &self.bus
    }

    /// Capabilities service, if configured.
    pub fn capabilities(&self) -> Option<&Arc<FeedCapabilitiesService>> {
        self.capabilities.as_ref()
    }

    /// Own-values service, if configured.
    pub fn own_values(&self) -> Option<&Arc<FeedOwnValuesService>> {
        self.own_values.as_ref()
    }

    /// Deliver one push event to every live view. Returns the number of listeners reached.
    pub fn publish(&self, event: &StateEvent) -> usize {
        self.bus.publish(event)
    }

    // ─── Factories ───

    /// An activity list with the default insertion policy.
    pub fn activity_list(
        &self,
        query: ListQuery<ActivityField>,
        fetcher: Arc<dyn PageFetcher<ActivityData, ActivityField>>,
    ) -> ActivityListController {
        let query = self.paged(query);
        self.activity_list_in(ActivityScope::new(query, self.user_id()), fetcher)
    }

    /// An activity list deciding new-activity placement with `policy`.
    pub fn activity_list_with_policy(
        &self,
        query: ListQuery<ActivityField>,
        policy: OnNewActivity,
        fetcher: Arc<dyn PageFetcher<ActivityData, ActivityField>>,
    ) -> ActivityListController {
        let query = self.paged(query);
        let scope = ActivityScope::new(query, self.user_id()).with_on_new_activity(policy);
        self.activity_list_in(scope, fetcher)
    }

    fn activity_list_in(
        &self,
        scope: ActivityScope,
        fetcher: Arc<dyn PageFetcher<ActivityData, ActivityField>>,
    ) -> ActivityListController {
        let query = scope.query.clone();
        let state = Arc::new(ActivityListState::new(scope));
        let controller = ListController::new(&self.bus, state.clone(), state.event_handler(), query, fetcher);
        match self.activity_hook() {
            Some(hook) => controller.with_page_hook(hook),
            None => controller,
        }
    }

    /// A single activity seen through `fid`.
    pub fn activity(
        &self,
        fid: FeedId,
        activity_id: impl Into<String>,
        fetcher: Arc<dyn ActivityFetcher>,
    ) -> ActivityView {
        let state = Arc::new(ActivityState::new(fid, activity_id, self.user_id()));
        let view = ActivityView::new(&self.bus, state, fetcher);
        match self.activity_hook() {
            Some(hook) => view.with_load_hook(hook),
            None => view,
        }
    }

    /// A feed and its timeline.
    pub fn feed(&self, fid: FeedId, query: ListQuery<ActivityField>, fetcher: Arc<dyn FeedFetcher>) -> FeedView {
        if let Some(own_values) = &self.own_values {
            own_values.request([fid.clone()]);
        }
        let state = Arc::new(FeedState::new(fid, self.paged(query), self.user_id()));
        let view = FeedView::new(&self.bus, state, fetcher);
        match self.feed_hook() {
            Some(hook) => view.with_page_hook(hook),
            None => view,
        }
    }

    /// Top-level comments matching `query`.
    pub fn comment_list(
        &self,
        query: ListQuery<CommentField>,
        fetcher: Arc<dyn PageFetcher<CommentData, CommentField>>,
    ) -> CommentListController {
        let state = Arc::new(CommentListState::new(self.paged(query), self.user_id()));
        let query = state.query().clone();
        ListController::new(&self.bus, state.clone(), state.event_handler(), query, fetcher)
    }

    /// Replies to `parent_id` on `object_id`.
    pub fn comment_replies(
        &self,
        object_id: impl Into<String>,
        parent_id: impl Into<String>,
        query: ListQuery<CommentField>,
        fetcher: Arc<dyn PageFetcher<CommentData, CommentField>>,
    ) -> CommentReplyListController {
        let state = Arc::new(CommentReplyListState::new(
            object_id,
            parent_id,
            self.paged(query),
            self.user_id(),
        ));
        let query = state.query().clone();
        ListController::new(&self.bus, state.clone(), state.event_handler(), query, fetcher)
    }

    /// Reactions on an activity or a comment.
    pub fn reaction_list(
        &self,
        scope: ReactionScope,
        query: ListQuery<ReactionField>,
        fetcher: Arc<dyn PageFetcher<ReactionData, ReactionField>>,
    ) -> ReactionListController {
        let state = Arc::new(ReactionListState::new(scope, self.paged(query)));
        let query = state.query().clone();
        ListController::new(&self.bus, state.clone(), state.event_handler(), query, fetcher)
    }

    /// Follows matching `query`.
    pub fn follow_list(
        &self,
        query: ListQuery<FollowField>,
        fetcher: Arc<dyn PageFetcher<FollowData, FollowField>>,
    ) -> FollowListController {
        let state = Arc::new(FollowListState::new(self.paged(query)));
        let query = state.query().clone();
        ListController::new(&self.bus, state.clone(), state.event_handler(), query, fetcher)
    }

    /// Members of `fid` matching `query`.
    pub fn member_list(
        &self,
        fid: FeedId,
        query: ListQuery<MemberField>,
        fetcher: Arc<dyn PageFetcher<FeedMemberData, MemberField>>,
    ) -> MemberListController {
        let state = Arc::new(MemberListState::new(fid, self.paged(query)));
        let query = state.query().clone();
        ListController::new(&self.bus, state.clone(), state.event_handler(), query, fetcher)
    }

    /// Feeds matching `query`.
    pub fn feed_list(
        &self,
        query: ListQuery<FeedField>,
        fetcher: Arc<dyn PageFetcher<FeedData, FeedField>>,
    ) -> FeedListController {
        let state = Arc::new(FeedListState::new(self.paged(query)));
        let query = state.query().clone();
        let controller = ListController::new(&self.bus, state.clone(), state.event_handler(), query, fetcher);
        match &self.capabilities {
            Some(capabilities) => {
                let capabilities = capabilities.clone();
                controller.with_page_hook(Arc::new(move |feeds: &[FeedData]| {
                    capabilities.cache_from_feeds(feeds);
                }))
            }
            None => controller,
        }
    }

    /// Bookmarks matching `query`.
    pub fn bookmark_list(
        &self,
        query: ListQuery<BookmarkField>,
        fetcher: Arc<dyn PageFetcher<BookmarkData, BookmarkField>>,
    ) -> BookmarkListController {
        let state = Arc::new(BookmarkListState::new(self.paged(query)));
        let query = state.query().clone();
        ListController::new(&self.bus, state.clone(), state.event_handler(), query, fetcher)
    }

    /// Bookmark folders matching `query`.
    pub fn bookmark_folder_list(
        &self,
        query: ListQuery<BookmarkFolderField>,
        fetcher: Arc<dyn PageFetcher<BookmarkFolderData, BookmarkFolderField>>,
    ) -> BookmarkFolderListController {
        let state = Arc::new(BookmarkFolderListState::new(self.paged(query)));
        let query = state.query().clone();
        ListController::new(&self.bus, state.clone(), state.event_handler(), query, fetcher)
    }

    // ─── Helpers ───

    fn paged<F>(&self, query: ListQuery<F>) -> ListQuery<F> {
        if query.limit.is_some() {
            query
        } else {
            query.with_limit(self.config.page_limit)
        }
    }

    fn activity_hook(&self) -> Option<PageHook<ActivityData>> {
        let capabilities = self.capabilities.clone()?;
        Some(Arc::new(move |activities: &[ActivityData]| {
            capabilities.cache_from_activities(activities);
        }))
    }

    fn feed_hook(&self) -> Option<FeedPageHook> {
        let capabilities = self.capabilities.clone()?;
        Some(Arc::new(move |page: &FeedPage| {
            capabilities.cache_from_feeds([&page.feed]);
            capabilities.cache_from_activities(&page.activities.models);
        }))
    }
}

impl Drop for FeedsSession {
    fn drop(&mut self) {
        tracing::info!(
            user = %self.config.user_id,
            listeners = self.bus.listener_count(),
            "feeds session closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::PaginationResult;
    use feedsync_testkit::{ActivityBuilder, MockPageFetcher};

    #[test]
    fn invalid_config_is_rejected() {
        let config = FeedsConfig::new("alice").with_page_limit(0);
        assert!(FeedsSession::new(config).is_err());
    }

    #[tokio::test]
    async fn default_page_limit_is_applied() {
        let session = FeedsSession::new(FeedsConfig::new("alice").with_page_limit(7)).unwrap();
        let fetcher = Arc::new(MockPageFetcher::new([PaginationResult::last(vec![
            ActivityBuilder::new("a1").build(),
        ])]));
        let list = session.activity_list(ListQuery::new(), fetcher);

        assert_eq!(list.query().limit, Some(7));
        assert_eq!(list.get().await.unwrap().len(), 1);
        assert_eq!(session.bus().listener_count(), 1);

        drop(list);
        assert_eq!(session.bus().listener_count(), 0);
    }
}
