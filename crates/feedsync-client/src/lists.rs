//! View controllers
//!
//! A controller owns a view state, keeps its event handler subscribed to the
//! bus and loads pages into it. Dropping or disposing the controller removes
//! the subscription; the state itself stays readable through any `Arc` the
//! application kept.

use feedsync_core::models::{ActivityData, FeedMemberData, FollowData};
use feedsync_core::{
    ActivityFetcher, EventBus, EventListener, FeedFetcher, FeedId, FeedPage, Identifiable, ListQuery, PageFetcher, Result,
    StateEvent, Subscription,
};
use feedsync_state::{ActivityState, FeedState, PaginatedView};
use std::marker::PhantomData;
use std::sync::Arc;

/// Called with every page loaded by a controller.
pub type PageHook<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

/// Called with every page loaded by a [`FeedView`].
pub type FeedPageHook = Arc<dyn Fn(&FeedPage) + Send + Sync>;

// ============================================================================
// Paginated lists
// ============================================================================

/// Loads pages of `query` into a paginated view state.
pub struct ListController<T, F, S> {
    state: Arc<S>,
    query: ListQuery<F>,
    fetcher: Arc<dyn PageFetcher<T, F>>,
    subscription: Subscription,
    on_page: Option<PageHook<T>>,
    loading: tokio::sync::Mutex<()>,
    _item: PhantomData<fn() -> T>,
}

impl<T, F, S> ListController<T, F, S>
where
    T: Identifiable + Clone + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
    S: PaginatedView<T> + 'static,
{
    /// Subscribe `handler` on `bus` and control `state`.
    pub fn new(
        bus: &EventBus<StateEvent>,
        state: Arc<S>,
        handler: impl EventListener<StateEvent> + 'static,
        query: ListQuery<F>,
        fetcher: Arc<dyn PageFetcher<T, F>>,
    ) -> Self {
        Self {
            subscription: bus.subscribe(Arc::new(handler)),
            state,
            query,
            fetcher,
            on_page: None,
            loading: tokio::sync::Mutex::new(()),
            _item: PhantomData,
        }
    }

    /// Run `hook` on every loaded page.
    pub fn with_page_hook(mut self, hook: PageHook<T>) -> Self {
        self.on_page = Some(hook);
        self
    }

    /// The controlled state.
    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    /// The query pages are fetched with.
    pub fn query(&self) -> &ListQuery<F> {
        &self.query
    }

    /// Whether another page exists.
    pub fn can_load_more(&self) -> bool {
        self.state.store().can_load_more()
    }

    /// Load the first page, replacing whatever was loaded.
    pub async fn get(&self) -> Result<Vec<T>> {
        let _guard = self.loading.lock().await;
        let page = self.fetcher.fetch_page(&self.query, None).await?;
        self.loaded(&page.models);
        self.state.store().replace(page.models.clone(), page.pagination);
        Ok(page.models)
    }

    /// Load the next page. Returns an empty page when nothing is left.
    pub async fn query_more(&self) -> Result<Vec<T>> {
        let _guard = self.loading.lock().await;
        let Some(next) = self.state.store().pagination().next else {
            return Ok(Vec::new());
        };
        let page = self.fetcher.fetch_page(&self.query, Some(next)).await?;
        self.loaded(&page.models);
        self.state.store().append_page(page.models.clone(), page.pagination);
        Ok(page.models)
    }

    /// Stop applying events. Loaded items stay readable.
    pub fn dispose(&self) {
        self.subscription.unsubscribe();
    }

    /// Whether events still reach the state.
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    fn loaded(&self, models: &[T]) {
        tracing::debug!(items = models.len(), "page loaded");
        if let Some(hook) = &self.on_page {
            hook(models);
        }
    }
}

// ============================================================================
// Single activity
// ============================================================================

/// Loads one activity into an [`ActivityState`].
pub struct ActivityView {
    state: Arc<ActivityState>,
    fetcher: Arc<dyn ActivityFetcher>,
    subscription: Subscription,
    on_load: Option<PageHook<ActivityData>>,
}

impl ActivityView {
    /// Subscribe `state` on `bus`.
    pub fn new(bus: &EventBus<StateEvent>, state: Arc<ActivityState>, fetcher: Arc<dyn ActivityFetcher>) -> Self {
        Self {
            subscription: bus.subscribe(Arc::new(state.event_handler())),
            state,
            fetcher,
            on_load: None,
        }
    }

    /// Run `hook` on every loaded activity.
    pub fn with_load_hook(mut self, hook: PageHook<ActivityData>) -> Self {
        self.on_load = Some(hook);
        self
    }

    /// The controlled state.
    pub fn state(&self) -> &Arc<ActivityState> {
        &self.state
    }

    /// Fetch the activity.
    pub async fn get(&self) -> Result<ActivityData> {
        let activity = self.fetcher.fetch_activity(self.state.activity_id()).await?;
        if let Some(hook) = &self.on_load {
            hook(std::slice::from_ref(&activity));
        }
        self.state.set_activity(activity.clone());
        Ok(activity)
    }

    /// Stop applying events.
    pub fn dispose(&self) {
        self.subscription.unsubscribe();
    }
}

// ============================================================================
// Single feed
// ============================================================================

/// Everything a [`FeedView`] reports after loading.
#[derive(Debug, Clone)]
pub struct FeedSummary {
    /// Loaded activities
    pub activities: Vec<ActivityData>,
    /// Accepted followers
    pub followers: Vec<FollowData>,
    /// Members
    pub members: Vec<FeedMemberData>,
}

/// Loads a feed into a [`FeedState`].
pub struct FeedView {
    state: Arc<FeedState>,
    fetcher: Arc<dyn FeedFetcher>,
    subscription: Subscription,
    on_page: Option<FeedPageHook>,
    loading: tokio::sync::Mutex<()>,
}

impl FeedView {
    /// Subscribe `state` on `bus`.
    pub fn new(bus: &EventBus<StateEvent>, state: Arc<FeedState>, fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self {
            subscription: bus.subscribe(Arc::new(state.event_handler())),
            state,
            fetcher,
            on_page: None,
            loading: tokio::sync::Mutex::new(()),
        }
    }

    /// Run `hook` on every loaded feed page.
    pub fn with_page_hook(mut self, hook: FeedPageHook) -> Self {
        self.on_page = Some(hook);
        self
    }

    /// The controlled state.
    pub fn state(&self) -> &Arc<FeedState> {
        &self.state
    }

    /// The feed id.
    pub fn fid(&self) -> &FeedId {
        self.state.fid()
    }

    /// Whether another activity page exists.
    pub fn can_load_more(&self) -> bool {
        self.state.can_load_more()
    }

    /// Load the feed and its first activity page, replacing everything loaded.
    pub async fn get(&self) -> Result<FeedSummary> {
        let _guard = self.loading.lock().await;
        let page = self.fetcher.fetch_feed(self.state.fid(), None).await?;
        if let Some(hook) = &self.on_page {
            hook(&page);
        }
        let summary = FeedSummary {
            activities: page.activities.models.clone(),
            followers: page.followers.clone(),
            members: page.members.clone(),
        };
        self.state.apply_feed_page(page);
        Ok(summary)
    }

    /// Load the next activity page. Returns an empty page when nothing is left.
    pub async fn query_more(&self) -> Result<Vec<ActivityData>> {
        let _guard = self.loading.lock().await;
        let store = self.state.store();
        let Some(next) = store.pagination().next else {
            return Ok(Vec::new());
        };
        let page = self.fetcher.fetch_feed(self.state.fid(), Some(next)).await?;
        if let Some(hook) = &self.on_page {
            hook(&page);
        }
        let models = page.activities.models;
        store.append_page(models.clone(), page.activities.pagination);
        Ok(models)
    }

    /// Stop applying events.
    pub fn dispose(&self) {
        self.subscription.unsubscribe();
    }
}
