//! Remote fetch interfaces
//!
//! These traits are the seam to the REST binding layer. feedsync never talks
//! to the network itself: the client layer drives these traits and the
//! application supplies implementations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;

use crate::errors::Result;
use crate::ids::FeedId;
use crate::models::{ActivityData, FeedData, FeedMemberData, FollowData};
use crate::pagination::PaginationResult;
use crate::query::ListQuery;

/// Fetches values for a batch of keys in one remote call.
///
/// Keys missing from the returned map are treated as "no value yet" and may
/// be requested again later.
#[async_trait]
pub trait BatchFetcher<K, V>: Send + Sync
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    /// Fetch values for `keys`.
    async fn fetch(&self, keys: Vec<K>) -> Result<HashMap<K, V>>;
}

/// Fetches one page of a list query.
#[async_trait]
pub trait PageFetcher<T, F>: Send + Sync
where
    T: Send + 'static,
    F: Send + Sync + 'static,
{
    /// Fetch the page after `next` (the first page when `None`).
    async fn fetch_page(&self, query: &ListQuery<F>, next: Option<String>) -> Result<PaginationResult<T>>;
}

/// Fetches a single activity.
#[async_trait]
pub trait ActivityFetcher: Send + Sync {
    /// Fetch the activity with `activity_id`.
    async fn fetch_activity(&self, activity_id: &str) -> Result<ActivityData>;
}

/// Everything a feed view loads up front.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    /// The feed itself
    pub feed: FeedData,
    /// First page of activities
    pub activities: PaginationResult<ActivityData>,
    /// Accepted followers
    pub followers: Vec<FollowData>,
    /// Feeds this feed follows
    pub following: Vec<FollowData>,
    /// Pending follow requests addressed to the feed
    pub follow_requests: Vec<FollowData>,
    /// Members
    pub members: Vec<FeedMemberData>,
}

/// Loads a feed and the first page of its activities.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Load `fid`; `next` continues the activity list when set.
    async fn fetch_feed(&self, fid: &FeedId, next: Option<String>) -> Result<FeedPage>;
}
