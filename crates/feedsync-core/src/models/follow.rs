use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FeedData, Identifiable};
use crate::ids::FeedId;
use crate::query::{FieldValue, FilterTarget};

/// State of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowStatus {
    /// The target accepted the follow
    Accepted,
    /// Awaiting approval
    Pending,
    /// The target rejected the follow
    Rejected,
}

impl FollowStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowStatus::Accepted => "accepted",
            FollowStatus::Pending => "pending",
            FollowStatus::Rejected => "rejected",
        }
    }
}

/// A follow relationship from `source_feed` to `target_feed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowData {
    /// Following feed
    pub source_feed: FeedData,
    /// Followed feed
    pub target_feed: FeedData,
    /// Request state
    pub status: FollowStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl FollowData {
    /// Accepted follow whose target is `fid`.
    pub fn is_follower_of(&self, fid: &FeedId) -> bool {
        self.status == FollowStatus::Accepted && self.target_feed.fid == *fid
    }

    /// Accepted follow whose source is `fid`.
    pub fn is_following_of(&self, fid: &FeedId) -> bool {
        self.status == FollowStatus::Accepted && self.source_feed.fid == *fid
    }

    /// Pending follow request addressed to `fid`.
    pub fn is_request_to(&self, fid: &FeedId) -> bool {
        self.status == FollowStatus::Pending && self.target_feed.fid == *fid
    }

    /// Whether either end is `fid`.
    pub fn touches(&self, fid: &FeedId) -> bool {
        self.source_feed.fid == *fid || self.target_feed.fid == *fid
    }
}

impl Identifiable for FollowData {
    fn id(&self) -> String {
        format!("{}:{}", self.source_feed.fid, self.target_feed.fid)
    }
}

/// Filterable and sortable fields of [`FollowData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FollowField {
    /// Source feed id
    SourceFeed,
    /// Target feed id
    TargetFeed,
    /// Request state
    Status,
    /// Creation time
    CreatedAt,
    /// Last update time
    UpdatedAt,
}

impl FilterTarget<FollowField> for FollowData {
    fn field_value(&self, field: &FollowField) -> FieldValue {
        match field {
            FollowField::SourceFeed => (&self.source_feed.fid).into(),
            FollowField::TargetFeed => (&self.target_feed.fid).into(),
            FollowField::Status => self.status.as_str().into(),
            FollowField::CreatedAt => self.created_at.into(),
            FollowField::UpdatedAt => self.updated_at.into(),
        }
    }
}
