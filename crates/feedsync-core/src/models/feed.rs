use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use super::{FeedMemberData, FollowData, Identifiable, UserData};
use crate::ids::FeedId;
use crate::query::{FieldValue, FilterTarget};

/// An action the current user may perform on a feed.
///
/// Unrecognized capabilities from newer servers are kept verbatim in
/// [`FeedOwnCapability::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeedOwnCapability {
    /// Post activities to the feed
    AddActivity,
    /// React to activities
    AddActivityReaction,
    /// Comment on activities
    AddComment,
    /// React to comments
    AddCommentReaction,
    /// Bookmark activities
    BookmarkActivity,
    /// Vote in polls
    CastPollVote,
    /// Delete the feed
    DeleteFeed,
    /// Delete own activities
    DeleteOwnActivity,
    /// Delete own comments
    DeleteOwnComment,
    /// Follow the feed
    Follow,
    /// Add and remove members
    ManageFeedMembers,
    /// Read activities
    ReadFeed,
    /// Edit the feed itself
    UpdateFeed,
    /// Edit own activities
    UpdateOwnActivity,
    /// Edit own comments
    UpdateOwnComment,
    /// Capability not known to this client
    Unknown(String),
}

impl FeedOwnCapability {
    /// Wire name of the capability.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AddActivity => "add-activity",
            Self::AddActivityReaction => "add-activity-reaction",
            Self::AddComment => "add-comment",
            Self::AddCommentReaction => "add-comment-reaction",
            Self::BookmarkActivity => "bookmark-activity",
            Self::CastPollVote => "cast-poll-vote",
            Self::DeleteFeed => "delete-feed",
            Self::DeleteOwnActivity => "delete-own-activity",
            Self::DeleteOwnComment => "delete-own-comment",
            Self::Follow => "follow",
            Self::ManageFeedMembers => "manage-feed-members",
            Self::ReadFeed => "read-feed",
            Self::UpdateFeed => "update-feed",
            Self::UpdateOwnActivity => "update-own-activity",
            Self::UpdateOwnComment => "update-own-comment",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for FeedOwnCapability {
    fn from(raw: &str) -> Self {
        match raw {
            "add-activity" => Self::AddActivity,
            "add-activity-reaction" => Self::AddActivityReaction,
            "add-comment" => Self::AddComment,
            "add-comment-reaction" => Self::AddCommentReaction,
            "bookmark-activity" => Self::BookmarkActivity,
            "cast-poll-vote" => Self::CastPollVote,
            "delete-feed" => Self::DeleteFeed,
            "delete-own-activity" => Self::DeleteOwnActivity,
            "delete-own-comment" => Self::DeleteOwnComment,
            "follow" => Self::Follow,
            "manage-feed-members" => Self::ManageFeedMembers,
            "read-feed" => Self::ReadFeed,
            "update-feed" => Self::UpdateFeed,
            "update-own-activity" => Self::UpdateOwnActivity,
            "update-own-comment" => Self::UpdateOwnComment,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for FeedOwnCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FeedOwnCapability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeedOwnCapability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// The set of capabilities the current user holds on one feed.
pub type FeedCapabilities = BTreeSet<FeedOwnCapability>;

/// A feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedData {
    /// Feed id
    pub fid: FeedId,
    /// Display name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Creator
    pub created_by: UserData,
    /// Number of accepted followers
    pub follower_count: u32,
    /// Number of feeds this feed follows
    pub following_count: u32,
    /// Number of members
    pub member_count: u32,
    /// Capabilities of the current user, when the response included them
    pub own_capabilities: Option<FeedCapabilities>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl FeedData {
    /// Take the server's copy but keep locally known capabilities it omitted.
    pub fn merged_with(&self, incoming: &FeedData) -> FeedData {
        let mut merged = incoming.clone();
        if merged.own_capabilities.is_none() {
            merged.own_capabilities = self.own_capabilities.clone();
        }
        merged
    }
}

impl Identifiable for FeedData {
    fn id(&self) -> String {
        self.fid.raw_value()
    }
}

/// Filterable and sortable fields of [`FeedData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedField {
    /// `group:id`
    Fid,
    /// Feed group
    Group,
    /// Display name
    Name,
    /// Creator id
    CreatedBy,
    /// Follower count
    FollowerCount,
    /// Member count
    MemberCount,
    /// Creation time
    CreatedAt,
    /// Last update time
    UpdatedAt,
}

impl FilterTarget<FeedField> for FeedData {
    fn field_value(&self, field: &FeedField) -> FieldValue {
        match field {
            FeedField::Fid => (&self.fid).into(),
            FeedField::Group => self.fid.group().into(),
            FeedField::Name => self.name.clone().into(),
            FeedField::CreatedBy => self.created_by.id.clone().into(),
            FeedField::FollowerCount => self.follower_count.into(),
            FeedField::MemberCount => self.member_count.into(),
            FeedField::CreatedAt => self.created_at.into(),
            FeedField::UpdatedAt => self.updated_at.into(),
        }
    }
}

/// Per-feed relationship of the current user to a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedOwnValues {
    /// Follows from the current user's feeds to this feed
    pub own_follows: Vec<FollowData>,
    /// The current user's membership, if any
    pub own_membership: Option<FeedMemberData>,
}
