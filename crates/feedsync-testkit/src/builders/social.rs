//! Feed, follow, member and bookmark builders

use feedsync_core::models::{
    ActivityData, BookmarkData, BookmarkFolderData, FeedCapabilities, FeedData, FeedMemberData, FollowData,
    FollowStatus, MemberStatus, UserData,
};

use super::fid;
use crate::test_time;

/// Builder for [`FeedData`].
#[derive(Debug, Clone)]
pub struct FeedBuilder {
    feed: FeedData,
}

impl FeedBuilder {
    /// A feed `group:id` created by the feed's id, without capabilities.
    pub fn new(raw_fid: &str) -> Self {
        let fid = fid(raw_fid);
        Self {
            feed: FeedData {
                name: fid.id().to_string(),
                created_by: UserData::new(fid.id()),
                fid,
                description: None,
                follower_count: 0,
                following_count: 0,
                member_count: 0,
                own_capabilities: None,
                created_at: test_time(0),
                updated_at: test_time(0),
            },
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: &str) -> Self {
        self.feed.name = name.into();
        self
    }

    /// Set the current user's capabilities.
    pub fn capabilities(mut self, capabilities: FeedCapabilities) -> Self {
        self.feed.own_capabilities = Some(capabilities);
        self
    }

    /// Set the follower count.
    pub fn follower_count(mut self, count: u32) -> Self {
        self.feed.follower_count = count;
        self
    }

    /// Finish.
    pub fn build(self) -> FeedData {
        self.feed
    }
}

/// Builder for [`FollowData`].
#[derive(Debug, Clone)]
pub struct FollowBuilder {
    follow: FollowData,
}

impl FollowBuilder {
    /// An accepted follow from `source` to `target` (both `group:id`).
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            follow: FollowData {
                source_feed: FeedBuilder::new(source).build(),
                target_feed: FeedBuilder::new(target).build(),
                status: FollowStatus::Accepted,
                created_at: test_time(0),
                updated_at: test_time(0),
            },
        }
    }

    /// Set the request state.
    pub fn status(mut self, status: FollowStatus) -> Self {
        self.follow.status = status;
        self
    }

    /// Finish.
    pub fn build(self) -> FollowData {
        self.follow
    }
}

/// Builder for [`FeedMemberData`].
#[derive(Debug, Clone)]
pub struct MemberBuilder {
    member: FeedMemberData,
}

impl MemberBuilder {
    /// An active `member` role for `user_id`.
    pub fn new(user_id: &str) -> Self {
        Self {
            member: FeedMemberData {
                user: UserData::new(user_id),
                role: "member".into(),
                status: MemberStatus::Member,
                created_at: test_time(0),
                updated_at: test_time(0),
            },
        }
    }

    /// Set the role.
    pub fn role(mut self, role: &str) -> Self {
        self.member.role = role.into();
        self
    }

    /// Set the membership state.
    pub fn status(mut self, status: MemberStatus) -> Self {
        self.member.status = status;
        self
    }

    /// Finish.
    pub fn build(self) -> FeedMemberData {
        self.member
    }
}

/// Builder for [`BookmarkData`].
#[derive(Debug, Clone)]
pub struct BookmarkBuilder {
    bookmark: BookmarkData,
}

impl BookmarkBuilder {
    /// An unfiled bookmark of `activity` owned by `user`.
    pub fn new(activity: ActivityData) -> Self {
        Self {
            bookmark: BookmarkData {
                activity,
                folder: None,
                user: UserData::new("user"),
                created_at: test_time(0),
                updated_at: test_time(0),
            },
        }
    }

    /// File into folder `folder_id` named `name`.
    pub fn folder(mut self, folder_id: &str, name: &str) -> Self {
        self.bookmark.folder = Some(BookmarkFolderData {
            id: folder_id.into(),
            name: name.into(),
            created_at: test_time(0),
            updated_at: test_time(0),
        });
        self
    }

    /// Set the owner.
    pub fn user(mut self, user_id: &str) -> Self {
        self.bookmark.user = UserData::new(user_id);
        self
    }

    /// Finish.
    pub fn build(self) -> BookmarkData {
        self.bookmark
    }
}
