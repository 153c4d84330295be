//! View states and the routers that keep them in sync with the event bus
//!
//! Every view family pairs a `*State` (owning an observable store) with a
//! `*Mutations` trait and an `*EventHandler` that decides, per event, which
//! mutation to call. Handlers hold the state behind the trait so routing can
//! be tested against recording doubles.

mod activity;
mod activity_list;
mod bookmarks;
mod comment_list;
mod comment_replies;
mod feed;
mod feeds;
mod follows;
mod members;
mod reactions;

pub use activity::{ActivityEventHandler, ActivityMutations, ActivityState};
pub use activity_list::{
    route_activity_event, ActivityCollectionMutations, ActivityListEventHandler, ActivityListState,
    ActivityScope,
};
pub use bookmarks::{
    BookmarkFolderListEventHandler, BookmarkFolderListMutations, BookmarkFolderListState,
    BookmarkListEventHandler, BookmarkListMutations, BookmarkListState,
};
pub use comment_list::{CommentListEventHandler, CommentListMutations, CommentListState};
pub use comment_replies::{CommentReplyListEventHandler, CommentReplyListState};
pub use feed::{FeedEventHandler, FeedMutations, FeedState};
pub use feeds::{FeedListEventHandler, FeedListMutations, FeedListState};
pub use follows::{FollowListEventHandler, FollowListMutations, FollowListState};
pub use members::{MemberListEventHandler, MemberListMutations, MemberListState};
pub use reactions::{ReactionListEventHandler, ReactionListMutations, ReactionListState, ReactionScope};

use feedsync_core::{FilterTarget, ListQuery};

/// What a filtered list does with an updated entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Membership {
    Upsert,
    Remove,
    Skip,
}

/// Matching entities are upserted; loaded ones that stopped matching leave.
pub(crate) fn membership_after_update<F, T: FilterTarget<F>>(
    query: &ListQuery<F>,
    item: &T,
    loaded: bool,
) -> Membership {
    if query.matches(item) {
        Membership::Upsert
    } else if loaded {
        Membership::Remove
    } else {
        Membership::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::models::{FeedData, FeedField, UserData};
    use feedsync_core::{FeedId, Filter};

    fn feed(group: &str) -> FeedData {
        FeedData {
            fid: FeedId::new(group, "1"),
            name: "n".into(),
            description: None,
            created_by: UserData::new("u"),
            follower_count: 0,
            following_count: 0,
            member_count: 0,
            own_capabilities: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn membership_table() {
        let query = ListQuery::new().with_filter(Filter::equal(FeedField::Group, "user"));
        assert_eq!(membership_after_update(&query, &feed("user"), false), Membership::Upsert);
        assert_eq!(membership_after_update(&query, &feed("user"), true), Membership::Upsert);
        assert_eq!(membership_after_update(&query, &feed("timeline"), true), Membership::Remove);
        assert_eq!(membership_after_update(&query, &feed("timeline"), false), Membership::Skip);
    }
}
