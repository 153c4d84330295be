//! Fluent builders producing valid models with deterministic defaults

mod activity;
mod social;

pub use activity::{ActivityBuilder, CommentBuilder, PollBuilder, ReactionBuilder};
pub use social::{BookmarkBuilder, FeedBuilder, FollowBuilder, MemberBuilder};

use feedsync_core::FeedId;

/// Parse `group:id`, panicking on malformed test input.
pub(crate) fn fid(raw: &str) -> FeedId {
    raw.parse().unwrap_or_else(|e| panic!("invalid test fid {raw:?}: {e}"))
}
