//! # State Events
//!
//! [`StateEvent`] is the closed set of notifications that flow over the
//! [`crate::bus::EventBus`]. Most variants mirror a server-push message
//! decoded by the transport; the two `*Updated` value variants are produced
//! locally when a keyed cache publishes a changed snapshot.
//!
//! Events carry the server's copy of the affected entity. Routers merge it
//! with local per-user state rather than trusting it wholesale.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::ids::FeedId;
use crate::models::{
    ActivityData, BookmarkData, BookmarkFolderData, CommentData, FeedCapabilities, FeedData,
    FeedMemberData, FeedOwnValues, FollowData, PollData, PollVoteData, ReactionData,
};

/// A state change delivered to live views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    // === Activities ===
    /// An activity was posted to `fid`
    ActivityAdded {
        /// Feed the event was delivered for
        fid: FeedId,
        /// The new activity
        activity: ActivityData,
    },
    /// An activity was edited
    ActivityUpdated {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Server copy after the edit
        activity: ActivityData,
    },
    /// An activity was deleted
    ActivityDeleted {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Deleted activity id
        activity_id: String,
    },
    /// A reaction was added to an activity
    ActivityReactionAdded {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Activity with updated counts
        activity: ActivityData,
        /// The reaction
        reaction: ReactionData,
    },
    /// A reaction was removed from an activity
    ActivityReactionDeleted {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Activity with updated counts
        activity: ActivityData,
        /// The removed reaction
        reaction: ReactionData,
    },

    // === Bookmarks ===
    /// An activity was bookmarked
    BookmarkAdded {
        /// The bookmark
        bookmark: BookmarkData,
    },
    /// A bookmark moved folder or was edited
    BookmarkUpdated {
        /// The bookmark after the edit
        bookmark: BookmarkData,
    },
    /// A bookmark was removed
    BookmarkDeleted {
        /// The removed bookmark
        bookmark: BookmarkData,
    },
    /// A bookmark folder was renamed or edited
    BookmarkFolderUpdated {
        /// The folder after the edit
        folder: BookmarkFolderData,
    },
    /// A bookmark folder was deleted
    BookmarkFolderDeleted {
        /// Deleted folder id
        folder_id: String,
    },

    // === Comments ===
    /// A comment or reply was added
    CommentAdded {
        /// Feed the event was delivered for
        fid: FeedId,
        /// The comment
        comment: CommentData,
    },
    /// A comment was edited
    CommentUpdated {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Server copy after the edit
        comment: CommentData,
    },
    /// A comment was deleted
    CommentDeleted {
        /// Feed the event was delivered for
        fid: FeedId,
        /// The deleted comment
        comment: CommentData,
    },
    /// A reaction was added to a comment
    CommentReactionAdded {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Comment with updated counts
        comment: CommentData,
        /// The reaction
        reaction: ReactionData,
    },
    /// A reaction was removed from a comment
    CommentReactionDeleted {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Comment with updated counts
        comment: CommentData,
        /// The removed reaction
        reaction: ReactionData,
    },

    // === Feeds ===
    /// A feed was created
    FeedAdded {
        /// The feed
        feed: FeedData,
    },
    /// A feed was edited
    FeedUpdated {
        /// Server copy after the edit
        feed: FeedData,
    },
    /// A feed was deleted
    FeedDeleted {
        /// Deleted feed id
        fid: FeedId,
    },

    // === Follows ===
    /// A follow was created
    FollowAdded {
        /// The follow
        follow: FollowData,
    },
    /// A follow changed state
    FollowUpdated {
        /// The follow after the change
        follow: FollowData,
    },
    /// A follow was removed
    FollowDeleted {
        /// The removed follow
        follow: FollowData,
    },

    // === Members ===
    /// A member joined or was invited to `fid`
    FeedMemberAdded {
        /// The feed
        fid: FeedId,
        /// The member
        member: FeedMemberData,
    },
    /// A membership changed
    FeedMemberUpdated {
        /// The feed
        fid: FeedId,
        /// The member after the change
        member: FeedMemberData,
    },
    /// A member left or was removed from `fid`
    FeedMemberRemoved {
        /// The feed
        fid: FeedId,
        /// Removed member's user id
        user_id: String,
    },

    // === Polls ===
    /// A poll was edited
    PollUpdated {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Server copy after the edit
        poll: PollData,
    },
    /// A poll was closed
    PollClosed {
        /// Feed the event was delivered for
        fid: FeedId,
        /// The closed poll
        poll: PollData,
    },
    /// A poll was deleted
    PollDeleted {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Deleted poll id
        poll_id: String,
    },
    /// A vote was cast
    PollVoteCasted {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Poll with updated counts
        poll: PollData,
        /// The vote
        vote: PollVoteData,
    },
    /// A vote moved to another option
    PollVoteChanged {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Poll with updated counts
        poll: PollData,
        /// The vote after the change
        vote: PollVoteData,
    },
    /// A vote was retracted
    PollVoteRemoved {
        /// Feed the event was delivered for
        fid: FeedId,
        /// Poll with updated counts
        poll: PollData,
        /// The removed vote
        vote: PollVoteData,
    },

    // === Locally derived values ===
    /// The capabilities cache published a changed snapshot
    FeedCapabilitiesUpdated {
        /// Every cached capability set
        capabilities: Arc<HashMap<FeedId, FeedCapabilities>>,
    },
    /// The own-values cache published a changed snapshot
    FeedOwnValuesUpdated {
        /// Every cached own-values entry
        values: Arc<HashMap<FeedId, FeedOwnValues>>,
    },
}

impl StateEvent {
    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            StateEvent::ActivityAdded { .. } => "activity.added",
            StateEvent::ActivityUpdated { .. } => "activity.updated",
            StateEvent::ActivityDeleted { .. } => "activity.deleted",
            StateEvent::ActivityReactionAdded { .. } => "activity.reaction.added",
            StateEvent::ActivityReactionDeleted { .. } => "activity.reaction.deleted",
            StateEvent::BookmarkAdded { .. } => "bookmark.added",
            StateEvent::BookmarkUpdated { .. } => "bookmark.updated",
            StateEvent::BookmarkDeleted { .. } => "bookmark.deleted",
            StateEvent::BookmarkFolderUpdated { .. } => "bookmark_folder.updated",
            StateEvent::BookmarkFolderDeleted { .. } => "bookmark_folder.deleted",
            StateEvent::CommentAdded { .. } => "comment.added",
            StateEvent::CommentUpdated { .. } => "comment.updated",
            StateEvent::CommentDeleted { .. } => "comment.deleted",
            StateEvent::CommentReactionAdded { .. } => "comment.reaction.added",
            StateEvent::CommentReactionDeleted { .. } => "comment.reaction.deleted",
            StateEvent::FeedAdded { .. } => "feed.added",
            StateEvent::FeedUpdated { .. } => "feed.updated",
            StateEvent::FeedDeleted { .. } => "feed.deleted",
            StateEvent::FollowAdded { .. } => "follow.added",
            StateEvent::FollowUpdated { .. } => "follow.updated",
            StateEvent::FollowDeleted { .. } => "follow.deleted",
            StateEvent::FeedMemberAdded { .. } => "feed_member.added",
            StateEvent::FeedMemberUpdated { .. } => "feed_member.updated",
            StateEvent::FeedMemberRemoved { .. } => "feed_member.removed",
            StateEvent::PollUpdated { .. } => "poll.updated",
            StateEvent::PollClosed { .. } => "poll.closed",
            StateEvent::PollDeleted { .. } => "poll.deleted",
            StateEvent::PollVoteCasted { .. } => "poll.vote_casted",
            StateEvent::PollVoteChanged { .. } => "poll.vote_changed",
            StateEvent::PollVoteRemoved { .. } => "poll.vote_removed",
            StateEvent::FeedCapabilitiesUpdated { .. } => "feed.capabilities.updated",
            StateEvent::FeedOwnValuesUpdated { .. } => "feed.own_values.updated",
        }
    }

    /// The feed the event was delivered for, when it has one.
    pub fn fid(&self) -> Option<&FeedId> {
        match self {
            StateEvent::ActivityAdded { fid, .. }
            | StateEvent::ActivityUpdated { fid, .. }
            | StateEvent::ActivityDeleted { fid, .. }
            | StateEvent::ActivityReactionAdded { fid, .. }
            | StateEvent::ActivityReactionDeleted { fid, .. }
            | StateEvent::CommentAdded { fid, .. }
            | StateEvent::CommentUpdated { fid, .. }
            | StateEvent::CommentDeleted { fid, .. }
            | StateEvent::CommentReactionAdded { fid, .. }
            | StateEvent::CommentReactionDeleted { fid, .. }
            | StateEvent::FeedDeleted { fid }
            | StateEvent::FeedMemberAdded { fid, .. }
            | StateEvent::FeedMemberUpdated { fid, .. }
            | StateEvent::FeedMemberRemoved { fid, .. }
            | StateEvent::PollUpdated { fid, .. }
            | StateEvent::PollClosed { fid, .. }
            | StateEvent::PollDeleted { fid, .. }
            | StateEvent::PollVoteCasted { fid, .. }
            | StateEvent::PollVoteChanged { fid, .. }
            | StateEvent::PollVoteRemoved { fid, .. } => Some(fid),
            StateEvent::FeedAdded { feed } | StateEvent::FeedUpdated { feed } => Some(&feed.fid),
            StateEvent::BookmarkAdded { .. }
            | StateEvent::BookmarkUpdated { .. }
            | StateEvent::BookmarkDeleted { .. }
            | StateEvent::BookmarkFolderUpdated { .. }
            | StateEvent::BookmarkFolderDeleted { .. }
            | StateEvent::FollowAdded { .. }
            | StateEvent::FollowUpdated { .. }
            | StateEvent::FollowDeleted { .. }
            | StateEvent::FeedCapabilitiesUpdated { .. }
            | StateEvent::FeedOwnValuesUpdated { .. } => None,
        }
    }
}
