use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    remove_by_id, upsert_by_id, BookmarkData, CommentData, FeedCapabilities, FeedData, Identifiable,
    PollData, PollVoteData, ReactionData, UserData,
};
use crate::ids::FeedId;
use crate::query::{FieldValue, FilterTarget};

/// An activity posted to one or more feeds.
///
/// The `own_*` collections describe the current user's relationship to the
/// activity. Push events never carry them, so every update path merges the
/// server copy with the locally known values through [`ActivityData::merged_with`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityData {
    /// Activity id
    pub id: String,
    /// Activity type (e.g. `post`)
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Author
    pub user: UserData,
    /// Feeds the activity was posted to
    pub feeds: Vec<FeedId>,
    /// Body text
    pub text: Option<String>,
    /// Tags used by filters
    pub filter_tags: Vec<String>,
    /// Number of reactions
    pub reaction_count: u32,
    /// Reactions by the current user
    pub own_reactions: Vec<ReactionData>,
    /// Most recent reactions by anyone
    pub latest_reactions: Vec<ReactionData>,
    /// Number of comments, replies included
    pub comment_count: u32,
    /// Loaded top-level comments
    pub comments: Vec<CommentData>,
    /// Number of bookmarks
    pub bookmark_count: u32,
    /// Bookmarks by the current user
    pub own_bookmarks: Vec<BookmarkData>,
    /// Attached poll
    pub poll: Option<PollData>,
    /// The feed the activity was fetched through, with the current user's capabilities
    pub current_feed: Option<FeedData>,
    /// Ranking score
    pub popularity: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl ActivityData {
    /// Take the server's copy but keep the locally known per-user state.
    ///
    /// Own reactions, own bookmarks and own poll votes are kept as is. Loaded
    /// comments and the current feed are kept when the incoming copy lacks them.
    pub fn merged_with(&self, incoming: &ActivityData) -> ActivityData {
        let mut merged = incoming.clone();
        merged.own_reactions = self.own_reactions.clone();
        merged.own_bookmarks = self.own_bookmarks.clone();
        if merged.comments.is_empty() {
            merged.comments = self.comments.clone();
        }
        if merged.current_feed.is_none() {
            merged.current_feed = self.current_feed.clone();
        }
        merged.poll = match (&self.poll, &incoming.poll) {
            (Some(local), Some(remote)) if local.id == remote.id => Some(local.merged_with(remote)),
            (_, remote) => remote.clone(),
        };
        merged
    }

    /// Whether the activity was posted to `fid`.
    pub fn is_in_feed(&self, fid: &FeedId) -> bool {
        self.feeds.iter().any(|feed| feed == fid)
    }

    // ------------------------------------------------------------------------
    // Reactions
    // ------------------------------------------------------------------------

    /// Apply an added reaction: counts from `updated`, own reactions from `reaction`.
    pub fn add_reaction(&mut self, updated: &ActivityData, reaction: ReactionData, current_user_id: &str) {
        *self = self.merged_with(updated);
        if reaction.user.id == current_user_id {
            upsert_by_id(&mut self.own_reactions, reaction);
        }
    }

    /// Apply a removed reaction.
    pub fn remove_reaction(&mut self, updated: &ActivityData, reaction: &ReactionData, current_user_id: &str) {
        *self = self.merged_with(updated);
        if reaction.user.id == current_user_id {
            remove_by_id(&mut self.own_reactions, &reaction.id());
        }
    }

    // ------------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------------

    /// Record a new comment or reply.
    ///
    /// Top-level comments join `comments`; replies attach under their parent
    /// when it is loaded. `comment_count` counts both.
    pub fn add_comment(&mut self, comment: CommentData) {
        let known = self.comments.iter().any(|c| c.contains(&comment.id));
        if !known {
            self.comment_count += 1;
        }
        if comment.parent_id.is_none() {
            upsert_by_id(&mut self.comments, comment);
        } else {
            let _ = self.comments.iter_mut().any(|c| c.add_reply(comment.clone()));
        }
    }

    /// Replace a loaded comment, keeping its local state.
    pub fn update_comment(&mut self, comment: &CommentData) -> bool {
        match super::comment::find_in_tree_mut(&mut self.comments, &comment.id) {
            Some(existing) => {
                *existing = existing.merged_with(comment);
                true
            }
            None => false,
        }
    }

    /// Forget a loaded comment or reply and decrement `comment_count`.
    ///
    /// Returns `false`, leaving the count alone, when the comment is not loaded.
    pub fn remove_comment(&mut self, comment: &CommentData) -> bool {
        let removed = remove_by_id(&mut self.comments, &comment.id)
            || self.comments.iter_mut().any(|c| c.remove_reply(&comment.id));
        if removed {
            self.comment_count = self.comment_count.saturating_sub(1);
        }
        removed
    }

    // ------------------------------------------------------------------------
    // Bookmarks
    // ------------------------------------------------------------------------

    /// Apply an added or updated bookmark.
    pub fn upsert_bookmark(&mut self, bookmark: &BookmarkData, current_user_id: &str) {
        self.bookmark_count = bookmark.activity.bookmark_count;
        if bookmark.user.id == current_user_id {
            let mut own = bookmark.clone();
            // Avoid nesting the activity inside its own bookmark list.
            own.activity.own_bookmarks.clear();
            upsert_by_id(&mut self.own_bookmarks, own);
        }
    }

    /// Apply a removed bookmark.
    pub fn remove_bookmark(&mut self, bookmark: &BookmarkData, current_user_id: &str) {
        self.bookmark_count = bookmark.activity.bookmark_count;
        if bookmark.user.id == current_user_id {
            remove_by_id(&mut self.own_bookmarks, &bookmark.id());
        }
    }

    // ------------------------------------------------------------------------
    // Polls
    // ------------------------------------------------------------------------

    /// Id of the attached poll.
    pub fn poll_id(&self) -> Option<&str> {
        self.poll.as_ref().map(|poll| poll.id.as_str())
    }

    /// Replace the attached poll if `poll` is it. Keeps the current user's votes.
    pub fn update_poll(&mut self, poll: &PollData) -> bool {
        match self.poll.as_mut() {
            Some(existing) if existing.id == poll.id => {
                *existing = existing.merged_with(poll);
                true
            }
            _ => false,
        }
    }

    /// Detach the poll with `poll_id`.
    pub fn remove_poll(&mut self, poll_id: &str) -> bool {
        if self.poll_id() == Some(poll_id) {
            self.poll = None;
            return true;
        }
        false
    }

    /// Apply a cast or changed vote.
    pub fn upsert_poll_vote(&mut self, poll: &PollData, vote: PollVoteData, current_user_id: &str) -> bool {
        if !self.update_poll(poll) {
            return false;
        }
        if vote.user_id == current_user_id {
            if let Some(existing) = self.poll.as_mut() {
                existing.upsert_own_vote(vote);
            }
        }
        true
    }

    /// Apply a removed vote.
    pub fn remove_poll_vote(&mut self, poll: &PollData, vote: &PollVoteData, current_user_id: &str) -> bool {
        if !self.update_poll(poll) {
            return false;
        }
        if vote.user_id == current_user_id {
            if let Some(existing) = self.poll.as_mut() {
                existing.remove_own_vote(&vote.id);
            }
        }
        true
    }

    // ------------------------------------------------------------------------
    // Capabilities
    // ------------------------------------------------------------------------

    /// Install capabilities for the current feed if they are for `fid`.
    pub fn set_own_capabilities(&mut self, fid: &FeedId, capabilities: &FeedCapabilities) -> bool {
        match self.current_feed.as_mut() {
            Some(feed) if feed.fid == *fid && feed.own_capabilities.as_ref() != Some(capabilities) => {
                feed.own_capabilities = Some(capabilities.clone());
                true
            }
            _ => false,
        }
    }
}

impl Identifiable for ActivityData {
    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Filterable and sortable fields of [`ActivityData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityField {
    /// Activity id
    Id,
    /// Activity type
    ActivityType,
    /// Author id
    UserId,
    /// Feeds the activity was posted to
    Feeds,
    /// Filter tags
    FilterTags,
    /// Body text
    Text,
    /// Reaction count
    ReactionCount,
    /// Comment count
    CommentCount,
    /// Ranking score
    Popularity,
    /// Creation time
    CreatedAt,
    /// Last update time
    UpdatedAt,
}

impl FilterTarget<ActivityField> for ActivityData {
    fn field_value(&self, field: &ActivityField) -> FieldValue {
        match field {
            ActivityField::Id => self.id.clone().into(),
            ActivityField::ActivityType => self.activity_type.clone().into(),
            ActivityField::UserId => self.user.id.clone().into(),
            ActivityField::Feeds => FieldValue::TextList(self.feeds.iter().map(FeedId::raw_value).collect()),
            ActivityField::FilterTags => self.filter_tags.clone().into(),
            ActivityField::Text => self.text.clone().into(),
            ActivityField::ReactionCount => self.reaction_count.into(),
            ActivityField::CommentCount => self.comment_count.into(),
            ActivityField::Popularity => self.popularity.into(),
            ActivityField::CreatedAt => self.created_at.into(),
            ActivityField::UpdatedAt => self.updated_at.into(),
        }
    }
}
