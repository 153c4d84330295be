//! Activity, comment, reaction and poll builders

use feedsync_core::models::{
    ActivityData, CommentData, FeedData, ObjectType, PollData, PollOptionData, ReactionData, UserData,
};
use std::collections::BTreeMap;

use super::fid;
use crate::test_time;

/// Builder for [`ActivityData`].
#[derive(Debug, Clone)]
pub struct ActivityBuilder {
    activity: ActivityData,
}

impl ActivityBuilder {
    /// A `post` by `user` with no feeds, counters at zero.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            activity: ActivityData {
                id: id.into(),
                activity_type: "post".into(),
                user: UserData::new("user"),
                feeds: Vec::new(),
                text: None,
                filter_tags: Vec::new(),
                reaction_count: 0,
                own_reactions: Vec::new(),
                latest_reactions: Vec::new(),
                comment_count: 0,
                comments: Vec::new(),
                bookmark_count: 0,
                own_bookmarks: Vec::new(),
                poll: None,
                current_feed: None,
                popularity: 0,
                created_at: test_time(0),
                updated_at: test_time(0),
            },
        }
    }

    /// Set the activity type.
    pub fn activity_type(mut self, activity_type: &str) -> Self {
        self.activity.activity_type = activity_type.into();
        self
    }

    /// Set the author.
    pub fn user(mut self, user_id: &str) -> Self {
        self.activity.user = UserData::new(user_id);
        self
    }

    /// Add a feed the activity is posted to (`group:id`).
    pub fn fid(mut self, raw: &str) -> Self {
        self.activity.feeds.push(fid(raw));
        self
    }

    /// Set the body text.
    pub fn text(mut self, text: &str) -> Self {
        self.activity.text = Some(text.into());
        self
    }

    /// Add a filter tag.
    pub fn tag(mut self, tag: &str) -> Self {
        self.activity.filter_tags.push(tag.into());
        self
    }

    /// Attach a poll.
    pub fn poll(mut self, poll: PollData) -> Self {
        self.activity.poll = Some(poll);
        self
    }

    /// Set the feed the activity was fetched through.
    pub fn current_feed(mut self, feed: FeedData) -> Self {
        self.activity.current_feed = Some(feed);
        self
    }

    /// Set the ranking score.
    pub fn popularity(mut self, popularity: i64) -> Self {
        self.activity.popularity = popularity;
        self
    }

    /// Set creation and update time to `test_time(offset_secs)`.
    pub fn created_at(mut self, offset_secs: i64) -> Self {
        self.activity.created_at = test_time(offset_secs);
        self.activity.updated_at = test_time(offset_secs);
        self
    }

    /// Set the comment count.
    pub fn comment_count(mut self, count: u32) -> Self {
        self.activity.comment_count = count;
        self
    }

    /// Finish.
    pub fn build(self) -> ActivityData {
        self.activity
    }
}

/// Builder for [`CommentData`].
#[derive(Debug, Clone)]
pub struct CommentBuilder {
    comment: CommentData,
}

impl CommentBuilder {
    /// A top-level comment on activity `object_id`.
    pub fn new(id: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            comment: CommentData {
                id: id.into(),
                object_id: object_id.into(),
                object_type: ObjectType::Activity,
                parent_id: None,
                user: UserData::new("user"),
                text: String::new(),
                reaction_count: 0,
                own_reactions: Vec::new(),
                latest_reactions: Vec::new(),
                reply_count: 0,
                replies: Vec::new(),
                score: 0,
                created_at: test_time(0),
                updated_at: test_time(0),
            },
        }
    }

    /// Make this a reply to `parent_id`.
    pub fn parent(mut self, parent_id: &str) -> Self {
        self.comment.parent_id = Some(parent_id.into());
        self
    }

    /// Set the author.
    pub fn user(mut self, user_id: &str) -> Self {
        self.comment.user = UserData::new(user_id);
        self
    }

    /// Set the body.
    pub fn text(mut self, text: &str) -> Self {
        self.comment.text = text.into();
        self
    }

    /// Set the ranking score.
    pub fn score(mut self, score: i64) -> Self {
        self.comment.score = score;
        self
    }

    /// Set the reaction count.
    pub fn reaction_count(mut self, count: u32) -> Self {
        self.comment.reaction_count = count;
        self
    }

    /// Finish.
    pub fn build(self) -> CommentData {
        self.comment
    }
}

/// Builder for [`ReactionData`].
#[derive(Debug, Clone)]
pub struct ReactionBuilder {
    reaction: ReactionData,
}

impl ReactionBuilder {
    /// A `like` by `user` on activity `object_id`.
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            reaction: ReactionData {
                object_id: object_id.into(),
                object_type: ObjectType::Activity,
                reaction_type: "like".into(),
                user: UserData::new("user"),
                created_at: test_time(0),
            },
        }
    }

    /// Target a comment instead of an activity.
    pub fn on_comment(mut self) -> Self {
        self.reaction.object_type = ObjectType::Comment;
        self
    }

    /// Set the reaction type.
    pub fn reaction_type(mut self, reaction_type: &str) -> Self {
        self.reaction.reaction_type = reaction_type.into();
        self
    }

    /// Set the reacting user.
    pub fn user(mut self, user_id: &str) -> Self {
        self.reaction.user = UserData::new(user_id);
        self
    }

    /// Finish.
    pub fn build(self) -> ReactionData {
        self.reaction
    }
}

/// Builder for [`PollData`].
#[derive(Debug, Clone)]
pub struct PollBuilder {
    poll: PollData,
}

impl PollBuilder {
    /// An open poll with options `yes` and `no` and no votes.
    pub fn new(id: impl Into<String>) -> Self {
        let options = ["yes", "no"]
            .into_iter()
            .map(|text| PollOptionData {
                id: text.into(),
                text: text.into(),
            })
            .collect();
        Self {
            poll: PollData {
                id: id.into(),
                name: "poll".into(),
                options,
                vote_count: 0,
                vote_counts_by_option: BTreeMap::new(),
                is_closed: false,
                own_votes: Vec::new(),
                latest_votes: Vec::new(),
                created_at: test_time(0),
                updated_at: test_time(0),
            },
        }
    }

    /// Record `count` votes for `option_id`.
    pub fn votes(mut self, option_id: &str, count: u32) -> Self {
        self.poll.vote_count += count;
        *self.poll.vote_counts_by_option.entry(option_id.into()).or_default() += count;
        self
    }

    /// Mark closed.
    pub fn closed(mut self) -> Self {
        self.poll.is_closed = true;
        self
    }

    /// Finish.
    pub fn build(self) -> PollData {
        self.poll
    }
}
