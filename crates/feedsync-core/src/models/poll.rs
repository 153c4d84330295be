use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{remove_by_id, upsert_by_id, Identifiable};

/// One answer option of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOptionData {
    /// Option id
    pub id: String,
    /// Option label
    pub text: String,
}

/// A vote cast in a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollVoteData {
    /// Vote id
    pub id: String,
    /// Poll the vote belongs to
    pub poll_id: String,
    /// Chosen option
    pub option_id: String,
    /// Voter
    pub user_id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Identifiable for PollVoteData {
    fn id(&self) -> String {
        self.id.clone()
    }
}

/// A poll attached to an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollData {
    /// Poll id
    pub id: String,
    /// Question
    pub name: String,
    /// Answer options
    pub options: Vec<PollOptionData>,
    /// Total number of votes
    pub vote_count: u32,
    /// Votes per option id
    pub vote_counts_by_option: BTreeMap<String, u32>,
    /// Whether voting has ended
    pub is_closed: bool,
    /// Votes cast by the current user
    pub own_votes: Vec<PollVoteData>,
    /// Most recent votes by anyone
    pub latest_votes: Vec<PollVoteData>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl PollData {
    /// Take the server's copy of the poll but keep the current user's votes,
    /// which push events do not carry.
    pub fn merged_with(&self, incoming: &PollData) -> PollData {
        let mut merged = incoming.clone();
        merged.own_votes = self.own_votes.clone();
        merged
    }

    /// Record a vote by the current user.
    pub fn upsert_own_vote(&mut self, vote: PollVoteData) {
        upsert_by_id(&mut self.own_votes, vote);
    }

    /// Forget a vote by the current user.
    pub fn remove_own_vote(&mut self, vote_id: &str) -> bool {
        remove_by_id(&mut self.own_votes, vote_id)
    }
}

impl Identifiable for PollData {
    fn id(&self) -> String {
        self.id.clone()
    }
}
