//! Shared fixtures for feedsync-state integration tests

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use feedsync_core::models::{CommentData, ReactionData};
use feedsync_state::CommentListMutations;
use parking_lot::Mutex;
use std::collections::HashSet;

/// Comment list double that records every mutation it receives.
#[derive(Default)]
pub struct RecordingCommentList {
    loaded: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingCommentList {
    pub fn with_loaded(ids: &[&str]) -> Self {
        let list = Self::default();
        list.loaded.lock().extend(ids.iter().map(|id| id.to_string()));
        list
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

impl CommentListMutations for RecordingCommentList {
    fn contains_comment(&self, comment_id: &str) -> bool {
        self.loaded.lock().contains(comment_id)
    }

    fn on_comment_upserted(&self, comment: CommentData) {
        self.loaded.lock().insert(comment.id.clone());
        self.record(format!("upsert {}", comment.id));
    }

    fn on_reply_added(&self, reply: CommentData) {
        self.loaded.lock().insert(reply.id.clone());
        self.record(format!("reply {}", reply.id));
    }

    fn on_reply_updated(&self, reply: &CommentData) {
        self.record(format!("reply-update {}", reply.id));
    }

    fn on_comment_removed(&self, comment_id: &str) {
        self.loaded.lock().remove(comment_id);
        self.record(format!("remove {comment_id}"));
    }

    fn on_comment_reaction_added(&self, comment: &CommentData, reaction: ReactionData) {
        self.record(format!("reaction+ {} {}", comment.id, reaction.reaction_type));
    }

    fn on_comment_reaction_removed(&self, comment: &CommentData, reaction: &ReactionData) {
        self.record(format!("reaction- {} {}", comment.id, reaction.reaction_type));
    }
}
