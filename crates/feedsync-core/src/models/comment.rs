use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{remove_by_id, upsert_by_id, Identifiable, ObjectType, ReactionData, UserData};
use crate::query::{FieldValue, FilterTarget};

/// A comment on an activity, possibly a reply to another comment.
///
/// Replies nest through `replies`; `reply_count` is the server's count and
/// may exceed the number of loaded replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentData {
    /// Comment id
    pub id: String,
    /// Id of the object commented on
    pub object_id: String,
    /// Kind of the object commented on
    pub object_type: ObjectType,
    /// Parent comment for replies
    pub parent_id: Option<String>,
    /// Author
    pub user: UserData,
    /// Body
    pub text: String,
    /// Number of reactions
    pub reaction_count: u32,
    /// Reactions by the current user
    pub own_reactions: Vec<ReactionData>,
    /// Most recent reactions by anyone
    pub latest_reactions: Vec<ReactionData>,
    /// Number of direct replies
    pub reply_count: u32,
    /// Loaded direct replies
    pub replies: Vec<CommentData>,
    /// Ranking score
    pub score: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl CommentData {
    /// Take the server's copy but keep the current user's reactions and the
    /// loaded replies, which push events do not carry.
    pub fn merged_with(&self, incoming: &CommentData) -> CommentData {
        let mut merged = incoming.clone();
        merged.own_reactions = self.own_reactions.clone();
        if merged.replies.is_empty() {
            merged.replies = self.replies.clone();
        }
        merged
    }

    /// Apply an added reaction: counts from `updated`, own reactions from `reaction`.
    pub fn add_reaction(&mut self, updated: &CommentData, reaction: ReactionData, current_user_id: &str) {
        *self = self.merged_with(updated);
        if reaction.user.id == current_user_id {
            upsert_by_id(&mut self.own_reactions, reaction);
        }
    }

    /// Apply a removed reaction.
    pub fn remove_reaction(&mut self, updated: &CommentData, reaction: &ReactionData, current_user_id: &str) {
        *self = self.merged_with(updated);
        if reaction.user.id == current_user_id {
            remove_by_id(&mut self.own_reactions, &reaction.id());
        }
    }

    /// Find a comment by id in this comment's subtree, itself included.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut CommentData> {
        if self.id == id {
            return Some(self);
        }
        self.replies.iter_mut().find_map(|reply| reply.find_mut(id))
    }

    /// Whether `id` is this comment or one of its loaded descendants.
    pub fn contains(&self, id: &str) -> bool {
        self.id == id || self.replies.iter().any(|reply| reply.contains(id))
    }

    /// Attach `reply` under its parent somewhere in this subtree.
    ///
    /// Returns `false` when the parent is not loaded here.
    pub fn add_reply(&mut self, reply: CommentData) -> bool {
        let Some(parent_id) = reply.parent_id.clone() else {
            return false;
        };
        match self.find_mut(&parent_id) {
            Some(parent) => {
                if upsert_by_id(&mut parent.replies, reply) {
                    parent.reply_count += 1;
                }
                true
            }
            None => false,
        }
    }

    /// Remove a descendant by id, adjusting its parent's `reply_count`.
    pub fn remove_reply(&mut self, reply_id: &str) -> bool {
        if remove_by_id(&mut self.replies, reply_id) {
            self.reply_count = self.reply_count.saturating_sub(1);
            return true;
        }
        self.replies.iter_mut().any(|reply| reply.remove_reply(reply_id))
    }
}

/// Find a comment by id anywhere in a forest of comments.
pub fn find_in_tree_mut<'a>(comments: &'a mut [CommentData], id: &str) -> Option<&'a mut CommentData> {
    comments.iter_mut().find_map(|comment| comment.find_mut(id))
}

impl Identifiable for CommentData {
    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Filterable and sortable fields of [`CommentData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentField {
    /// Comment id
    Id,
    /// Commented object id
    ObjectId,
    /// Parent comment id (unset for top-level comments)
    ParentId,
    /// Author id
    UserId,
    /// Ranking score
    Score,
    /// Reaction count
    ReactionCount,
    /// Reply count
    ReplyCount,
    /// Creation time
    CreatedAt,
    /// Last update time
    UpdatedAt,
}

impl FilterTarget<CommentField> for CommentData {
    fn field_value(&self, field: &CommentField) -> FieldValue {
        match field {
            CommentField::Id => self.id.clone().into(),
            CommentField::ObjectId => self.object_id.clone().into(),
            CommentField::ParentId => self.parent_id.clone().into(),
            CommentField::UserId => self.user.id.clone().into(),
            CommentField::Score => self.score.into(),
            CommentField::ReactionCount => self.reaction_count.into(),
            CommentField::ReplyCount => self.reply_count.into(),
            CommentField::CreatedAt => self.created_at.into(),
            CommentField::UpdatedAt => self.updated_at.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, parent: Option<&str>) -> CommentData {
        CommentData {
            id: id.into(),
            object_id: "act-1".into(),
            object_type: ObjectType::Activity,
            parent_id: parent.map(Into::into),
            user: UserData::new("u1"),
            text: String::new(),
            reaction_count: 0,
            own_reactions: Vec::new(),
            latest_reactions: Vec::new(),
            reply_count: 0,
            replies: Vec::new(),
            score: 0,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn replies_attach_at_any_depth() {
        let mut root = comment("c1", None);
        assert!(root.add_reply(comment("c2", Some("c1"))));
        assert!(root.add_reply(comment("c3", Some("c2"))));
        assert!(!root.add_reply(comment("c4", Some("elsewhere"))));

        assert_eq!(root.reply_count, 1);
        assert_eq!(root.replies[0].reply_count, 1);
        assert!(root.contains("c3"));

        // Re-adding the same reply replaces it without recounting.
        assert!(root.add_reply(comment("c3", Some("c2"))));
        assert_eq!(root.replies[0].reply_count, 1);
    }

    #[test]
    fn removing_a_reply_updates_its_parent_count() {
        let mut root = comment("c1", None);
        root.add_reply(comment("c2", Some("c1")));
        root.add_reply(comment("c3", Some("c2")));

        assert!(root.remove_reply("c3"));
        assert_eq!(root.replies[0].reply_count, 0);
        assert!(!root.remove_reply("c3"));
        assert_eq!(root.reply_count, 1);
    }

    #[test]
    fn merge_keeps_local_reactions_and_replies() {
        let mut local = comment("c1", None);
        local.add_reply(comment("c2", Some("c1")));
        local.own_reactions.push(ReactionData {
            object_id: "c1".into(),
            object_type: ObjectType::Comment,
            reaction_type: "like".into(),
            user: UserData::new("me"),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        });
        let mut incoming = comment("c1", None);
        incoming.text = "edited".into();

        let merged = local.merged_with(&incoming);
        assert_eq!(merged.text, "edited");
        assert_eq!(merged.own_reactions.len(), 1);
        assert_eq!(merged.replies.len(), 1);
    }
}
