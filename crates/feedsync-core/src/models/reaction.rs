use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identifiable, UserData};
use crate::query::{FieldValue, FilterTarget};

/// Kind of object a reaction or comment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    /// An activity
    Activity,
    /// A comment
    Comment,
}

/// A reaction by a user to an activity or comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionData {
    /// Id of the reacted-to object
    pub object_id: String,
    /// Kind of the reacted-to object
    pub object_type: ObjectType,
    /// Reaction type (e.g. `like`)
    #[serde(rename = "type")]
    pub reaction_type: String,
    /// Reacting user
    pub user: UserData,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Identifiable for ReactionData {
    fn id(&self) -> String {
        format!("{}:{}:{}", self.object_id, self.reaction_type, self.user.id)
    }
}

/// Filterable and sortable fields of [`ReactionData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionField {
    /// Reaction type
    ReactionType,
    /// Reacting user id
    UserId,
    /// Creation time
    CreatedAt,
}

impl FilterTarget<ReactionField> for ReactionData {
    fn field_value(&self, field: &ReactionField) -> FieldValue {
        match field {
            ReactionField::ReactionType => self.reaction_type.clone().into(),
            ReactionField::UserId => self.user.id.clone().into(),
            ReactionField::CreatedAt => self.created_at.into(),
        }
    }
}
