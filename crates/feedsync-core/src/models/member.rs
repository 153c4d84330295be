use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Identifiable, UserData};
use crate::query::{FieldValue, FilterTarget};

/// Membership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Active member
    Member,
    /// Invited, not yet accepted
    Pending,
    /// Invitation rejected
    Rejected,
}

impl MemberStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Member => "member",
            MemberStatus::Pending => "pending",
            MemberStatus::Rejected => "rejected",
        }
    }
}

/// A member of a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMemberData {
    /// The member
    pub user: UserData,
    /// Role within the feed (e.g. `member`, `moderator`)
    pub role: String,
    /// Membership state
    pub status: MemberStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Identifiable for FeedMemberData {
    fn id(&self) -> String {
        self.user.id.clone()
    }
}

/// Filterable and sortable fields of [`FeedMemberData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberField {
    /// Member user id
    UserId,
    /// Role
    Role,
    /// Membership state
    Status,
    /// Creation time
    CreatedAt,
    /// Last update time
    UpdatedAt,
}

impl FilterTarget<MemberField> for FeedMemberData {
    fn field_value(&self, field: &MemberField) -> FieldValue {
        match field {
            MemberField::UserId => self.user.id.clone().into(),
            MemberField::Role => self.role.clone().into(),
            MemberField::Status => self.status.as_str().into(),
            MemberField::CreatedAt => self.created_at.into(),
            MemberField::UpdatedAt => self.updated_at.into(),
        }
    }
}
