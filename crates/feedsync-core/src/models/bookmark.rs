use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActivityData, Identifiable, UserData};
use crate::query::{FieldValue, FilterTarget};

/// A folder grouping bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkFolderData {
    /// Folder id
    pub id: String,
    /// Folder name
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Identifiable for BookmarkFolderData {
    fn id(&self) -> String {
        self.id.clone()
    }
}

/// A bookmark of an activity, optionally inside a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkData {
    /// Bookmarked activity
    pub activity: ActivityData,
    /// Folder, if filed
    pub folder: Option<BookmarkFolderData>,
    /// Owner of the bookmark
    pub user: UserData,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl BookmarkData {
    /// Folder id, or the empty string when unfiled.
    pub fn folder_id(&self) -> &str {
        self.folder.as_ref().map_or("", |folder| folder.id.as_str())
    }
}

/// One bookmark per user and activity; the folder can change.
impl Identifiable for BookmarkData {
    fn id(&self) -> String {
        format!("{}:{}", self.activity.id, self.user.id)
    }
}

/// Filterable and sortable fields of [`BookmarkData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookmarkField {
    /// Bookmarked activity id
    ActivityId,
    /// Folder id (unset when unfiled)
    FolderId,
    /// Owner id
    UserId,
    /// Creation time
    CreatedAt,
    /// Last update time
    UpdatedAt,
}

impl FilterTarget<BookmarkField> for BookmarkData {
    fn field_value(&self, field: &BookmarkField) -> FieldValue {
        match field {
            BookmarkField::ActivityId => self.activity.id.clone().into(),
            BookmarkField::FolderId => self.folder.as_ref().map(|f| f.id.clone()).into(),
            BookmarkField::UserId => self.user.id.clone().into(),
            BookmarkField::CreatedAt => self.created_at.into(),
            BookmarkField::UpdatedAt => self.updated_at.into(),
        }
    }
}

/// Filterable and sortable fields of [`BookmarkFolderData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookmarkFolderField {
    /// Folder id
    FolderId,
    /// Folder name
    Name,
    /// Creation time
    CreatedAt,
    /// Last update time
    UpdatedAt,
}

impl FilterTarget<BookmarkFolderField> for BookmarkFolderData {
    fn field_value(&self, field: &BookmarkFolderField) -> FieldValue {
        match field {
            BookmarkFolderField::FolderId => self.id.clone().into(),
            BookmarkFolderField::Name => self.name.clone().into(),
            BookmarkFolderField::CreatedAt => self.created_at.into(),
            BookmarkFolderField::UpdatedAt => self.updated_at.into(),
        }
    }
}
