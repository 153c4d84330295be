use serde::{Deserialize, Serialize};

/// A user as embedded in other entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserData {
    /// User id
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Avatar URL
    pub image: Option<String>,
}

impl UserData {
    /// A user with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            image: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl super::Identifiable for UserData {
    fn id(&self) -> String {
        self.id.clone()
    }
}
