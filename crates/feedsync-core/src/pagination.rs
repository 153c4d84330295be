//! Cursor pagination

use serde::{Deserialize, Serialize};

/// Opaque cursors around the currently loaded window.
///
/// `next == None` means the server reported no further pages as of the last
/// successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaginationData {
    /// Cursor for the following page
    pub next: Option<String>,
    /// Cursor for the preceding page
    pub previous: Option<String>,
}

impl PaginationData {
    /// Cursors with only a `next` value.
    pub fn with_next(next: impl Into<String>) -> Self {
        Self {
            next: Some(next.into()),
            previous: None,
        }
    }

    /// Whether another page can be requested.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationResult<T> {
    /// Items in server order
    pub models: Vec<T>,
    /// Cursors after this page
    pub pagination: PaginationData,
}

impl<T> PaginationResult<T> {
    /// A page with the given items and cursors.
    pub fn new(models: Vec<T>, pagination: PaginationData) -> Self {
        Self { models, pagination }
    }

    /// A final page.
    pub fn last(models: Vec<T>) -> Self {
        Self::new(models, PaginationData::default())
    }
}
