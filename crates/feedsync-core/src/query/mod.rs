//! # List Queries
//!
//! Views are configured once with an immutable [`ListQuery<F>`]: an optional
//! [`Filter<F>`], a list of [`Sort<F>`] keys and a page size. The same query
//! is sent to the remote service when paging and evaluated locally when push
//! events arrive, so a view's contents keep matching what the server would
//! return for it.

mod filter;
mod sort;

pub use filter::{FieldValue, Filter, FilterTarget};
pub use sort::{compare_by, Sort, SortDirection, SortTarget};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// Shared comparator used to keep sorted views ordered.
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Immutable query configuration of a list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery<F> {
    /// Items must match this filter (`None` matches everything)
    pub filter: Option<Filter<F>>,
    /// Sort keys, most significant first
    pub sort: Vec<Sort<F>>,
    /// Page size requested from the service
    pub limit: Option<u32>,
}

impl<F> Default for ListQuery<F> {
    fn default() -> Self {
        Self {
            filter: None,
            sort: Vec::new(),
            limit: None,
        }
    }
}

impl<F> ListQuery<F> {
    /// An unfiltered, unsorted query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter
    pub fn with_filter(mut self, filter: Filter<F>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Append a sort key
    pub fn with_sort(mut self, sort: Sort<F>) -> Self {
        self.sort.push(sort);
        self
    }

    /// Set the page size
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `item` belongs in a view configured with this query.
    pub fn matches<T: FilterTarget<F>>(&self, item: &T) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter.matches(item))
    }
}

impl<F: Clone + Send + Sync + 'static> ListQuery<F> {
    /// Comparator over the sort keys, if any were given.
    pub fn comparator<T: SortTarget<F> + 'static>(&self) -> Option<Comparator<T>> {
        if self.sort.is_empty() {
            return None;
        }
        let sorts = self.sort.clone();
        Some(Arc::new(move |a: &T, b: &T| compare_by(&sorts, a, b)))
    }
}
