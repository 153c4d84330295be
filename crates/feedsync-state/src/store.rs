//! # Paginated State Store
//!
//! The ordered list plus cursor behind every list view.
//!
//! [`PaginatedStateStore`] keeps two invariants through every mutation:
//! - no two items share an id ([`Identifiable::id`])
//! - `can_load_more()` is exactly "the last known cursor has a `next` token"
//!
//! Fetch results enter through [`replace`](PaginatedStateStore::replace) and
//! [`append_page`](PaginatedStateStore::append_page); push events enter
//! through the incremental mutations (`upsert`, `remove`, `update`, ...).
//! Items are published through an [`Observable`], so every committed change
//! reaches the presentation layer and no-op mutations do not.

use feedsync_core::{Comparator, Identifiable, Observable, ObservableView, PaginationData};
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// Where [`PaginatedStateStore::upsert`] places an item it has not seen.
pub enum InsertionPolicy<T> {
    /// Prepend
    Start,
    /// Append
    End,
    /// Insert after every item that does not sort after it
    Sorted(Comparator<T>),
}

impl<T> InsertionPolicy<T> {
    /// `Sorted` when a comparator is given, otherwise `End`.
    pub fn from_comparator(comparator: Option<Comparator<T>>) -> Self {
        comparator.map_or(InsertionPolicy::End, InsertionPolicy::Sorted)
    }
}

impl<T> Clone for InsertionPolicy<T> {
    fn clone(&self) -> Self {
        match self {
            InsertionPolicy::Start => InsertionPolicy::Start,
            InsertionPolicy::End => InsertionPolicy::End,
            InsertionPolicy::Sorted(cmp) => InsertionPolicy::Sorted(cmp.clone()),
        }
    }
}

impl<T> fmt::Debug for InsertionPolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertionPolicy::Start => f.write_str("Start"),
            InsertionPolicy::End => f.write_str("End"),
            InsertionPolicy::Sorted(_) => f.write_str("Sorted"),
        }
    }
}

/// Ordered, duplicate-free list of items plus pagination cursors.
pub struct PaginatedStateStore<T> {
    items: Observable<Vec<T>>,
    pagination: RwLock<PaginationData>,
    insertion: InsertionPolicy<T>,
    // Serializes read-modify-write sequences across the two fields above.
    write_guard: Mutex<()>,
}

/// Views backed by a [`PaginatedStateStore`].
pub trait PaginatedView<T>: Send + Sync {
    /// The view's store.
    fn store(&self) -> &PaginatedStateStore<T>;
}

impl<T> PaginatedStateStore<T>
where
    T: Identifiable + Clone + Send + Sync + 'static,
{
    /// Create an empty store.
    pub fn new(insertion: InsertionPolicy<T>) -> Self {
        Self {
            items: Observable::new(Vec::new()),
            pagination: RwLock::new(PaginationData::default()),
            insertion,
            write_guard: Mutex::new(()),
        }
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Snapshot of the current items.
    pub fn items(&self) -> Vec<T> {
        self.items.get()
    }

    /// Read-only observable of the items.
    pub fn observe(&self) -> ObservableView<Vec<T>> {
        self.items.view()
    }

    /// The last known cursors.
    pub fn pagination(&self) -> PaginationData {
        self.pagination.read().clone()
    }

    /// Whether another page exists as of the last successful fetch.
    pub fn can_load_more(&self) -> bool {
        self.pagination.read().has_next()
    }

    /// The item with `id`.
    pub fn get(&self, id: &str) -> Option<T> {
        self.items
            .with(|items| items.iter().find(|item| item.id() == id).cloned())
    }

    /// Whether an item with `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.items.with(|items| items.iter().any(|item| item.id() == id))
    }

    /// Whether any item satisfies `predicate`.
    pub fn any(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.items.with(|items| items.iter().any(predicate))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.with(Vec::len)
    }

    /// Whether the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured insertion policy.
    pub fn insertion_policy(&self) -> &InsertionPolicy<T> {
        &self.insertion
    }

    // ─── Fetch results ───────────────────────────────────────

    /// Overwrite items and cursors with a fresh first page.
    ///
    /// Duplicate ids within `models` collapse onto the first position, holding
    /// the last copy.
    pub fn replace(&self, models: Vec<T>, pagination: PaginationData) {
        let _guard = self.write_guard.lock();
        let mut deduped: Vec<T> = Vec::with_capacity(models.len());
        for model in models {
            merge_into(&mut deduped, model);
        }
        *self.pagination.write() = pagination;
        self.items.set(deduped);
    }

    /// Append a following page and adopt its cursors.
    ///
    /// Items already present are replaced in place rather than appended again.
    pub fn append_page(&self, models: Vec<T>, pagination: PaginationData) {
        let _guard = self.write_guard.lock();
        *self.pagination.write() = pagination;
        if models.is_empty() {
            return;
        }
        self.items.update(|items| {
            for model in models {
                merge_into(items, model);
            }
        });
    }

    // ─── Incremental mutations ───────────────────────────────

    /// Replace the item with the same id in place, or insert it per the
    /// insertion policy. Returns `true` if the item was inserted.
    pub fn upsert(&self, item: T) -> bool {
        let _guard = self.write_guard.lock();
        self.items.update(|items| {
            let id = item.id();
            if let Some(index) = items.iter().position(|existing| existing.id() == id) {
                items[index] = item;
                return false;
            }
            match &self.insertion {
                InsertionPolicy::Start => items.insert(0, item),
                InsertionPolicy::End => items.push(item),
                InsertionPolicy::Sorted(cmp) => {
                    let index = items.partition_point(|existing| cmp(existing, &item) != Ordering::Greater);
                    items.insert(index, item);
                }
            }
            true
        })
    }

    /// Replace in place, or prepend if absent.
    pub fn insert_at_start(&self, item: T) -> bool {
        self.insert_at(item, true)
    }

    /// Replace in place, or append if absent.
    pub fn insert_at_end(&self, item: T) -> bool {
        self.insert_at(item, false)
    }

    fn insert_at(&self, item: T, start: bool) -> bool {
        let _guard = self.write_guard.lock();
        self.items.update(|items| {
            let id = item.id();
            if let Some(index) = items.iter().position(|existing| existing.id() == id) {
                items[index] = item;
                return false;
            }
            if start {
                items.insert(0, item);
            } else {
                items.push(item);
            }
            true
        })
    }

    /// Remove the item with `id`. Absent ids are ignored.
    pub fn remove(&self, id: &str) -> bool {
        let _guard = self.write_guard.lock();
        self.items.modify(|items| {
            let before = items.len();
            items.retain(|item| item.id() != id);
            items.len() != before
        })
    }

    /// Edit the item with `id` in place. Returns `false` if absent.
    pub fn update(&self, id: &str, f: impl FnOnce(&mut T)) -> bool {
        let _guard = self.write_guard.lock();
        self.items.modify(|items| match items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        })
    }

    /// Edit every item; `f` reports whether it changed the item.
    pub fn update_all(&self, mut f: impl FnMut(&mut T) -> bool) -> bool {
        let _guard = self.write_guard.lock();
        self.items.modify(|items| {
            let mut changed = false;
            for item in items.iter_mut() {
                changed |= f(item);
            }
            changed
        })
    }

    /// Keep only items satisfying `keep`.
    pub fn retain(&self, keep: impl Fn(&T) -> bool) -> bool {
        let _guard = self.write_guard.lock();
        self.items.modify(|items| {
            let before = items.len();
            items.retain(|item| keep(item));
            items.len() != before
        })
    }

    /// Stable-sort by the store's comparator. No-op without one.
    pub fn reorder(&self) -> bool {
        let InsertionPolicy::Sorted(cmp) = &self.insertion else {
            return false;
        };
        let _guard = self.write_guard.lock();
        self.items.modify(|items| {
            let sorted = items.windows(2).all(|pair| cmp(&pair[0], &pair[1]) != Ordering::Greater);
            if !sorted {
                items.sort_by(|a, b| cmp(a, b));
            }
            !sorted
        })
    }

    /// Drop all items and cursors.
    pub fn clear(&self) {
        let _guard = self.write_guard.lock();
        *self.pagination.write() = PaginationData::default();
        self.items.modify(|items| {
            let changed = !items.is_empty();
            items.clear();
            changed
        });
    }
}

/// Replace a same-id item in place, or push.
fn merge_into<T: Identifiable>(items: &mut Vec<T>, model: T) {
    let id = model.id();
    match items.iter().position(|existing| existing.id() == id) {
        Some(index) => items[index] = model,
        None => items.push(model),
    }
}

/// Whether `items` holds no duplicate ids.
pub fn has_unique_ids<T: Identifiable>(items: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().all(|item| seen.insert(item.id()))
}

impl<T> fmt::Debug for PaginatedStateStore<T>
where
    T: Identifiable + Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedStateStore")
            .field("items", &self.items())
            .field("pagination", &self.pagination())
            .field("insertion", &self.insertion)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        rank: i32,
    }

    impl Identifiable for Item {
        fn id(&self) -> String {
            self.id.to_string()
        }
    }

    fn item(id: &'static str, rank: i32) -> Item {
        Item { id, rank }
    }

    fn ids(store: &PaginatedStateStore<Item>) -> Vec<&'static str> {
        store.items().iter().map(|i| i.id).collect()
    }

    fn by_rank() -> InsertionPolicy<Item> {
        InsertionPolicy::Sorted(Arc::new(|a: &Item, b: &Item| a.rank.cmp(&b.rank)))
    }

    #[test]
    fn replace_overwrites_items_and_cursor() {
        let store = PaginatedStateStore::new(InsertionPolicy::End);
        store.replace(vec![item("x", 0)], PaginationData::with_next("n1"));
        store.replace(vec![item("a", 0), item("b", 0), item("a", 5)], PaginationData::default());

        assert_eq!(ids(&store), vec!["a", "b"]);
        assert_eq!(store.get("a").map(|i| i.rank), Some(5));
        assert!(!store.can_load_more());
    }

    #[test]
    fn append_page_dedups_overlap() {
        let store = PaginatedStateStore::new(InsertionPolicy::End);
        store.replace(vec![item("a", 1), item("b", 1)], PaginationData::with_next("n1"));
        store.append_page(vec![item("b", 2), item("c", 2)], PaginationData::with_next("n2"));

        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert_eq!(store.get("b").map(|i| i.rank), Some(2));
        assert_eq!(store.pagination().next.as_deref(), Some("n2"));
    }

    #[test]
    fn upsert_replaces_in_place_or_inserts_per_policy() {
        let start = PaginatedStateStore::new(InsertionPolicy::Start);
        start.replace(vec![item("a", 0), item("b", 0)], PaginationData::default());
        assert!(start.upsert(item("c", 0)));
        assert!(!start.upsert(item("b", 9)));
        assert_eq!(ids(&start), vec!["c", "a", "b"]);

        let sorted = PaginatedStateStore::new(by_rank());
        sorted.replace(vec![item("a", 1), item("c", 3)], PaginationData::default());
        assert!(sorted.upsert(item("b", 2)));
        assert!(sorted.upsert(item("d", 3)));
        assert_eq!(ids(&sorted), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn remove_absent_is_silent_and_does_not_notify() {
        let store = PaginatedStateStore::new(InsertionPolicy::End);
        store.replace(vec![item("a", 0)], PaginationData::with_next("n"));
        let version = store.observe().version();

        assert!(!store.remove("zzz"));
        assert_eq!(store.observe().version(), version);
        assert!(store.remove("a"));
        assert!(store.is_empty());
        assert!(store.can_load_more());
    }

    #[test]
    fn reorder_sorts_stably_by_comparator() {
        let store = PaginatedStateStore::new(by_rank());
        store.replace(
            vec![item("c", 3), item("a", 1), item("b", 1)],
            PaginationData::default(),
        );
        assert!(store.reorder());
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert!(!store.reorder());
    }

    #[test]
    fn update_and_retain() {
        let store = PaginatedStateStore::new(InsertionPolicy::End);
        store.replace(vec![item("a", 1), item("b", 2)], PaginationData::default());

        assert!(store.update("a", |i| i.rank = 10));
        assert!(!store.update("zzz", |i| i.rank = 10));
        assert!(store.retain(|i| i.rank > 5));
        assert_eq!(ids(&store), vec!["a"]);

        store.clear();
        assert!(store.is_empty());
    }
}
