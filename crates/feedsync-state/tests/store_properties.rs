//! Property tests for PaginatedStateStore

use feedsync_core::{Identifiable, PaginationData};
use feedsync_state::store::has_unique_ids;
use feedsync_state::{InsertionPolicy, PaginatedStateStore};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: u8,
    rank: i32,
}

impl Identifiable for Item {
    fn id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone)]
enum Op {
    Replace(Vec<Item>),
    Append(Vec<Item>),
    Upsert(Item),
    Start(Item),
    End(Item),
    Remove(u8),
    Bump(u8),
}

fn item() -> impl Strategy<Value = Item> {
    (0u8..12, -50i32..50).prop_map(|(id, rank)| Item { id, rank })
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop::collection::vec(item(), 0..8).prop_map(Op::Replace),
        prop::collection::vec(item(), 0..8).prop_map(Op::Append),
        item().prop_map(Op::Upsert),
        item().prop_map(Op::Start),
        item().prop_map(Op::End),
        (0u8..12).prop_map(Op::Remove),
        (0u8..12).prop_map(Op::Bump),
    ]
}

fn policy() -> impl Strategy<Value = InsertionPolicy<Item>> {
    prop_oneof![
        Just(InsertionPolicy::Start),
        Just(InsertionPolicy::End),
        Just(InsertionPolicy::Sorted(Arc::new(|a: &Item, b: &Item| a.rank.cmp(&b.rank)))),
    ]
}

fn apply(store: &PaginatedStateStore<Item>, op: Op) {
    match op {
        Op::Replace(items) => store.replace(items, PaginationData::default()),
        Op::Append(items) => store.append_page(items, PaginationData::with_next("next")),
        Op::Upsert(item) => {
            store.upsert(item);
        }
        Op::Start(item) => {
            store.insert_at_start(item);
        }
        Op::End(item) => {
            store.insert_at_end(item);
        }
        Op::Remove(id) => {
            store.remove(&id.to_string());
        }
        Op::Bump(id) => {
            store.update(&id.to_string(), |item| item.rank += 1);
        }
    }
}

proptest! {
    #[test]
    fn ids_stay_unique_under_any_mutation_sequence(
        policy in policy(),
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let store = PaginatedStateStore::new(policy);
        for op in ops {
            apply(&store, op);
            prop_assert!(has_unique_ids(&store.items()));
        }
    }

    #[test]
    fn appended_page_keeps_first_positions(
        first in prop::collection::vec(item(), 0..10),
        second in prop::collection::vec(item(), 0..10),
    ) {
        let store = PaginatedStateStore::new(InsertionPolicy::End);
        store.replace(first, PaginationData::with_next("p2"));
        let before: Vec<String> = store.items().iter().map(Identifiable::id).collect();
        store.append_page(second.clone(), PaginationData::default());
        let after: Vec<String> = store.items().iter().map(Identifiable::id).collect();

        prop_assert_eq!(&after[..before.len()], &before[..]);
        prop_assert!(has_unique_ids(&store.items()));
        prop_assert!(!store.can_load_more());
        for model in &second {
            prop_assert!(store.contains(&model.id()));
        }
    }
}

#[test]
fn duplicates_within_a_first_page_collapse() {
    let store = PaginatedStateStore::new(InsertionPolicy::End);
    store.replace(
        vec![Item { id: 1, rank: 0 }, Item { id: 2, rank: 0 }, Item { id: 1, rank: 9 }],
        PaginationData::default(),
    );

    assert_eq!(store.items(), vec![Item { id: 1, rank: 9 }, Item { id: 2, rank: 0 }]);
}
