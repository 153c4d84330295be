//! Event routing through the bus into view states

mod common;

use common::RecordingCommentList;
use feedsync_core::models::CommentField;
use feedsync_core::{EventBus, FeedId, Filter, ListQuery, PaginationData, StateEvent};
use feedsync_state::{ActivityListState, ActivityScope, CommentListEventHandler, CommentListState};
use feedsync_testkit::{init_test_tracing, ActivityBuilder, CommentBuilder};
use std::sync::Arc;

fn bus() -> EventBus<StateEvent> {
    init_test_tracing();
    EventBus::new()
}

fn fid() -> FeedId {
    FeedId::new("user", "alice")
}

fn ids<T: feedsync_core::Identifiable>(items: &[T]) -> Vec<String> {
    items.iter().map(|item| item.id()).collect()
}

fn comments_on(object_id: &str) -> ListQuery<CommentField> {
    ListQuery::new().with_filter(Filter::equal(CommentField::ObjectId, object_id))
}

#[test]
fn comments_on_other_objects_never_reach_the_list() {
    let bus = bus();
    let list = Arc::new(RecordingCommentList::default());
    let _sub = bus.subscribe(Arc::new(CommentListEventHandler::new(comments_on("activity-123"), list.clone())));

    let foreign = CommentBuilder::new("c1", "other").build();
    bus.publish(&StateEvent::CommentAdded { fid: fid(), comment: foreign.clone() });
    bus.publish(&StateEvent::CommentUpdated { fid: fid(), comment: foreign.clone() });
    bus.publish(&StateEvent::CommentDeleted { fid: fid(), comment: foreign });

    assert!(list.calls().is_empty());
}

#[test]
fn matching_comment_and_reply_are_applied() {
    let bus = bus();
    let list = Arc::new(RecordingCommentList::default());
    let _sub = bus.subscribe(Arc::new(CommentListEventHandler::new(comments_on("activity-123"), list.clone())));

    let top = CommentBuilder::new("c1", "activity-123").build();
    let reply = CommentBuilder::new("c2", "activity-123").parent("c1").build();
    let orphan = CommentBuilder::new("c3", "activity-123").parent("missing").build();
    bus.publish(&StateEvent::CommentAdded { fid: fid(), comment: top });
    bus.publish(&StateEvent::CommentAdded { fid: fid(), comment: reply });
    bus.publish(&StateEvent::CommentAdded { fid: fid(), comment: orphan });

    assert_eq!(list.calls(), vec!["upsert c1", "reply c2"]);
}

#[test]
fn loaded_comment_that_stops_matching_is_removed() {
    let bus = bus();
    let list = Arc::new(RecordingCommentList::with_loaded(&["c1"]));
    let _sub = bus.subscribe(Arc::new(CommentListEventHandler::new(comments_on("activity-123"), list.clone())));

    let moved = CommentBuilder::new("c1", "other").build();
    bus.publish(&StateEvent::CommentUpdated { fid: fid(), comment: moved });

    assert_eq!(list.calls(), vec!["remove c1"]);
}

#[test]
fn replies_nest_under_loaded_parents_in_a_real_list() {
    let bus = bus();
    let state = Arc::new(CommentListState::new(comments_on("activity-123"), "alice"));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(
        vec![CommentBuilder::new("c1", "activity-123").build()],
        PaginationData::default(),
        true,
    );

    let reply = CommentBuilder::new("c2", "activity-123").parent("c1").build();
    bus.publish(&StateEvent::CommentAdded { fid: fid(), comment: reply });

    let comments = state.comments().get();
    assert_eq!(ids(&comments), vec!["c1"]);
    assert!(comments[0].contains("c2"));
}

#[test]
fn deleted_activity_leaves_cursors_untouched() {
    let bus = bus();
    let state = Arc::new(ActivityListState::new(ActivityScope::new(ListQuery::new(), "alice")));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(
        vec![
            ActivityBuilder::new("a").build(),
            ActivityBuilder::new("b").build(),
            ActivityBuilder::new("c").build(),
        ],
        PaginationData::with_next("cursor-2"),
        true,
    );

    let delivered = bus.publish(&StateEvent::ActivityDeleted { fid: fid(), activity_id: "b".into() });

    assert_eq!(delivered, 1);
    assert_eq!(ids(&state.activities().get()), vec!["a", "c"]);
    assert!(state.can_load_more());
}

#[test]
fn only_own_new_activities_are_prepended() {
    let bus = bus();
    let state = Arc::new(ActivityListState::new(ActivityScope::new(ListQuery::new(), "alice")));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(vec![ActivityBuilder::new("a").user("bob").build()], PaginationData::default(), true);

    let theirs = ActivityBuilder::new("b").user("bob").build();
    let mine = ActivityBuilder::new("c").user("alice").build();
    bus.publish(&StateEvent::ActivityAdded { fid: fid(), activity: theirs });
    bus.publish(&StateEvent::ActivityAdded { fid: fid(), activity: mine });

    assert_eq!(ids(&state.activities().get()), vec!["c", "a"]);
}
