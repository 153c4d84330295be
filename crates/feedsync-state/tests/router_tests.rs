//! Scope checks and filter membership for every view router

#![allow(clippy::unwrap_used)]

mod common;

use common::RecordingCommentList;
use feedsync_core::models::{
    ActivityField, BookmarkField, BookmarkFolderData, BookmarkFolderField, CommentField, FeedCapabilities,
    FeedField, FeedOwnCapability, FollowField, FollowStatus, MemberField,
};
use feedsync_core::{EventBus, FeedId, Filter, ListQuery, PaginationData, StateEvent};
use feedsync_state::{
    route_activity_event, ActivityListState, ActivityScope, ActivityState, BookmarkFolderListState,
    BookmarkListState, CommentReplyListEventHandler, CommentReplyListState, FeedListState, FollowListState,
    MemberListState, ReactionListState, ReactionScope,
};
use feedsync_testkit::{
    init_test_tracing, test_time, ActivityBuilder, BookmarkBuilder, CommentBuilder, FeedBuilder, FollowBuilder,
    MemberBuilder, ReactionBuilder,
};
use std::collections::HashMap;
use std::sync::Arc;

fn bus() -> EventBus<StateEvent> {
    init_test_tracing();
    EventBus::new()
}

fn alice() -> FeedId {
    FeedId::new("user", "alice")
}

fn bob() -> FeedId {
    FeedId::new("user", "bob")
}

fn ids<T: feedsync_core::Identifiable>(items: &[T]) -> Vec<String> {
    items.iter().map(|item| item.id()).collect()
}

fn caps(list: &[FeedOwnCapability]) -> FeedCapabilities {
    list.iter().cloned().collect()
}

// ============================================================================
// Single activity
// ============================================================================

#[test]
fn activity_ignores_updates_seen_through_other_feeds() {
    let bus = bus();
    let state = Arc::new(ActivityState::new(alice(), "a1", "alice"));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.set_activity(ActivityBuilder::new("a1").text("first").build());

    let edited = ActivityBuilder::new("a1").text("edited").build();
    bus.publish(&StateEvent::ActivityUpdated { fid: bob(), activity: edited.clone() });
    bus.publish(&StateEvent::ActivityDeleted { fid: bob(), activity_id: "a1".into() });
    bus.publish(&StateEvent::CommentAdded { fid: alice(), comment: CommentBuilder::new("c1", "a2").build() });

    let current = state.activity().get().unwrap();
    assert_eq!(current.text.as_deref(), Some("first"));
    assert_eq!(current.comment_count, 0);
    assert!(!state.deleted().get());

    bus.publish(&StateEvent::ActivityUpdated { fid: alice(), activity: edited });
    assert_eq!(state.activity().get().unwrap().text.as_deref(), Some("edited"));
}

#[test]
fn activity_deleted_through_own_feed_is_flagged() {
    let bus = bus();
    let state = Arc::new(ActivityState::new(alice(), "a1", "alice"));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.set_activity(ActivityBuilder::new("a1").build());

    bus.publish(&StateEvent::ActivityDeleted { fid: alice(), activity_id: "a2".into() });
    assert!(!state.deleted().get());

    bus.publish(&StateEvent::ActivityDeleted { fid: alice(), activity_id: "a1".into() });
    assert!(state.deleted().get());
    assert!(state.activity().get().is_none());
}

// ============================================================================
// Activity collections
// ============================================================================

#[test]
fn loaded_activity_that_stops_matching_is_removed() {
    let query = ListQuery::new().with_filter(Filter::equal(ActivityField::ActivityType, "post"));
    let state = ActivityListState::new(ActivityScope::new(query, "alice").with_fid(alice()));
    state.apply_page(
        vec![ActivityBuilder::new("a1").build(), ActivityBuilder::new("a2").build()],
        PaginationData::default(),
        true,
    );
    let scope = state.scope().clone();

    let story = ActivityBuilder::new("a1").activity_type("story").build();
    let elsewhere = StateEvent::ActivityUpdated { fid: bob(), activity: story.clone() };
    assert!(!route_activity_event(&elsewhere, &scope, &state));
    assert_eq!(ids(&state.activities().get()), vec!["a1", "a2"]);

    let unloaded = StateEvent::ActivityUpdated { fid: alice(), activity: ActivityBuilder::new("a9").build() };
    assert!(!route_activity_event(&unloaded, &scope, &state));

    let moved = StateEvent::ActivityUpdated { fid: alice(), activity: story };
    assert!(route_activity_event(&moved, &scope, &state));
    assert_eq!(ids(&state.activities().get()), vec!["a2"]);
}

#[test]
fn unchanged_capabilities_leave_activities_untouched() {
    let own = caps(&[FeedOwnCapability::ReadFeed]);
    let feed = FeedBuilder::new("user:alice").capabilities(own.clone()).build();
    let state = ActivityListState::new(ActivityScope::new(ListQuery::new(), "alice"));
    state.apply_page(
        vec![ActivityBuilder::new("a1").current_feed(feed).build()],
        PaginationData::default(),
        true,
    );
    let scope = state.scope().clone();
    let version = state.activities().version();

    let same = StateEvent::FeedCapabilitiesUpdated { capabilities: Arc::new(HashMap::from([(alice(), own)])) };
    assert!(!route_activity_event(&same, &scope, &state));
    assert_eq!(state.activities().version(), version);

    let wider = caps(&[FeedOwnCapability::ReadFeed, FeedOwnCapability::AddActivity]);
    let changed = StateEvent::FeedCapabilitiesUpdated {
        capabilities: Arc::new(HashMap::from([(alice(), wider.clone())])),
    };
    assert!(route_activity_event(&changed, &scope, &state));
    assert_ne!(state.activities().version(), version);
    let activities = state.activities().get();
    assert_eq!(activities[0].current_feed.as_ref().unwrap().own_capabilities, Some(wider));
}

// ============================================================================
// Reactions
// ============================================================================

#[test]
fn reactions_on_other_objects_are_ignored() {
    let bus = bus();
    let state = Arc::new(ReactionListState::new(ReactionScope::Activity("a1".into()), ListQuery::new()));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));

    let other = ActivityBuilder::new("a2").build();
    bus.publish(&StateEvent::ActivityReactionAdded {
        fid: alice(),
        activity: other,
        reaction: ReactionBuilder::new("a2").build(),
    });
    // Same id, but a comment rather than an activity.
    bus.publish(&StateEvent::CommentReactionAdded {
        fid: alice(),
        comment: CommentBuilder::new("a1", "a9").build(),
        reaction: ReactionBuilder::new("a1").on_comment().build(),
    });

    assert!(state.reactions().get().is_empty());
}

#[test]
fn reactions_follow_add_and_delete_on_the_scoped_activity() {
    let bus = bus();
    let state = Arc::new(ReactionListState::new(ReactionScope::Activity("a1".into()), ListQuery::new()));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    let activity = ActivityBuilder::new("a1").build();
    let like = ReactionBuilder::new("a1").user("bob").build();
    let heart = ReactionBuilder::new("a1").reaction_type("heart").user("carol").build();

    bus.publish(&StateEvent::ActivityReactionAdded { fid: alice(), activity: activity.clone(), reaction: like.clone() });
    bus.publish(&StateEvent::ActivityReactionAdded { fid: alice(), activity: activity.clone(), reaction: heart });
    bus.publish(&StateEvent::ActivityReactionDeleted { fid: alice(), activity, reaction: like });

    assert_eq!(ids(&state.reactions().get()), vec!["a1:heart:carol"]);
}

// ============================================================================
// Follows
// ============================================================================

#[test]
fn follow_leaves_the_list_when_its_status_stops_matching() {
    let bus = bus();
    let query = ListQuery::new().with_filter(Filter::equal(FollowField::Status, "accepted"));
    let state = Arc::new(FollowListState::new(query));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(
        vec![FollowBuilder::new("user:alice", "user:bob").build()],
        PaginationData::default(),
        true,
    );

    let pending = FollowBuilder::new("user:alice", "user:carol").status(FollowStatus::Pending).build();
    bus.publish(&StateEvent::FollowAdded { follow: pending.clone() });
    bus.publish(&StateEvent::FollowUpdated { follow: pending });
    assert_eq!(ids(&state.follows().get()), vec!["user:alice:user:bob"]);

    let rejected = FollowBuilder::new("user:alice", "user:bob").status(FollowStatus::Rejected).build();
    bus.publish(&StateEvent::FollowUpdated { follow: rejected });
    assert!(state.follows().get().is_empty());
}

#[test]
fn deleting_an_unloaded_follow_changes_nothing() {
    let bus = bus();
    let state = Arc::new(FollowListState::new(ListQuery::new()));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(
        vec![FollowBuilder::new("user:alice", "user:bob").build()],
        PaginationData::default(),
        true,
    );
    let version = state.follows().version();

    bus.publish(&StateEvent::FollowDeleted { follow: FollowBuilder::new("user:bob", "user:alice").build() });

    assert_eq!(state.follows().version(), version);
    assert_eq!(state.follows().get().len(), 1);
}

// ============================================================================
// Members
// ============================================================================

#[test]
fn members_of_other_feeds_are_ignored() {
    let bus = bus();
    let state = Arc::new(MemberListState::new(alice(), ListQuery::new()));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(vec![MemberBuilder::new("bob").build()], PaginationData::default(), true);

    bus.publish(&StateEvent::FeedMemberAdded { fid: bob(), member: MemberBuilder::new("carol").build() });
    bus.publish(&StateEvent::FeedMemberRemoved { fid: bob(), user_id: "bob".into() });
    assert_eq!(ids(&state.members().get()), vec!["bob"]);

    bus.publish(&StateEvent::FeedMemberAdded { fid: alice(), member: MemberBuilder::new("carol").build() });
    assert_eq!(state.members().get().len(), 2);
}

#[test]
fn demoted_member_leaves_a_moderator_list() {
    let bus = bus();
    let query = ListQuery::new().with_filter(Filter::equal(MemberField::Role, "moderator"));
    let state = Arc::new(MemberListState::new(alice(), query));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(
        vec![MemberBuilder::new("bob").role("moderator").build()],
        PaginationData::default(),
        true,
    );

    bus.publish(&StateEvent::FeedMemberUpdated { fid: alice(), member: MemberBuilder::new("bob").build() });

    assert!(state.members().get().is_empty());
}

// ============================================================================
// Feeds
// ============================================================================

#[test]
fn renamed_feed_leaves_a_name_filtered_list() {
    let bus = bus();
    let query = ListQuery::new().with_filter(Filter::equal(FeedField::Name, "Bob"));
    let state = Arc::new(FeedListState::new(query));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(vec![FeedBuilder::new("user:bob").name("Bob").build()], PaginationData::default(), true);

    bus.publish(&StateEvent::FeedAdded { feed: FeedBuilder::new("user:carol").name("Carol").build() });
    bus.publish(&StateEvent::FeedDeleted { fid: FeedId::new("user", "carol") });
    assert_eq!(ids(&state.feeds().get()), vec!["user:bob"]);

    bus.publish(&StateEvent::FeedUpdated { feed: FeedBuilder::new("user:bob").name("Robert").build() });
    assert!(state.feeds().get().is_empty());
}

#[test]
fn unchanged_capabilities_do_not_touch_the_feed_list() {
    let bus = bus();
    let own = caps(&[FeedOwnCapability::ReadFeed]);
    let state = Arc::new(FeedListState::new(ListQuery::new()));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(
        vec![FeedBuilder::new("user:bob").capabilities(own.clone()).build()],
        PaginationData::default(),
        true,
    );
    let version = state.feeds().version();

    bus.publish(&StateEvent::FeedCapabilitiesUpdated { capabilities: Arc::new(HashMap::from([(bob(), own)])) });
    assert_eq!(state.feeds().version(), version);

    let wider = caps(&[FeedOwnCapability::ReadFeed, FeedOwnCapability::AddActivity]);
    bus.publish(&StateEvent::FeedCapabilitiesUpdated {
        capabilities: Arc::new(HashMap::from([(bob(), wider.clone())])),
    });
    assert_ne!(state.feeds().version(), version);
    assert_eq!(state.feeds().get()[0].own_capabilities, Some(wider));
}

// ============================================================================
// Bookmarks
// ============================================================================

#[test]
fn bookmark_moved_to_another_folder_replaces_the_entry() {
    let bus = bus();
    let state = Arc::new(BookmarkListState::new(ListQuery::new()));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    let activity = ActivityBuilder::new("a1").build();
    state.apply_page(
        vec![BookmarkBuilder::new(activity.clone()).folder("f1", "Reading").build()],
        PaginationData::default(),
        true,
    );

    let moved = BookmarkBuilder::new(activity).folder("f2", "Later").build();
    bus.publish(&StateEvent::BookmarkUpdated { bookmark: moved });

    let bookmarks = state.bookmarks().get();
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].folder_id(), "f2");
}

#[test]
fn bookmark_leaves_a_folder_filtered_list_when_moved_out() {
    let bus = bus();
    let query = ListQuery::new().with_filter(Filter::equal(BookmarkField::FolderId, "f1"));
    let state = Arc::new(BookmarkListState::new(query));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    let activity = ActivityBuilder::new("a1").build();
    state.apply_page(
        vec![BookmarkBuilder::new(activity.clone()).folder("f1", "Reading").build()],
        PaginationData::default(),
        true,
    );

    let foreign = BookmarkBuilder::new(ActivityBuilder::new("a2").build()).folder("f2", "Later").build();
    bus.publish(&StateEvent::BookmarkAdded { bookmark: foreign.clone() });
    bus.publish(&StateEvent::BookmarkDeleted { bookmark: foreign });
    assert_eq!(state.bookmarks().get().len(), 1);

    let moved = BookmarkBuilder::new(activity).folder("f2", "Later").build();
    bus.publish(&StateEvent::BookmarkUpdated { bookmark: moved });
    assert!(state.bookmarks().get().is_empty());
}

#[test]
fn renamed_folder_leaves_a_name_filtered_folder_list() {
    let bus = bus();
    let query = ListQuery::new().with_filter(Filter::equal(BookmarkFolderField::Name, "Reading"));
    let state = Arc::new(BookmarkFolderListState::new(query));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    let folder = |id: &str, name: &str| BookmarkFolderData {
        id: id.into(),
        name: name.into(),
        created_at: test_time(0),
        updated_at: test_time(0),
    };
    state.apply_page(vec![folder("f1", "Reading")], PaginationData::default(), true);

    bus.publish(&StateEvent::BookmarkFolderDeleted { folder_id: "f9".into() });
    let filed = BookmarkBuilder::new(ActivityBuilder::new("a1").build()).folder("f2", "Later").build();
    bus.publish(&StateEvent::BookmarkAdded { bookmark: filed });
    assert_eq!(ids(&state.folders().get()), vec!["f1"]);

    bus.publish(&StateEvent::BookmarkFolderUpdated { folder: folder("f1", "Archive") });
    assert!(state.folders().get().is_empty());
}

#[test]
fn bookmark_filed_into_an_unseen_folder_adds_it() {
    let bus = bus();
    let state = Arc::new(BookmarkFolderListState::new(ListQuery::new()));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));

    let filed = BookmarkBuilder::new(ActivityBuilder::new("a1").build()).folder("f1", "Reading").build();
    bus.publish(&StateEvent::BookmarkAdded { bookmark: filed });
    let unfiled = BookmarkBuilder::new(ActivityBuilder::new("a2").build()).build();
    bus.publish(&StateEvent::BookmarkAdded { bookmark: unfiled });

    assert_eq!(ids(&state.folders().get()), vec!["f1"]);
}

// ============================================================================
// Comment replies
// ============================================================================

fn replies_by(user: &str) -> ListQuery<CommentField> {
    ListQuery::new().with_filter(Filter::and([
        Filter::equal(CommentField::ParentId, "c1"),
        Filter::equal(CommentField::UserId, user),
    ]))
}

#[test]
fn replies_to_other_parents_or_objects_are_ignored() {
    let bus = bus();
    let list = Arc::new(RecordingCommentList::default());
    let handler = CommentReplyListEventHandler::new("a1", "c1", replies_by("bob"), list.clone());
    let _sub = bus.subscribe(Arc::new(handler));

    let sibling = CommentBuilder::new("r1", "a1").parent("c2").user("bob").build();
    let elsewhere = CommentBuilder::new("r2", "a2").parent("c1").user("bob").build();
    let filtered_out = CommentBuilder::new("r3", "a1").parent("c1").user("carol").build();
    for comment in [sibling, elsewhere, filtered_out] {
        bus.publish(&StateEvent::CommentAdded { fid: alice(), comment: comment.clone() });
        bus.publish(&StateEvent::CommentUpdated { fid: alice(), comment });
    }

    assert!(list.calls().is_empty());
}

#[test]
fn loaded_reply_that_stops_matching_is_removed() {
    let bus = bus();
    let list = Arc::new(RecordingCommentList::with_loaded(&["r1"]));
    let handler = CommentReplyListEventHandler::new("a1", "c1", replies_by("bob"), list.clone());
    let _sub = bus.subscribe(Arc::new(handler));

    let reassigned = CommentBuilder::new("r1", "a1").parent("c1").user("carol").build();
    bus.publish(&StateEvent::CommentUpdated { fid: alice(), comment: reassigned });

    assert_eq!(list.calls(), vec!["remove r1"]);
}

#[test]
fn nested_replies_attach_under_loaded_replies() {
    let bus = bus();
    let list = Arc::new(RecordingCommentList::default());
    let handler = CommentReplyListEventHandler::new("a1", "c1", replies_by("bob"), list.clone());
    let _sub = bus.subscribe(Arc::new(handler));

    let direct = CommentBuilder::new("r1", "a1").parent("c1").user("bob").build();
    let nested = CommentBuilder::new("r2", "a1").parent("r1").user("carol").build();
    bus.publish(&StateEvent::CommentAdded { fid: alice(), comment: direct });
    bus.publish(&StateEvent::CommentAdded { fid: alice(), comment: nested.clone() });
    bus.publish(&StateEvent::CommentUpdated { fid: alice(), comment: nested });

    assert_eq!(list.calls(), vec!["upsert r1", "reply r2", "reply-update r2"]);
}

#[test]
fn real_reply_list_drops_a_reply_that_stops_matching() {
    let bus = bus();
    let query = ListQuery::new().with_filter(Filter::equal(CommentField::UserId, "bob"));
    let state = Arc::new(CommentReplyListState::new("a1", "c1", query, "alice"));
    let _sub = bus.subscribe(Arc::new(state.event_handler()));
    state.apply_page(
        vec![
            CommentBuilder::new("r1", "a1").parent("c1").user("bob").build(),
            CommentBuilder::new("r2", "a1").parent("c1").user("bob").build(),
        ],
        PaginationData::default(),
        true,
    );

    let reassigned = CommentBuilder::new("r1", "a1").parent("c1").user("carol").build();
    bus.publish(&StateEvent::CommentUpdated { fid: alice(), comment: reassigned });

    assert_eq!(ids(&state.replies().get()), vec!["r2"]);
}
