//! Entity models
//!
//! Plain data mirrored from the remote service. Every model that can sit in a
//! list view implements [`Identifiable`]; list views use that id to keep
//! their contents duplicate-free and to route push events to the right item.
//! Each model also exposes a field enum for [`crate::query::Filter`] and
//! [`crate::query::Sort`].

mod activity;
mod bookmark;
mod comment;
mod feed;
mod follow;
mod member;
mod poll;
mod reaction;
mod user;

pub use activity::{ActivityData, ActivityField};
pub use bookmark::{BookmarkData, BookmarkField, BookmarkFolderData, BookmarkFolderField};
pub use comment::{find_in_tree_mut, CommentData, CommentField};
pub use feed::{FeedCapabilities, FeedData, FeedField, FeedOwnCapability, FeedOwnValues};
pub use follow::{FollowData, FollowField, FollowStatus};
pub use member::{FeedMemberData, MemberField, MemberStatus};
pub use poll::{PollData, PollOptionData, PollVoteData};
pub use reaction::{ObjectType, ReactionData, ReactionField};
pub use user::UserData;

/// Models with a stable identity inside a list.
pub trait Identifiable {
    /// The id used for deduplication and event routing.
    fn id(&self) -> String;
}

/// Replace the item with the same id, or push it. Returns `true` if it was new.
pub fn upsert_by_id<T: Identifiable>(items: &mut Vec<T>, item: T) -> bool {
    let id = item.id();
    match items.iter().position(|existing| existing.id() == id) {
        Some(index) => {
            items[index] = item;
            false
        }
        None => {
            items.push(item);
            true
        }
    }
}

/// Remove the item with `id`. Returns `true` if something was removed.
pub fn remove_by_id<T: Identifiable>(items: &mut Vec<T>, id: &str) -> bool {
    let before = items.len();
    items.retain(|existing| existing.id() != id);
    items.len() != before
}
