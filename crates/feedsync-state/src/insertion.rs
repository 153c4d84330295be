//! New-activity insertion policy
//!
//! When an activity is created while a list is live, membership is not
//! decided by filter and sort alone. The default policy only shows the
//! current user's own new activities, and always at the top, regardless of
//! the list's declared sort. Other users' activities appear on the next
//! refresh.

use feedsync_core::models::{ActivityData, ActivityField};
use feedsync_core::ListQuery;
use std::sync::Arc;

/// What to do with a newly created activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertionAction {
    /// Prepend to the list
    AddToStart,
    /// Append to the list
    AddToEnd,
    /// Leave the list unchanged
    Ignore,
}

/// Custom insertion policy: `(query, activity, current_user_id) -> action`.
pub type OnNewActivity =
    Arc<dyn Fn(&ListQuery<ActivityField>, &ActivityData, &str) -> InsertionAction + Send + Sync>;

/// `AddToStart` iff the activity is the current user's own and passes the
/// query's filter (a missing filter passes everything); otherwise `Ignore`.
pub fn default_on_new_activity(
    query: &ListQuery<ActivityField>,
    activity: &ActivityData,
    current_user_id: &str,
) -> InsertionAction {
    if activity.user.id == current_user_id && query.matches(activity) {
        InsertionAction::AddToStart
    } else {
        InsertionAction::Ignore
    }
}

/// The default policy as an [`OnNewActivity`].
pub fn default_policy() -> OnNewActivity {
    Arc::new(default_on_new_activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_core::Filter;
    use feedsync_testkit::ActivityBuilder;

    fn activity(activity_type: &str, user: &str) -> ActivityData {
        ActivityBuilder::new("a1").activity_type(activity_type).user(user).build()
    }

    #[test]
    fn filtered_query_requires_own_matching_activity() {
        let query = ListQuery::new().with_filter(Filter::equal(ActivityField::ActivityType, "post"));
        let me = "user-u";

        assert_eq!(
            default_on_new_activity(&query, &activity("post", me), me),
            InsertionAction::AddToStart
        );
        assert_eq!(
            default_on_new_activity(&query, &activity("post", "someone-else"), me),
            InsertionAction::Ignore
        );
        assert_eq!(
            default_on_new_activity(&query, &activity("comment", me), me),
            InsertionAction::Ignore
        );
    }

    #[test]
    fn unfiltered_query_accepts_any_own_activity() {
        let query = ListQuery::new();
        for kind in ["post", "comment", "share"] {
            assert_eq!(
                default_on_new_activity(&query, &activity(kind, "u"), "u"),
                InsertionAction::AddToStart
            );
        }
        assert_eq!(
            default_on_new_activity(&query, &activity("post", "v"), "u"),
            InsertionAction::Ignore
        );
    }
}
