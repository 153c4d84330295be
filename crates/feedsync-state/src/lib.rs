//! feedsync State - paginated view state kept in sync by push events
//!
//! Views own a [`PaginatedStateStore`] (or a single observable value) and
//! expose it read-only. Each view hands out an event handler that, once
//! subscribed to the [`EventBus`](feedsync_core::EventBus), decides for every
//! [`StateEvent`](feedsync_core::StateEvent) whether it applies and which
//! mutation to run.
//!
//! # Example
//!
//! ```rust
//! use feedsync_core::{EventBus, FeedId, ListQuery, StateEvent};
//! use feedsync_state::FeedState;
//! use std::sync::Arc;
//!
//! let bus = EventBus::new();
//! let state = Arc::new(FeedState::new(FeedId::new("user", "alice"), ListQuery::new(), "alice"));
//! let _subscription = bus.subscribe(Arc::new(state.event_handler()));
//!
//! bus.publish(&StateEvent::FeedDeleted { fid: FeedId::new("user", "alice") });
//! assert!(state.deleted().get());
//! ```

#![forbid(unsafe_code)]

/// New-activity insertion policy
pub mod insertion;

/// Paginated list storage
pub mod store;

/// View states and event handlers
pub mod views;

pub use insertion::{default_on_new_activity, default_policy, InsertionAction, OnNewActivity};
pub use store::{InsertionPolicy, PaginatedStateStore, PaginatedView};
pub use views::*;
