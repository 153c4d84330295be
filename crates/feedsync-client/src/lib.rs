//! feedsync Client - runtime services around the view states
//!
//! The state crate knows how a single view reacts to one event. This crate
//! runs the pieces that live for a whole session:
//!
//! - [`KeyedCache`]: concurrent key/value cache that announces merged changes
//! - [`RequestCoalescer`]: batches lookups under a quiet-period/max-delay window
//! - [`ValueResolver`]: read-through resolution on top of both, with retries
//! - [`FeedCapabilitiesService`] and [`FeedOwnValuesService`]: per-feed values
//!   of the signed-in user, published on the bus as they change
//! - [`ListController`], [`ActivityView`] and [`FeedView`]: load pages into
//!   view states and keep their handlers subscribed
//! - [`FeedsSession`]: owns the bus and builds all of the above
//!
//! ```no_run
//! use feedsync_client::{init_tracing, FeedsConfig, FeedsSession};
//!
//! # fn main() -> Result<(), feedsync_client::ConfigError> {
//! init_tracing();
//! let mut config = FeedsConfig::new("alice");
//! config.merge_with_env()?;
//! let session = FeedsSession::new(config)?;
//! assert_eq!(session.bus().listener_count(), 0);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

/// Keyed caches with change notification
pub mod cache;

/// Request coalescing
pub mod coalescer;

/// Session configuration
pub mod config;

/// View controllers
pub mod lists;

/// Per-feed values of the signed-in user
pub mod own_values;

/// Cache-backed value resolution
pub mod resolver;

/// Session wiring
pub mod session;

/// Logging setup
pub mod telemetry;

pub use cache::{ChangeListener, KeyedCache};
pub use coalescer::{Batch, BatchHandler, RequestCoalescer};
pub use config::{CoalescerConfig, ConfigError, FeedsConfig, RetryConfig};
pub use lists::{ActivityView, FeedPageHook, FeedSummary, FeedView, ListController, PageHook};
pub use own_values::{FeedCapabilitiesService, FeedOwnValuesService};
pub use resolver::ValueResolver;
pub use session::{
    ActivityListController, BookmarkFolderListController, BookmarkListController, CommentListController,
    CommentReplyListController, FeedListController, FeedsSession, FollowListController, MemberListController,
    ReactionListController,
};
pub use telemetry::init_tracing;
