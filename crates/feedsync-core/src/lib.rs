//! feedsync Core - shared vocabulary for the feed-state runtime
//!
//! This crate holds everything the state and client layers agree on: entity
//! identifiers and models, the query language views are configured with, the
//! push-event enum, the in-process event bus, reactive values and the retry
//! executor.
//!
//! # Layers
//!
//! ## Vocabulary
//! - [`FeedId`] and the entity models in [`models`]
//! - [`ListQuery`] filters and sorts evaluated locally against models
//! - [`StateEvent`]: one variant per server-push notification
//!
//! ## Runtime primitives
//! - [`EventBus`]: synchronous fan-out with idempotent unsubscribe
//! - [`Observable`]: replay-latest reactive values exposed by views
//! - [`RetryPolicy`]: bounded retry with backoff for async fetches
//!
//! ## External seams
//! - [`fetch`]: traits implemented by the remote binding layer

#![forbid(unsafe_code)]

// === Core Modules ===

/// In-process event bus and subscriptions
pub mod bus;

/// Unified error handling
pub mod errors;

/// Server-push state events
pub mod events;

/// Remote fetch interfaces
pub mod fetch;

/// Feed identifiers
pub mod ids;

/// Entity models
pub mod models;

/// Cursor pagination
pub mod pagination;

/// Filters, sorts and list queries
pub mod query;

/// Reactive values for view state
pub mod reactive;

/// Retry policies
pub mod reliability;

// === Public API Re-exports ===

pub use bus::{EventBus, EventListener, FnListener, ListenerError, Subscription};
pub use errors::{FeedsError, Result};
pub use events::StateEvent;
pub use fetch::{ActivityFetcher, BatchFetcher, FeedFetcher, FeedPage, PageFetcher};
pub use ids::FeedId;
pub use models::Identifiable;
pub use pagination::{PaginationData, PaginationResult};
pub use query::{Comparator, FieldValue, Filter, FilterTarget, ListQuery, Sort, SortDirection, SortTarget};
pub use reactive::{Observable, ObservableView, ValueSubscription};
pub use reliability::{Backoff, RetryOutcome, RetryPolicy, RetryableError};
