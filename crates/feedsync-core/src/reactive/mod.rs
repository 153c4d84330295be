//! # Reactive Primitives for View State
//!
//! View state is published to the presentation layer through [`Observable<T>`]:
//! a current value plus change notification with replay-latest semantics.
//!
//! ## Core Types
//!
//! - [`Observable<T>`]: writable reactive value owned by a view's state.
//! - [`ObservableView<T>`]: read-only handle given to consumers.
//! - [`ValueSubscription<T>`]: poll-based subscription tracking versions.
//!
//! Push-based consumers use [`Observable::signal`], a `futures-signals`
//! signal that yields the current value first.

mod observable;

pub use observable::{Observable, ObservableView, ValueSubscription};
