//! # Event Bus
//!
//! In-process fan-out of state events to live views.
//!
//! [`EventBus::publish`] delivers synchronously, in registration order, to a
//! snapshot of the listeners registered when the call started. A listener
//! that returns an error or panics is logged and skipped; the remaining
//! listeners still receive the event.
//!
//! [`EventBus::subscribe`] hands back a [`Subscription`]. Dropping it, or
//! calling [`Subscription::unsubscribe`], removes the listener exactly once.
//! Subscriptions hold the bus weakly, so an outstanding handle never keeps a
//! dropped bus alive.

use parking_lot::RwLock;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::errors::FeedsError;

// ============================================================================
// Listeners
// ============================================================================

/// Failure reported by a listener while handling an event.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The listener could not apply the event
    #[error("listener failed: {message}")]
    Failed {
        /// What went wrong
        message: String,
    },

    /// A feedsync operation inside the listener failed
    #[error(transparent)]
    Feeds(#[from] FeedsError),
}

impl ListenerError {
    /// Create a generic listener failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Receives events published on an [`EventBus`].
pub trait EventListener<E>: Send + Sync {
    /// Handle one event. Called synchronously from `publish`.
    fn on_event(&self, event: &E) -> Result<(), ListenerError>;
}

/// Adapter turning a closure into an [`EventListener`].
pub struct FnListener<F>(pub F);

impl<E, F> EventListener<E> for FnListener<F>
where
    F: Fn(&E) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_event(&self, event: &E) -> Result<(), ListenerError> {
        (self.0)(event)
    }
}

// ============================================================================
// Bus
// ============================================================================

type ListenerEntry<E> = (u64, Arc<dyn EventListener<E>>);

struct BusInner<E> {
    listeners: RwLock<Vec<ListenerEntry<E>>>,
    next_id: AtomicU64,
}

/// Removal side of a bus, object-safe so [`Subscription`] need not be generic.
trait SubscriptionRegistry: Send + Sync {
    fn remove(&self, id: u64) -> bool;
}

impl<E: 'static> SubscriptionRegistry for BusInner<E> {
    fn remove(&self, id: u64) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}

/// Synchronous multi-listener event bus.
///
/// Clones share the same listener registry.
pub struct EventBus<E> {
    inner: Arc<BusInner<E>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventBus<E> {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a listener. It receives every event published after this call.
    pub fn subscribe(&self, listener: Arc<dyn EventListener<E>>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push((id, listener));
        tracing::trace!(subscription = id, "listener subscribed");

        let registry: Arc<dyn SubscriptionRegistry> = self.inner.clone();
        Subscription {
            registry: Arc::downgrade(&registry),
            id,
            active: AtomicBool::new(true),
        }
    }

    /// Register a closure as a listener.
    pub fn subscribe_fn<F>(&self, f: F) -> Subscription
    where
        F: Fn(&E) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnListener(f)))
    }

    /// Deliver `event` to every current listener. Returns how many handled it
    /// without error.
    pub fn publish(&self, event: &E) -> usize {
        let snapshot: Vec<ListenerEntry<E>> = self.inner.listeners.read().clone();
        let mut delivered = 0;

        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    tracing::warn!(subscription = id, error = %err, "event listener failed");
                }
                Err(_) => {
                    tracing::warn!(subscription = id, "event listener panicked");
                }
            }
        }

        delivered
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.inner.listeners.read().len())
            .finish()
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle for a registered listener.
///
/// Unsubscribes on drop.
pub struct Subscription {
    registry: Weak<dyn SubscriptionRegistry>,
    id: u64,
    active: AtomicBool,
}

impl Subscription {
    /// Remove the listener. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            tracing::trace!(subscription = self.id, "listener unsubscribed");
        }
    }

    /// Whether the listener is still registered through this handle.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) && self.registry.strong_count() > 0
    }

    /// Bus-local id of the listener.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder(bus: &EventBus<u32>, log: &Arc<Mutex<Vec<(u8, u32)>>>, tag: u8) -> Subscription {
        let log = Arc::clone(log);
        bus.subscribe_fn(move |event| {
            log.lock().push((tag, *event));
            Ok(())
        })
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _a = recorder(&bus, &log, 1);
        let _b = recorder(&bus, &log, 2);

        assert_eq!(bus.publish(&7), 2);
        assert_eq!(*log.lock(), vec![(1, 7), (2, 7)]);
    }

    #[test]
    fn unsubscribe_is_idempotent_and_runs_on_drop() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recorder(&bus, &log, 1);
        let b = recorder(&bus, &log, 2);
        assert_eq!(bus.listener_count(), 2);

        a.unsubscribe();
        a.unsubscribe();
        assert!(!a.is_active());
        assert_eq!(bus.listener_count(), 1);

        drop(b);
        assert_eq!(bus.listener_count(), 0);
        assert_eq!(bus.publish(&1), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn failing_listener_does_not_stop_delivery() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _err = bus.subscribe_fn(|_| Err(ListenerError::failed("nope")));
        let _panic = bus.subscribe_fn(|_| panic!("listener bug"));
        let _ok = recorder(&bus, &log, 3);

        assert_eq!(bus.publish(&5), 1);
        assert_eq!(*log.lock(), vec![(3, 5)]);
    }

    #[test]
    fn listener_added_during_publish_waits_for_next_event() {
        let bus: EventBus<u32> = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let late: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let _first = {
            let inner_bus = bus.clone();
            let log = Arc::clone(&log);
            let late = Arc::clone(&late);
            bus.subscribe_fn(move |_| {
                let mut slot = late.lock();
                if slot.is_none() {
                    *slot = Some(recorder(&inner_bus, &log, 9));
                }
                Ok(())
            })
        };

        bus.publish(&1);
        assert!(log.lock().is_empty());
        bus.publish(&2);
        assert_eq!(*log.lock(), vec![(9, 2)]);
    }

    #[test]
    fn subscription_outliving_bus_is_inert() {
        let bus: EventBus<u32> = EventBus::new();
        let sub = bus.subscribe_fn(|_| Ok(()));
        drop(bus);
        assert!(!sub.is_active());
        sub.unsubscribe();
    }
}
