//! Observable<T> - current value plus change notification
//!
//! `Observable<T>` wraps a value behind a lock and bumps a version on every
//! committed change. Consumers either poll a [`ValueSubscription`] or drive a
//! `futures-signals` [`Signal`]. Both replay the latest value to a new
//! subscriber before reporting further changes.
//!
//! View state hands out [`ObservableView`]s so the presentation layer can read
//! and observe but never write.

use futures_signals::signal::{Mutable, Signal, SignalExt};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Inner state of an Observable value.
struct ObservableInner<T> {
    /// The current value.
    value: RwLock<T>,
    /// Version counter, incremented on each committed change.
    version: Mutable<u64>,
}

impl<T> ObservableInner<T> {
    fn bump(&self) {
        let mut version = self.version.lock_mut();
        *version += 1;
    }
}

/// A value that can be observed for changes.
///
/// `Observable<T>` provides:
/// - `get()`: read a clone of the current value
/// - `set()` / `update()`: replace or edit the value and notify observers
/// - `modify()`: edit the value and notify only when the edit reports a change
/// - `subscribe()`: poll-based change tracking
/// - `signal()`: push-based change stream
///
/// Clones share state.
pub struct Observable<T> {
    inner: Arc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Create a new Observable with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(ObservableInner {
                value: RwLock::new(value),
                version: Mutable::new(0),
            }),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read())
    }

    /// Get the current version number.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Replace the value and notify observers.
    pub fn set(&self, value: T) {
        *self.inner.value.write() = value;
        self.inner.bump();
    }

    /// Edit the value in place and notify observers.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.inner.value.write());
        self.inner.bump();
        result
    }

    /// Edit the value in place; observers are notified only if `f` returns `true`.
    pub fn modify(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let changed = f(&mut self.inner.value.write());
        if changed {
            self.inner.bump();
        }
        changed
    }

    /// Subscribe to value changes by polling.
    ///
    /// The first `poll()` returns the current value; later polls return a value
    /// only if the Observable changed since the previous poll.
    pub fn subscribe(&self) -> ValueSubscription<T> {
        ValueSubscription {
            source: Arc::clone(&self.inner),
            last_version: None,
        }
    }

    /// A signal yielding the current value, then the latest value after each change.
    pub fn signal(&self) -> impl Signal<Item = T> + Send + Sync + 'static {
        let inner = Arc::clone(&self.inner);
        self.inner
            .version
            .signal()
            .map(move |_| inner.value.read().clone())
    }

    /// A read-only handle sharing this Observable's state.
    pub fn view(&self) -> ObservableView<T> {
        ObservableView {
            source: self.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.get())
            .field("version", &self.version())
            .finish()
    }
}

/// Read-only handle to an [`Observable`].
pub struct ObservableView<T> {
    source: Observable<T>,
}

impl<T> Clone for ObservableView<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ObservableView<T> {
    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.source.get()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.source.with(f)
    }

    /// Get the current version number.
    pub fn version(&self) -> u64 {
        self.source.version()
    }

    /// See [`Observable::subscribe`].
    pub fn subscribe(&self) -> ValueSubscription<T> {
        self.source.subscribe()
    }

    /// See [`Observable::signal`].
    pub fn signal(&self) -> impl Signal<Item = T> + Send + Sync + 'static {
        self.source.signal()
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for ObservableView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableView").field(&self.get()).finish()
    }
}

/// A poll-based subscription to an [`Observable`].
pub struct ValueSubscription<T> {
    source: Arc<ObservableInner<T>>,
    last_version: Option<u64>,
}

impl<T: Clone + Send + Sync + 'static> ValueSubscription<T> {
    /// Check if there is a value this subscription has not seen yet.
    pub fn has_changed(&self) -> bool {
        match self.last_version {
            None => true,
            Some(seen) => self.source.version.get() > seen,
        }
    }

    /// Poll for a new value.
    pub fn poll(&mut self) -> Option<T> {
        // Read the version before the value so a concurrent write is seen on the next poll.
        let current = self.source.version.get();
        if self.last_version.is_some_and(|seen| current <= seen) {
            return None;
        }
        self.last_version = Some(current);
        Some(self.source.value.read().clone())
    }

    /// Get the current value regardless of whether it changed.
    pub fn get(&self) -> T {
        self.source.value.read().clone()
    }
}
