//! Request coalescing
//!
//! A [`RequestCoalescer`] collects keys offered from anywhere and hands them
//! to one batch handler in ordered, deduplicated batches. A batch fires when
//! the pending set reaches `max_batch_size`, when no key arrived for
//! `initial_delay`, or when the batch is `max_delay` old, whichever is first.
//!
//! A background tokio task drives the timers. Batches are handled one at a
//! time; keys offered while a handler runs start the next batch. The task
//! stops when the coalescer is dropped.

use futures::future::BoxFuture;
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;

use crate::config::CoalescerConfig;

/// A dispatched set of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<K> {
    /// Keys in offer order, without duplicates
    pub keys: Vec<K>,
    /// Time from the batch's first key to dispatch
    pub elapsed: Duration,
    /// Zero-based sequence number of the batch
    pub index: u64,
}

/// Handles one batch. The next batch waits for the returned future.
pub type BatchHandler<K> = Arc<dyn Fn(Batch<K>) -> BoxFuture<'static, ()> + Send + Sync>;

struct Pending<K> {
    keys: IndexSet<K>,
    started: Option<Instant>,
    deadline: Option<Instant>,
}

impl<K> Pending<K> {
    fn take(&mut self) -> (Vec<K>, Option<Instant>) {
        self.deadline = None;
        let keys = std::mem::take(&mut self.keys).into_iter().collect();
        (keys, self.started.take())
    }
}

struct Shared<K> {
    pending: Mutex<Pending<K>>,
    wake: Notify,
    config: CoalescerConfig,
}

enum Step {
    Idle,
    Wait(Instant),
    Fire,
}

/// Batches keys for a single handler.
pub struct RequestCoalescer<K> {
    shared: Arc<Shared<K>>,
    shutdown: watch::Sender<bool>,
}

impl<K> RequestCoalescer<K>
where
    K: Eq + Hash + Clone + Send + std::fmt::Debug + 'static,
{
    /// Start a coalescer on the current tokio runtime.
    pub fn new(config: CoalescerConfig, handler: BatchHandler<K>) -> Self {
        let shared = Arc::new(Shared {
            pending: Mutex::new(Pending {
                keys: IndexSet::new(),
                started: None,
                deadline: None,
            }),
            wake: Notify::new(),
            config,
        });
        let (shutdown, shutdown_rx) = watch::channel(false);
        tokio::spawn(run(shared.clone(), handler, shutdown_rx));
        Self { shared, shutdown }
    }

    /// Schedule `key` for the next batch. Never blocks on the handler;
    /// offering a pending key again is a no-op.
    pub fn offer(&self, key: K) {
        {
            let mut pending = self.shared.pending.lock();
            if pending.keys.contains(&key) {
                return;
            }
            tracing::trace!(?key, "key offered");
            pending.keys.insert(key);
            let now = Instant::now();
            let started = *pending.started.get_or_insert(now);
            let config = &self.shared.config;
            pending.deadline = Some((now + config.initial_delay).min(started + config.max_delay));
        }
        self.shared.wake.notify_one();
    }

    /// Offer several keys.
    pub fn offer_all(&self, keys: impl IntoIterator<Item = K>) {
        for key in keys {
            self.offer(key);
        }
    }

    /// Number of keys waiting for the next batch.
    pub fn pending_len(&self) -> usize {
        self.shared.pending.lock().keys.len()
    }

    /// The batching windows in use.
    pub fn config(&self) -> &CoalescerConfig {
        &self.shared.config
    }
}

impl<K> Drop for RequestCoalescer<K> {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn run<K>(shared: Arc<Shared<K>>, handler: BatchHandler<K>, mut shutdown: watch::Receiver<bool>)
where
    K: Eq + Hash + Clone + Send + 'static,
{
    let mut index = 0u64;
    loop {
        if *shutdown.borrow() {
            break;
        }
        let step = {
            let pending = shared.pending.lock();
            match pending.deadline {
                _ if pending.keys.is_empty() => Step::Idle,
                _ if pending.keys.len() >= shared.config.max_batch_size => Step::Fire,
                Some(deadline) if deadline <= Instant::now() => Step::Fire,
                Some(deadline) => Step::Wait(deadline),
                None => Step::Fire,
            }
        };

        match step {
            Step::Idle => tokio::select! {
                _ = shared.wake.notified() => {}
                _ = shutdown.changed() => break,
            },
            Step::Wait(deadline) => tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = shared.wake.notified() => {}
                _ = shutdown.changed() => break,
            },
            Step::Fire => {
                let (keys, started) = shared.pending.lock().take();
                if keys.is_empty() {
                    continue;
                }
                let elapsed = started.map_or(Duration::ZERO, |started| started.elapsed());
                tracing::debug!(index, keys = keys.len(), ?elapsed, "batch dispatched");
                handler(Batch { keys, elapsed, index }).await;
                index += 1;
            }
        }
    }
    tracing::trace!(batches = index, "coalescer stopped");
}
