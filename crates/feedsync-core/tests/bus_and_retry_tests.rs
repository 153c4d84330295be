//! Integration tests for the event bus and the retry executor

use feedsync_core::{EventBus, FeedsError, ListenerError, RetryPolicy, StateEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn deleted(id: &str) -> StateEvent {
    StateEvent::ActivityDeleted {
        fid: "user:alice".parse().unwrap(),
        activity_id: id.into(),
    }
}

#[test]
fn failing_listener_does_not_block_the_others() {
    let bus = EventBus::<StateEvent>::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let _broken = bus.subscribe_fn(|_| Err(ListenerError::failed("boom")));
    let _panicking = bus.subscribe_fn(|_| panic!("listener bug"));
    let recorder = seen.clone();
    let _ok = bus.subscribe_fn(move |event: &StateEvent| {
        recorder.lock().push(event.name());
        Ok(())
    });

    assert_eq!(bus.publish(&deleted("a1")), 1);
    assert_eq!(seen.lock().len(), 1);
}

#[test]
fn unsubscribe_is_idempotent_and_drop_releases() {
    let bus = EventBus::<StateEvent>::new();
    let first = bus.subscribe_fn(|_| Ok(()));
    let second = bus.subscribe_fn(|_| Ok(()));
    assert_eq!(bus.listener_count(), 2);

    first.unsubscribe();
    first.unsubscribe();
    assert!(!first.is_active());
    assert_eq!(bus.listener_count(), 1);
    assert_eq!(bus.publish(&deleted("a1")), 1);

    drop(second);
    assert_eq!(bus.listener_count(), 0);
    assert_eq!(bus.publish(&deleted("a1")), 0);
}

#[test]
fn listener_may_unsubscribe_during_publish() {
    let bus = EventBus::<StateEvent>::new();
    let slot: Arc<Mutex<Option<feedsync_core::Subscription>>> = Arc::new(Mutex::new(None));
    let inner = slot.clone();
    let sub = bus.subscribe_fn(move |_| {
        if let Some(sub) = inner.lock().take() {
            sub.unsubscribe();
        }
        Ok(())
    });
    *slot.lock() = Some(sub);

    assert_eq!(bus.publish(&deleted("a1")), 1);
    assert_eq!(bus.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_until_success() {
    let calls = &AtomicU32::new(0);
    let outcome = RetryPolicy::exponential()
        .execute_with_context(|| async move {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(FeedsError::network("reset")),
                1 => Err(FeedsError::server(503, "unavailable")),
                _ => Ok("done"),
            }
        })
        .await;

    assert_eq!(outcome.result.unwrap(), "done");
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.total_backoff, Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn client_errors_fail_fast() {
    let calls = &AtomicU32::new(0);
    let result: Result<(), _> = RetryPolicy::exponential()
        .execute(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FeedsError::server(404, "gone"))
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
