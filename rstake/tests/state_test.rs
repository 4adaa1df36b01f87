//! Balance tracker and profile session against a scripted backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{tokens, FakeBackend};
use rstake::{BalanceTracker, ClientEvent, EventBus, ProfileSession};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_no_token_means_no_balance() {
    let events = EventBus::default();
    let backend = Arc::new(FakeBackend::new());
    let tracker = BalanceTracker::new(Arc::clone(&backend), tokens(&events, false), events);

    tracker.reload().await.unwrap();
    let state = tracker.snapshot();
    assert_eq!(state.display(), "-");
    assert_eq!(state.real_balance(), None);
    assert_eq!(backend.balance_calls(), 0);
}

#[tokio::test]
async fn test_balance_is_abbreviated_for_display() {
    let events = EventBus::default();
    let backend = Arc::new(FakeBackend::new().with_balances([Some(2_500_000.0)]));
    let tracker = BalanceTracker::new(backend, tokens(&events, true), events);

    tracker.reload().await.unwrap();
    let state = tracker.snapshot();
    assert_eq!(state.display(), "2.50M");
    assert_eq!(state.real_balance(), Some(2_500_000.0));
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_balance() {
    let events = EventBus::default();
    let backend = Arc::new(FakeBackend::new().with_balances([Some(320.0), None]));
    let tracker = BalanceTracker::new(backend, tokens(&events, true), events);

    tracker.reload().await.unwrap();
    assert!(tracker.reload().await.is_err());

    let state = tracker.snapshot();
    assert_eq!(state.real_balance(), Some(320.0));
    assert!(state.error.is_some());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_logout_drops_balance() {
    let events = EventBus::default();
    let tokens = tokens(&events, true);
    let tracker = BalanceTracker::new(Arc::new(FakeBackend::new()), tokens.clone(), events);

    tracker.reload().await.unwrap();
    assert!(tracker.snapshot().real_balance().is_some());

    tokens.clear();
    tracker.reload().await.unwrap();
    assert_eq!(tracker.snapshot().display(), "-");
}

#[tokio::test(start_paused = true)]
async fn test_listener_reloads_on_token_and_event() {
    let events = EventBus::default();
    let backend = Arc::new(FakeBackend::new());
    let tokens = tokens(&events, false);
    let tracker = BalanceTracker::new(Arc::clone(&backend), tokens.clone(), events.clone());
    let mut state = tracker.subscribe();
    let cancel = CancellationToken::new();
    let task = tracker.spawn(cancel.clone());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(backend.balance_calls(), 0);

    tokens.set("tok-456");
    timeout(Duration::from_secs(1), async {
        while state.borrow_and_update().real_balance().is_none() {
            state.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    assert_eq!(backend.balance_calls(), 1);

    events.publish(ClientEvent::BalanceReload);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(backend.balance_calls(), 2);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_profile_requires_token() {
    let events = EventBus::default();
    let backend = Arc::new(FakeBackend::new());
    let session = ProfileSession::new(Arc::clone(&backend), tokens(&events, false));

    assert_eq!(session.reload().await.unwrap(), None);
    assert!(session.snapshot().profile.is_none());
    assert_eq!(backend.profile_calls(), 0);
}

#[tokio::test]
async fn test_profile_loads_with_token() {
    let events = EventBus::default();
    let backend = Arc::new(FakeBackend::new());
    let session = ProfileSession::new(backend, tokens(&events, true));

    let profile = session.reload().await.unwrap().unwrap();
    assert_eq!(profile.email, "ada@example.com");
    assert!(profile.is_verified);

    let state = session.snapshot();
    assert_eq!(state.profile, Some(profile));
    assert!(!state.is_loading);
    assert!(state.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_profile_cleared_when_token_removed() {
    let events = EventBus::default();
    let tokens = tokens(&events, true);
    let session = ProfileSession::new(Arc::new(FakeBackend::new()), tokens.clone());
    let mut state = session.subscribe();
    let cancel = CancellationToken::new();
    let task = session.spawn(cancel.clone());

    timeout(Duration::from_secs(1), async {
        while state.borrow_and_update().profile.is_none() {
            state.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    tokens.clear();
    timeout(Duration::from_secs(1), async {
        while state.borrow_and_update().profile.is_some() {
            state.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    task.await.unwrap();
}
