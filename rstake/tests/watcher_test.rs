//! Pending-deposit watcher driven by a scripted backend on a paused clock.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{pending, tokens, FakeBackend, Poll};
use rstake::invoice::{DepositModal, DepositWait, InvoiceWatcher, PendingInvoiceStore, WatcherState};
use rstake::storage::MemoryStore;
use rstake::{BalanceTracker, ClientEvent, EventBus, Notification};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

const POLL: Duration = Duration::from_secs(15);
const RELOAD_DELAY: Duration = Duration::from_secs(1);
const SETTLE: Duration = Duration::from_millis(10);

#[derive(Default)]
struct CountingModal {
    closed: AtomicUsize,
}

impl DepositModal for CountingModal {
    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    backend: Arc<FakeBackend>,
    store: Arc<MemoryStore>,
    invoices: PendingInvoiceStore,
    events: EventBus,
    balance: BalanceTracker<FakeBackend>,
    modal: Arc<CountingModal>,
}

impl Harness {
    fn new(backend: FakeBackend) -> Self {
        let events = EventBus::default();
        let backend = Arc::new(backend);
        let tokens = tokens(&events, true);
        let store = Arc::new(MemoryStore::new());
        let invoices = PendingInvoiceStore::new(store.clone(), events.clone());
        let balance = BalanceTracker::new(Arc::clone(&backend), tokens, events.clone());
        Self {
            backend,
            store,
            invoices,
            events,
            balance,
            modal: Arc::new(CountingModal::default()),
        }
    }

    fn watcher(&self) -> InvoiceWatcher<FakeBackend> {
        InvoiceWatcher::new(
            Arc::clone(&self.backend),
            self.invoices.clone(),
            self.balance.clone(),
            self.events.clone(),
            POLL,
            RELOAD_DELAY,
        )
        .with_modal(self.modal.clone())
    }

    fn spawn(&self, cancel: &CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.watcher().run(cancel.clone()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_sequence_runs_once() {
    let h = Harness::new(FakeBackend::new().with_polls([
        Poll::Status("pending"),
        Poll::Status("completed"),
    ]));
    h.invoices.save(&pending("inv-1"));
    let mut sub = h.events.subscribe();
    let cancel = CancellationToken::new();
    let task = h.spawn(&cancel);

    // First poll happens right away.
    sleep(SETTLE).await;
    assert_eq!(h.backend.polled(), vec!["inv-1"]);
    assert!(h.invoices.read().is_some());

    sleep(POLL).await;
    assert_eq!(h.backend.polled(), vec!["inv-1", "inv-1"]);
    assert!(h.invoices.read().is_none());
    assert_eq!(h.modal.closed.load(Ordering::SeqCst), 1);
    assert_eq!(h.backend.balance_calls(), 0);

    sleep(RELOAD_DELAY).await;
    assert_eq!(h.backend.balance_calls(), 1);
    assert_eq!(h.balance.snapshot().real_balance(), Some(150.0));

    // Nothing left to watch.
    sleep(POLL * 4).await;
    assert_eq!(h.backend.polled().len(), 2);
    assert_eq!(h.backend.balance_calls(), 1);

    assert_eq!(sub.try_next(), Some(ClientEvent::PendingInvoiceChanged));
    assert_eq!(
        sub.try_next(),
        Some(ClientEvent::Notification(Notification::success(
            "Deposit confirmed"
        )))
    );
    assert_eq!(sub.try_next(), Some(ClientEvent::CloseDepositModal));
    assert_eq!(sub.try_next(), Some(ClientEvent::BalanceReload));
    assert_eq!(sub.try_next(), None);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_is_retried_next_tick() {
    let h = Harness::new(FakeBackend::new().with_polls([Poll::Fail, Poll::Status("paid")]));
    h.invoices.save(&pending("inv-1"));
    let cancel = CancellationToken::new();
    let task = h.spawn(&cancel);

    sleep(SETTLE).await;
    assert_eq!(h.backend.polled().len(), 1);
    assert!(h.invoices.read().is_some());

    sleep(POLL + RELOAD_DELAY).await;
    assert_eq!(h.backend.polled().len(), 2);
    assert!(h.invoices.read().is_none());
    assert_eq!(h.backend.balance_calls(), 1);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_missing_status_counts_as_pending() {
    let h = Harness::new(FakeBackend::new().with_polls([Poll::NoStatus, Poll::NoStatus]));
    h.invoices.save(&pending("inv-1"));
    let cancel = CancellationToken::new();
    let task = h.spawn(&cancel);

    sleep(POLL + SETTLE).await;
    assert_eq!(h.backend.polled().len(), 2);
    assert!(h.invoices.read().is_some());
    assert_eq!(h.modal.closed.load(Ordering::SeqCst), 0);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_new_invoice_replaces_old_one() {
    let h = Harness::new(FakeBackend::new());
    h.invoices.save(&pending("inv-1"));
    let watcher = h.watcher();
    let mut state = watcher.subscribe_state();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(watcher.run(cancel.clone()));

    sleep(SETTLE).await;
    assert_eq!(
        *state.borrow_and_update(),
        WatcherState::Watching {
            puid: "inv-1".into()
        }
    );

    h.invoices.save(&pending("inv-2"));
    sleep(SETTLE).await;
    assert_eq!(h.backend.polled(), vec!["inv-1", "inv-2"]);
    assert_eq!(
        *state.borrow_and_update(),
        WatcherState::Watching {
            puid: "inv-2".into()
        }
    );

    sleep(POLL).await;
    assert_eq!(h.backend.polled(), vec!["inv-1", "inv-2", "inv-2"]);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_clearing_the_invoice_stops_polling() {
    let h = Harness::new(FakeBackend::new());
    h.invoices.save(&pending("inv-1"));
    let watcher = h.watcher();
    let state = watcher.subscribe_state();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(watcher.run(cancel.clone()));

    sleep(SETTLE).await;
    h.invoices.clear();
    sleep(SETTLE).await;
    assert_eq!(*state.borrow(), WatcherState::Idle);

    sleep(POLL * 3).await;
    assert_eq!(h.backend.polled().len(), 1);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_settled_record_is_not_polled() {
    let h = Harness::new(FakeBackend::new());
    let mut settled = pending("inv-1");
    settled.status = "completed".into();
    h.invoices.save(&settled);
    let cancel = CancellationToken::new();
    let task = h.spawn(&cancel);

    sleep(POLL * 2).await;
    assert!(h.backend.polled().is_empty());

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_reload_delay_skips_reload() {
    let h = Harness::new(FakeBackend::new().with_polls([Poll::Status("completed")]));
    h.invoices.save(&pending("inv-1"));
    let cancel = CancellationToken::new();
    let task = h.spawn(&cancel);

    sleep(SETTLE).await;
    assert!(h.invoices.read().is_none());
    cancel.cancel();
    task.await.unwrap();

    sleep(RELOAD_DELAY * 2).await;
    assert_eq!(h.backend.balance_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_confirmed_state_survives_the_clear() {
    let h = Harness::new(FakeBackend::new().with_polls([Poll::Status("completed")]));
    h.invoices.save(&pending("inv-1"));
    let watcher = h.watcher();
    let state = watcher.subscribe_state();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(watcher.run(cancel.clone()));

    sleep(SETTLE).await;
    assert_eq!(
        *state.borrow(),
        WatcherState::Confirmed {
            puid: "inv-1".into()
        }
    );

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_new_invoice_is_polled_during_reload_delay() {
    let h = Harness::new(FakeBackend::new().with_polls([Poll::Status("completed")]));
    h.invoices.save(&pending("inv-1"));
    let cancel = CancellationToken::new();
    let task = h.spawn(&cancel);

    sleep(SETTLE).await;
    assert!(h.invoices.read().is_none());

    h.invoices.save(&pending("inv-2"));
    sleep(SETTLE).await;
    assert_eq!(h.backend.polled(), vec!["inv-1", "inv-2"]);
    assert_eq!(h.backend.balance_calls(), 0);

    sleep(RELOAD_DELAY).await;
    assert_eq!(h.backend.balance_calls(), 1);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_poll_does_not_stall_polling() {
    let h = Harness::new(FakeBackend::new().with_polls([Poll::Hang, Poll::Hang]));
    h.invoices.save(&pending("inv-1"));
    let cancel = CancellationToken::new();
    let task = h.spawn(&cancel);

    sleep(POLL * 2 + SETTLE).await;
    assert!(h.backend.polled().len() >= 3);
    assert!(h.invoices.read().is_some());

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_unanswered_poll() {
    let h = Harness::new(FakeBackend::new().with_polls([Poll::Hang]));
    h.invoices.save(&pending("inv-1"));
    let cancel = CancellationToken::new();
    let task = h.spawn(&cancel);

    sleep(SETTLE).await;
    assert_eq!(h.backend.polled().len(), 1);

    cancel.cancel();
    assert!(timeout(SETTLE, task).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_wait_ends_once_balance_is_reloaded() {
    let h = Harness::new(FakeBackend::new().with_polls([
        Poll::Status("pending"),
        Poll::Status("confirmed"),
    ]));
    h.invoices.save(&pending("inv-1"));
    let cancel = CancellationToken::new();

    let outcome = timeout(POLL * 2, h.watcher().run_until_settled(cancel))
        .await
        .unwrap();
    assert_eq!(outcome, DepositWait::Confirmed);
    assert_eq!(h.backend.balance_calls(), 1);
    assert!(h.invoices.read().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_wait_ends_when_invoice_is_cleared_elsewhere() {
    let h = Harness::new(FakeBackend::new());
    h.invoices.save(&pending("inv-1"));
    // Same storage, different bus: a second process running `deposit clear`.
    let other_process = PendingInvoiceStore::new(h.store.clone(), EventBus::default());
    let cancel = CancellationToken::new();
    let wait = tokio::spawn(h.watcher().run_until_settled(cancel));

    sleep(SETTLE).await;
    other_process.clear();

    let outcome = timeout(POLL * 2, wait).await.unwrap().unwrap();
    assert_eq!(outcome, DepositWait::Cleared);
    assert_eq!(h.backend.polled().len(), 1);
    assert_eq!(h.modal.closed.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_without_pending_invoice_returns_at_once() {
    let h = Harness::new(FakeBackend::new());
    let outcome = h.watcher().run_until_settled(CancellationToken::new()).await;
    assert_eq!(outcome, DepositWait::Cleared);
    assert!(h.backend.polled().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wait_is_cancelled_while_poll_hangs() {
    let h = Harness::new(FakeBackend::new().with_polls([Poll::Hang]));
    h.invoices.save(&pending("inv-1"));
    let cancel = CancellationToken::new();
    let wait = tokio::spawn(h.watcher().run_until_settled(cancel.clone()));

    sleep(SETTLE).await;
    cancel.cancel();

    let outcome = timeout(SETTLE, wait).await.unwrap().unwrap();
    assert_eq!(outcome, DepositWait::Cancelled);
}
