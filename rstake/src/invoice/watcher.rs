//! Background poller for the pending deposit invoice.
//!
//! Watches at most one invoice. Whenever the persisted record changes the
//! watcher re-reads it; a new puid replaces the old timer and is polled at
//! once, then every `poll_interval`. The first non-pending status triggers
//! one confirmation sequence:
//!
//! 1. stop polling and clear the persisted invoice
//! 2. notify "Deposit confirmed"
//! 3. close the deposit modal (direct call, then [`ClientEvent::CloseDepositModal`])
//! 4. after `reload_delay`, reload the balance and publish [`ClientEvent::BalanceReload`]
//!
//! Poll failures are ignored; the next tick simply tries again. A poll that
//! gets no answer within `poll_interval` counts as failed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::StakingBackend;
use crate::balance::BalanceTracker;
use crate::events::{ClientEvent, EventBus, Notification};
use crate::invoice::PendingInvoiceStore;
use crate::types::INVOICE_PENDING;

/// Message shown once a deposit lands.
pub const DEPOSIT_CONFIRMED: &str = "Deposit confirmed";

/// Something that can close an open deposit dialog.
pub trait DepositModal: Send + Sync {
    fn close(&self);
}

/// For front ends without a deposit dialog.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDepositModal;

impl DepositModal for NoDepositModal {
    fn close(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Watching { puid: String },
    /// The last watched invoice settled; the balance reload may still be due.
    Confirmed { puid: String },
}

/// How [`InvoiceWatcher::run_until_settled`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositWait {
    /// The deposit landed and the balance has been reloaded.
    Confirmed,
    /// No pending invoice was left to watch.
    Cleared,
    Cancelled,
}

enum PollOutcome {
    StillPending,
    Stop,
    Confirmed { puid: String, status: String },
}

pub struct InvoiceWatcher<B> {
    backend: Arc<B>,
    invoices: PendingInvoiceStore,
    balance: BalanceTracker<B>,
    events: EventBus,
    modal: Arc<dyn DepositModal>,
    poll_interval: Duration,
    reload_delay: Duration,
    state: watch::Sender<WatcherState>,
}

impl<B: StakingBackend> InvoiceWatcher<B> {
    pub fn new(
        backend: Arc<B>,
        invoices: PendingInvoiceStore,
        balance: BalanceTracker<B>,
        events: EventBus,
        poll_interval: Duration,
        reload_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(WatcherState::Idle);
        Self {
            backend,
            invoices,
            balance,
            events,
            modal: Arc::new(NoDepositModal),
            poll_interval,
            reload_delay,
            state,
        }
    }

    pub fn with_modal(mut self, modal: Arc<dyn DepositModal>) -> Self {
        self.modal = modal;
        self
    }

    pub fn subscribe_state(&self) -> watch::Receiver<WatcherState> {
        self.state.subscribe()
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut events = self.events.subscribe();
        let mut ticker: Option<Interval> = None;

        self.sync(&mut ticker);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("invoice watcher stopped");
                    return;
                }
                event = events.next() => match event {
                    Some(ClientEvent::PendingInvoiceChanged) => self.sync(&mut ticker),
                    Some(_) => {}
                    None => return,
                },
                _ = next_tick(&mut ticker) => {
                    let outcome = tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!("invoice watcher stopped during poll");
                            return;
                        }
                        outcome = self.poll() => outcome,
                    };
                    match outcome {
                        PollOutcome::StillPending => {}
                        PollOutcome::Stop => {
                            ticker = None;
                            self.state.send_replace(WatcherState::Idle);
                        }
                        PollOutcome::Confirmed { puid, status } => {
                            ticker = None;
                            self.confirm(puid, &status, &cancel);
                        }
                    }
                }
            }
        }
    }

    /// Watch the pending invoice until it settles and the balance has been
    /// reloaded, until it disappears, or until `cancel` fires.
    ///
    /// Unlike [`run`](Self::run) this notices an invoice cleared by another
    /// process sharing the same storage, which publishes nothing on this bus.
    pub async fn run_until_settled(self, cancel: CancellationToken) -> DepositWait {
        if !self.invoices.read().is_some_and(|inv| inv.is_pending()) {
            return DepositWait::Cleared;
        }

        let mut events = self.events.subscribe();
        let mut state = self.subscribe_state();
        let watcher_cancel = cancel.child_token();
        let task = tokio::spawn(self.run(watcher_cancel.clone()));
        let mut confirmed = false;

        let outcome = loop {
            tokio::select! {
                _ = cancel.cancelled() => break DepositWait::Cancelled,
                changed = state.changed(), if !confirmed => {
                    if changed.is_err() {
                        break DepositWait::Cancelled;
                    }
                    let current = state.borrow_and_update().clone();
                    match current {
                        WatcherState::Watching { .. } => {}
                        WatcherState::Confirmed { .. } => confirmed = true,
                        WatcherState::Idle => break DepositWait::Cleared,
                    }
                }
                event = events.next(), if confirmed => match event {
                    Some(ClientEvent::BalanceReload) | None => break DepositWait::Confirmed,
                    Some(_) => {}
                },
            }
        };

        watcher_cancel.cancel();
        let _ = task.await;
        outcome
    }

    /// Re-read the persisted invoice and (re)start the timer if its puid changed.
    fn sync(&self, ticker: &mut Option<Interval>) {
        let puid = self
            .invoices
            .read()
            .map(|inv| inv.puid)
            .filter(|p| !p.is_empty());

        let Some(puid) = puid else {
            *ticker = None;
            // A confirmation stays visible until the next invoice shows up.
            self.state.send_if_modified(|state| {
                let confirmed = matches!(state, WatcherState::Confirmed { .. });
                if !confirmed {
                    *state = WatcherState::Idle;
                }
                !confirmed
            });
            return;
        };

        let already_watching = matches!(
            &*self.state.borrow(),
            WatcherState::Watching { puid: current } if *current == puid
        );
        if already_watching {
            return;
        }

        info!(%puid, interval_secs = self.poll_interval.as_secs(), "watching deposit invoice");
        // First tick fires immediately.
        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        *ticker = Some(interval);
        self.state.send_replace(WatcherState::Watching { puid });
    }

    async fn poll(&self) -> PollOutcome {
        let pending = match self.invoices.read() {
            Some(inv) if inv.is_pending() => inv,
            _ => return PollOutcome::Stop,
        };

        let answer = time::timeout(
            self.poll_interval,
            self.backend.invoice_status(&pending.puid),
        )
        .await;
        match answer {
            Ok(Ok(resp)) => {
                let status = resp
                    .data
                    .as_ref()
                    .map(|inv| inv.status().to_string())
                    .unwrap_or_else(|| INVOICE_PENDING.to_string());
                if status == INVOICE_PENDING {
                    debug!(puid = %pending.puid, "invoice still pending");
                    PollOutcome::StillPending
                } else {
                    PollOutcome::Confirmed {
                        puid: pending.puid,
                        status,
                    }
                }
            }
            Ok(Err(e)) => {
                debug!(puid = %pending.puid, error = %e, "invoice poll failed");
                PollOutcome::StillPending
            }
            Err(_) => {
                debug!(puid = %pending.puid, "invoice poll timed out");
                PollOutcome::StillPending
            }
        }
    }

    /// Run the confirmation sequence. The balance reload is scheduled on its
    /// own task so invoice changes keep being handled during the delay.
    fn confirm(&self, puid: String, status: &str, cancel: &CancellationToken) {
        info!(%puid, %status, "deposit invoice settled");
        self.state.send_replace(WatcherState::Confirmed { puid });
        self.invoices.clear();
        self.events.notify(Notification::success(DEPOSIT_CONFIRMED));
        self.modal.close();
        self.events.publish(ClientEvent::CloseDepositModal);

        let balance = self.balance.clone();
        let events = self.events.clone();
        let delay = self.reload_delay;
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = cancel.cancelled() => return,
            }
            if let Err(e) = balance.reload().await {
                warn!(error = %e, "balance reload after deposit failed");
            }
            events.publish(ClientEvent::BalanceReload);
        });
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
