//! Balance state: raw value for arithmetic, abbreviated string for display.
//!
//! [`BalanceTracker`] publishes its state through a `watch` channel. A
//! background task started with [`BalanceTracker::spawn`] refetches whenever
//! the token changes or someone publishes [`ClientEvent::BalanceReload`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::backend::StakingBackend;
use crate::error::Result;
use crate::events::{ClientEvent, EventBus};

/// Placeholder shown when no balance is known.
pub const NO_BALANCE: &str = "-";

const SUFFIXES: [(f64, &str); 5] = [
    (1e3, "K"),
    (1e6, "M"),
    (1e9, "B"),
    (1e12, "T"),
    (1e15, "Q"),
];

/// Abbreviate a balance: below 1000 it is printed as is, above that it is
/// divided down to K/M/B/T/Q with two decimals (`2_500_000` → `"2.50M"`).
/// Amounts of 1e18 and more keep the `Q` suffix but are divided by 1e18.
pub fn abbreviate_balance(balance: f64) -> String {
    if balance < 1e3 {
        return format!("{balance}");
    }
    for window in SUFFIXES.windows(2) {
        let (scale, suffix) = window[0];
        let (next, _) = window[1];
        if balance < next {
            return format!("{}{suffix}", to_fixed_2(balance / scale));
        }
    }
    if balance < 1e18 {
        return format!("{}Q", to_fixed_2(balance / 1e15));
    }
    format!("{}Q", to_fixed_2(balance / 1e18))
}

/// Two-decimal rounding with ties away from zero.
fn to_fixed_2(x: f64) -> String {
    format!("{:.2}", (x * 100.0).round() / 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceView {
    pub raw: f64,
    pub display: String,
}

impl BalanceView {
    pub fn new(raw: f64) -> Self {
        Self {
            raw,
            display: abbreviate_balance(raw),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceState {
    pub balance: Option<BalanceView>,
    pub loading: bool,
    pub error: Option<String>,
}

impl BalanceState {
    /// Display string, `-` when unknown.
    pub fn display(&self) -> &str {
        self.balance
            .as_ref()
            .map(|b| b.display.as_str())
            .unwrap_or(NO_BALANCE)
    }

    /// Exact value, when known.
    pub fn real_balance(&self) -> Option<f64> {
        self.balance.as_ref().map(|b| b.raw)
    }
}

pub struct BalanceTracker<B> {
    backend: Arc<B>,
    tokens: TokenStore,
    events: EventBus,
    state: Arc<watch::Sender<BalanceState>>,
}

impl<B> Clone for BalanceTracker<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            tokens: self.tokens.clone(),
            events: self.events.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<B: StakingBackend> BalanceTracker<B> {
    pub fn new(backend: Arc<B>, tokens: TokenStore, events: EventBus) -> Self {
        let (state, _) = watch::channel(BalanceState::default());
        Self {
            backend,
            tokens,
            events,
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> BalanceState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BalanceState> {
        self.state.subscribe()
    }

    /// Refetch the balance.
    ///
    /// Without a token the balance becomes unknown. A failed fetch records
    /// the error and keeps the previous balance.
    pub async fn reload(&self) -> Result<()> {
        if self.tokens.get().is_none() {
            self.state.send_modify(|s| {
                s.balance = None;
                s.loading = false;
            });
            return Ok(());
        }

        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let fetched = match self.backend.current_balance().await {
            Ok(resp) => resp.into_data(),
            Err(e) => Err(e),
        };

        match fetched {
            Ok(balance) => {
                let view = BalanceView::new(balance.balance);
                debug!(balance = view.raw, display = %view.display, "balance loaded");
                self.state.send_modify(|s| {
                    s.balance = Some(view);
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.state.send_modify(|s| {
                    s.error = Some(message);
                    s.loading = false;
                });
                Err(e)
            }
        }
    }

    /// Reload now, then again on every token change and every
    /// [`ClientEvent::BalanceReload`], until `cancel` fires.
    pub fn spawn(&self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let tracker = self.clone();
        let mut token_rx = self.tokens.subscribe();
        let mut events = self.events.subscribe();

        tokio::spawn(async move {
            tracker.reload_quietly().await;
            loop {
                tokio::select! {
                    changed = token_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        tracker.reload_quietly().await;
                    }
                    event = events.next() => match event {
                        Some(ClientEvent::BalanceReload) => tracker.reload_quietly().await,
                        Some(_) => {}
                        None => return,
                    },
                    _ = cancel.cancelled() => {
                        debug!("balance listener stopped");
                        return;
                    }
                }
            }
        })
    }

    async fn reload_quietly(&self) {
        if let Err(e) = self.reload().await {
            warn!(error = %e, "balance reload failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_balances_are_unchanged() {
        assert_eq!(abbreviate_balance(0.0), "0");
        assert_eq!(abbreviate_balance(12.5), "12.5");
        assert_eq!(abbreviate_balance(999.0), "999");
    }

    #[test]
    fn test_suffix_boundaries() {
        assert_eq!(abbreviate_balance(1_000.0), "1.00K");
        assert_eq!(abbreviate_balance(999_999.0), "1000.00K");
        assert_eq!(abbreviate_balance(1_000_000.0), "1.00M");
        assert_eq!(abbreviate_balance(2_500_000.0), "2.50M");
        assert_eq!(abbreviate_balance(1e9), "1.00B");
        assert_eq!(abbreviate_balance(3.456e12), "3.46T");
        assert_eq!(abbreviate_balance(7e15), "7.00Q");
    }

    #[test]
    fn test_huge_balances_keep_q_suffix() {
        assert_eq!(abbreviate_balance(2e18), "2.00Q");
    }

    #[test]
    fn test_ties_round_up() {
        assert_eq!(abbreviate_balance(1_125.0), "1.13K");
    }

    #[test]
    fn test_state_display_defaults_to_dash() {
        let state = BalanceState::default();
        assert_eq!(state.display(), "-");
        assert_eq!(state.real_balance(), None);

        let state = BalanceState {
            balance: Some(BalanceView::new(2_500_000.0)),
            ..Default::default()
        };
        assert_eq!(state.display(), "2.50M");
        assert_eq!(state.real_balance(), Some(2_500_000.0));
    }
}
