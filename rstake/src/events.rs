//! In-process event bus.
//!
//! Components that need to react to each other without direct references
//! (token changes, pending-invoice changes, balance reload requests, deposit
//! modal close, user notifications) publish and subscribe here. The bus is
//! injected into every consumer; subscriptions end when the receiver drops.

use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// A transient message meant for the user (a "toast").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The bearer token was stored or cleared.
    AuthTokenChanged,
    /// The persisted pending invoice was saved or cleared.
    PendingInvoiceChanged,
    /// Someone asked every balance view to refetch.
    BalanceReload,
    /// An open deposit dialog should close.
    CloseDepositModal,
    Notification(Notification),
}

/// Broadcast bus shared by all client components.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            rx: self.sender.subscribe(),
        }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: ClientEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("event published with no subscribers");
        }
    }

    pub fn notify(&self, notification: Notification) {
        self.publish(ClientEvent::Notification(notification));
    }
}

/// Receiving end of the bus. Skips over lag instead of failing.
pub struct EventSubscription {
    rx: broadcast::Receiver<ClientEvent>,
}

impl EventSubscription {
    /// Receive the next event. Returns `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<ClientEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("event subscription lagged by {n} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive; `None` when nothing is queued.
    pub fn try_next(&mut self) -> Option<ClientEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_sees_every_event() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(ClientEvent::BalanceReload);
        bus.notify(Notification::success("done"));

        assert_eq!(a.next().await, Some(ClientEvent::BalanceReload));
        assert_eq!(b.next().await, Some(ClientEvent::BalanceReload));
        assert_eq!(
            a.next().await,
            Some(ClientEvent::Notification(Notification::success("done")))
        );
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.publish(ClientEvent::CloseDepositModal);
    }

    #[test]
    fn test_try_next_skips_lag() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();
        for _ in 0..5 {
            bus.publish(ClientEvent::BalanceReload);
        }
        bus.publish(ClientEvent::AuthTokenChanged);
        let mut last = None;
        while let Some(event) = sub.try_next() {
            last = Some(event);
        }
        assert_eq!(last, Some(ClientEvent::AuthTokenChanged));
    }
}
