use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::events::{ClientEvent, EventBus};
use crate::storage::KeyValueStore;

/// Persists the bearer token and tells everyone when it changes.
///
/// Storage failures never surface: a failed read looks like "logged out",
/// a failed write is logged and dropped.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    events: EventBus,
    tx: Arc<watch::Sender<Option<String>>>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, events: EventBus) -> Self {
        let key = key.into();
        let initial = read(store.as_ref(), &key);
        let (tx, _) = watch::channel(initial);
        Self {
            store,
            key,
            events,
            tx: Arc::new(tx),
        }
    }

    /// Current token, read straight from storage.
    pub fn get(&self) -> Option<String> {
        read(self.store.as_ref(), &self.key)
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// Persist a new token and broadcast the change.
    pub fn set(&self, token: &str) {
        if let Err(e) = self.store.set(&self.key, token) {
            warn!(error = %e, "failed to persist auth token");
            return;
        }
        debug!("auth token stored");
        self.broadcast();
    }

    /// Remove the token and broadcast the change.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            warn!(error = %e, "failed to clear auth token");
            return;
        }
        debug!("auth token cleared");
        self.broadcast();
    }

    /// Watch the token. The receiver always holds the latest value.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    fn broadcast(&self) {
        self.tx.send_replace(self.get());
        self.events.publish(ClientEvent::AuthTokenChanged);
    }
}

fn read(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(token) => token.filter(|t| !t.is_empty()),
        Err(e) => {
            warn!(error = %e, "failed to read auth token");
            None
        }
    }
}
