use std::sync::Arc;

use tracing::warn;

use crate::events::{ClientEvent, EventBus};
use crate::storage::KeyValueStore;
use crate::types::PendingInvoice;

/// Storage key of the pending invoice record.
pub const PENDING_INVOICE_KEY: &str = "pending_invoice";

/// The single deposit invoice being waited on, persisted between runs.
///
/// Saving replaces whatever was there. Every save and clear publishes
/// [`ClientEvent::PendingInvoiceChanged`]. Storage and decode failures are
/// logged and otherwise ignored.
#[derive(Clone)]
pub struct PendingInvoiceStore {
    store: Arc<dyn KeyValueStore>,
    events: EventBus,
}

impl PendingInvoiceStore {
    pub fn new(store: Arc<dyn KeyValueStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    pub fn save(&self, invoice: &PendingInvoice) {
        let text = match serde_json::to_string(invoice) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode pending invoice");
                return;
            }
        };
        if let Err(e) = self.store.set(PENDING_INVOICE_KEY, &text) {
            warn!(error = %e, "failed to persist pending invoice");
            return;
        }
        self.events.publish(ClientEvent::PendingInvoiceChanged);
    }

    pub fn read(&self) -> Option<PendingInvoice> {
        let raw = match self.store.get(PENDING_INVOICE_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read pending invoice");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(invoice) => Some(invoice),
            Err(e) => {
                warn!(error = %e, "ignoring malformed pending invoice");
                None
            }
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(PENDING_INVOICE_KEY) {
            warn!(error = %e, "failed to clear pending invoice");
            return;
        }
        self.events.publish(ClientEvent::PendingInvoiceChanged);
    }
}
