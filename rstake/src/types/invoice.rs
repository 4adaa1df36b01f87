use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Status string of an invoice that is still waiting for funds.
pub const INVOICE_PENDING: &str = "pending";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceById {
    pub puid: String,
}

/// Deposit invoice as stored on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub puid: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memo: String,
    /// Missing status is read as pending.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_accounted: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn status(&self) -> &str {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(INVOICE_PENDING)
    }

    pub fn is_pending(&self) -> bool {
        self.status() == INVOICE_PENDING
    }
}

/// Just the status of an invoice, read from whatever else the payload holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvoiceStatus {
    #[serde(default)]
    pub status: Option<String>,
}

impl InvoiceStatus {
    /// Missing, `null` or empty status is read as pending.
    pub fn status(&self) -> &str {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(INVOICE_PENDING)
    }
}

/// The one deposit invoice the client is waiting on. Persisted so polling
/// resumes after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInvoice {
    pub puid: String,
    pub address: String,
    pub memo: String,
    pub amount: f64,
    pub status: String,
}

impl PendingInvoice {
    pub fn is_pending(&self) -> bool {
        !self.puid.is_empty() && self.status == INVOICE_PENDING
    }
}

impl From<&Invoice> for PendingInvoice {
    fn from(inv: &Invoice) -> Self {
        Self {
            puid: inv.puid.clone(),
            address: inv.address.clone(),
            memo: inv.memo.clone(),
            amount: inv.amount,
            status: inv.status().to_string(),
        }
    }
}
