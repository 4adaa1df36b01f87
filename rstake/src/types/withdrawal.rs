use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub amount: f64,
    pub address: String,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawReceipt {
    pub puid: String,
    #[serde(default)]
    pub left_balance: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelWithdrawRequest {
    pub puid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelWithdrawReceipt {
    pub puid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WithdrawStatus {
    Pending,
    Confirmed,
    Canceled,
    Other(String),
}

impl From<String> for WithdrawStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => WithdrawStatus::Pending,
            "confirmed" => WithdrawStatus::Confirmed,
            "canceled" | "cancelled" => WithdrawStatus::Canceled,
            _ => WithdrawStatus::Other(s),
        }
    }
}

impl From<WithdrawStatus> for String {
    fn from(s: WithdrawStatus) -> Self {
        s.to_string()
    }
}

impl fmt::Display for WithdrawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithdrawStatus::Pending => f.write_str("pending"),
            WithdrawStatus::Confirmed => f.write_str("confirmed"),
            WithdrawStatus::Canceled => f.write_str("canceled"),
            WithdrawStatus::Other(s) => f.write_str(s),
        }
    }
}

/// One withdrawal request from the history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawHistoryItem {
    pub puid: String,
    pub status: WithdrawStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destination_address: String,
    #[serde(default)]
    pub destination_memo: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(default)]
    pub tx_hash: Option<String>,
    pub requested_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_withdrawn: bool,
    #[serde(default)]
    pub withdrawn_at: Option<DateTime<Utc>>,
}

impl WithdrawHistoryItem {
    /// Only requests still waiting for processing can be canceled.
    pub fn is_cancelable(&self) -> bool {
        self.status == WithdrawStatus::Pending && !self.is_withdrawn
    }
}
