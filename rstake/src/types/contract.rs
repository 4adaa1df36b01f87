use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Staking plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContractType {
    /// Flexible plan with no end date; the only plan that can be unstaked.
    Unlimited,
    Monthly,
    Yearly,
    Other(String),
}

impl From<String> for ContractType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "unlimited" => ContractType::Unlimited,
            "monthly" => ContractType::Monthly,
            "yearly" => ContractType::Yearly,
            _ => ContractType::Other(s),
        }
    }
}

impl From<ContractType> for String {
    fn from(t: ContractType) -> Self {
        t.as_str().to_string()
    }
}

impl ContractType {
    pub fn as_str(&self) -> &str {
        match self {
            ContractType::Unlimited => "unlimited",
            ContractType::Monthly => "monthly",
            ContractType::Yearly => "yearly",
            ContractType::Other(s) => s,
        }
    }

    /// Marketing label shown next to a position.
    pub fn label(&self) -> &str {
        match self {
            ContractType::Unlimited => "Flexible (9% per month)",
            ContractType::Monthly => "Monthly (20% per month)",
            ContractType::Yearly => "Annual (30% per month)",
            ContractType::Other(_) => "Unknown",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyContractRequest {
    #[serde(rename = "type")]
    pub contract_type: ContractType,
    pub amount: f64,
}

/// Body of the unstake and resume calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRef {
    pub puid: String,
}

/// A staking position as the server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: i64,
    #[serde(default)]
    pub contract_id: Option<i64>,
    #[serde(default)]
    pub puid: Option<String>,
    pub contract_type: ContractType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub staked_amount: f64,
    /// Reward cap; zero or absent for the open-ended flexible plan.
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_contract_reward: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_reward_received: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contract_reward_rate: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_reward_amount: f64,
    #[serde(default)]
    pub next_reward_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_unstakeable: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_unstaked: bool,
    #[serde(default)]
    pub unstaked_at: Option<DateTime<Utc>>,
    #[serde(rename = "isStakedAmountWithdrawen", default, deserialize_with = "null_as_default")]
    pub is_staked_amount_withdrawn: bool,
    #[serde(rename = "stakedAmountWithdrawenAt", default)]
    pub staked_amount_withdrawn_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub filled_percent: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Contract {
    /// Share of the reward cap already paid out, clamped to `0..=100`.
    /// Flexible contracts have no cap and always report zero.
    pub fn progress_percent(&self) -> f64 {
        if self.contract_type == ContractType::Unlimited {
            return 0.0;
        }
        if let Some(p) = self.filled_percent {
            return p.clamp(0.0, 100.0);
        }
        let cap = if self.max_contract_reward > 0.0 {
            self.max_contract_reward
        } else {
            1.0
        };
        (self.total_reward_received / cap * 100.0).clamp(0.0, 100.0)
    }
}

/// State of a contract after an unstake or resume call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractStateChange {
    pub puid: String,
    #[serde(default)]
    pub contract_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_unstaked: bool,
    #[serde(default)]
    pub unstaked_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub contract_type: ContractType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub staked_amount: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_contract_reward: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_reward_received: f64,
    #[serde(default)]
    pub next_reward_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_reward_amount: Option<f64>,
}

/// Aggregate numbers over all of the user's contracts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractStatistic {
    #[serde(deserialize_with = "null_as_default")]
    pub total_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_contracts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_reward_received: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_account_reward: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub max_contract_reward: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub avg_reward_rate: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub contract_reward_remaining: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_profit: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub avg_profit: f64,
}
