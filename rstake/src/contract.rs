//! What a user may do with a contract, and the timers shown next to it.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::types::{Contract, ContractType};

/// Days an unstaked flexible contract can still be resumed.
pub const RESUME_WINDOW_DAYS: i64 = 7;

const ZERO_HMS: &str = "00:00:00";

/// Monthly profit rate advertised for a plan.
pub fn profit_rate(plan: &ContractType) -> Decimal {
    match plan {
        ContractType::Yearly => Decimal::from_parts(30, 0, 0, false, 2),
        ContractType::Monthly => Decimal::from_parts(20, 0, 0, false, 2),
        ContractType::Unlimited | ContractType::Other(_) => Decimal::from_parts(9, 0, 0, false, 2),
    }
}

/// Profit per month for staking `amount` on `plan`; zero for non-positive
/// amounts.
pub fn potential_profit(plan: &ContractType, amount: Decimal) -> Decimal {
    if amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    amount * profit_rate(plan)
}

fn is_live_flexible(c: &Contract) -> bool {
    c.contract_type == ContractType::Unlimited
        && c.puid.as_deref().is_some_and(|p| !p.is_empty())
        && !c.is_completed
}

/// Unstake is only offered on running flexible contracts the server marks
/// unstakeable.
pub fn can_unstake(c: &Contract) -> bool {
    is_live_flexible(c) && c.is_unstakeable && !c.is_unstaked
}

/// End of the resume window, if the contract has been unstaked.
pub fn resume_deadline(c: &Contract) -> Option<DateTime<Utc>> {
    c.unstaked_at.map(|at| at + Duration::days(RESUME_WINDOW_DAYS))
}

pub fn can_resume(c: &Contract, now: DateTime<Utc>) -> bool {
    is_live_flexible(c)
        && c.is_unstaked
        && resume_deadline(c).is_some_and(|deadline| now < deadline)
}

/// Time left to resume, clamped at zero.
pub fn resume_remaining(c: &Contract, now: DateTime<Utc>) -> Duration {
    resume_deadline(c)
        .map(|deadline| (deadline - now).max(Duration::zero()))
        .unwrap_or_else(Duration::zero)
}

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_hms(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

/// `DD:HH:MM:SS`.
pub fn format_dhms(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}:{:02}",
        secs / 86_400,
        secs % 86_400 / 3600,
        secs % 3600 / 60,
        secs % 60
    )
}

/// Countdown to the next reward payout. Unstaked contracts, missing and past
/// payout times all show `00:00:00`.
pub fn next_reward_countdown(c: &Contract, now: DateTime<Utc>) -> String {
    if c.is_unstaked {
        return ZERO_HMS.to_string();
    }
    match c.next_reward_at {
        Some(at) if at > now => format_hms(at - now),
        _ => ZERO_HMS.to_string(),
    }
}

pub fn resume_countdown(c: &Contract, now: DateTime<Utc>) -> String {
    format_dhms(resume_remaining(c, now))
}
