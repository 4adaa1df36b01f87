//! Client-side checks run before any staking, deposit or withdraw request.

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::types::ContractType;

pub const YEARLY_MINIMUM: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
pub const MONTHLY_MINIMUM: Decimal = Decimal::from_parts(500, 0, 0, false, 0);
pub const UNLIMITED_MINIMUM: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
pub const WITHDRAW_MINIMUM: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

/// Deposit suggested when a purchase is attempted with nothing to spend.
pub const SUGGESTED_DEPOSIT: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Shortest destination address the withdraw form accepts.
pub const MIN_ADDRESS_LEN: usize = 25;

/// Smallest stake the client lets through for `plan`. Unknown plans are left
/// to the server.
pub fn plan_minimum(plan: &ContractType) -> Option<Decimal> {
    match plan {
        ContractType::Yearly => Some(YEARLY_MINIMUM),
        ContractType::Monthly => Some(MONTHLY_MINIMUM),
        ContractType::Unlimited => Some(UNLIMITED_MINIMUM),
        ContractType::Other(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseDecision {
    /// Send the buy request.
    Proceed,
    /// Nothing to stake with; open the deposit flow instead.
    DepositFirst { suggested_amount: Decimal },
}

/// Decide what a "stake" action should do.
///
/// Order matters: an empty or unknown balance always leads to the deposit
/// flow, even when the amount is also below the plan minimum.
pub fn decide_purchase(
    plan: &ContractType,
    amount: Decimal,
    real_balance: Option<Decimal>,
) -> Result<PurchaseDecision, ValidationError> {
    let available = match real_balance {
        Some(b) if b > Decimal::ZERO => b,
        _ => {
            return Ok(PurchaseDecision::DepositFirst {
                suggested_amount: SUGGESTED_DEPOSIT,
            })
        }
    };

    match plan_minimum(plan) {
        Some(minimum) if amount < minimum => {
            return Err(ValidationError::BelowPlanMinimum {
                plan: plan.as_str().to_string(),
                minimum,
            })
        }
        None if amount <= Decimal::ZERO => {
            return Err(ValidationError::InvalidAmount(
                "amount must be positive".into(),
            ))
        }
        _ => {}
    }

    if amount > available {
        return Err(ValidationError::InsufficientBalance {
            requested: amount,
            available,
        });
    }
    Ok(PurchaseDecision::Proceed)
}

/// Check a withdrawal amount. The balance check only applies when the
/// balance is known.
pub fn validate_withdrawal(
    amount: Decimal,
    known_balance: Option<Decimal>,
) -> Result<(), ValidationError> {
    if amount < WITHDRAW_MINIMUM {
        return Err(ValidationError::BelowWithdrawMinimum {
            minimum: WITHDRAW_MINIMUM,
        });
    }
    if let Some(available) = known_balance {
        if amount > available {
            return Err(ValidationError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
    }
    Ok(())
}

pub fn validate_withdraw_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().chars().count() < MIN_ADDRESS_LEN {
        return Err(ValidationError::InvalidAddress);
    }
    Ok(())
}

/// Deposit amounts are floored at 1.
pub fn deposit_amount(requested: Decimal) -> Decimal {
    requested.max(Decimal::ONE)
}

/// Parse a user-entered amount such as `"250"` or `"12.5"`.
pub fn parse_amount(input: &str) -> Result<Decimal, ValidationError> {
    let input = input.trim();
    Decimal::from_str(input)
        .map_err(|_| ValidationError::InvalidAmount(format!("not a number: {input:?}")))
}

/// Amounts go over the wire as JSON numbers.
pub fn to_wire(amount: Decimal) -> Result<f64, ValidationError> {
    amount
        .to_f64()
        .ok_or_else(|| ValidationError::InvalidAmount(amount.to_string()))
}

/// Server-side floats as decimals, for comparisons against user input.
pub fn from_wire(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}
