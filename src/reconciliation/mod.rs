//! Closing reconciliation calculator
//!
//! Pure functions turning the amounts typed on a closing form into a
//! settlement (waiters) or a cash difference (cashiers). Nothing here keeps
//! state or fails: callers recompute the whole result on every input change.

pub mod cashier;
pub mod waiter;

pub use cashier::*;
pub use waiter::*;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Commission rates paid to waiters, in percent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionPolicy {
    /// Rate over sales not paid with cashless cards (8%)
    pub sales_rate: BigDecimal,
    /// Rate over cashless card sales (4%)
    pub cashless_rate: BigDecimal,
}

impl CommissionPolicy {
    /// Create a policy, rejecting rates outside 0..=100
    pub fn new(sales_rate: BigDecimal, cashless_rate: BigDecimal) -> EventBarResult<Self> {
        let policy = Self {
            sales_rate,
            cashless_rate,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// The house standard: 8% over sales, 4% over cashless
    pub fn standard() -> Self {
        Self {
            sales_rate: BigDecimal::from(8),
            cashless_rate: BigDecimal::from(4),
        }
    }

    pub fn validate(&self) -> EventBarResult<()> {
        let zero = BigDecimal::from(0);
        let hundred = BigDecimal::from(100);
        for (name, rate) in [("sales", &self.sales_rate), ("cashless", &self.cashless_rate)] {
            if *rate < zero || *rate > hundred {
                return Err(EventBarError::InvalidPolicy(format!(
                    "{name} rate must be between 0 and 100, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Calculator for the three closing variants
#[derive(Debug, Clone, Default)]
pub struct ReconciliationCalculator {
    policy: CommissionPolicy,
}

impl ReconciliationCalculator {
    /// Create a calculator with the standard commission policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calculator with a custom commission policy
    pub fn with_policy(policy: CommissionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CommissionPolicy {
        &self.policy
    }

    /// Waiter closing: commission and settlement direction
    pub fn waiter(&self, input: &ClosingInput) -> WaiterSettlement {
        WaiterSettlement::calculate(input, &self.policy)
    }

    /// Mobile cashier closing: expected cash and difference
    pub fn cashier(&self, input: &ClosingInput) -> CashierBalance {
        CashierBalance::calculate(input)
    }

    /// Fixed cashier group: per-cashier balances and the group difference
    pub fn fixed_group(&self, entries: &[ClosingInput], group_change: Adjustment) -> GroupBalance {
        GroupBalance::calculate(entries, group_change)
    }
}
