//! Cashier closings: mobile cashier and fixed cashier groups

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Result of a single cashier closing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashierBalance {
    /// Cash the cashier should present
    pub expected_cash: Cents,
    pub counted_cash: Cents,
    /// Counted minus expected; negative is a shortfall
    pub difference: Cents,
    pub state: BalanceState,
}

impl CashierBalance {
    /// Mobile cashier formula, change float included when flagged
    pub fn calculate(input: &ClosingInput) -> Self {
        let expected_cash = expected_without_change(input) + input.change.effective();
        Self::from_expected(expected_cash, input.physical_cash.non_negative())
    }

    /// Per-cashier formula inside a fixed group, where the change float is
    /// shared by the group and never counted per cashier
    pub fn calculate_in_group(input: &ClosingInput) -> Self {
        Self::from_expected(
            expected_without_change(input),
            input.physical_cash.non_negative(),
        )
    }

    fn from_expected(expected_cash: Cents, counted_cash: Cents) -> Self {
        let difference = counted_cash - expected_cash;
        Self {
            expected_cash,
            counted_cash,
            difference,
            state: BalanceState::of(difference),
        }
    }
}

fn expected_without_change(input: &ClosingInput) -> Cents {
    input.gross_sales.non_negative() - input.electronic_total() - input.reversal.effective()
}

/// Result of a fixed cashier group closing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBalance {
    /// Per-cashier balances in entry order
    pub entries: Vec<CashierBalance>,
    pub total_counted: Cents,
    pub group_expected: Cents,
    /// Shared change float, zero when the switch is off
    pub group_change: Cents,
    pub group_difference: Cents,
    pub state: BalanceState,
}

impl GroupBalance {
    pub fn calculate(inputs: &[ClosingInput], group_change: Adjustment) -> Self {
        let entries: Vec<CashierBalance> =
            inputs.iter().map(CashierBalance::calculate_in_group).collect();

        let total_counted: Cents = entries.iter().map(|e| e.counted_cash).sum();
        let group_expected: Cents = entries.iter().map(|e| e.expected_cash).sum();
        let group_change = group_change.effective();
        let group_difference = total_counted - group_expected - group_change;

        Self {
            entries,
            total_counted,
            group_expected,
            group_change,
            group_difference,
            state: BalanceState::of(group_difference),
        }
    }

    /// Number of cashiers short on cash
    pub fn shortfall_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == BalanceState::Shortfall)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cashier(gross: i64, counted: i64) -> ClosingInput {
        ClosingInput {
            gross_sales: Cents::from_major(gross),
            physical_cash: Cents::from_major(counted),
            ..ClosingInput::default()
        }
    }

    #[test]
    fn test_mobile_cashier_shortfall() {
        let result = CashierBalance::calculate(&cashier(500, 480));
        assert_eq!(result.expected_cash, Cents::from_major(500));
        assert_eq!(result.difference, Cents::from_major(-20));
        assert_eq!(result.state, BalanceState::Shortfall);
    }

    #[test]
    fn test_mobile_cashier_with_payments_change_and_reversal() {
        let mut input = cashier(1000, 720);
        input.credit = Cents::from_major(200);
        input.debit = Cents::from_major(50);
        input.instant_payment = Cents::from_major(30);
        input.stored_value = Cents::from_major(20);
        input.change = Adjustment::of(Cents::from_major(100));
        input.reversal = Adjustment::of(Cents::from_major(80));

        // (1000 + 100) - 300 - 80
        let result = CashierBalance::calculate(&input);
        assert_eq!(result.expected_cash, Cents::from_major(720));
        assert_eq!(result.difference, Cents::ZERO);
        assert_eq!(result.state, BalanceState::Balanced);
    }

    #[test]
    fn test_mobile_cashier_ignores_switched_off_amounts() {
        let mut input = cashier(500, 510);
        input.change = Adjustment {
            applied: false,
            amount: Cents::from_major(100),
        };
        input.reversal = Adjustment {
            applied: false,
            amount: Cents::from_major(40),
        };
        let result = CashierBalance::calculate(&input);
        assert_eq!(result.expected_cash, Cents::from_major(500));
        assert_eq!(result.difference, Cents::from_major(10));
        assert_eq!(result.state, BalanceState::Surplus);
    }

    #[test]
    fn test_group_of_two() {
        let inputs = [cashier(300, 300), cashier(200, 190)];
        let result = GroupBalance::calculate(&inputs, Adjustment::NONE);

        assert_eq!(result.entries[0].difference, Cents::ZERO);
        assert_eq!(result.entries[1].difference, Cents::from_major(-10));
        assert_eq!(result.total_counted, Cents::from_major(490));
        assert_eq!(result.group_expected, Cents::from_major(500));
        assert_eq!(result.group_difference, Cents::from_major(-10));
        assert_eq!(result.state, BalanceState::Shortfall);
        assert_eq!(result.shortfall_count(), 1);
    }

    #[test]
    fn test_group_change_is_shared_not_per_cashier() {
        let mut first = cashier(300, 350);
        // a per-entry change value never takes part in a group closing
        first.change = Adjustment::of(Cents::from_major(999));
        let inputs = [first, cashier(200, 200)];

        let result = GroupBalance::calculate(&inputs, Adjustment::of(Cents::from_major(50)));
        assert_eq!(result.entries[0].expected_cash, Cents::from_major(300));
        assert_eq!(result.group_change, Cents::from_major(50));
        assert_eq!(result.group_difference, Cents::ZERO);

        let switched_off = Adjustment {
            applied: false,
            amount: Cents::from_major(50),
        };
        let result = GroupBalance::calculate(&inputs, switched_off);
        assert_eq!(result.group_change, Cents::ZERO);
        assert_eq!(result.group_difference, Cents::from_major(50));
    }

    #[test]
    fn test_group_reversal_is_per_cashier() {
        let mut first = cashier(300, 250);
        first.reversal = Adjustment::of(Cents::from_major(50));
        let result = GroupBalance::calculate(&[first], Adjustment::NONE);
        assert_eq!(result.group_expected, Cents::from_major(250));
        assert_eq!(result.group_difference, Cents::ZERO);
    }

    #[test]
    fn test_empty_group_is_balanced() {
        let result = GroupBalance::calculate(&[], Adjustment::NONE);
        assert!(result.entries.is_empty());
        assert_eq!(result.group_difference, Cents::ZERO);
        assert_eq!(result.state, BalanceState::Balanced);
    }
}
