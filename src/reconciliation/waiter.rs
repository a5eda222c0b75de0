//! Waiter closing: commission split and settlement

use serde::{Deserialize, Serialize};

use super::CommissionPolicy;
use crate::types::*;

/// Result of a waiter closing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiterSettlement {
    /// Sales the standard rate applies to
    pub commission_base: Cents,
    /// "Comissão 8%"
    pub sales_commission: Cents,
    /// "Comissão 4%"
    pub cashless_commission: Cents,
    /// "Comissão Total"
    pub commission_total: Cents,
    /// Part of the sales the waiter collected as cash
    pub cash_portion: Cents,
    /// Cash after the manual reversal
    pub adjusted_cash: Cents,
    pub direction: SettlementDirection,
    /// Amount owed in `direction`, never negative
    pub settlement: Cents,
}

impl WaiterSettlement {
    /// Run the waiter closing formula
    ///
    /// A settlement of zero (cash equal to commission) is reported as
    /// collect-from-waiter.
    pub fn calculate(input: &ClosingInput, policy: &CommissionPolicy) -> Self {
        let gross_sales = input.gross_sales.non_negative();
        let stored_value = input.stored_value.non_negative();

        let commission_base = if stored_value.is_positive() {
            gross_sales - stored_value
        } else {
            gross_sales
        };
        let sales_commission = commission_base.percent(&policy.sales_rate);
        let cashless_commission = stored_value.percent(&policy.cashless_rate);
        let commission_total = sales_commission + cashless_commission;

        let cash_portion = gross_sales - input.electronic_total();
        let adjusted_cash = cash_portion - input.reversal.effective();

        let (direction, settlement) = if adjusted_cash < commission_total {
            (
                SettlementDirection::PayToWaiter,
                commission_total - adjusted_cash,
            )
        } else {
            (
                SettlementDirection::CollectFromWaiter,
                adjusted_cash - commission_total,
            )
        };

        Self {
            commission_base,
            sales_commission,
            cashless_commission,
            commission_total,
            cash_portion,
            adjusted_cash,
            direction,
            settlement,
        }
    }

    /// Settlement seen from the house: positive when the waiter pays,
    /// negative when the house pays
    pub fn signed_settlement(&self) -> Cents {
        self.adjusted_cash - self.commission_total
    }

    /// Label and amount as shown on the result panel
    pub fn summary_line(&self) -> String {
        format!("{} {}", self.direction.label(), self.settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculate(input: &ClosingInput) -> WaiterSettlement {
        WaiterSettlement::calculate(input, &CommissionPolicy::standard())
    }

    #[test]
    fn test_cash_only_sales() {
        let input = ClosingInput::with_gross_sales(Cents::from_major(1000));
        let result = calculate(&input);

        assert_eq!(result.sales_commission, Cents::from_major(80));
        assert_eq!(result.cashless_commission, Cents::ZERO);
        assert_eq!(result.commission_total, Cents::from_major(80));
        assert_eq!(result.cash_portion, Cents::from_major(1000));
        assert_eq!(result.adjusted_cash, Cents::from_major(1000));
        assert_eq!(result.direction, SettlementDirection::CollectFromWaiter);
        assert_eq!(result.settlement, Cents::from_major(920));
    }

    #[test]
    fn test_cashless_sales_use_reduced_rate() {
        let mut input = ClosingInput::with_gross_sales(Cents::from_major(1000));
        input.stored_value = Cents::from_major(200);
        let result = calculate(&input);

        assert_eq!(result.commission_base, Cents::from_major(800));
        assert_eq!(result.sales_commission, Cents::from_major(64));
        assert_eq!(result.cashless_commission, Cents::from_major(8));
        assert_eq!(result.commission_total, Cents::from_major(72));
        assert_eq!(result.cash_portion, Cents::from_major(800));
        assert_eq!(result.settlement, Cents::from_major(728));
        assert_eq!(result.direction, SettlementDirection::CollectFromWaiter);
    }

    #[test]
    fn test_card_heavy_shift_pays_waiter() {
        let mut input = ClosingInput::with_gross_sales(Cents::from_major(500));
        input.credit = Cents::from_major(300);
        input.debit = Cents::from_major(150);
        input.instant_payment = Cents::from_major(40);
        let result = calculate(&input);

        // commission 40, cash 10
        assert_eq!(result.commission_total, Cents::from_major(40));
        assert_eq!(result.adjusted_cash, Cents::from_major(10));
        assert_eq!(result.direction, SettlementDirection::PayToWaiter);
        assert_eq!(result.settlement, Cents::from_major(30));
        assert_eq!(result.signed_settlement(), Cents::from_major(-30));
    }

    #[test]
    fn test_equal_cash_and_commission_collects_zero() {
        let mut input = ClosingInput::with_gross_sales(Cents::from_major(100));
        input.credit = Cents::from_major(92);
        let result = calculate(&input);

        assert_eq!(result.adjusted_cash, result.commission_total);
        assert_eq!(result.direction, SettlementDirection::CollectFromWaiter);
        assert_eq!(result.settlement, Cents::ZERO);
    }

    #[test]
    fn test_reversal_only_counts_when_flagged() {
        let mut input = ClosingInput::with_gross_sales(Cents::from_major(1000));
        input.reversal = Adjustment {
            applied: false,
            amount: Cents::from_major(100),
        };
        assert_eq!(calculate(&input).settlement, Cents::from_major(920));

        input.reversal.applied = true;
        let result = calculate(&input);
        assert_eq!(result.adjusted_cash, Cents::from_major(900));
        assert_eq!(result.settlement, Cents::from_major(820));
    }

    #[test]
    fn test_electronic_payments_above_sales_go_negative() {
        let mut input = ClosingInput::with_gross_sales(Cents::from_major(100));
        input.credit = Cents::from_major(150);
        let result = calculate(&input);

        assert_eq!(result.cash_portion, Cents::from_major(-50));
        assert_eq!(result.direction, SettlementDirection::PayToWaiter);
        assert_eq!(result.settlement, Cents::from_major(58));
    }

    #[test]
    fn test_negative_inputs_are_clamped() {
        let mut input = ClosingInput::with_gross_sales(Cents::from_major(1000));
        input.credit = Cents::from_major(-500);
        input.stored_value = Cents::from_major(-200);
        let result = calculate(&input);

        assert_eq!(result.commission_total, Cents::from_major(80));
        assert_eq!(result.settlement, Cents::from_major(920));
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let mut input = ClosingInput::with_gross_sales(Cents::from_cents(123_457));
        input.stored_value = Cents::from_cents(33_301);
        input.debit = Cents::from_cents(10_000);
        input.reversal = Adjustment::of(Cents::from_cents(999));
        assert_eq!(calculate(&input), calculate(&input));
    }

    #[test]
    fn test_settlement_is_distance_between_cash_and_commission() {
        for gross in [0_i64, 1, 99, 1000, 1250, 98_765] {
            for credit in [0_i64, 1, 500, 2000] {
                let mut input = ClosingInput::with_gross_sales(Cents::from_cents(gross));
                input.credit = Cents::from_cents(credit);
                let result = calculate(&input);
                assert_eq!(result.settlement, result.signed_settlement().abs());
                assert_eq!(
                    result.direction == SettlementDirection::PayToWaiter,
                    result.adjusted_cash < result.commission_total
                );
            }
        }
    }

    #[test]
    fn test_summary_line() {
        let input = ClosingInput::with_gross_sales(Cents::from_major(1000));
        assert_eq!(calculate(&input).summary_line(), "Receber do Garçom: R$ 920,00");
    }
}
