//! JSON records exchanged with the back office for closings
//!
//! Field names follow the back office's Portuguese camelCase. Amounts are
//! decimal numbers in reais; a switched-off reversal or change is sent as 0.

use serde::{Deserialize, Serialize};

use super::{CashierClosingForm, FixedClosingForm, WaiterClosingForm};
use crate::reconciliation::{CashierBalance, GroupBalance, WaiterSettlement};
use crate::types::*;
use crate::utils::validation::normalize_machine_id;

/// Identifying fields every closing carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingContext {
    pub event_name: String,
    pub operator_name: String,
}

/// Body of `POST /api/closings/waiter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiterClosingPayload {
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "operatorName")]
    pub operator_name: String,
    pub cpf: String,
    #[serde(rename = "waiterName")]
    pub waiter_name: String,
    #[serde(rename = "numeroCamiseta")]
    pub shirt_number: String,
    #[serde(rename = "numeroMaquina")]
    pub machine_id: String,
    #[serde(rename = "valorTotal")]
    pub gross_sales: Cents,
    #[serde(rename = "credito")]
    pub credit: Cents,
    #[serde(rename = "debito")]
    pub debit: Cents,
    #[serde(rename = "pix")]
    pub instant_payment: Cents,
    #[serde(rename = "cashless")]
    pub stored_value: Cents,
    #[serde(rename = "temEstorno")]
    pub has_reversal: bool,
    #[serde(rename = "valorEstorno")]
    pub reversal_amount: Cents,
    #[serde(rename = "comissaoTotal")]
    pub commission_total: Cents,
    #[serde(rename = "acertoLabel")]
    pub direction: SettlementDirection,
    #[serde(rename = "valorAcerto")]
    pub settlement: Cents,
}

impl WaiterClosingPayload {
    pub fn build(
        context: &ClosingContext,
        waiter: &Person,
        form: &WaiterClosingForm,
        result: &WaiterSettlement,
    ) -> Self {
        let input = &form.input;
        Self {
            event_name: context.event_name.clone(),
            operator_name: context.operator_name.clone(),
            cpf: waiter.cpf.clone(),
            waiter_name: waiter.name.clone(),
            shirt_number: form.shirt_number.trim().to_string(),
            machine_id: normalize_machine_id(&form.machine_id),
            gross_sales: input.gross_sales.non_negative(),
            credit: input.credit.non_negative(),
            debit: input.debit.non_negative(),
            instant_payment: input.instant_payment.non_negative(),
            stored_value: input.stored_value.non_negative(),
            has_reversal: input.reversal.applied,
            reversal_amount: input.reversal.effective(),
            commission_total: result.commission_total,
            direction: result.direction,
            settlement: result.settlement,
        }
    }
}

/// Body of `POST /api/closings/cashier`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashierClosingPayload {
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "operatorName")]
    pub operator_name: String,
    pub cpf: String,
    #[serde(rename = "cashierName")]
    pub cashier_name: String,
    #[serde(rename = "numeroMaquina")]
    pub machine_id: String,
    #[serde(rename = "temTroco")]
    pub has_change: bool,
    #[serde(rename = "temEstorno")]
    pub has_reversal: bool,
    #[serde(rename = "valorTroco")]
    pub change_amount: Cents,
    #[serde(rename = "valorEstorno")]
    pub reversal_amount: Cents,
    #[serde(rename = "valorTotalVenda")]
    pub gross_sales: Cents,
    #[serde(rename = "credito")]
    pub credit: Cents,
    #[serde(rename = "debito")]
    pub debit: Cents,
    #[serde(rename = "pix")]
    pub instant_payment: Cents,
    #[serde(rename = "cashless")]
    pub stored_value: Cents,
    #[serde(rename = "dinheiroFisico")]
    pub physical_cash: Cents,
    /// Expected cash to present
    #[serde(rename = "valorAcerto")]
    pub expected_cash: Cents,
    #[serde(rename = "diferenca")]
    pub difference: Cents,
}

impl CashierClosingPayload {
    pub fn build(
        context: &ClosingContext,
        cashier: &Person,
        form: &CashierClosingForm,
        result: &CashierBalance,
    ) -> Self {
        let input = &form.input;
        Self {
            event_name: context.event_name.clone(),
            operator_name: context.operator_name.clone(),
            cpf: cashier.cpf.clone(),
            cashier_name: cashier.name.clone(),
            machine_id: normalize_machine_id(&form.machine_id),
            has_change: input.change.applied,
            has_reversal: input.reversal.applied,
            change_amount: input.change.effective(),
            reversal_amount: input.reversal.effective(),
            gross_sales: input.gross_sales.non_negative(),
            credit: input.credit.non_negative(),
            debit: input.debit.non_negative(),
            instant_payment: input.instant_payment.non_negative(),
            stored_value: input.stored_value.non_negative(),
            physical_cash: result.counted_cash,
            expected_cash: result.expected_cash,
            difference: result.difference,
        }
    }
}

/// One cashier inside `POST /api/closings/fixed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedCashierPayload {
    pub cpf: String,
    #[serde(rename = "cashierName")]
    pub cashier_name: String,
    #[serde(rename = "numeroMaquina")]
    pub machine_id: String,
    #[serde(rename = "temEstorno")]
    pub has_reversal: bool,
    #[serde(rename = "valorEstorno")]
    pub reversal_amount: Cents,
    #[serde(rename = "valorTotalVenda")]
    pub gross_sales: Cents,
    #[serde(rename = "credito")]
    pub credit: Cents,
    #[serde(rename = "debito")]
    pub debit: Cents,
    #[serde(rename = "pix")]
    pub instant_payment: Cents,
    #[serde(rename = "cashless")]
    pub stored_value: Cents,
    #[serde(rename = "dinheiroFisico")]
    pub physical_cash: Cents,
    #[serde(rename = "valorAcerto", default)]
    pub expected_cash: Cents,
    #[serde(rename = "diferenca", default)]
    pub difference: Cents,
}

/// Body of `POST /api/closings/fixed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedClosingPayload {
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "operatorName")]
    pub operator_name: String,
    #[serde(rename = "temTroco", default)]
    pub has_change: bool,
    #[serde(rename = "valorTroco")]
    pub change_amount: Cents,
    #[serde(rename = "caixas")]
    pub cashiers: Vec<FixedCashierPayload>,
    #[serde(rename = "diferencaTotal", default)]
    pub group_difference: Cents,
}

impl FixedClosingPayload {
    /// Build the group body. Every entry needs a selected cashier so the
    /// per-cashier lines add up to the group difference.
    pub fn build(
        context: &ClosingContext,
        form: &FixedClosingForm,
        result: &GroupBalance,
    ) -> EventBarResult<Self> {
        if form.entries.len() != result.entries.len() {
            return Err(EventBarError::Validation(format!(
                "Group result covers {} cashiers, form has {}",
                result.entries.len(),
                form.entries.len()
            )));
        }

        let cashiers = form
            .entries
            .iter()
            .zip(result.entries.iter())
            .enumerate()
            .map(|(index, (entry, balance))| {
                let cashier = entry.cashier.as_ref().ok_or_else(|| {
                    EventBarError::Validation(format!("Cashier {}: Select a cashier", index + 1))
                })?;
                let input = &entry.input;
                Ok(FixedCashierPayload {
                    cpf: cashier.cpf.clone(),
                    cashier_name: cashier.name.clone(),
                    machine_id: normalize_machine_id(&entry.machine_id),
                    has_reversal: input.reversal.applied,
                    reversal_amount: input.reversal.effective(),
                    gross_sales: input.gross_sales.non_negative(),
                    credit: input.credit.non_negative(),
                    debit: input.debit.non_negative(),
                    instant_payment: input.instant_payment.non_negative(),
                    stored_value: input.stored_value.non_negative(),
                    physical_cash: balance.counted_cash,
                    expected_cash: balance.expected_cash,
                    difference: balance.difference,
                })
            })
            .collect::<EventBarResult<Vec<_>>>()?;

        Ok(Self {
            event_name: context.event_name.clone(),
            operator_name: context.operator_name.clone(),
            has_change: form.group_change.applied,
            change_amount: result.group_change,
            cashiers,
            group_difference: result.group_difference,
        })
    }
}

/// Back office answer to a closing submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub protocol: String,
    /// Name echoed back by the back office
    #[serde(
        rename = "name",
        alias = "waiterName",
        alias = "cashierName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub person_name: Option<String>,
}
