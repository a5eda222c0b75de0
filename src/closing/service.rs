//! Closing service: validate, calculate, submit

use tracing::{info, warn};

use super::*;
use crate::reconciliation::*;
use crate::session::Session;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::DefaultClosingValidator;

/// Runs closings against a back office
pub struct ClosingService<B: BackOffice> {
    backend: B,
    calculator: ReconciliationCalculator,
    validator: Box<dyn ClosingValidator>,
}

impl<B: BackOffice> ClosingService<B> {
    /// Create a service with the standard commission policy
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            calculator: ReconciliationCalculator::new(),
            validator: Box::new(DefaultClosingValidator),
        }
    }

    /// Create a service with a custom calculator
    pub fn with_calculator(backend: B, calculator: ReconciliationCalculator) -> Self {
        Self {
            backend,
            calculator,
            validator: Box::new(DefaultClosingValidator),
        }
    }

    /// Replace the form validator
    pub fn with_validator(mut self, validator: Box<dyn ClosingValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn calculator(&self) -> &ReconciliationCalculator {
        &self.calculator
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    // Live previews, recomputed on every keystroke
    pub fn preview_waiter(&self, form: &WaiterClosingForm) -> WaiterSettlement {
        self.calculator.waiter(&form.input)
    }

    pub fn preview_cashier(&self, form: &CashierClosingForm) -> CashierBalance {
        self.calculator.cashier(&form.input)
    }

    pub fn preview_fixed(&self, form: &FixedClosingForm) -> GroupBalance {
        self.calculator.fixed_group(&form.inputs(), form.group_change)
    }

    /// People offered on the waiter form
    pub async fn waiters(&self) -> EventBarResult<Vec<Person>> {
        self.backend.list_waiters().await
    }

    /// People offered on the cashier forms
    pub async fn cashiers(&self) -> EventBarResult<Vec<Person>> {
        self.backend.list_cashiers().await
    }

    /// Validate and file a waiter closing
    pub async fn submit_waiter(
        &mut self,
        session: &Session,
        form: &WaiterClosingForm,
    ) -> EventBarResult<SubmissionReceipt> {
        self.validator.validate_waiter(form)?;
        let context = session.closing_context()?;
        let waiter = form
            .waiter
            .as_ref()
            .ok_or_else(|| EventBarError::Validation("Select a waiter".to_string()))?;

        let result = self.calculator.waiter(&form.input);
        let payload = WaiterClosingPayload::build(&context, waiter, form, &result);

        let receipt = self
            .backend
            .submit_waiter_closing(&payload)
            .await
            .inspect_err(|e| warn!(waiter = %waiter.name, error = %e, "waiter closing failed"))?;

        info!(
            protocol = %receipt.protocol,
            event = %context.event_name,
            waiter = %waiter.name,
            direction = %result.direction,
            settlement = %result.settlement.to_decimal(),
            "waiter closing saved"
        );
        Ok(receipt)
    }

    /// Validate and file a mobile cashier closing
    pub async fn submit_cashier(
        &mut self,
        session: &Session,
        form: &CashierClosingForm,
    ) -> EventBarResult<SubmissionReceipt> {
        self.validator.validate_cashier(form)?;
        let context = session.closing_context()?;
        let cashier = form
            .cashier
            .as_ref()
            .ok_or_else(|| EventBarError::Validation("Select a cashier".to_string()))?;

        let result = self.calculator.cashier(&form.input);
        let payload = CashierClosingPayload::build(&context, cashier, form, &result);

        let receipt = self
            .backend
            .submit_cashier_closing(&payload)
            .await
            .inspect_err(|e| warn!(cashier = %cashier.name, error = %e, "cashier closing failed"))?;

        info!(
            protocol = %receipt.protocol,
            event = %context.event_name,
            cashier = %cashier.name,
            difference = %result.difference.to_decimal(),
            state = ?result.state,
            "cashier closing saved"
        );
        Ok(receipt)
    }

    /// Validate and file a fixed cashier group closing
    pub async fn submit_fixed(
        &mut self,
        session: &Session,
        form: &FixedClosingForm,
    ) -> EventBarResult<SubmissionReceipt> {
        self.validator.validate_fixed(form)?;
        let context = session.closing_context()?;

        let result = self.preview_fixed(form);
        let payload = FixedClosingPayload::build(&context, form, &result)?;

        let receipt = self
            .backend
            .submit_fixed_closing(&payload)
            .await
            .inspect_err(|e| warn!(cashiers = payload.cashiers.len(), error = %e, "group closing failed"))?;

        info!(
            protocol = %receipt.protocol,
            event = %context.event_name,
            cashiers = payload.cashiers.len(),
            difference = %result.group_difference.to_decimal(),
            "group closing saved"
        );
        Ok(receipt)
    }
}
