//! Traits for the back-office boundary and form validation

use async_trait::async_trait;

use crate::closing::*;
use crate::history::ClosingRecord;
use crate::session::User;
use crate::stock::*;
use crate::types::*;

/// Remote back office the client talks to
///
/// It is the system of record for people, events, closings and stock. This
/// trait lets the crate work against the HTTP API, an in-memory double, or
/// anything else that answers the same calls.
#[async_trait]
pub trait BackOffice: Send + Sync {
    /// Operator accounts used for login
    async fn list_users(&self) -> EventBarResult<Vec<User>>;

    /// Names of the events a closing can be filed under
    async fn list_events(&self) -> EventBarResult<Vec<String>>;

    async fn list_waiters(&self) -> EventBarResult<Vec<Person>>;

    async fn list_cashiers(&self) -> EventBarResult<Vec<Person>>;

    /// Store a waiter closing and return the assigned protocol
    async fn submit_waiter_closing(
        &mut self,
        payload: &WaiterClosingPayload,
    ) -> EventBarResult<SubmissionReceipt>;

    /// Store a mobile cashier closing and return the assigned protocol
    async fn submit_cashier_closing(
        &mut self,
        payload: &CashierClosingPayload,
    ) -> EventBarResult<SubmissionReceipt>;

    /// Store a fixed cashier group closing and return the assigned protocol
    async fn submit_fixed_closing(
        &mut self,
        payload: &FixedClosingPayload,
    ) -> EventBarResult<SubmissionReceipt>;

    /// Closings filed under an event
    async fn list_closings(&self, event_name: &str) -> EventBarResult<Vec<ClosingRecord>>;

    /// Current stock of every product
    async fn list_products(&self) -> EventBarResult<Vec<Product>>;

    async fn create_product(&mut self, product: &NewProduct) -> EventBarResult<Product>;

    /// Overwrite a product's stock with a physical count
    async fn update_inventory(&mut self, count: &InventoryCount) -> EventBarResult<()>;

    /// Clients, suppliers and events used as movement counterparts
    async fn list_registrations(&self) -> EventBarResult<Vec<Registration>>;

    /// Create a registration, or update it when it already has an id
    async fn save_registration(&mut self, registration: &Registration)
        -> EventBarResult<Registration>;

    async fn delete_registration(&mut self, registration_id: &str) -> EventBarResult<()>;

    async fn record_movement(&mut self, movement: &MovementPayload)
        -> EventBarResult<MovementReceipt>;

    async fn record_return(&mut self, stock_return: &ReturnPayload)
        -> EventBarResult<MovementReceipt>;

    /// Stock audit log, newest first
    async fn list_audit(&self) -> EventBarResult<Vec<AuditEntry>>;

    /// Receipt of a past movement or return, for reprinting
    async fn transaction_details(&self, transaction_id: &str) -> EventBarResult<MovementDetails>;
}

/// Trait for the checks a closing form must pass before submission
pub trait ClosingValidator: Send + Sync {
    fn validate_waiter(&self, form: &WaiterClosingForm) -> EventBarResult<()>;

    fn validate_cashier(&self, form: &CashierClosingForm) -> EventBarResult<()>;

    fn validate_fixed(&self, form: &FixedClosingForm) -> EventBarResult<()>;
}
