//! In-memory back office for testing and demos

use async_trait::async_trait;
use chrono::{Local, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::closing::*;
use crate::history::{ClosingDetail, ClosingRecord};
use crate::session::User;
use crate::stock::*;
use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    events: Vec<String>,
    waiters: Vec<Person>,
    cashiers: Vec<Person>,
    closings: Vec<ClosingRecord>,
    products: Vec<Product>,
    registrations: Vec<Registration>,
    movements: Vec<MovementDetails>,
    audit: Vec<AuditEntry>,
    sequence: u64,
}

impl State {
    fn next_protocol(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}-{:06}", self.sequence)
    }

    fn registration(&self, id: &str) -> EventBarResult<&Registration> {
        self.registrations
            .iter()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| EventBarError::NotFound(format!("registration {id}")))
    }

    fn product_index(&self, id: &str) -> EventBarResult<usize> {
        self.products
            .iter()
            .position(|p| p.product_id == id)
            .ok_or_else(|| EventBarError::NotFound(format!("product {id}")))
    }

    /// One audit entry per receipt line
    fn log_receipt(&mut self, details: &MovementDetails, operator: &str) {
        for line in &details.products {
            self.audit.push(AuditEntry {
                id: details.id.clone(),
                kind: details.kind.clone(),
                date: Some(display_now()),
                product_name: Some(line.product_name.clone()),
                registration_name: Some(details.registration_name.clone()),
                operator: Some(operator.to_string()),
            });
        }
    }

    /// Apply item quantities in total units, all or nothing
    fn apply_items(&mut self, items: &[MovementItem], entry: bool) -> EventBarResult<Vec<ReceiptLine>> {
        let mut totals: HashMap<usize, u64> = HashMap::new();
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            let index = self.product_index(&item.product_id)?;
            let product = &self.products[index];
            *totals.entry(index).or_default() += product.units_for(item.box_quantity, item.unit_quantity);
            lines.push(ReceiptLine {
                product_name: product.product_name.clone(),
                box_quantity: item.box_quantity,
                unit_quantity: item.unit_quantity,
                units_per_box: product.units_per_box,
            });
        }

        let mut updated = Vec::with_capacity(totals.len());
        for (&index, &requested) in &totals {
            let product = &self.products[index];
            let available = product.total_units();
            let remaining = if entry {
                available.saturating_add(requested)
            } else {
                available.checked_sub(requested).ok_or_else(|| EventBarError::InsufficientStock {
                    product: product.product_name.clone(),
                    requested,
                    available,
                })?
            };
            updated.push((index, remaining));
        }

        for (index, units) in updated {
            let product = &mut self.products[index];
            let (boxes, loose) = if product.units_per_box == 0 {
                (0, units)
            } else {
                let per_box = u64::from(product.units_per_box);
                (units / per_box, units % per_box)
            };
            product.box_stock = u32::try_from(boxes).unwrap_or(u32::MAX);
            product.unit_stock = u32::try_from(loose).unwrap_or(u32::MAX);
        }

        Ok(lines)
    }
}

/// Back office double holding everything in memory
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackOffice {
    state: Arc<RwLock<State>>,
}

impl MemoryBackOffice {
    /// Create an empty back office
    pub fn new() -> Self {
        Self::default()
    }

    fn seed(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner));
        self
    }

    pub fn with_users(self, users: Vec<User>) -> Self {
        self.seed(|s| s.users = users)
    }

    pub fn with_events<I, S>(self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let events = events.into_iter().map(Into::into).collect();
        self.seed(|s| s.events = events)
    }

    pub fn with_waiters(self, waiters: Vec<Person>) -> Self {
        self.seed(|s| s.waiters = waiters)
    }

    pub fn with_cashiers(self, cashiers: Vec<Person>) -> Self {
        self.seed(|s| s.cashiers = cashiers)
    }

    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.seed(|s| s.products = products)
    }

    pub fn with_registrations(self, registrations: Vec<Registration>) -> Self {
        self.seed(|s| s.registrations = registrations)
    }

    fn read(&self) -> EventBarResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| EventBarError::Backend("state lock poisoned".to_string()))
    }

    fn write(&self) -> EventBarResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| EventBarError::Backend("state lock poisoned".to_string()))
    }

    /// Receipts of every movement and return recorded so far
    pub fn movements(&self) -> EventBarResult<Vec<MovementDetails>> {
        Ok(self.read()?.movements.clone())
    }

    /// Clear closings, movements and the audit log (useful for testing)
    pub fn clear(&self) -> EventBarResult<()> {
        let mut state = self.write()?;
        state.closings.clear();
        state.movements.clear();
        state.audit.clear();
        Ok(())
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

// Audit dates and verification stamps are stored already formatted
fn display_now() -> String {
    Local::now().format("%d/%m/%Y %H:%M").to_string()
}

#[async_trait]
impl BackOffice for MemoryBackOffice {
    async fn list_users(&self) -> EventBarResult<Vec<User>> {
        Ok(self.read()?.users.clone())
    }

    async fn list_events(&self) -> EventBarResult<Vec<String>> {
        Ok(self.read()?.events.clone())
    }

    async fn list_waiters(&self) -> EventBarResult<Vec<Person>> {
        Ok(self.read()?.waiters.clone())
    }

    async fn list_cashiers(&self) -> EventBarResult<Vec<Person>> {
        Ok(self.read()?.cashiers.clone())
    }

    async fn submit_waiter_closing(
        &mut self,
        payload: &WaiterClosingPayload,
    ) -> EventBarResult<SubmissionReceipt> {
        let mut state = self.write()?;
        let protocol = state.next_protocol("GAR");
        state.closings.push(ClosingRecord {
            protocol: protocol.clone(),
            timestamp: Some(now()),
            event_name: payload.event_name.clone(),
            operator_name: payload.operator_name.clone(),
            detail: ClosingDetail::Waiter {
                waiter_name: payload.waiter_name.clone(),
                gross_sales: payload.gross_sales,
                credit: payload.credit,
                debit: payload.debit,
                instant_payment: payload.instant_payment,
                stored_value: payload.stored_value,
                commission_total: payload.commission_total,
                settlement_label: payload.direction.label().to_string(),
                settlement: payload.settlement,
            },
        });
        debug!(%protocol, "waiter closing stored");
        Ok(SubmissionReceipt {
            protocol,
            person_name: Some(payload.waiter_name.clone()),
        })
    }

    async fn submit_cashier_closing(
        &mut self,
        payload: &CashierClosingPayload,
    ) -> EventBarResult<SubmissionReceipt> {
        let mut state = self.write()?;
        let protocol = state.next_protocol("CX");
        state.closings.push(ClosingRecord {
            protocol: protocol.clone(),
            timestamp: Some(now()),
            event_name: payload.event_name.clone(),
            operator_name: payload.operator_name.clone(),
            detail: ClosingDetail::Cashier {
                cashier_name: payload.cashier_name.clone(),
                gross_sales: payload.gross_sales,
                credit: payload.credit,
                debit: payload.debit,
                instant_payment: payload.instant_payment,
                stored_value: payload.stored_value,
                physical_cash: payload.physical_cash,
                difference: payload.difference,
            },
        });
        debug!(%protocol, "cashier closing stored");
        Ok(SubmissionReceipt {
            protocol,
            person_name: Some(payload.cashier_name.clone()),
        })
    }

    // Each cashier of the group becomes a record under the group protocol
    async fn submit_fixed_closing(
        &mut self,
        payload: &FixedClosingPayload,
    ) -> EventBarResult<SubmissionReceipt> {
        if payload.cashiers.is_empty() {
            return Err(EventBarError::Validation(
                "A cashier group needs at least one cashier".to_string(),
            ));
        }

        let mut state = self.write()?;
        let protocol = state.next_protocol("CXF");
        let timestamp = now();
        for cashier in &payload.cashiers {
            state.closings.push(ClosingRecord {
                protocol: protocol.clone(),
                timestamp: Some(timestamp.clone()),
                event_name: payload.event_name.clone(),
                operator_name: payload.operator_name.clone(),
                detail: ClosingDetail::Cashier {
                    cashier_name: cashier.cashier_name.clone(),
                    gross_sales: cashier.gross_sales,
                    credit: cashier.credit,
                    debit: cashier.debit,
                    instant_payment: cashier.instant_payment,
                    stored_value: cashier.stored_value,
                    physical_cash: cashier.physical_cash,
                    difference: cashier.difference,
                },
            });
        }
        debug!(%protocol, cashiers = payload.cashiers.len(), "group closing stored");
        Ok(SubmissionReceipt {
            protocol,
            person_name: None,
        })
    }

    async fn list_closings(&self, event_name: &str) -> EventBarResult<Vec<ClosingRecord>> {
        Ok(self
            .read()?
            .closings
            .iter()
            .filter(|c| c.event_name == event_name)
            .cloned()
            .collect())
    }

    async fn list_products(&self) -> EventBarResult<Vec<Product>> {
        Ok(self.read()?.products.clone())
    }

    async fn create_product(&mut self, product: &NewProduct) -> EventBarResult<Product> {
        let created = Product {
            product_id: Uuid::new_v4().to_string(),
            product_name: product.product_name.clone(),
            units_per_box: product.units_per_box,
            box_stock: product.box_stock,
            unit_stock: product.unit_stock,
            last_verified: None,
        };
        self.write()?.products.push(created.clone());
        info!(product = %created.product_name, "product created");
        Ok(created)
    }

    async fn update_inventory(&mut self, count: &InventoryCount) -> EventBarResult<()> {
        let mut state = self.write()?;
        let index = state.product_index(&count.product_id)?;
        let product = &mut state.products[index];
        product.box_stock = count.new_box_stock;
        product.unit_stock = count.new_unit_stock;
        product.last_verified = Some(display_now());
        debug!(product = %product.product_name, operator = %count.operator_name, "inventory counted");

        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            kind: INVENTORY_AUDIT_KIND.to_string(),
            date: product.last_verified.clone(),
            product_name: Some(product.product_name.clone()),
            registration_name: Some(format!(
                "{} cx + {} un",
                count.new_box_stock, count.new_unit_stock
            )),
            operator: Some(count.operator_name.clone()),
        };
        state.audit.push(entry);
        Ok(())
    }

    async fn list_registrations(&self) -> EventBarResult<Vec<Registration>> {
        Ok(self.read()?.registrations.clone())
    }

    async fn save_registration(
        &mut self,
        registration: &Registration,
    ) -> EventBarResult<Registration> {
        registration.validate()?;
        let mut state = self.write()?;

        match &registration.id {
            Some(id) => {
                let existing = state
                    .registrations
                    .iter_mut()
                    .find(|r| r.id.as_deref() == Some(id.as_str()))
                    .ok_or_else(|| EventBarError::NotFound(format!("registration {id}")))?;
                *existing = registration.clone();
                Ok(registration.clone())
            }
            None => {
                let mut saved = registration.clone();
                saved.id = Some(Uuid::new_v4().to_string());
                state.registrations.push(saved.clone());
                Ok(saved)
            }
        }
    }

    async fn delete_registration(&mut self, registration_id: &str) -> EventBarResult<()> {
        let mut state = self.write()?;
        let before = state.registrations.len();
        state
            .registrations
            .retain(|r| r.id.as_deref() != Some(registration_id));
        if state.registrations.len() == before {
            return Err(EventBarError::NotFound(format!(
                "registration {registration_id}"
            )));
        }
        Ok(())
    }

    async fn record_movement(
        &mut self,
        movement: &MovementPayload,
    ) -> EventBarResult<MovementReceipt> {
        if movement.products.is_empty() {
            return Err(EventBarError::Validation("A movement needs items".to_string()));
        }

        let mut state = self.write()?;
        let registration = state.registration(&movement.registration_id)?.clone();
        if !movement.kind.accepts(&registration) {
            return Err(EventBarError::Validation(format!(
                "{} cannot be recorded against '{}'",
                movement.kind.title(),
                registration.name
            )));
        }

        let products = state.apply_items(&movement.products, movement.kind.is_entry())?;
        let details = MovementDetails {
            id: state.next_protocol("MOV"),
            kind: movement.kind.code().to_string(),
            date: Some(now()),
            registration_name: registration.name,
            doc: registration.doc,
            contact: registration.contact,
            plate: registration.plate,
            return_date: movement.return_date.clone(),
            event_name: None,
            products,
        };
        state.movements.push(details.clone());
        state.log_receipt(&details, &movement.operator_name);
        info!(id = %details.id, kind = %details.kind, "movement recorded");
        Ok(MovementReceipt { details })
    }

    // Returned goods leave stock for the supplier
    async fn record_return(
        &mut self,
        stock_return: &ReturnPayload,
    ) -> EventBarResult<MovementReceipt> {
        if stock_return.products.is_empty() {
            return Err(EventBarError::Validation("A return needs items".to_string()));
        }

        let mut state = self.write()?;
        let registration = state.registration(&stock_return.registration_id)?.clone();
        if !state.registration(&stock_return.event_id)?.is_event() {
            return Err(EventBarError::Validation(
                "The origin must be an event registration".to_string(),
            ));
        }

        let products = state.apply_items(&stock_return.products, false)?;
        let details = MovementDetails {
            id: state.next_protocol("DEV"),
            kind: RETURN_RECEIPT_KIND.to_string(),
            date: Some(now()),
            registration_name: registration.name,
            doc: registration.doc,
            contact: registration.contact,
            plate: registration.plate,
            return_date: None,
            event_name: Some(stock_return.event_name.clone()),
            products,
        };
        state.movements.push(details.clone());
        state.log_receipt(&details, &stock_return.operator_name);
        info!(id = %details.id, "return recorded");
        Ok(MovementReceipt { details })
    }

    async fn list_audit(&self) -> EventBarResult<Vec<AuditEntry>> {
        Ok(self.read()?.audit.iter().rev().cloned().collect())
    }

    async fn transaction_details(&self, transaction_id: &str) -> EventBarResult<MovementDetails> {
        self.read()?
            .movements
            .iter()
            .find(|m| m.id == transaction_id)
            .cloned()
            .ok_or_else(|| EventBarError::NotFound(format!("transaction {transaction_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            product_id: "p1".to_string(),
            product_name: "Cerveja".to_string(),
            units_per_box: 12,
            box_stock: 2,
            unit_stock: 0,
            last_verified: None,
        }
    }

    fn client() -> Registration {
        let mut client = Registration::new(RegistrationKind::Person, "João");
        client.id = Some("c1".to_string());
        client.doc = Some("12345678900".to_string());
        client.contact = Some("9999".to_string());
        client
    }

    fn sale(boxes: u32, units: u32) -> MovementPayload {
        MovementPayload {
            kind: MovementKind::VendaDireta,
            registration_id: "c1".to_string(),
            notes: String::new(),
            operator_name: "Fabio".to_string(),
            products: vec![MovementItem {
                product_id: "p1".to_string(),
                product_name: "Cerveja".to_string(),
                box_quantity: boxes,
                unit_quantity: units,
            }],
            return_date: None,
        }
    }

    #[tokio::test]
    async fn test_protocols_are_sequential() {
        let mut backend = MemoryBackOffice::new();
        let payload = FixedClosingPayload {
            event_name: "Rodeio".to_string(),
            operator_name: "Fabio".to_string(),
            has_change: false,
            change_amount: Cents::ZERO,
            cashiers: Vec::new(),
            group_difference: Cents::ZERO,
        };
        assert!(backend.submit_fixed_closing(&payload).await.is_err());

        let users = backend.list_users().await.unwrap();
        assert!(users.is_empty());
        let mut state = backend.write().unwrap();
        assert_eq!(state.next_protocol("GAR"), "GAR-000001");
        assert_eq!(state.next_protocol("CX"), "CX-000002");
    }

    #[tokio::test]
    async fn test_movement_applies_total_units() {
        let mut backend = MemoryBackOffice::new()
            .with_products(vec![product()])
            .with_registrations(vec![client()]);

        let receipt = backend.record_movement(&sale(0, 5)).await.unwrap();
        assert_eq!(receipt.details.kind, "VENDA_DIRETA");
        assert_eq!(receipt.details.registration_name, "João");
        assert_eq!(receipt.details.products[0].units_per_box, 12);

        let stock = backend.list_products().await.unwrap();
        assert_eq!(stock[0].box_stock, 1);
        assert_eq!(stock[0].unit_stock, 7);

        let err = backend.record_movement(&sale(2, 0)).await.unwrap_err();
        assert!(matches!(err, EventBarError::InsufficientStock { requested: 24, available: 19, .. }));
        assert_eq!(backend.list_products().await.unwrap()[0].total_units(), 19);

        // Only the accepted movement is audited, and it can be reprinted
        let audit = backend.list_audit().await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].id, receipt.details.id);
        assert_eq!(audit[0].category(), AuditCategory::Exit);
        assert_eq!(audit[0].operator.as_deref(), Some("Fabio"));
        let reprint = backend.transaction_details(&audit[0].id).await.unwrap();
        assert_eq!(reprint, receipt.details);
    }

    #[tokio::test]
    async fn test_movement_checks_counterpart_kind() {
        let mut backend = MemoryBackOffice::new()
            .with_products(vec![product()])
            .with_registrations(vec![client()]);
        let mut payload = sale(1, 0);
        payload.kind = MovementKind::SaidaEvento;
        assert!(matches!(
            backend.record_movement(&payload).await,
            Err(EventBarError::Validation(_))
        ));

        payload.registration_id = "missing".to_string();
        assert!(matches!(
            backend.record_movement(&payload).await,
            Err(EventBarError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_registration_save_and_delete() {
        let mut backend = MemoryBackOffice::new();
        let mut draft = client();
        draft.id = None;

        let saved = backend.save_registration(&draft).await.unwrap();
        let id = saved.id.clone().unwrap();

        let mut edited = saved.clone();
        edited.notes = Some("VIP".to_string());
        backend.save_registration(&edited).await.unwrap();
        let list = backend.list_registrations().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].notes.as_deref(), Some("VIP"));

        backend.delete_registration(&id).await.unwrap();
        assert!(backend.delete_registration(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_inventory_update_marks_verified() {
        let mut backend = MemoryBackOffice::new().with_products(vec![product()]);
        backend
            .update_inventory(&InventoryCount::from_input("p1", "5", "3", "Fabio"))
            .await
            .unwrap();
        let stock = backend.list_products().await.unwrap();
        assert_eq!(stock[0].total_units(), 63);
        assert!(stock[0].last_verified.is_some());

        let audit = backend.list_audit().await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].category(), AuditCategory::Inventory);
        assert_eq!(audit[0].registration_name.as_deref(), Some("5 cx + 3 un"));
        assert!(!audit[0].can_reprint());
        assert!(backend.transaction_details(&audit[0].id).await.is_err());

        assert!(backend
            .update_inventory(&InventoryCount::from_input("p9", "1", "0", "Fabio"))
            .await
            .is_err());
    }
}
