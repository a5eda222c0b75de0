//! Stock movements and returns

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Product, Registration, RegistrationKind};
use crate::types::*;

/// Kinds of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Sale straight to a client
    VendaDireta,
    /// Goods sent out to an event
    SaidaEvento,
    /// Material rented out, due back on a date
    AluguelMaterial,
    /// Purchase received from a supplier
    CompraFornecedor,
    /// Goods coming back from an event
    RetornoEvento,
}

impl MovementKind {
    pub const ALL: [MovementKind; 5] = [
        MovementKind::VendaDireta,
        MovementKind::SaidaEvento,
        MovementKind::AluguelMaterial,
        MovementKind::CompraFornecedor,
        MovementKind::RetornoEvento,
    ];

    /// Wire code, as sent in `type`
    pub fn code(&self) -> &'static str {
        match self {
            MovementKind::VendaDireta => "VENDA_DIRETA",
            MovementKind::SaidaEvento => "SAIDA_EVENTO",
            MovementKind::AluguelMaterial => "ALUGUEL_MATERIAL",
            MovementKind::CompraFornecedor => "COMPRA_FORNECEDOR",
            MovementKind::RetornoEvento => "RETORNO_EVENTO",
        }
    }

    /// Entries add to stock; every other kind removes from it
    pub fn is_entry(&self) -> bool {
        matches!(self, MovementKind::CompraFornecedor | MovementKind::RetornoEvento)
    }

    /// Event kinds are recorded against event registrations
    pub fn uses_event_registrations(&self) -> bool {
        matches!(self, MovementKind::SaidaEvento | MovementKind::RetornoEvento)
    }

    pub fn requires_return_date(&self) -> bool {
        *self == MovementKind::AluguelMaterial
    }

    /// Screen title
    pub fn title(&self) -> &'static str {
        match self {
            MovementKind::VendaDireta => "Venda Direta",
            MovementKind::SaidaEvento => "Saída para Evento",
            MovementKind::AluguelMaterial => "Aluguel de Material",
            MovementKind::CompraFornecedor => "Compra de Fornecedor",
            MovementKind::RetornoEvento => "Retorno de Evento",
        }
    }

    /// Label of the counterpart field
    pub fn counterpart_label(&self) -> &'static str {
        if self.uses_event_registrations() {
            "Evento"
        } else if *self == MovementKind::CompraFornecedor {
            "Fornecedor"
        } else {
            "Cliente"
        }
    }

    pub fn accepts(&self, registration: &Registration) -> bool {
        registration.is_event() == self.uses_event_registrations()
    }
}

/// One product line of a movement or return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementItem {
    pub product_id: String,
    pub product_name: String,
    pub box_quantity: u32,
    pub unit_quantity: u32,
}

impl MovementItem {
    pub fn new(product: &Product, box_quantity: u32, unit_quantity: u32) -> Self {
        Self {
            product_id: product.product_id.clone(),
            product_name: product.product_name.clone(),
            box_quantity,
            unit_quantity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.box_quantity == 0 && self.unit_quantity == 0
    }
}

/// Selected registration, as the drafts keep it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRef {
    pub id: String,
    pub name: String,
}

impl RegistrationRef {
    fn from_registration(registration: &Registration) -> EventBarResult<Self> {
        let id = registration.id.clone().ok_or_else(|| {
            EventBarError::Validation(format!("Registration '{}' has not been saved", registration.name))
        })?;
        Ok(Self {
            id,
            name: registration.name.clone(),
        })
    }
}

/// Body of `POST /api/stock/movements`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementPayload {
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub registration_id: String,
    pub notes: String,
    pub operator_name: String,
    pub products: Vec<MovementItem>,
    pub return_date: Option<String>,
}

fn validate_item(item: &MovementItem) -> EventBarResult<()> {
    if item.product_id.is_empty() || item.is_empty() {
        return Err(EventBarError::Validation(
            "Select a product and enter a quantity".to_string(),
        ));
    }
    Ok(())
}

fn check_index(len: usize, index: usize) -> EventBarResult<()> {
    if index >= len {
        return Err(EventBarError::NotFound(format!("item {index}")));
    }
    Ok(())
}

/// A movement being assembled on the entry screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementDraft {
    kind: MovementKind,
    items: Vec<MovementItem>,
    counterpart: Option<RegistrationRef>,
    pub notes: String,
    pub return_date: Option<String>,
}

impl MovementDraft {
    pub fn new(kind: MovementKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            counterpart: None,
            notes: String::new(),
            return_date: None,
        }
    }

    pub fn kind(&self) -> MovementKind {
        self.kind
    }

    pub fn items(&self) -> &[MovementItem] {
        &self.items
    }

    pub fn counterpart(&self) -> Option<&RegistrationRef> {
        self.counterpart.as_ref()
    }

    /// Registrations this kind of movement can be recorded against
    pub fn eligible<'a>(&self, registrations: &'a [Registration]) -> Vec<&'a Registration> {
        registrations.iter().filter(|r| self.kind.accepts(r)).collect()
    }

    pub fn select_counterpart(&mut self, registration: &Registration) -> EventBarResult<()> {
        if !self.kind.accepts(registration) {
            return Err(EventBarError::Validation(format!(
                "{} needs a {} registration",
                self.kind.title(),
                self.kind.counterpart_label()
            )));
        }
        self.counterpart = Some(RegistrationRef::from_registration(registration)?);
        Ok(())
    }

    pub fn clear_counterpart(&mut self) {
        self.counterpart = None;
    }

    /// Add a product line and return its position
    pub fn add_item(&mut self, product: &Product, boxes: u32, units: u32) -> EventBarResult<usize> {
        let item = MovementItem::new(product, boxes, units);
        self.check_stock(product, &item, None)?;
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    /// Overwrite the line at `index`
    pub fn replace_item(
        &mut self,
        index: usize,
        product: &Product,
        boxes: u32,
        units: u32,
    ) -> EventBarResult<()> {
        check_index(self.items.len(), index)?;
        let item = MovementItem::new(product, boxes, units);
        self.check_stock(product, &item, Some(index))?;
        self.items[index] = item;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> EventBarResult<MovementItem> {
        check_index(self.items.len(), index)?;
        Ok(self.items.remove(index))
    }

    /// Exits may not take more units than are on hand, counting what the
    /// draft already takes of the same product
    fn check_stock(
        &self,
        product: &Product,
        item: &MovementItem,
        replacing: Option<usize>,
    ) -> EventBarResult<()> {
        validate_item(item)?;
        if self.kind.is_entry() {
            return Ok(());
        }

        let already: u64 = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, existing)| Some(*i) != replacing && existing.product_id == product.product_id)
            .map(|(_, existing)| product.units_for(existing.box_quantity, existing.unit_quantity))
            .sum();
        let requested = already + product.units_for(item.box_quantity, item.unit_quantity);
        let available = product.total_units();

        if requested > available {
            debug!(product = %product.product_name, requested, available, "exit refused");
            return Err(EventBarError::InsufficientStock {
                product: product.product_name.clone(),
                requested,
                available,
            });
        }
        Ok(())
    }

    /// Produce the request body, checking the draft is complete
    pub fn finish(&self, operator_name: &str) -> EventBarResult<MovementPayload> {
        let counterpart = match (&self.counterpart, self.items.is_empty()) {
            (Some(counterpart), false) => counterpart,
            _ => {
                return Err(EventBarError::Validation(format!(
                    "Add items and select the {}",
                    self.kind.counterpart_label().to_lowercase()
                )))
            }
        };

        let return_date = if self.kind.requires_return_date() {
            let date = self
                .return_date
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .ok_or_else(|| {
                    EventBarError::Validation("A return date is required for rentals".to_string())
                })?;
            Some(date.to_string())
        } else {
            None
        };

        Ok(MovementPayload {
            kind: self.kind,
            registration_id: counterpart.id.clone(),
            notes: self.notes.clone(),
            operator_name: operator_name.to_string(),
            products: self.items.clone(),
            return_date,
        })
    }
}

/// Body of `POST /api/stock/returns`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPayload {
    pub registration_id: String,
    pub event_id: String,
    pub event_name: String,
    pub notes: String,
    pub operator_name: String,
    pub products: Vec<MovementItem>,
}

/// Goods handed back to a client or supplier after an event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnDraft {
    items: Vec<MovementItem>,
    counterpart: Option<RegistrationRef>,
    event: Option<RegistrationRef>,
    pub notes: String,
}

impl ReturnDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[MovementItem] {
        &self.items
    }

    pub fn select_counterpart(&mut self, registration: &Registration) -> EventBarResult<()> {
        if registration.is_event() {
            return Err(EventBarError::Validation(
                "A return goes to a client or supplier".to_string(),
            ));
        }
        self.counterpart = Some(RegistrationRef::from_registration(registration)?);
        Ok(())
    }

    pub fn select_event(&mut self, registration: &Registration) -> EventBarResult<()> {
        if registration.kind != RegistrationKind::Event {
            return Err(EventBarError::Validation(
                "The origin must be an event registration".to_string(),
            ));
        }
        self.event = Some(RegistrationRef::from_registration(registration)?);
        Ok(())
    }

    pub fn add_item(&mut self, product: &Product, boxes: u32, units: u32) -> EventBarResult<usize> {
        let item = MovementItem::new(product, boxes, units);
        validate_item(&item)?;
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    pub fn replace_item(
        &mut self,
        index: usize,
        product: &Product,
        boxes: u32,
        units: u32,
    ) -> EventBarResult<()> {
        check_index(self.items.len(), index)?;
        let item = MovementItem::new(product, boxes, units);
        validate_item(&item)?;
        self.items[index] = item;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> EventBarResult<MovementItem> {
        check_index(self.items.len(), index)?;
        Ok(self.items.remove(index))
    }

    pub fn finish(&self, operator_name: &str) -> EventBarResult<ReturnPayload> {
        match (&self.counterpart, &self.event, self.items.is_empty()) {
            (Some(counterpart), Some(event), false) => Ok(ReturnPayload {
                registration_id: counterpart.id.clone(),
                event_id: event.id.clone(),
                event_name: event.name.clone(),
                notes: self.notes.clone(),
                operator_name: operator_name.to_string(),
                products: self.items.clone(),
            }),
            _ => Err(EventBarError::Validation(
                "Add items, then select the supplier and the event of origin".to_string(),
            )),
        }
    }
}

/// Line of a movement receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub product_name: String,
    pub box_quantity: u32,
    pub unit_quantity: u32,
    #[serde(default)]
    pub units_per_box: u32,
}

impl ReceiptLine {
    pub fn total_units(&self) -> u64 {
        u64::from(self.box_quantity) * u64::from(self.units_per_box) + u64::from(self.unit_quantity)
    }
}

/// Receipt details echoed back for a movement or return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDetails {
    /// Receipt number
    pub id: String,
    /// Movement kind, or `DEVOLUÇÃO` for returns
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub registration_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default)]
    pub products: Vec<ReceiptLine>,
}

/// Kind tag used on return receipts
pub const RETURN_RECEIPT_KIND: &str = "DEVOLUÇÃO";

impl MovementDetails {
    /// Receipt heading
    pub fn title(&self) -> &'static str {
        match self.kind.as_str() {
            "COMPRA_FORNECEDOR" | "RETORNO_EVENTO" => "COMPROVANTE DE ENTRADA",
            "VENDA_DIRETA" => "VENDA DIRETA",
            "SAIDA_EVENTO" => "SAÍDA PARA EVENTO",
            "ALUGUEL_MATERIAL" => "ALUGUEL DE MATERIAL",
            RETURN_RECEIPT_KIND => "COMPROVANTE DE DEVOLUÇÃO",
            _ => "COMPROVANTE",
        }
    }

    pub fn total_units(&self) -> u64 {
        self.products.iter().map(ReceiptLine::total_units).sum()
    }
}

/// Back office answer to a movement or return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementReceipt {
    pub details: MovementDetails,
}
