//! Stock audit log
//!
//! Every movement, return and inventory count leaves one entry per product
//! line in `GET /api/stock/audit`. Entries for movements and returns carry
//! the receipt id, so the receipt can be fetched again from
//! `GET /api/stock/transaction/{id}`.

use serde::{Deserialize, Serialize};

/// Kind tag used on entries written by an inventory count
pub const INVENTORY_AUDIT_KIND: &str = "INVENTÁRIO";

/// Grouping shown on the audit screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditCategory {
    Entry,
    Exit,
    Return,
    Inventory,
    /// Any kind not listed above
    Other,
}

impl AuditCategory {
    /// Classify a raw `type` value
    pub fn of(kind: &str) -> Self {
        match kind.trim() {
            "ENTRADA" | "COMPRA_FORNECEDOR" | "RETORNO_EVENTO" => AuditCategory::Entry,
            "SAÍDA" | "VENDA_DIRETA" | "SAIDA_EVENTO" | "ALUGUEL_MATERIAL" => AuditCategory::Exit,
            "DEVOLUÇÃO" => AuditCategory::Return,
            INVENTORY_AUDIT_KIND => AuditCategory::Inventory,
            _ => AuditCategory::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuditCategory::Entry => "Entrada",
            AuditCategory::Exit => "Saída",
            AuditCategory::Return => "Devolução",
            AuditCategory::Inventory => "Inventário",
            AuditCategory::Other => "Outro",
        }
    }

    /// Display colour used by the audit screen
    pub fn color(&self) -> &'static str {
        match self {
            AuditCategory::Entry => "green",
            AuditCategory::Exit => "red",
            AuditCategory::Return => "orange",
            AuditCategory::Inventory => "blue",
            AuditCategory::Other => "gray",
        }
    }
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Receipt id for movements and returns
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    /// Counterpart for movements, count detail for inventory entries
    #[serde(default)]
    pub registration_name: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
}

impl AuditEntry {
    pub fn category(&self) -> AuditCategory {
        AuditCategory::of(&self.kind)
    }

    /// Inventory counts have no receipt to print
    pub fn can_reprint(&self) -> bool {
        self.kind.trim() != INVENTORY_AUDIT_KIND && !self.id.is_empty()
    }

    /// Label before the registration name on the card
    pub fn counterpart_label(&self) -> &'static str {
        if self.category() == AuditCategory::Inventory {
            "Detalhe:"
        } else {
            "Para:"
        }
    }

    /// Case-insensitive match on product or registration name
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        [&self.product_name, &self.registration_name]
            .iter()
            .any(|field| {
                field
                    .as_deref()
                    .is_some_and(|v| v.to_lowercase().contains(&query))
            })
    }
}

/// Loaded audit log with the screen's filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new(entries: Vec<AuditEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in `category` (all when `None`) matching `query`
    pub fn filter(&self, category: Option<AuditCategory>, query: &str) -> Vec<&AuditEntry> {
        self.entries
            .iter()
            .filter(|e| category.map_or(true, |c| e.category() == c))
            .filter(|e| query.trim().is_empty() || e.matches(query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log() -> AuditLog {
        AuditLog::new(
            serde_json::from_value(json!([
                {"id": "MOV-1", "type": "SAIDA_EVENTO", "date": "08/03/2025 10:00",
                 "productName": "Cerveja 600ml", "registrationName": "Rodeio 2025", "operator": "Fabio"},
                {"id": "MOV-2", "type": "COMPRA_FORNECEDOR",
                 "productName": "Água", "registrationName": "Bebidas LTDA", "operator": "Fabio"},
                {"id": "DEV-3", "type": "DEVOLUÇÃO",
                 "productName": "Cerveja 600ml", "registrationName": "Bebidas LTDA"},
                {"id": "INV-4", "type": "INVENTÁRIO",
                 "productName": "Água", "registrationName": "3 cx + 2 un", "operator": "Ana"},
                {"id": "X-5", "type": "AJUSTE", "productName": "Gelo"}
            ]))
            .unwrap(),
        )
    }

    #[test]
    fn test_categories() {
        assert_eq!(AuditCategory::of("RETORNO_EVENTO"), AuditCategory::Entry);
        assert_eq!(AuditCategory::of("ENTRADA"), AuditCategory::Entry);
        assert_eq!(AuditCategory::of("ALUGUEL_MATERIAL"), AuditCategory::Exit);
        assert_eq!(AuditCategory::of("SAÍDA"), AuditCategory::Exit);
        assert_eq!(AuditCategory::of("DEVOLUÇÃO"), AuditCategory::Return);
        assert_eq!(AuditCategory::of("INVENTÁRIO"), AuditCategory::Inventory);
        assert_eq!(AuditCategory::of("AJUSTE"), AuditCategory::Other);
        assert_eq!(AuditCategory::Exit.label(), "Saída");
    }

    #[test]
    fn test_inventory_entries_cannot_reprint() {
        let log = log();
        assert!(log.entries()[0].can_reprint());
        assert!(log.entries()[2].can_reprint());
        assert!(!log.entries()[3].can_reprint());
        assert_eq!(log.entries()[3].counterpart_label(), "Detalhe:");
        assert_eq!(log.entries()[0].counterpart_label(), "Para:");
    }

    #[test]
    fn test_filter_by_category_and_query() {
        let log = log();
        assert_eq!(log.filter(None, "").len(), 5);
        assert_eq!(log.filter(Some(AuditCategory::Exit), "").len(), 1);
        assert_eq!(log.filter(Some(AuditCategory::Inventory), "")[0].id, "INV-4");
        assert_eq!(log.filter(Some(AuditCategory::Other), "").len(), 1);

        let bebidas = log.filter(None, "bebidas");
        assert_eq!(bebidas.len(), 2);
        assert_eq!(log.filter(Some(AuditCategory::Return), "CERVEJA").len(), 1);
        assert!(log.filter(Some(AuditCategory::Entry), "cerveja").is_empty());
    }
}
