//! Stock: products, registrations, inventory counts and movements

pub mod audit;
pub mod movement;

pub use audit::*;
pub use movement::*;

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::types::*;

/// A stocked product, counted in boxes plus loose units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    #[serde(deserialize_with = "count_from_any")]
    pub units_per_box: u32,
    #[serde(default, deserialize_with = "count_from_any")]
    pub box_stock: u32,
    #[serde(default, deserialize_with = "count_from_any")]
    pub unit_stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<String>,
}

impl Product {
    /// Units on hand: boxes times units per box, plus loose units
    pub fn total_units(&self) -> u64 {
        u64::from(self.box_stock) * u64::from(self.units_per_box) + u64::from(self.unit_stock)
    }

    /// Units represented by a box/unit quantity of this product
    pub fn units_for(&self, boxes: u32, units: u32) -> u64 {
        u64::from(boxes) * u64::from(self.units_per_box) + u64::from(units)
    }

    /// Case-insensitive product name match
    pub fn matches(&self, query: &str) -> bool {
        self.product_name
            .to_lowercase()
            .contains(&query.trim().to_lowercase())
    }
}

/// Products whose name contains `query`; empty query keeps everything
pub fn search_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    if query.trim().is_empty() {
        return products.iter().collect();
    }
    products.iter().filter(|p| p.matches(query)).collect()
}

/// Body of `POST /api/stock/inventory`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub product_name: String,
    pub units_per_box: u32,
    pub box_stock: u32,
    pub unit_stock: u32,
}

impl NewProduct {
    /// Build from the product form. Both fields are required and the box
    /// size must be a positive whole number.
    pub fn from_form(product_name: &str, units_per_box: &str) -> EventBarResult<Self> {
        let product_name = product_name.trim();
        if product_name.is_empty() || units_per_box.trim().is_empty() {
            return Err(EventBarError::Validation(
                "Product name and units per box are required".to_string(),
            ));
        }
        let units_per_box = parse_count(units_per_box);
        if units_per_box == 0 {
            return Err(EventBarError::Validation(
                "Units per box must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            product_name: product_name.to_string(),
            units_per_box,
            box_stock: 0,
            unit_stock: 0,
        })
    }
}

/// Read a typed count the way the forms do: leading digits, else zero
pub fn parse_count(raw: &str) -> u32 {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Body of `POST /api/stock/inventory/update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCount {
    pub product_id: String,
    pub new_box_stock: u32,
    pub new_unit_stock: u32,
    pub operator_name: String,
}

impl InventoryCount {
    pub fn from_input(product_id: &str, boxes: &str, units: &str, operator_name: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            new_box_stock: parse_count(boxes),
            new_unit_stock: parse_count(units),
            operator_name: operator_name.to_string(),
        }
    }
}

/// Which rows of an inventory sheet to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryFilter {
    #[default]
    All,
    Pending,
    Verified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub product: Product,
    pub verified: bool,
}

/// A physical count in progress; every product starts pending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySheet {
    entries: Vec<SheetEntry>,
}

impl InventorySheet {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            entries: products
                .into_iter()
                .map(|product| SheetEntry {
                    product,
                    verified: false,
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[SheetEntry] {
        &self.entries
    }

    /// Apply an accepted count and mark the product verified
    pub fn record(&mut self, count: &InventoryCount) -> EventBarResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.product.product_id == count.product_id)
            .ok_or_else(|| EventBarError::NotFound(format!("product {}", count.product_id)))?;
        entry.product.box_stock = count.new_box_stock;
        entry.product.unit_stock = count.new_unit_stock;
        entry.verified = true;
        Ok(())
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.verified).count()
    }

    pub fn filter(&self, status: InventoryFilter, query: &str) -> Vec<&SheetEntry> {
        self.entries
            .iter()
            .filter(|e| match status {
                InventoryFilter::All => true,
                InventoryFilter::Pending => !e.verified,
                InventoryFilter::Verified => e.verified,
            })
            .filter(|e| query.trim().is_empty() || e.product.matches(query))
            .collect()
    }
}

/// Registration categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationKind {
    /// Individual client or supplier
    #[serde(rename = "CPF")]
    Person,
    /// Company client or supplier
    #[serde(rename = "CNPJ")]
    Company,
    #[serde(rename = "EVENTO")]
    Event,
}

/// Client, supplier or event a movement is recorded against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: RegistrationKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Registration {
    pub fn new(kind: RegistrationKind, name: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            name: name.into(),
            doc: None,
            contact: None,
            responsible_name: None,
            plate: None,
            city: None,
            notes: None,
        }
    }

    /// Required fields per kind: people need a document and contact,
    /// companies also a responsible name, events a city
    pub fn validate(&self) -> EventBarResult<()> {
        let complete = !self.name.trim().is_empty()
            && match self.kind {
                RegistrationKind::Person => present(&self.doc) && present(&self.contact),
                RegistrationKind::Company => {
                    present(&self.doc) && present(&self.contact) && present(&self.responsible_name)
                }
                RegistrationKind::Event => present(&self.city),
            };
        if complete {
            Ok(())
        } else {
            Err(EventBarError::Validation(format!(
                "Missing required fields for {:?} registration",
                self.kind
            )))
        }
    }

    pub fn is_event(&self) -> bool {
        self.kind == RegistrationKind::Event
    }
}

/// Registrations of `kind` (all when `None`) whose name contains `query`
pub fn filter_registrations<'a>(
    registrations: &'a [Registration],
    kind: Option<RegistrationKind>,
    query: &str,
) -> Vec<&'a Registration> {
    let query = query.trim().to_lowercase();
    registrations
        .iter()
        .filter(|r| kind.map_or(true, |k| r.kind == k))
        .filter(|r| query.is_empty() || r.name.to_lowercase().contains(&query))
        .collect()
}

// The product form posts box sizes as typed text
fn count_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative count")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("count out of range: {v}")))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("count out of range: {v}")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
            if v.is_finite() && v >= 0.0 && v <= f64::from(u32::MAX) {
                Ok(v.trunc() as u32)
            } else {
                Err(E::custom(format!("count out of range: {v}")))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
            Ok(parse_count(v))
        }

        fn visit_unit<E: de::Error>(self) -> Result<u32, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn beer() -> Product {
        Product {
            product_id: "p1".to_string(),
            product_name: "Cerveja Original 600ml".to_string(),
            units_per_box: 12,
            box_stock: 3,
            unit_stock: 5,
            last_verified: None,
        }
    }

    #[test]
    fn test_total_units() {
        assert_eq!(beer().total_units(), 41);
        assert_eq!(beer().units_for(1, 2), 14);
    }

    #[test]
    fn test_product_accepts_textual_box_size() {
        let product: Product = serde_json::from_value(json!({
            "productId": "p9",
            "productName": "Água",
            "unitsPerBox": "24",
            "boxStock": 2,
            "unitStock": null
        }))
        .unwrap();
        assert_eq!(product.units_per_box, 24);
        assert_eq!(product.total_units(), 48);
    }

    #[test]
    fn test_parse_count_reads_leading_digits() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count(" 7 caixas"), 7);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("-3"), 0);
    }

    #[test]
    fn test_new_product_requires_fields() {
        assert!(NewProduct::from_form("", "12").is_err());
        assert!(NewProduct::from_form("Água", "").is_err());
        assert!(NewProduct::from_form("Água", "zero").is_err());
        let product = NewProduct::from_form(" Água ", "24").unwrap();
        assert_eq!(product.product_name, "Água");
        assert_eq!(product.units_per_box, 24);
        assert_eq!(product.box_stock, 0);
    }

    #[test]
    fn test_inventory_sheet_filters() {
        let mut water = beer();
        water.product_id = "p2".to_string();
        water.product_name = "Água".to_string();
        let mut sheet = InventorySheet::new(vec![beer(), water]);
        assert_eq!(sheet.pending_count(), 2);

        sheet
            .record(&InventoryCount::from_input("p2", "4", "x", "Fabio"))
            .unwrap();
        assert_eq!(sheet.pending_count(), 1);
        assert_eq!(sheet.filter(InventoryFilter::Verified, "").len(), 1);
        assert_eq!(sheet.filter(InventoryFilter::Pending, "cerveja").len(), 1);
        assert!(sheet.filter(InventoryFilter::Pending, "água").is_empty());
        assert_eq!(sheet.entries()[1].product.box_stock, 4);
        assert_eq!(sheet.entries()[1].product.unit_stock, 0);

        assert!(sheet
            .record(&InventoryCount::from_input("nope", "1", "1", "Fabio"))
            .is_err());
    }

    #[test]
    fn test_registration_required_fields() {
        let mut person = Registration::new(RegistrationKind::Person, "João");
        assert!(person.validate().is_err());
        person.doc = Some("12345678900".to_string());
        person.contact = Some("9999-0000".to_string());
        assert!(person.validate().is_ok());

        let mut company = Registration::new(RegistrationKind::Company, "Bebidas LTDA");
        company.doc = Some("00.000.000/0001-00".to_string());
        company.contact = Some("3333-0000".to_string());
        assert!(company.validate().is_err());
        company.responsible_name = Some("Marta".to_string());
        assert!(company.validate().is_ok());

        let mut event = Registration::new(RegistrationKind::Event, "Rodeio");
        assert!(event.validate().is_err());
        event.city = Some("Barretos".to_string());
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_registration_wire_type() {
        let value = serde_json::to_value(Registration::new(RegistrationKind::Event, "Rodeio")).unwrap();
        assert_eq!(value["type"], json!("EVENTO"));
        assert!(value.get("id").is_none());

        let list = vec![
            Registration::new(RegistrationKind::Event, "Rodeio"),
            Registration::new(RegistrationKind::Company, "Rodeio Bebidas"),
        ];
        assert_eq!(filter_registrations(&list, None, "rodeio").len(), 2);
        assert_eq!(
            filter_registrations(&list, Some(RegistrationKind::Company), "").len(),
            1
        );
    }
}
