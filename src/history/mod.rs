//! Closing history for an event
//!
//! Records come back from `GET /api/closings?eventName=` in the same
//! camelCase shape the closings were submitted in, tagged with `type`.
//! Group closings are stored per cashier and read back as cashier records.

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::*;

/// A saved closing as listed by the back office
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosingRecord {
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub operator_name: String,
    #[serde(flatten)]
    pub detail: ClosingDetail,
}

/// Kind-specific part of a closing record
///
/// Only `type: "waiter"` reads as a waiter closing. Any other tag, or none
/// at all, reads as a cashier closing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClosingDetail {
    Waiter {
        #[serde(rename = "waiterName", default)]
        waiter_name: String,
        #[serde(rename = "valorTotal", default)]
        gross_sales: Cents,
        #[serde(rename = "credito", default)]
        credit: Cents,
        #[serde(rename = "debito", default)]
        debit: Cents,
        #[serde(rename = "pix", default)]
        instant_payment: Cents,
        #[serde(rename = "cashless", default)]
        stored_value: Cents,
        #[serde(rename = "comissaoTotal", default)]
        commission_total: Cents,
        #[serde(rename = "acertoLabel", default)]
        settlement_label: String,
        #[serde(rename = "valorAcerto", default)]
        settlement: Cents,
    },
    Cashier {
        #[serde(rename = "cashierName", default)]
        cashier_name: String,
        #[serde(rename = "valorTotalVenda", default)]
        gross_sales: Cents,
        #[serde(rename = "credito", default)]
        credit: Cents,
        #[serde(rename = "debito", default)]
        debit: Cents,
        #[serde(rename = "pix", default)]
        instant_payment: Cents,
        #[serde(rename = "cashless", default)]
        stored_value: Cents,
        #[serde(rename = "dinheiroFisico", default)]
        physical_cash: Cents,
        #[serde(rename = "diferenca", default)]
        difference: Cents,
    },
}

// Union of both record shapes, used to decode without trusting the tag
#[derive(Deserialize)]
struct RawDetail {
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(rename = "waiterName", default)]
    waiter_name: Option<String>,
    #[serde(rename = "cashierName", default)]
    cashier_name: Option<String>,
    #[serde(rename = "valorTotal", default)]
    waiter_gross_sales: Cents,
    #[serde(rename = "valorTotalVenda", default)]
    cashier_gross_sales: Cents,
    #[serde(rename = "credito", default)]
    credit: Cents,
    #[serde(rename = "debito", default)]
    debit: Cents,
    #[serde(rename = "pix", default)]
    instant_payment: Cents,
    #[serde(rename = "cashless", default)]
    stored_value: Cents,
    #[serde(rename = "comissaoTotal", default)]
    commission_total: Cents,
    #[serde(rename = "acertoLabel", default)]
    settlement_label: Option<String>,
    #[serde(rename = "valorAcerto", default)]
    settlement: Cents,
    #[serde(rename = "dinheiroFisico", default)]
    physical_cash: Cents,
    #[serde(rename = "diferenca", default)]
    difference: Cents,
}

impl<'de> Deserialize<'de> for ClosingDetail {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawDetail::deserialize(deserializer)?;
        let is_waiter = raw
            .kind
            .as_ref()
            .and_then(Value::as_str)
            .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("waiter"));

        Ok(if is_waiter {
            ClosingDetail::Waiter {
                waiter_name: raw.waiter_name.unwrap_or_default(),
                gross_sales: raw.waiter_gross_sales,
                credit: raw.credit,
                debit: raw.debit,
                instant_payment: raw.instant_payment,
                stored_value: raw.stored_value,
                commission_total: raw.commission_total,
                settlement_label: raw.settlement_label.unwrap_or_default(),
                settlement: raw.settlement,
            }
        } else {
            ClosingDetail::Cashier {
                cashier_name: raw.cashier_name.unwrap_or_default(),
                gross_sales: raw.cashier_gross_sales,
                credit: raw.credit,
                debit: raw.debit,
                instant_payment: raw.instant_payment,
                stored_value: raw.stored_value,
                physical_cash: raw.physical_cash,
                difference: raw.difference,
            }
        })
    }
}

impl ClosingRecord {
    pub fn is_waiter(&self) -> bool {
        matches!(self.detail, ClosingDetail::Waiter { .. })
    }

    /// Waiter or cashier name
    pub fn person_name(&self) -> &str {
        match &self.detail {
            ClosingDetail::Waiter { waiter_name, .. } => waiter_name,
            ClosingDetail::Cashier { cashier_name, .. } => cashier_name,
        }
    }

    /// Badge text shown on the list card
    pub fn kind_label(&self) -> &'static str {
        if self.is_waiter() {
            "Garçom"
        } else {
            "Caixa"
        }
    }

    pub fn gross_sales(&self) -> Cents {
        match &self.detail {
            ClosingDetail::Waiter { gross_sales, .. } | ClosingDetail::Cashier { gross_sales, .. } => {
                *gross_sales
            }
        }
    }

    /// Settlement for waiters, cash difference for cashiers
    pub fn final_amount(&self) -> Cents {
        match &self.detail {
            ClosingDetail::Waiter { settlement, .. } => *settlement,
            ClosingDetail::Cashier { difference, .. } => *difference,
        }
    }

    /// Case-insensitive substring match on the person name or protocol
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.person_name().to_lowercase().contains(&query)
            || self.protocol.to_lowercase().contains(&query)
    }

    /// Multi-line detail block shown when a record is opened
    pub fn details_text(&self) -> String {
        let mut text = format!(
            "Protocolo: {}\nData: {}\nEvento: {}\nOperador: {}\n\n",
            self.protocol,
            format_timestamp(self.timestamp.as_deref()),
            self.event_name,
            self.operator_name
        );

        match &self.detail {
            ClosingDetail::Waiter {
                waiter_name,
                gross_sales,
                credit,
                debit,
                instant_payment,
                stored_value,
                commission_total,
                settlement_label,
                settlement,
            } => {
                text.push_str("Tipo: Garçom\n");
                text.push_str(&format!("Garçom: {waiter_name}\n\n"));
                text.push_str(&format!("Valor Total: {gross_sales}\n"));
                text.push_str(&format!("Crédito: {credit}\n"));
                text.push_str(&format!("Débito: {debit}\n"));
                text.push_str(&format!("PIX: {instant_payment}\n"));
                text.push_str(&format!("Cashless: {stored_value}\n\n"));
                text.push_str(&format!("Comissão Total: {commission_total}\n"));
                text.push_str(&format!("{settlement_label} {settlement}\n"));
            }
            ClosingDetail::Cashier {
                cashier_name,
                gross_sales,
                credit,
                debit,
                instant_payment,
                stored_value,
                physical_cash,
                difference,
            } => {
                text.push_str("Tipo: Caixa\n");
                text.push_str(&format!("Caixa: {cashier_name}\n\n"));
                text.push_str(&format!("Venda Total: {gross_sales}\n"));
                text.push_str(&format!("Crédito: {credit}\n"));
                text.push_str(&format!("Débito: {debit}\n"));
                text.push_str(&format!("PIX: {instant_payment}\n"));
                text.push_str(&format!("Cashless: {stored_value}\n"));
                text.push_str(&format!("Dinheiro Contado: {physical_cash}\n\n"));
                text.push_str(&format!("Diferença: {difference}\n"));
            }
        }
        text
    }
}

/// Render a record timestamp as `dd/mm/yyyy hh:mm`.
///
/// Instants with an offset are shown in local time; naive timestamps are
/// taken as local already. Values that already contain `/` are taken as
/// formatted. Missing values
/// render as "Data indisponível"; unparseable ones are shown as received.
pub fn format_timestamp(timestamp: Option<&str>) -> String {
    let Some(raw) = timestamp.map(str::trim).filter(|t| !t.is_empty()) else {
        return "Data indisponível".to_string();
    };
    if raw.contains('/') {
        return raw.to_string();
    }

    const DISPLAY: &str = "%d/%m/%Y %H:%M";
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format(DISPLAY).to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format(DISPLAY).to_string();
    }
    raw.to_string()
}

/// Closings loaded for one event, with search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClosingHistory {
    event_name: String,
    records: Vec<ClosingRecord>,
}

impl ClosingHistory {
    pub fn new(event_name: impl Into<String>, records: Vec<ClosingRecord>) -> Self {
        Self {
            event_name: event_name.into(),
            records,
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn records(&self) -> &[ClosingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn waiter_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_waiter()).count()
    }

    pub fn cashier_count(&self) -> usize {
        self.len() - self.waiter_count()
    }

    /// Records matching `query`; an empty query returns everything
    pub fn search(&self, query: &str) -> Vec<&ClosingRecord> {
        let query = query.trim();
        if query.is_empty() {
            return self.records.iter().collect();
        }
        self.records.iter().filter(|r| r.matches(query)).collect()
    }

    pub fn find(&self, protocol: &str) -> Option<&ClosingRecord> {
        self.records.iter().find(|r| r.protocol == protocol)
    }

    /// Sum of waiter commissions across the event
    pub fn total_commission(&self) -> Cents {
        self.records
            .iter()
            .filter_map(|r| match &r.detail {
                ClosingDetail::Waiter { commission_total, .. } => Some(*commission_total),
                ClosingDetail::Cashier { .. } => None,
            })
            .sum()
    }

    /// Net cashier difference across the event
    pub fn total_difference(&self) -> Cents {
        self.records
            .iter()
            .filter_map(|r| match &r.detail {
                ClosingDetail::Cashier { difference, .. } => Some(*difference),
                ClosingDetail::Waiter { .. } => None,
            })
            .sum()
    }
}
