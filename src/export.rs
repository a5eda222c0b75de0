//! CSV export of closings and stock

use std::io::Write;

use csv::WriterBuilder;
use serde::Serialize;

use crate::history::{format_timestamp, ClosingDetail, ClosingRecord};
use crate::stock::Product;
use crate::types::*;
use crate::utils::money::format_decimal;

const CLOSING_HEADERS: [&str; 9] = [
    "protocol",
    "type",
    "name",
    "timestamp",
    "operator",
    "gross_sales",
    "commission_total",
    "settlement_label",
    "final_amount",
];

const STOCK_HEADERS: [&str; 6] = [
    "product",
    "units_per_box",
    "boxes",
    "units",
    "total_units",
    "last_verified",
];

#[derive(Serialize)]
struct ClosingRow<'a> {
    protocol: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
    timestamp: String,
    operator: &'a str,
    gross_sales: String,
    commission_total: String,
    settlement_label: &'a str,
    final_amount: String,
}

#[derive(Serialize)]
struct StockRow<'a> {
    product: &'a str,
    units_per_box: u32,
    boxes: u32,
    units: u32,
    total_units: u64,
    last_verified: &'a str,
}

/// Write closings as CSV, one row per record
///
/// `final_amount` is the settlement for waiters and the cash difference
/// for cashiers; cashier rows leave commission and label empty.
pub fn export_closings<W: Write>(records: &[ClosingRecord], writer: W) -> EventBarResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(CLOSING_HEADERS)?;

    for record in records {
        let (kind, commission_total, settlement_label) = match &record.detail {
            ClosingDetail::Waiter {
                commission_total,
                settlement_label,
                ..
            } => ("waiter", format_decimal(*commission_total), settlement_label.as_str()),
            ClosingDetail::Cashier { .. } => ("cashier", String::new(), ""),
        };

        wtr.serialize(ClosingRow {
            protocol: &record.protocol,
            kind,
            name: record.person_name(),
            timestamp: format_timestamp(record.timestamp.as_deref()),
            operator: &record.operator_name,
            gross_sales: format_decimal(record.gross_sales()),
            commission_total,
            settlement_label,
            final_amount: format_decimal(record.final_amount()),
        })?;
    }

    wtr.flush()
        .map_err(|e| EventBarError::Export(e.to_string()))?;
    Ok(())
}

/// Write current stock as CSV
pub fn export_inventory<W: Write>(products: &[Product], writer: W) -> EventBarResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(STOCK_HEADERS)?;

    for product in products {
        wtr.serialize(StockRow {
            product: &product.product_name,
            units_per_box: product.units_per_box,
            boxes: product.box_stock,
            units: product.unit_stock,
            total_units: product.total_units(),
            last_verified: product.last_verified.as_deref().unwrap_or("Nunca"),
        })?;
    }

    wtr.flush()
        .map_err(|e| EventBarError::Export(e.to_string()))?;
    Ok(())
}

/// Closings CSV as a string
pub fn closings_csv(records: &[ClosingRecord]) -> EventBarResult<String> {
    let mut buf = Vec::new();
    export_closings(records, &mut buf)?;
    String::from_utf8(buf).map_err(|e| EventBarError::Export(e.to_string()))
}
