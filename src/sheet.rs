//! Spreadsheet parsing and export for ledger rows.
//!
//! The upload format is one CSV with a header row:
//! `share,openingDate,openingQty,openingAmt,purchaseDate,purchaseQty,
//! purchaseAmt,saleDate,saleQty,saleAmt`. Dates are ISO-8601; empty cells
//! are absent values. Exports reuse the same layout so a carry-forward
//! file re-uploads cleanly.

use crate::domain::{Decimal, Leg, Share, TransactionRow};
use crate::engine::Ledger;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
    #[error("csv error: {0}")]
    Csv(String),
}

pub const HEADER: [&str; 10] = [
    "share",
    "openingDate",
    "openingQty",
    "openingAmt",
    "purchaseDate",
    "purchaseQty",
    "purchaseAmt",
    "saleDate",
    "saleQty",
    "saleAmt",
];

#[derive(Debug, serde::Deserialize)]
struct RawRow {
    share: Option<String>,
    #[serde(rename = "openingDate")]
    opening_date: Option<String>,
    #[serde(rename = "openingQty")]
    opening_qty: Option<String>,
    #[serde(rename = "openingAmt")]
    opening_amt: Option<String>,
    #[serde(rename = "purchaseDate")]
    purchase_date: Option<String>,
    #[serde(rename = "purchaseQty")]
    purchase_qty: Option<String>,
    #[serde(rename = "purchaseAmt")]
    purchase_amt: Option<String>,
    #[serde(rename = "saleDate")]
    sale_date: Option<String>,
    #[serde(rename = "saleQty")]
    sale_qty: Option<String>,
    #[serde(rename = "saleAmt")]
    sale_amt: Option<String>,
}

fn cell(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_decimal_cell(
    line: usize,
    label: &str,
    value: &Option<String>,
) -> Result<Decimal, SheetError> {
    match cell(value) {
        None => Ok(Decimal::zero()),
        Some(s) => Decimal::from_str_canonical(s).map_err(|_| SheetError::MalformedRow {
            row: line,
            reason: format!("invalid {label}: {s:?}"),
        }),
    }
}

fn parse_leg(
    line: usize,
    label: &str,
    date: &Option<String>,
    qty: &Option<String>,
    amount: &Option<String>,
) -> Result<Option<Leg>, SheetError> {
    let qty = parse_decimal_cell(line, &format!("{label}Qty"), qty)?;
    let amount = parse_decimal_cell(line, &format!("{label}Amt"), amount)?;
    let date = match cell(date) {
        Some(s) => Some(s.parse::<NaiveDate>().map_err(|_| SheetError::MalformedRow {
            row: line,
            reason: format!("unparsable {label}Date: {s:?}"),
        })?),
        None => None,
    };

    if qty.is_negative() {
        return Err(SheetError::MalformedRow {
            row: line,
            reason: format!("negative {label}Qty"),
        });
    }
    if amount.is_negative() {
        return Err(SheetError::MalformedRow {
            row: line,
            reason: format!("negative {label}Amt"),
        });
    }

    match date {
        Some(date) => Ok(Some(Leg::new(date, qty, amount))),
        None if qty.is_zero() && amount.is_zero() => Ok(None),
        None => Err(SheetError::MalformedRow {
            row: line,
            reason: format!("{label}Date missing for populated {label} values"),
        }),
    }
}

/// Parse an uploaded spreadsheet into validated rows.
///
/// # Errors
/// Returns [`SheetError::MalformedRow`] with the offending line number on
/// the first invalid row; the whole upload is rejected.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<TransactionRow>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<RawRow>().enumerate() {
        // Line 1 is the header.
        let line = index + 2;
        let raw = record.map_err(|e| SheetError::Csv(e.to_string()))?;

        let share = cell(&raw.share).ok_or_else(|| SheetError::MalformedRow {
            row: line,
            reason: "missing share identifier".to_string(),
        })?;

        let row = TransactionRow {
            share: Share::new(share),
            opening: parse_leg(
                line,
                "opening",
                &raw.opening_date,
                &raw.opening_qty,
                &raw.opening_amt,
            )?,
            purchase: parse_leg(
                line,
                "purchase",
                &raw.purchase_date,
                &raw.purchase_qty,
                &raw.purchase_amt,
            )?,
            sale: parse_leg(line, "sale", &raw.sale_date, &raw.sale_qty, &raw.sale_amt)?,
        };
        rows.push(row);
    }

    Ok(rows)
}

fn leg_cells(leg: &Option<Leg>) -> [String; 3] {
    match leg {
        Some(leg) => [
            leg.date.to_string(),
            leg.qty.to_canonical_string(),
            leg.amount.to_canonical_string(),
        ],
        None => [String::new(), String::new(), String::new()],
    }
}

/// Write rows in the upload layout, e.g. for the carry-forward export.
///
/// # Errors
/// Returns [`SheetError::Csv`] on writer failure.
pub fn write_rows(rows: &[TransactionRow]) -> Result<Vec<u8>, SheetError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADER)
        .map_err(|e| SheetError::Csv(e.to_string()))?;
    for row in rows {
        let mut record = vec![row.share.as_str().to_string()];
        record.extend(leg_cells(&row.opening));
        record.extend(leg_cells(&row.purchase));
        record.extend(leg_cells(&row.sale));
        writer
            .write_record(&record)
            .map_err(|e| SheetError::Csv(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| SheetError::Csv(e.to_string()))
}

const REPORT_HEADER: [&str; 13] = [
    "share",
    "openingQty",
    "openingAmt",
    "purchaseQty",
    "purchaseAmt",
    "saleQty",
    "saleAmt",
    "closingQty",
    "closingAmt",
    "avgCostPrice",
    "realizedGain",
    "ltcg",
    "stcg",
];

/// Write the current-ledger report: one line per share's closing balance
/// plus a portfolio totals line.
///
/// # Errors
/// Returns [`SheetError::Csv`] on writer failure.
pub fn write_report(ledger: &Ledger) -> Result<Vec<u8>, SheetError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(REPORT_HEADER)
        .map_err(|e| SheetError::Csv(e.to_string()))?;

    for b in &ledger.closing_balances {
        writer
            .write_record(&[
                b.share.as_str().to_string(),
                b.opening_qty.to_canonical_string(),
                b.opening_amount.to_canonical_string(),
                b.purchase_qty.to_canonical_string(),
                b.purchase_amount.to_canonical_string(),
                b.sale_qty.to_canonical_string(),
                b.sale_amount.to_canonical_string(),
                b.closing_qty.to_canonical_string(),
                b.closing_amount.to_canonical_string(),
                b.avg_cost_price.to_canonical_string(),
                b.realized_gain.to_canonical_string(),
                b.ltcg.to_canonical_string(),
                b.stcg.to_canonical_string(),
            ])
            .map_err(|e| SheetError::Csv(e.to_string()))?;
    }

    let s = &ledger.summary;
    writer
        .write_record(&[
            "TOTAL".to_string(),
            String::new(),
            s.total_opening_value.to_canonical_string(),
            String::new(),
            s.total_purchase_value.to_canonical_string(),
            String::new(),
            s.total_sale_value.to_canonical_string(),
            String::new(),
            s.total_closing_value.to_canonical_string(),
            String::new(),
            s.total_realized_gain.to_canonical_string(),
            ledger.capital_gains.total_ltcg.to_canonical_string(),
            ledger.capital_gains.total_stcg.to_canonical_string(),
        ])
        .map_err(|e| SheetError::Csv(e.to_string()))?;

    writer
        .into_inner()
        .map_err(|e| SheetError::Csv(e.to_string()))
}
