//! Matched-transaction output records.

use crate::domain::{Decimal, GainType, Share};
use chrono::NaiveDate;
use serde::Serialize;

/// Which side of the acquisition queue a lot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotKind {
    /// Carried-in opening balance. Always ordered before purchases.
    Opening,
    /// In-year purchase.
    Purchase,
}

/// One sale-lot pairing, or an unconsumed lot carried to closing balance.
///
/// Field granularity mirrors the input rows for traceability: a record
/// populates its opening or purchase triple depending on which lot it came
/// from, and its sale triple when a sale consumed it. `gain_type`/`gain`
/// are present only on sale pairings after classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedTransaction {
    pub share: Share,
    pub opening_date: Option<NaiveDate>,
    pub opening_qty: Option<Decimal>,
    #[serde(rename = "openingAmt")]
    pub opening_amount: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_qty: Option<Decimal>,
    #[serde(rename = "purchaseAmt")]
    pub purchase_amount: Option<Decimal>,
    pub sale_date: Option<NaiveDate>,
    pub sale_qty: Option<Decimal>,
    #[serde(rename = "saleAmt")]
    pub sale_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_type: Option<GainType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<Decimal>,
}

impl MatchedTransaction {
    fn empty(share: Share) -> Self {
        MatchedTransaction {
            share,
            opening_date: None,
            opening_qty: None,
            opening_amount: None,
            purchase_date: None,
            purchase_qty: None,
            purchase_amount: None,
            sale_date: None,
            sale_qty: None,
            sale_amount: None,
            gain_type: None,
            gain: None,
        }
    }

    /// A sale consumption of `qty` units from a lot, before classification.
    pub fn sale_pairing(
        share: Share,
        kind: LotKind,
        acquired: NaiveDate,
        qty: Decimal,
        cost: Decimal,
        sale_date: NaiveDate,
        proceeds: Decimal,
    ) -> Self {
        let mut tx = Self::empty(share);
        tx.set_acquisition(kind, acquired, qty, cost);
        tx.sale_date = Some(sale_date);
        tx.sale_qty = Some(qty);
        tx.sale_amount = Some(proceeds);
        tx
    }

    /// A still-open lot remainder, retained for display and closing
    /// aggregation. Carries no sale or gain fields.
    pub fn open_lot(
        share: Share,
        kind: LotKind,
        acquired: NaiveDate,
        qty: Decimal,
        cost: Decimal,
    ) -> Self {
        let mut tx = Self::empty(share);
        tx.set_acquisition(kind, acquired, qty, cost);
        tx
    }

    fn set_acquisition(&mut self, kind: LotKind, acquired: NaiveDate, qty: Decimal, cost: Decimal) {
        match kind {
            LotKind::Opening => {
                self.opening_date = Some(acquired);
                self.opening_qty = Some(qty);
                self.opening_amount = Some(cost);
            }
            LotKind::Purchase => {
                self.purchase_date = Some(acquired);
                self.purchase_qty = Some(qty);
                self.purchase_amount = Some(cost);
            }
        }
    }

    /// The acquisition date of the underlying lot.
    pub fn acquisition_date(&self) -> Option<NaiveDate> {
        self.opening_date.or(self.purchase_date)
    }

    /// The quantity of the underlying lot slice.
    pub fn acquisition_qty(&self) -> Option<Decimal> {
        self.opening_qty.or(self.purchase_qty)
    }

    /// The cost of the underlying lot slice.
    pub fn cost(&self) -> Option<Decimal> {
        self.opening_amount.or(self.purchase_amount)
    }

    /// True when a sale consumed this record's lot slice.
    pub fn is_sale(&self) -> bool {
        self.sale_date.is_some()
    }

    /// Attach a classification. Produces a new record; matched output is
    /// immutable once in a ledger.
    pub fn with_gain(mut self, gain_type: GainType, gain: Decimal) -> Self {
        self.gain_type = Some(gain_type);
        self.gain = Some(gain);
        self
    }
}
